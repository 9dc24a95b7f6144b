//! Visual themes: header/footer bands, size presets per row tier and colours.
//!
//! Every theme shares the same layout code; only the numbers differ. A preset
//! table maps a row-height tier to the sizes used to draw that row, and the
//! table must shrink monotonically from the tallest tier to the smallest.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::model::BettingType;
use crate::{Error, Result};

/// Row heights at or above `TIER_THRESHOLDS[i]` use tier `i`; anything
/// shorter than the last threshold falls into the final tier.
pub const TIER_THRESHOLDS: [u32; 6] = [150, 130, 110, 90, 75, 65];

pub const TIER_COUNT: usize = TIER_THRESHOLDS.len() + 1;

/// Sizes (in canvas units) used to draw one game row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SizePreset {
    pub league_font: u32,
    pub team_font: u32,
    pub odds_font: u32,
    pub market_font: u32,
    pub league_logo: u32,
    pub team_logo: u32,
    pub padding: u32,
    pub max_name_len: usize,
}

impl SizePreset {
    #[allow(clippy::too_many_arguments)]
    const fn new(
        league_font: u32,
        team_font: u32,
        odds_font: u32,
        market_font: u32,
        league_logo: u32,
        team_logo: u32,
        padding: u32,
        max_name_len: usize,
    ) -> Self {
        Self {
            league_font,
            team_font,
            odds_font,
            market_font,
            league_logo,
            team_logo,
            padding,
            max_name_len,
        }
    }

    /// True when no parameter of `self` is smaller than the one in `smaller`.
    pub fn dominates(&self, smaller: &SizePreset) -> bool {
        self.league_font >= smaller.league_font
            && self.team_font >= smaller.team_font
            && self.odds_font >= smaller.odds_font
            && self.market_font >= smaller.market_font
            && self.league_logo >= smaller.league_logo
            && self.team_logo >= smaller.team_logo
            && self.padding >= smaller.padding
            && self.max_name_len >= smaller.max_name_len
    }
}

const CLASSIC_PRESETS: [SizePreset; TIER_COUNT] = [
    SizePreset::new(22, 32, 34, 20, 32, 44, 16, 18),
    SizePreset::new(20, 28, 30, 18, 28, 40, 14, 17),
    SizePreset::new(18, 26, 28, 17, 26, 36, 12, 16),
    SizePreset::new(16, 24, 26, 16, 24, 32, 10, 15),
    SizePreset::new(15, 20, 22, 14, 20, 28, 8, 14),
    SizePreset::new(14, 18, 20, 13, 18, 24, 6, 13),
    SizePreset::new(12, 16, 18, 12, 16, 20, 4, 12),
];

const PREMIUM_PRESETS: [SizePreset; TIER_COUNT] = [
    SizePreset::new(24, 34, 38, 20, 36, 48, 18, 18),
    SizePreset::new(22, 30, 34, 18, 32, 42, 16, 17),
    SizePreset::new(20, 27, 30, 17, 28, 38, 13, 16),
    SizePreset::new(17, 24, 27, 16, 24, 32, 10, 15),
    SizePreset::new(15, 21, 23, 14, 20, 28, 8, 14),
    SizePreset::new(14, 18, 21, 13, 18, 24, 6, 13),
    SizePreset::new(12, 16, 18, 12, 16, 20, 4, 12),
];

const MINIMAL_PRESETS: [SizePreset; TIER_COUNT] = [
    SizePreset::new(20, 30, 30, 18, 28, 40, 14, 20),
    SizePreset::new(18, 26, 27, 17, 26, 36, 12, 18),
    SizePreset::new(17, 24, 25, 16, 24, 32, 10, 17),
    SizePreset::new(15, 22, 23, 15, 22, 28, 8, 16),
    SizePreset::new(14, 19, 20, 13, 18, 24, 7, 14),
    SizePreset::new(13, 17, 18, 12, 16, 22, 5, 13),
    SizePreset::new(11, 15, 16, 11, 14, 18, 3, 11),
];

/// Tier → preset table, validated to be non-increasing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresetTable {
    tiers: [SizePreset; TIER_COUNT],
}

impl PresetTable {
    /// Build a table from tallest tier to smallest, rejecting any table in
    /// which a parameter grows as rows get shorter.
    pub fn new(tiers: &[SizePreset]) -> Result<Self> {
        let tiers: [SizePreset; TIER_COUNT] = tiers.try_into().map_err(|_| {
            Error::ConfigError(format!("preset table needs {} tiers, got {}", TIER_COUNT, tiers.len()))
        })?;
        for (i, pair) in tiers.windows(2).enumerate() {
            if !pair[0].dominates(&pair[1]) {
                return Err(Error::ConfigError(format!(
                    "preset tier {} is larger than tier {} in at least one parameter",
                    i + 1,
                    i
                )));
            }
        }
        Ok(Self { tiers })
    }

    /// Tier index for a row of the given height.
    pub fn tier_for(row_height: u32) -> usize {
        TIER_THRESHOLDS
            .iter()
            .position(|&min| row_height >= min)
            .unwrap_or(TIER_COUNT - 1)
    }

    pub fn preset(&self, tier: usize) -> &SizePreset {
        &self.tiers[tier.min(TIER_COUNT - 1)]
    }

    pub fn preset_for(&self, row_height: u32) -> &SizePreset {
        self.preset(Self::tier_for(row_height))
    }

    pub fn tiers(&self) -> &[SizePreset] {
        &self.tiers
    }
}

pub type Rgba = (u8, u8, u8, u8);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    pub background_top: Rgba,
    pub background_bottom: Rgba,
    pub band: Rgba,
    pub accent: Rgba,
    pub text: Rgba,
    pub muted: Rgba,
    pub row_fill: Rgba,
    pub row_border: Rgba,
    pub strip: Rgba,
    pub won: Rgba,
    pub lost: Rgba,
    pub live: Rgba,
}

const CLASSIC_PALETTE: Palette = Palette {
    background_top: (26, 26, 26, 255),
    background_bottom: (15, 23, 42, 255),
    band: (250, 204, 21, 26),
    accent: (250, 204, 21, 255),
    text: (255, 255, 255, 255),
    muted: (209, 213, 219, 255),
    row_fill: (255, 255, 255, 26),
    row_border: (250, 204, 21, 77),
    strip: (255, 215, 0, 38),
    won: (34, 197, 94, 255),
    lost: (239, 68, 68, 255),
    live: (239, 68, 68, 255),
};

const PREMIUM_PALETTE: Palette = Palette {
    background_top: (15, 23, 42, 255),
    background_bottom: (30, 41, 59, 255),
    band: (255, 215, 0, 30),
    accent: (255, 215, 0, 255),
    text: (255, 255, 255, 255),
    muted: (203, 213, 225, 255),
    row_fill: (255, 255, 255, 20),
    row_border: (255, 215, 0, 90),
    strip: (255, 215, 0, 45),
    won: (74, 222, 128, 255),
    lost: (248, 113, 113, 255),
    live: (239, 68, 68, 255),
};

const MINIMAL_PALETTE: Palette = Palette {
    background_top: (17, 24, 39, 255),
    background_bottom: (17, 24, 39, 255),
    band: (255, 255, 255, 12),
    accent: (250, 204, 21, 255),
    text: (243, 244, 246, 255),
    muted: (156, 163, 175, 255),
    row_fill: (255, 255, 255, 14),
    row_border: (75, 85, 99, 255),
    strip: (255, 255, 255, 10),
    won: (34, 197, 94, 255),
    lost: (239, 68, 68, 255),
    live: (239, 68, 68, 255),
};

/// Identifier used to pick a theme
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThemeId {
    Classic,
    Premium,
    Minimal,
}

impl ThemeId {
    /// Default theme per bulletin type: simple bets get the classic look,
    /// multiples the premium one.
    pub fn for_type(kind: BettingType) -> Self {
        if kind.is_multiple() {
            ThemeId::Premium
        } else {
            ThemeId::Classic
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ThemeId::Classic => "classic",
            ThemeId::Premium => "premium",
            ThemeId::Minimal => "minimal",
        }
    }
}

impl fmt::Display for ThemeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ThemeId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "classic" => Ok(ThemeId::Classic),
            "premium" => Ok(ThemeId::Premium),
            "minimal" => Ok(ThemeId::Minimal),
            other => Err(Error::ConfigError(format!("unknown theme '{}'", other))),
        }
    }
}

/// Footer band height, either fixed or a share of the canvas height
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FooterHeight {
    Fixed(u32),
    Percent(u32),
}

impl FooterHeight {
    pub fn resolve(&self, canvas_height: u32) -> u32 {
        match *self {
            FooterHeight::Fixed(px) => px,
            FooterHeight::Percent(pct) => canvas_height * pct / 100,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Theme {
    pub id: ThemeId,
    pub header_height: u32,
    pub footer: FooterHeight,
    pub presets: PresetTable,
    pub palette: Palette,
}

impl Theme {
    pub const HEADER_HEIGHT: u32 = 160;

    pub fn builtin(id: ThemeId) -> Self {
        let (footer, tiers, palette) = match id {
            ThemeId::Classic => (FooterHeight::Fixed(140), CLASSIC_PRESETS, CLASSIC_PALETTE),
            ThemeId::Premium => (FooterHeight::Fixed(120), PREMIUM_PRESETS, PREMIUM_PALETTE),
            ThemeId::Minimal => (FooterHeight::Percent(15), MINIMAL_PRESETS, MINIMAL_PALETTE),
        };
        Self {
            id,
            header_height: Self::HEADER_HEIGHT,
            footer,
            presets: PresetTable { tiers },
            palette,
        }
    }

    /// Swap in a caller-supplied preset table (validated).
    pub fn with_presets(mut self, tiers: &[SizePreset]) -> Result<Self> {
        self.presets = PresetTable::new(tiers)?;
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_tables_are_monotone() {
        for id in [ThemeId::Classic, ThemeId::Premium, ThemeId::Minimal] {
            let theme = Theme::builtin(id);
            PresetTable::new(theme.presets.tiers()).unwrap_or_else(|e| panic!("{}: {}", id, e));
        }
    }

    #[test]
    fn tier_boundaries() {
        assert_eq!(PresetTable::tier_for(400), 0);
        assert_eq!(PresetTable::tier_for(150), 0);
        assert_eq!(PresetTable::tier_for(149), 1);
        assert_eq!(PresetTable::tier_for(110), 2);
        assert_eq!(PresetTable::tier_for(90), 3);
        assert_eq!(PresetTable::tier_for(75), 4);
        assert_eq!(PresetTable::tier_for(65), 5);
        assert_eq!(PresetTable::tier_for(64), 6);
        assert_eq!(PresetTable::tier_for(0), 6);
    }

    #[test]
    fn rejects_growing_table() {
        let mut tiers = CLASSIC_PRESETS;
        tiers[4].team_logo = 60;
        let err = PresetTable::new(&tiers).unwrap_err();
        assert!(err.to_string().contains("tier 4"));
        assert!(PresetTable::new(&tiers[..3]).is_err());
    }

    #[test]
    fn footer_modes() {
        assert_eq!(Theme::builtin(ThemeId::Classic).footer.resolve(1080), 140);
        assert_eq!(Theme::builtin(ThemeId::Premium).footer.resolve(1080), 120);
        assert_eq!(Theme::builtin(ThemeId::Minimal).footer.resolve(1080), 162);
    }

    #[test]
    fn theme_for_type() {
        assert_eq!(ThemeId::for_type(BettingType::LiveMultiple), ThemeId::Premium);
        assert_eq!(ThemeId::for_type(BettingType::Simple), ThemeId::Classic);
        assert_eq!("Minimal".parse::<ThemeId>().unwrap(), ThemeId::Minimal);
    }
}
