//! Bulletin layout: distributes game rows between the header and footer bands
//!
//! The layout is a pure function of the bulletin, the theme and a couple of
//! options. It resolves every size and every string that the painter needs;
//! nothing downstream makes sizing decisions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::logos;
use crate::model::{format_decimal, Bulletin, Game, GameStatus};
use crate::rendering::theme::{PresetTable, SizePreset, Theme};
use crate::{Error, Result};

/// Edge length of the square export canvas.
pub const CANVAS_SIZE: u32 = 1080;

/// Rows are never floored below this height unless the policy shrinks them.
pub const MIN_ROW_HEIGHT: u32 = 48;

/// Horizontal inset of rows from the canvas edges.
pub const SIDE_MARGIN: u32 = 40;

pub const ELLIPSIS: char = '…';

/// Below this max length names are cut mid-word.
const WORD_BREAK_MIN_LEN: usize = 8;

pub const DEFAULT_DISCLAIMER: &str = "+18, apostas envolvem risco. Joga com responsabilidade.";

#[derive(Debug, Clone, PartialEq)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    pub fn bottom(&self) -> i32 {
        self.y + self.height as i32
    }
}

/// What to do when rows would end up shorter than [`MIN_ROW_HEIGHT`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OverflowPolicy {
    /// Keep shrinking so everything fits (static image export)
    #[default]
    Shrink,
    /// Floor rows at the minimum and report the overflow (scrollable views)
    Scroll,
}

#[derive(Debug, Clone)]
pub struct LayoutOptions {
    pub canvas_size: u32,
    pub overflow: OverflowPolicy,
    pub disclaimer: String,
}

impl Default for LayoutOptions {
    fn default() -> Self {
        Self {
            canvas_size: CANVAS_SIZE,
            overflow: OverflowPolicy::Shrink,
            disclaimer: DEFAULT_DISCLAIMER.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CanvasSpec {
    pub width: u32,
    pub height: u32,
    pub header_height: u32,
    pub footer_height: u32,
}

impl CanvasSpec {
    pub fn available_height(&self) -> u32 {
        self.height
            .saturating_sub(self.header_height)
            .saturating_sub(self.footer_height)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusGlyph {
    Check,
    Cross,
}

impl StatusGlyph {
    pub fn for_status(status: GameStatus) -> Option<Self> {
        match status {
            GameStatus::Won => Some(StatusGlyph::Check),
            GameStatus::Lost => Some(StatusGlyph::Cross),
            GameStatus::Pending => None,
        }
    }
}

/// Fully resolved row: geometry, sizes and the strings to draw.
///
/// Image fields hold candidate references in priority order; the first one
/// that loads is drawn and none loading simply omits the image.
#[derive(Debug, Clone, PartialEq)]
pub struct RowLayout {
    pub index: usize,
    pub rect: Rect,
    pub tier: usize,
    pub preset: SizePreset,
    pub league_name: String,
    pub league_logo: Vec<String>,
    pub kickoff: Option<String>,
    pub home_name: String,
    pub home_badge: Vec<String>,
    pub away_name: String,
    pub away_badge: Vec<String>,
    pub odds_text: String,
    pub market_text: String,
    pub selection_text: Option<String>,
    pub status: Option<StatusGlyph>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HeaderLayout {
    pub rect: Rect,
    pub title: String,
    pub live: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StakeLine {
    pub stake_text: String,
    pub return_text: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BookmakerLine {
    pub name: String,
    pub logo: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FooterLayout {
    pub rect: Rect,
    pub total_odds_text: String,
    pub stake: Option<StakeLine>,
    pub bookmaker: Option<BookmakerLine>,
    pub disclaimer: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BulletinLayout {
    pub canvas: CanvasSpec,
    pub gap: u32,
    /// Base row height (the first rows may be one unit taller to absorb rounding)
    pub row_height: u32,
    pub tier: usize,
    pub header: HeaderLayout,
    pub rows: Vec<RowLayout>,
    pub footer: FooterLayout,
    /// Height used by rows and gaps together
    pub content_height: u32,
    pub overflow: bool,
}

/// Gap between rows: roomy for a couple of games, tight for long lists.
pub fn gap_for(count: usize) -> u32 {
    match count {
        0..=2 => 16,
        3..=4 => 12,
        5..=6 => 8,
        _ => 4,
    }
}

/// Row heights and gap for `count` rows sharing `available` units.
///
/// With [`OverflowPolicy::Shrink`] the heights plus gaps add up to exactly
/// `available`. With [`OverflowPolicy::Scroll`] rows never go below
/// [`MIN_ROW_HEIGHT`] and may add up to more.
pub fn row_heights(available: u32, count: usize, policy: OverflowPolicy) -> (Vec<u32>, u32) {
    if count == 0 {
        return (Vec::new(), 0);
    }
    let n = count as u32;
    let mut gap = gap_for(count);
    if gap * (n - 1) >= available {
        gap = 0;
    }
    let space = available - gap * (n - 1);
    let base = space / n;

    if policy == OverflowPolicy::Scroll && base < MIN_ROW_HEIGHT {
        return (vec![MIN_ROW_HEIGHT; count], gap);
    }

    let remainder = (space % n) as usize;
    let heights = (0..count)
        .map(|i| if i < remainder { base + 1 } else { base })
        .collect();
    (heights, gap)
}

/// Shorten `name` to at most `max` characters, ending in an ellipsis.
///
/// When `max` is roomy the cut goes back to the last space, as long as at
/// least 60% of `max` survives; otherwise the word is cut.
pub fn truncate_name(name: &str, max: usize) -> String {
    let name = name.trim();
    if name.chars().count() <= max {
        return name.to_string();
    }
    if max <= 1 {
        return if max == 1 { ELLIPSIS.to_string() } else { String::new() };
    }

    let keep: String = name.chars().take(max - 1).collect();
    let mut cut = keep.as_str();
    if max >= WORD_BREAK_MIN_LEN {
        let min_keep = (max * 3 + 4) / 5;
        if let Some((byte_idx, _)) = keep.char_indices().rev().find(|(_, c)| c.is_whitespace()) {
            if keep[..byte_idx].chars().count() >= min_keep {
                cut = &keep[..byte_idx];
            }
        }
    }
    format!("{}{}", cut.trim_end(), ELLIPSIS)
}

fn format_kickoff(at: &DateTime<Utc>) -> String {
    at.format("%d/%m %H:%M").to_string()
}

fn image_candidates(primary: Option<&str>, fallback: String) -> Vec<String> {
    let mut out = Vec::with_capacity(2);
    if let Some(p) = primary.map(str::trim).filter(|p| !p.is_empty()) {
        out.push(p.to_string());
    }
    out.push(fallback);
    out
}

fn layout_row(game: &Game, index: usize, rect: Rect, tier: usize, preset: SizePreset) -> RowLayout {
    let max = preset.max_name_len;
    let league_key = logos::league_logo_key(game.league.id);
    let home_key = logos::team_logo_key(&game.league.name, &game.home_team.name);
    let away_key = logos::team_logo_key(&game.league.name, &game.away_team.name);

    RowLayout {
        index,
        rect,
        tier,
        preset,
        league_name: truncate_name(&game.league.name, max + 8),
        league_logo: image_candidates(game.league.logo.as_deref(), league_key),
        kickoff: game.kickoff.as_ref().map(format_kickoff),
        home_name: truncate_name(&game.home_team.name, max),
        home_badge: image_candidates(game.home_team.badge_ref(), home_key),
        away_name: truncate_name(&game.away_team.name, max),
        away_badge: image_candidates(game.away_team.badge_ref(), away_key),
        odds_text: format!("@{}", format_decimal(game.odds)),
        market_text: truncate_name(game.market.label(), max + 8),
        selection_text: game.selection_text().map(|s| truncate_name(&s, max)),
        status: StatusGlyph::for_status(game.status()),
    }
}

/// Lay out `bulletin` on the theme's canvas.
pub fn layout_bulletin(bulletin: &Bulletin, theme: &Theme, options: &LayoutOptions) -> Result<BulletinLayout> {
    if bulletin.games.is_empty() {
        return Err(Error::RenderError("bulletin has no games to lay out".into()));
    }
    let size = options.canvas_size;
    let canvas = CanvasSpec {
        width: size,
        height: size,
        header_height: theme.header_height,
        footer_height: theme.footer.resolve(size),
    };
    if canvas.header_height + canvas.footer_height >= size {
        return Err(Error::ConfigError(format!(
            "header ({}) and footer ({}) leave no room on a {} canvas",
            canvas.header_height, canvas.footer_height, size
        )));
    }

    let available = canvas.available_height();
    let (heights, gap) = row_heights(available, bulletin.games.len(), options.overflow);
    let row_height = heights.last().copied().unwrap_or(0);
    let tier = PresetTable::tier_for(row_height);
    let preset = *theme.presets.preset(tier);

    let row_width = size.saturating_sub(2 * SIDE_MARGIN);
    let mut y = canvas.header_height;
    let mut rows = Vec::with_capacity(heights.len());
    for (index, (game, height)) in bulletin.games.iter().zip(heights.iter()).enumerate() {
        if index > 0 {
            y += gap;
        }
        let rect = Rect {
            x: SIDE_MARGIN as i32,
            y: y as i32,
            width: row_width,
            height: *height,
        };
        rows.push(layout_row(game, index, rect, tier, preset));
        y += height;
    }
    let content_height = y - canvas.header_height;
    let overflow = content_height > available;
    if overflow {
        log::debug!(
            "bulletin {} overflows by {} units ({} rows)",
            bulletin.id,
            content_height - available,
            rows.len()
        );
    }

    let header = HeaderLayout {
        rect: Rect { x: 0, y: 0, width: size, height: canvas.header_height },
        title: bulletin.kind.title().to_string(),
        live: bulletin.kind.is_live(),
    };

    let footer = FooterLayout {
        rect: Rect {
            x: 0,
            y: (size - canvas.footer_height) as i32,
            width: size,
            height: canvas.footer_height,
        },
        total_odds_text: format!("@{}", format_decimal(bulletin.total_odds)),
        stake: bulletin.stake_block().map(|(stake, ret)| StakeLine {
            stake_text: format!("€{}", stake),
            return_text: format!("€{}", ret),
        }),
        bookmaker: bulletin
            .bookmaker_name
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map(|name| BookmakerLine {
                name: truncate_name(name, 24),
                logo: image_candidates(
                    bulletin.bookmaker_logo_url.as_deref(),
                    format!("/logos/casas/{}.png", name.to_lowercase()),
                ),
            }),
        disclaimer: options.disclaimer.to_uppercase(),
    };

    Ok(BulletinLayout {
        canvas,
        gap,
        row_height,
        tier,
        header,
        rows,
        footer,
        content_height,
        overflow,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::fixtures;
    use crate::model::{BettingType, Bulletin};
    use crate::rendering::theme::ThemeId;

    #[test]
    fn rows_fill_the_canvas_exactly() {
        for id in [ThemeId::Classic, ThemeId::Premium, ThemeId::Minimal] {
            let theme = Theme::builtin(id);
            for n in 1..=10 {
                let b = fixtures::bulletin("b", n);
                let layout = layout_bulletin(&b, &theme, &LayoutOptions::default()).unwrap();
                let rows: u32 = layout.rows.iter().map(|r| r.rect.height).sum();
                let total = rows + layout.gap * (n as u32 - 1) + layout.canvas.header_height + layout.canvas.footer_height;
                assert_eq!(total, CANVAS_SIZE, "theme {} n {}", id, n);
                assert!(!layout.overflow);
                let last = layout.rows.last().unwrap();
                assert_eq!(last.rect.bottom(), layout.footer.rect.y);
            }
        }
    }

    #[test]
    fn presets_never_grow_with_more_games() {
        let theme = Theme::builtin(ThemeId::Classic);
        let mut previous: Option<SizePreset> = None;
        for n in 1..=10 {
            let layout = layout_bulletin(&fixtures::bulletin("b", n), &theme, &LayoutOptions::default()).unwrap();
            let preset = layout.rows[0].preset;
            if let Some(prev) = previous {
                assert!(prev.dominates(&preset), "n={} grew", n);
            }
            previous = Some(preset);
        }
    }

    #[test]
    fn gap_steps_down() {
        assert_eq!(gap_for(1), 16);
        assert_eq!(gap_for(2), 16);
        assert_eq!(gap_for(4), 12);
        assert_eq!(gap_for(6), 8);
        assert_eq!(gap_for(10), 4);
    }

    #[test]
    fn scroll_policy_floors_rows_and_reports_overflow() {
        let (heights, gap) = row_heights(780, 20, OverflowPolicy::Scroll);
        assert!(heights.iter().all(|h| *h == MIN_ROW_HEIGHT));
        assert_eq!(gap, 4);

        let (heights, gap) = row_heights(780, 20, OverflowPolicy::Shrink);
        let sum: u32 = heights.iter().sum::<u32>() + gap * 19;
        assert_eq!(sum, 780);
        assert!(heights.iter().all(|h| *h < MIN_ROW_HEIGHT));
    }

    #[test]
    fn scroll_layout_flags_overflow() {
        let mut b = fixtures::bulletin("b", 10);
        b.games.extend(fixtures::games(10));
        let opts = LayoutOptions { overflow: OverflowPolicy::Scroll, ..Default::default() };
        let layout = layout_bulletin(&b, &Theme::builtin(ThemeId::Classic), &opts).unwrap();
        assert!(layout.overflow);
        assert!(layout.content_height > layout.canvas.available_height());
    }

    #[test]
    fn truncation_without_word_break() {
        let name = "Wolverhampton Wanderers FC Ltd";
        assert_eq!(name.chars().count(), 30);
        let out = truncate_name(name, 10);
        assert_eq!(out, "Wolverham…");
        assert_eq!(out.chars().count(), 10);
    }

    #[test]
    fn truncation_prefers_word_boundary() {
        let name = "Wolves Wanderers Football Club";
        assert_eq!(name.chars().count(), 30);
        assert_eq!(truncate_name(name, 10), "Wolves…");
        // a boundary too close to the start is ignored
        assert_eq!(truncate_name("Real Sociedad de Futbol Madrid", 10), "Real Soci…");
    }

    #[test]
    fn truncation_small_limits_cut_mid_word() {
        assert_eq!(truncate_name("Porto B Sub23", 6), "Porto…");
        assert_eq!(truncate_name("Ab Cdefgh", 5), "Ab C…");
        assert_eq!(truncate_name("Benfica", 7), "Benfica");
        assert_eq!(truncate_name("Benfica", 1), "…");
    }

    #[test]
    fn row_content() {
        let mut games = fixtures::games(2);
        games[0].status = Some(GameStatus::Won);
        games[1].status = Some(GameStatus::Lost);
        games[0].odds = 2.0;
        games[0].home_team.badge = Some("/logos/arsenal.png".into());
        let b = Bulletin::new("b", BettingType::LiveMultiple, games, Some(10.0), fixtures::created_at())
            .with_bookmaker("Betano", None);
        let layout = layout_bulletin(&b, &Theme::builtin(ThemeId::Premium), &LayoutOptions::default()).unwrap();

        assert!(layout.header.live);
        assert_eq!(layout.header.title, "LIVE MÚLTIPLA");
        assert_eq!(layout.rows[0].odds_text, "@2.00");
        assert_eq!(layout.rows[0].status, Some(StatusGlyph::Check));
        assert_eq!(layout.rows[1].status, Some(StatusGlyph::Cross));
        assert_eq!(layout.rows[0].home_badge[0], "/logos/arsenal.png");
        assert_eq!(layout.rows[0].home_badge.len(), 2);
        assert_eq!(layout.rows[0].away_badge.len(), 1);
        let stake = layout.footer.stake.as_ref().unwrap();
        assert_eq!(stake.stake_text, "€10.00");
        let bookmaker = layout.footer.bookmaker.as_ref().unwrap();
        assert_eq!(bookmaker.logo, vec!["/logos/casas/betano.png".to_string()]);
    }

    #[test]
    fn no_stake_no_stake_line() {
        let b = fixtures::bulletin("single", 1);
        let layout = layout_bulletin(&b, &Theme::builtin(ThemeId::Classic), &LayoutOptions::default()).unwrap();
        assert!(layout.footer.stake.is_none());
        assert!(layout.footer.bookmaker.is_none());
        assert_eq!(layout.tier, 0);
    }

    #[test]
    fn empty_bulletin_is_rejected() {
        let b = Bulletin::new("e", BettingType::Multiple, Vec::new(), None, fixtures::created_at());
        assert!(layout_bulletin(&b, &Theme::builtin(ThemeId::Classic), &LayoutOptions::default()).is_err());
    }
}
