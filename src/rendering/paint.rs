//! Paint command list produced from a resolved layout

use crate::rendering::layout::{BulletinLayout, FooterLayout, HeaderLayout, RowLayout, StatusGlyph};
use crate::rendering::theme::{Palette, Rgba};

#[derive(Debug, Clone, PartialEq)]
pub enum PaintCommand {
    SolidRect {
        x: i32,
        y: i32,
        width: u32,
        height: u32,
        rgba: Rgba,
    },
    VerticalGradient {
        x: i32,
        y: i32,
        width: u32,
        height: u32,
        top: Rgba,
        bottom: Rgba,
    },
    RectOutline {
        x: i32,
        y: i32,
        width: u32,
        height: u32,
        thickness: u32,
        rgba: Rgba,
    },
    Text {
        x: i32,
        y: i32,
        size: u32,
        text: String,
        rgba: Rgba,
    },
    /// First loadable source wins; if none loads nothing is drawn.
    Image {
        sources: Vec<String>,
        x: i32,
        y: i32,
        width: u32,
        height: u32,
    },
    Glyph {
        glyph: StatusGlyph,
        x: i32,
        y: i32,
        size: u32,
        rgba: Rgba,
    },
    Dot {
        cx: i32,
        cy: i32,
        radius: u32,
        rgba: Rgba,
    },
}

/// Horizontal advance of one character at `size` (glyphs are drawn condensed).
pub fn char_advance(size: u32) -> u32 {
    (size * 5 / 8).max(1)
}

pub fn text_width(text: &str, size: u32) -> u32 {
    text.chars().count() as u32 * char_advance(size)
}

fn centered(offset: i32, outer: u32, inner: u32) -> i32 {
    offset + (outer.saturating_sub(inner) / 2) as i32
}

fn text(x: i32, y: i32, size: u32, s: impl Into<String>, rgba: Rgba) -> PaintCommand {
    PaintCommand::Text { x, y, size, text: s.into(), rgba }
}

/// Turn a layout into draw calls, back to front.
pub fn paint_layout(layout: &BulletinLayout, palette: &Palette) -> Vec<PaintCommand> {
    let mut cmds = vec![PaintCommand::VerticalGradient {
        x: 0,
        y: 0,
        width: layout.canvas.width,
        height: layout.canvas.height,
        top: palette.background_top,
        bottom: palette.background_bottom,
    }];
    for row in &layout.rows {
        paint_row(&mut cmds, row, palette);
    }
    // bands go last so overflowing rows are covered
    paint_header(&mut cmds, &layout.header, palette);
    paint_footer(&mut cmds, &layout.footer, palette);
    cmds
}

fn paint_header(cmds: &mut Vec<PaintCommand>, header: &HeaderLayout, palette: &Palette) {
    let r = &header.rect;
    cmds.push(PaintCommand::VerticalGradient {
        x: r.x,
        y: r.y,
        width: r.width,
        height: r.height,
        top: palette.background_top,
        bottom: palette.background_top,
    });
    cmds.push(PaintCommand::SolidRect { x: r.x, y: r.y, width: r.width, height: r.height, rgba: palette.band });

    let title_size = 48;
    let live_size = 20;
    let block = if header.live { title_size + 12 + live_size } else { title_size };
    let top = centered(r.y, r.height, block);
    let width = text_width(&header.title, title_size);
    cmds.push(text(centered(r.x, r.width, width), top, title_size, header.title.clone(), palette.accent));

    if header.live {
        let label = "AO VIVO";
        let label_w = text_width(label, live_size);
        let dot = live_size / 2;
        let total = dot * 2 + 8 + label_w;
        let x = centered(r.x, r.width, total);
        let y = top + (title_size + 12) as i32;
        cmds.push(PaintCommand::Dot {
            cx: x + dot as i32,
            cy: y + (live_size / 2) as i32,
            radius: dot,
            rgba: palette.live,
        });
        cmds.push(text(x + (dot * 2 + 8) as i32, y, live_size, label, palette.live));
    }
}

fn paint_row(cmds: &mut Vec<PaintCommand>, row: &RowLayout, palette: &Palette) {
    let r = &row.rect;
    let p = &row.preset;
    cmds.push(PaintCommand::SolidRect { x: r.x, y: r.y, width: r.width, height: r.height, rgba: palette.row_fill });
    cmds.push(PaintCommand::RectOutline {
        x: r.x,
        y: r.y,
        width: r.width,
        height: r.height,
        thickness: 2,
        rgba: palette.row_border,
    });

    let left = r.x + p.padding as i32;
    let right = r.x + r.width as i32 - p.padding as i32;
    let inner_w = r.width.saturating_sub(2 * p.padding);
    let strip_h = p.league_font.max(p.league_logo);
    let teams_h = p.team_font.max(p.team_logo);
    let market_h = p.market_font;
    let spare = r.height.saturating_sub(2 * p.padding + strip_h + teams_h + market_h);
    let spacing = (spare / 2) as i32;

    // league strip
    let y1 = r.y + p.padding as i32;
    cmds.push(PaintCommand::SolidRect { x: left, y: y1, width: inner_w, height: strip_h, rgba: palette.strip });
    let mut x = left + 6;
    cmds.push(PaintCommand::Image {
        sources: row.league_logo.clone(),
        x,
        y: centered(y1, strip_h, p.league_logo),
        width: p.league_logo,
        height: p.league_logo,
    });
    x += p.league_logo as i32 + 8;
    cmds.push(text(x, centered(y1, strip_h, p.league_font), p.league_font, row.league_name.clone(), palette.text));

    let mut rx = right - 6;
    if let Some(glyph) = row.status {
        let color = match glyph {
            StatusGlyph::Check => palette.won,
            StatusGlyph::Cross => palette.lost,
        };
        rx -= p.odds_font as i32;
        cmds.push(PaintCommand::Glyph { glyph, x: rx, y: centered(y1, strip_h, p.odds_font), size: p.odds_font, rgba: color });
        rx -= 8;
    }
    rx -= text_width(&row.odds_text, p.odds_font) as i32;
    cmds.push(text(rx, centered(y1, strip_h, p.odds_font), p.odds_font, row.odds_text.clone(), palette.accent));
    if let Some(kickoff) = &row.kickoff {
        rx -= 12 + text_width(kickoff, p.league_font) as i32;
        cmds.push(text(rx, centered(y1, strip_h, p.league_font), p.league_font, kickoff.clone(), palette.muted));
    }

    // teams
    let y2 = y1 + strip_h as i32 + spacing;
    let badge_y = centered(y2, teams_h, p.team_logo);
    let name_y = centered(y2, teams_h, p.team_font);
    let mut x = left;
    cmds.push(PaintCommand::Image { sources: row.home_badge.clone(), x, y: badge_y, width: p.team_logo, height: p.team_logo });
    x += p.team_logo as i32 + 8;
    cmds.push(text(x, name_y, p.team_font, row.home_name.clone(), palette.text));
    x += text_width(&row.home_name, p.team_font) as i32 + 16;
    cmds.push(text(x, name_y, p.team_font, "vs", palette.muted));
    x += text_width("vs", p.team_font) as i32 + 16;
    cmds.push(PaintCommand::Image { sources: row.away_badge.clone(), x, y: badge_y, width: p.team_logo, height: p.team_logo });
    x += p.team_logo as i32 + 8;
    cmds.push(text(x, name_y, p.team_font, row.away_name.clone(), palette.text));

    // market
    let y3 = y2 + teams_h as i32 + spacing;
    cmds.push(text(left, y3, p.market_font, row.market_text.clone(), palette.muted));
    if let Some(sel) = &row.selection_text {
        let sep = " · ";
        let x = left + text_width(&row.market_text, p.market_font) as i32;
        cmds.push(text(x, y3, p.market_font, sep, palette.muted));
        let x = x + text_width(sep, p.market_font) as i32;
        cmds.push(text(x, y3, p.market_font, sel.clone(), palette.text));
    }
}

fn paint_footer(cmds: &mut Vec<PaintCommand>, footer: &FooterLayout, palette: &Palette) {
    let r = &footer.rect;
    cmds.push(PaintCommand::VerticalGradient {
        x: r.x,
        y: r.y,
        width: r.width,
        height: r.height,
        top: palette.background_bottom,
        bottom: palette.background_bottom,
    });
    cmds.push(PaintCommand::SolidRect { x: r.x, y: r.y, width: r.width, height: r.height, rgba: palette.band });

    let label_size = 22;
    let value_size = 30;
    let bookmaker_size = 18;
    let disclaimer_size = 12;
    let mut block = value_size + 10 + disclaimer_size;
    if footer.bookmaker.is_some() {
        block += bookmaker_size + 10;
    }
    let mut y = centered(r.y, r.height, block);

    // totals line: label/value pairs centred as one run
    let mut parts: Vec<(String, u32, Rgba)> = vec![
        ("Odd Total: ".to_string(), label_size, palette.muted),
        (footer.total_odds_text.clone(), value_size, palette.accent),
    ];
    if let Some(stake) = &footer.stake {
        parts.push((format!("   {} → ", stake.stake_text), label_size, palette.muted));
        parts.push((stake.return_text.clone(), value_size, palette.won));
    }
    let run_w: u32 = parts.iter().map(|(s, size, _)| text_width(s, *size)).sum();
    let mut x = centered(r.x, r.width, run_w);
    for (s, size, rgba) in parts {
        let w = text_width(&s, size) as i32;
        cmds.push(text(x, centered(y, value_size, size), size, s, rgba));
        x += w;
    }
    y += (value_size + 10) as i32;

    if let Some(bookmaker) = &footer.bookmaker {
        let label = "Odds by ";
        let logo = bookmaker_size + 6;
        let run_w = text_width(label, bookmaker_size) + logo + 6 + text_width(&bookmaker.name, bookmaker_size);
        let mut x = centered(r.x, r.width, run_w);
        cmds.push(text(x, y, bookmaker_size, label, palette.muted));
        x += text_width(label, bookmaker_size) as i32;
        cmds.push(PaintCommand::Image {
            sources: bookmaker.logo.clone(),
            x,
            y: y - 3,
            width: logo,
            height: logo,
        });
        x += (logo + 6) as i32;
        cmds.push(text(x, y, bookmaker_size, bookmaker.name.clone(), palette.text));
        y += (bookmaker_size + 10) as i32;
    }

    let w = text_width(&footer.disclaimer, disclaimer_size);
    cmds.push(text(centered(r.x, r.width, w), y, disclaimer_size, footer.disclaimer.clone(), palette.muted));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::fixtures;
    use crate::rendering::layout::{layout_bulletin, LayoutOptions};
    use crate::rendering::theme::{Theme, ThemeId};

    fn texts(cmds: &[PaintCommand]) -> Vec<&str> {
        cmds.iter()
            .filter_map(|c| match c {
                PaintCommand::Text { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn paints_rows_and_totals() {
        let theme = Theme::builtin(ThemeId::Classic);
        let b = fixtures::bulletin("b", 3);
        let layout = layout_bulletin(&b, &theme, &LayoutOptions::default()).unwrap();
        let cmds = paint_layout(&layout, &theme.palette);
        let t = texts(&cmds);
        assert!(t.contains(&"APOSTA MÚLTIPLA"));
        assert_eq!(t.iter().filter(|s| **s == "Arsenal").count(), 3);
        assert!(t.contains(&"@1.60"));
        assert!(t.iter().any(|s| s.contains("€10.00")));
        assert!(t.contains(&"€48.96"));
        assert!(matches!(cmds[0], PaintCommand::VerticalGradient { .. }));
    }

    #[test]
    fn status_glyphs_only_for_settled_games() {
        let theme = Theme::builtin(ThemeId::Classic);
        let mut b = fixtures::bulletin("b", 2);
        b.set_game_status("game-1", crate::model::GameStatus::Won);
        let layout = layout_bulletin(&b, &theme, &LayoutOptions::default()).unwrap();
        let cmds = paint_layout(&layout, &theme.palette);
        let glyphs = cmds.iter().filter(|c| matches!(c, PaintCommand::Glyph { .. })).count();
        assert_eq!(glyphs, 1);
    }

    #[test]
    fn text_width_is_per_char() {
        assert_eq!(char_advance(32), 20);
        assert_eq!(text_width("abc", 32), 60);
        assert_eq!(text_width("€→", 16), 20);
    }
}
