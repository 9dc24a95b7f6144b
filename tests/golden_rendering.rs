use std::fs;
use std::path::PathBuf;

use boletim::model::{BetMarket, BettingType, Bulletin, Game, GameStatus, League, Team};
use boletim::rendering::images::decode_png;
use boletim::rendering::{RenderOptions, Renderer};
use chrono::TimeZone;

fn golden_path(name: &str) -> PathBuf {
    let mut p = PathBuf::from("tests/goldens/expected");
    p.push(name);
    p
}

fn fixture() -> Bulletin {
    let league = League {
        id: 4328,
        name: "Premier League".into(),
        str_league: "English Premier League".into(),
        logo: None,
        country: "England".into(),
    };
    let pairs = [("Arsenal", "Chelsea", 2.0), ("Liverpool", "Manchester City", 1.5), ("Brighton & Hove Albion", "Wolverhampton Wanderers", 1.8)];
    let games = pairs
        .iter()
        .enumerate()
        .map(|(i, (h, a, odds))| Game {
            id: format!("game-{}", i + 1),
            league: league.clone(),
            home_team: Team::named(i as u64 * 2 + 1, *h),
            away_team: Team::named(i as u64 * 2 + 2, *a),
            market: if i == 1 { BetMarket::Over25 } else { BetMarket::OneXTwo },
            odds: *odds,
            kickoff: None,
            selection: (i == 0).then(|| "home".to_string()),
            status: (i == 0).then_some(GameStatus::Won),
        })
        .collect();
    let created = chrono::Utc.with_ymd_and_hms(2024, 5, 1, 18, 30, 0).unwrap();
    Bulletin::new("golden-1", BettingType::Multiple, games, Some(10.0), created).with_bookmaker("Betano", None)
}

#[test]
fn golden_bulletin_matches_digest() {
    let renderer = Renderer::without_images(RenderOptions::default());
    let screenshot = renderer.render(&fixture()).expect("render");

    let expected_path = golden_path("multiple_3.sha256");
    if std::env::var("UPDATE_GOLDENS").is_ok() {
        fs::create_dir_all("tests/goldens/expected").ok();
        fs::write(&expected_path, screenshot.digest()).expect("write golden");
        println!("Updated golden: {:?}", expected_path);
        return;
    }

    if expected_path.exists() {
        let exp = fs::read_to_string(&expected_path).expect("unable to read golden");
        assert_eq!(screenshot.digest(), exp.trim(), "PNG output does not match golden");
        return;
    }

    // No golden yet: check the image has header and text pixels at least.
    println!("No golden at {:?}; run with UPDATE_GOLDENS=1 to create it.", expected_path);
    let bmp = decode_png(&screenshot.png_data).expect("decode");
    assert_eq!((bmp.width, bmp.height), (1080, 1080));
    let opaque = bmp.rgba.chunks(4).filter(|p| p[3] == 255).count();
    assert_eq!(opaque, 1080 * 1080, "background gradient covers the canvas");
    let distinct: std::collections::HashSet<[u8; 4]> =
        bmp.rgba.chunks(4).map(|p| [p[0], p[1], p[2], p[3]]).collect();
    assert!(distinct.len() > 8, "expected text, rows and bands to differ in colour");
}

#[test]
fn golden_render_is_reproducible() {
    let renderer = Renderer::without_images(RenderOptions { scale: 1, ..RenderOptions::default() });
    let a = renderer.render(&fixture()).unwrap();
    let b = renderer.render(&fixture()).unwrap();
    assert_eq!(a.png_data, b.png_data);
}
