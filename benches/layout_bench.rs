use criterion::{black_box, criterion_group, criterion_main, Criterion};

use boletim::model::{BettingType, Bulletin, Game, Team};
use boletim::rendering::layout::{layout_bulletin, LayoutOptions};
use boletim::rendering::theme::{Theme, ThemeId};
use boletim::rendering::{RenderOptions, Renderer};
use chrono::TimeZone;

// Run with:
//    cargo bench --bench layout_bench

fn bulletin(n: usize) -> Bulletin {
    let games = (1..=n)
        .map(|i| Game {
            id: format!("game-{}", i),
            league: boletim::sports::default_league(),
            home_team: Team::named(57, "Arsenal"),
            away_team: Team::named(61, "Chelsea"),
            market: Default::default(),
            odds: 1.5 + i as f64 / 10.0,
            kickoff: None,
            selection: None,
            status: None,
        })
        .collect();
    let at = chrono::Utc.with_ymd_and_hms(2024, 5, 1, 18, 30, 0).unwrap();
    Bulletin::new("bench", BettingType::Multiple, games, Some(10.0), at)
}

fn bench_layout(c: &mut Criterion) {
    let theme = Theme::builtin(ThemeId::Premium);
    let options = LayoutOptions::default();
    let b = bulletin(10);
    c.bench_function("layout_bulletin_10_games", |bench| {
        bench.iter(|| layout_bulletin(black_box(&b), &theme, &options).unwrap())
    });
}

fn bench_render(c: &mut Criterion) {
    let renderer = Renderer::without_images(RenderOptions { scale: 1, ..RenderOptions::default() });
    let b = bulletin(5);
    let mut group = c.benchmark_group("render");
    group.sample_size(10);
    group.bench_function("render_5_games_scale_1", |bench| {
        bench.iter(|| renderer.render(black_box(&b)).unwrap())
    });
    group.finish();
}

criterion_group!(benches, bench_layout, bench_render);
criterion_main!(benches);
