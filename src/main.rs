//! `boletim` command line
//!
//! Creates, lists and renders betting bulletins stored in the data directory.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use serde::Deserialize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use boletim::logos::LogoCache;
use boletim::model::{BetMarket, BettingType, Bulletin, Game, GameStatus, Team};
use boletim::rendering::images::{AssetLoader, ImageSource};
use boletim::rendering::theme::ThemeId;
use boletim::sports::{self, StaticDirectory, TeamDirectory};
use boletim::store::{BulletinStore, FileStorage, HISTORY_PAGE_SIZE};
use boletim::wizard::Wizard;
use boletim::{BoletimConfig, Exporter};

#[derive(Parser, Debug)]
#[command(name = "boletim")]
#[command(about = "Build and render betting bulletins as 1080x1080 PNGs")]
struct Args {
    /// Path to a JSON config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the data directory
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Override the local asset directory
    #[arg(long)]
    asset_dir: Option<PathBuf>,

    /// Never touch the network
    #[arg(long)]
    offline: bool,

    /// Log level (debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create a bulletin from a JSON list of games
    New {
        #[arg(long = "type", value_name = "TYPE")]
        kind: BettingType,
        /// JSON file: [{"league": "...", "home": "...", "away": "...", "odds": 1.8}, ...]
        #[arg(long)]
        games: PathBuf,
        #[arg(long)]
        stake: Option<f64>,
        #[arg(long)]
        bookmaker: Option<String>,
        #[arg(long)]
        bookmaker_logo: Option<String>,
    },
    /// Show the history, newest first
    List {
        #[arg(long, default_value = "1")]
        page: usize,
    },
    /// Print one bulletin as JSON
    Show { id: String },
    Delete { id: String },
    /// Settle one game
    Status {
        bulletin: String,
        game: String,
        status: GameStatus,
    },
    /// Export a bulletin as PNG
    Render {
        id: String,
        #[arg(long)]
        out: Option<PathBuf>,
        #[arg(long)]
        theme: Option<ThemeId>,
        #[arg(long)]
        scale: Option<u32>,
    },
    /// List teams of a league
    Teams {
        league: String,
        #[arg(long)]
        query: Option<String>,
    },
    /// Download league and team badges into the logo cache
    PrefetchLogos {
        /// Run even if a previous prefetch completed
        #[arg(long)]
        force: bool,
    },
}

/// One game as written in the `--games` file.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GameInput {
    #[serde(default)]
    league: Option<String>,
    home: String,
    away: String,
    #[serde(default)]
    market: BetMarket,
    odds: f64,
    #[serde(default)]
    kickoff: Option<DateTime<Utc>>,
    #[serde(default)]
    selection: Option<String>,
    #[serde(default)]
    home_badge: Option<String>,
    #[serde(default)]
    away_badge: Option<String>,
}

fn directory(config: &BoletimConfig) -> anyhow::Result<Box<dyn TeamDirectory>> {
    if config.offline {
        return Ok(Box::new(StaticDirectory));
    }
    #[cfg(feature = "net")]
    {
        let client = sports::SportsDbClient::new(config.client_config())?;
        Ok(Box::new(sports::FallbackDirectory::new(client)))
    }
    #[cfg(not(feature = "net"))]
    {
        Ok(Box::new(StaticDirectory))
    }
}

/// Fill a missing badge from the directory's team list.
fn resolve_team(name: &str, badge: Option<String>, known: &[Team]) -> Team {
    let hit = known.iter().find(|t| t.name.eq_ignore_ascii_case(name.trim()));
    Team {
        id: hit.map(|t| t.id).unwrap_or(0),
        name: name.trim().to_string(),
        badge: badge.or_else(|| hit.and_then(|t| t.badge.clone())),
        league: hit.map(|t| t.league.clone()).unwrap_or_default(),
    }
}

fn build_games(inputs: Vec<GameInput>, teams: &dyn TeamDirectory) -> anyhow::Result<Vec<Game>> {
    let mut games = Vec::with_capacity(inputs.len());
    for (i, input) in inputs.into_iter().enumerate() {
        let league = match input.league.as_deref() {
            Some(name) => {
                sports::find_league(name).with_context(|| format!("game {}: unknown league '{}'", i + 1, name))?
            }
            None => sports::default_league(),
        };
        let known = teams.teams_by_league(&league.str_league);
        games.push(Game {
            id: format!("game-{}", i + 1),
            home_team: resolve_team(&input.home, input.home_badge, &known),
            away_team: resolve_team(&input.away, input.away_badge, &known),
            league,
            market: input.market,
            odds: input.odds,
            kickoff: input.kickoff,
            selection: input.selection,
            status: None,
        });
    }
    Ok(games)
}

fn image_source(config: &BoletimConfig) -> anyhow::Result<Arc<dyn ImageSource>> {
    let cache = LogoCache::new(FileStorage::new(config.data_dir.join("logos")));
    let loader = AssetLoader::new(&config.asset_dir).with_cache(Arc::new(cache));
    #[cfg(feature = "net")]
    let loader = if config.offline {
        loader
    } else {
        loader.with_remote(config.timeout_ms, &config.user_agent)?
    };
    Ok(Arc::new(loader))
}

fn run(args: Args) -> anyhow::Result<()> {
    let mut config = match &args.config {
        Some(path) => BoletimConfig::from_json_file(path)?,
        None => BoletimConfig::default(),
    };
    if let Some(dir) = args.data_dir {
        config.data_dir = dir;
    }
    if let Some(dir) = args.asset_dir {
        config.asset_dir = dir;
    }
    config.offline |= args.offline;

    let store = BulletinStore::new(FileStorage::new(&config.data_dir));

    match args.command {
        Command::New { kind, games, stake, bookmaker, bookmaker_logo } => {
            let text = std::fs::read_to_string(&games).with_context(|| format!("reading {}", games.display()))?;
            let inputs: Vec<GameInput> =
                serde_json::from_str(&text).with_context(|| format!("parsing {}", games.display()))?;
            let teams = directory(&config)?;
            let games = build_games(inputs, teams.as_ref())?;
            let now = Utc::now();
            let (bulletin, warnings) = Wizard::build(
                kind,
                games,
                stake,
                bookmaker.map(|name| (name, bookmaker_logo)),
                now.timestamp_millis().to_string(),
                now,
            )?;
            for w in &warnings {
                log::warn!("{}", w);
            }
            store.save(&bulletin)?;
            println!("{}", bulletin.id);
        }
        Command::List { page } => {
            let page = store.page(page, HISTORY_PAGE_SIZE);
            for b in &page.items {
                println!(
                    "{}  {:<13}  {}  {:>2} game(s)  @{}  {}",
                    b.id,
                    b.kind.as_str(),
                    b.created_at.format("%Y-%m-%d %H:%M"),
                    b.games.len(),
                    boletim::model::format_decimal(b.total_odds),
                    b.status.label()
                );
            }
            println!("page {}/{} ({} bulletins)", page.page, page.total_pages, page.total);
        }
        Command::Show { id } => {
            let bulletin = store.get(&id).with_context(|| format!("no bulletin {}", id))?;
            println!("{}", serde_json::to_string_pretty(&bulletin)?);
        }
        Command::Delete { id } => store.delete(&id)?,
        Command::Status { bulletin, game, status } => {
            match store.update_game_status(&bulletin, &game, status)? {
                Some(b) => println!("{} is now {}", b.id, b.status.label()),
                None => bail!("no game {} in bulletin {}", game, bulletin),
            }
        }
        Command::Render { id, out, theme, scale } => {
            let bulletin = store.get(&id).with_context(|| format!("no bulletin {}", id))?;
            if let Some(scale) = scale {
                config.scale = scale;
            }
            if theme.is_some() {
                config.theme = theme;
            }
            config.validate()?;
            let out = out.unwrap_or_else(|| config.output_dir.clone());
            let images = image_source(&config)?;
            let options = config.render_options();

            let rt = tokio::runtime::Runtime::new()?;
            let path = rt.block_on(export(options, images, bulletin, out))?;
            println!("{}", path.display());
        }
        Command::Teams { league, query } => {
            let league = sports::find_league(&league).with_context(|| format!("unknown league '{}'", league))?;
            let teams = directory(&config)?.teams_by_league(&league.str_league);
            for team in sports::search_teams(&teams, query.as_deref().unwrap_or("")) {
                println!("{:>8}  {}", team.id, team.name);
            }
        }
        Command::PrefetchLogos { force } => prefetch(&config, force)?,
    }
    Ok(())
}

/// Export on the worker thread; blocking HTTP for remote badges stays off the runtime.
async fn export(
    options: boletim::RenderOptions,
    images: Arc<dyn ImageSource>,
    bulletin: Bulletin,
    out: PathBuf,
) -> boletim::Result<PathBuf> {
    let exporter = Exporter::new(options, images).await?;
    let path = exporter.export(&bulletin, out).await;
    exporter.close().await?;
    path
}

#[cfg(feature = "net")]
fn prefetch(config: &BoletimConfig, force: bool) -> anyhow::Result<()> {
    if config.offline {
        bail!("prefetch-logos needs network access");
    }
    let client = sports::SportsDbClient::new(config.client_config())?;
    let cache = LogoCache::new(FileStorage::new(config.data_dir.join("logos")));
    let report = cache.prefetch(&client, force);
    if report.skipped {
        println!("logos already downloaded (use --force to refresh)");
    } else {
        println!("{} league logos, {} team logos", report.league_logos, report.team_logos);
    }
    Ok(())
}

#[cfg(not(feature = "net"))]
fn prefetch(_config: &BoletimConfig, _force: bool) -> anyhow::Result<()> {
    bail!("built without the `net` feature")
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    run(args)
}
