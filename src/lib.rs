//! Boletim: betting bulletin builder and renderer
//!
//! Builds football betting slips ("boletins") through a small wizard, keeps
//! a local history of them, and renders each one as a square 1080×1080 PNG
//! ready for social media.
//!
//! # Features
//!
//! - **Layout engine**: row heights, gaps and size presets computed so any
//!   number of games fits the canvas exactly
//! - **Software rasterizer**: PNG output with no browser or system fonts
//! - **Team lookup** (`net`, default): TheSportsDB with a local rate limiter
//!   and static fallback tables
//!
//! # Example
//!
//! ```no_run
//! use boletim::model::{BettingType, Bulletin};
//! use boletim::rendering::{RenderOptions, Renderer};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let bulletin: Bulletin = serde_json::from_str(&std::fs::read_to_string("bulletin.json")?)?;
//! let renderer = Renderer::without_images(RenderOptions::default());
//! let shot = renderer.render(&bulletin)?;
//! std::fs::write("boletim.png", &shot.png_data)?;
//! # Ok(())
//! # }
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

pub mod error;
pub use error::{Error, Result};

pub mod model;

// Layout, paint, raster and file export
pub mod rendering;

pub mod logos;
pub mod sports;
pub mod store;
pub mod wizard;

// Worker-thread export facade for async callers
pub mod async_api;

pub use async_api::Exporter;
pub use model::{BettingType, Bulletin, Game};
pub use rendering::{RenderOptions, Renderer, Screenshot};

use rendering::layout::{LayoutOptions, OverflowPolicy, CANVAS_SIZE, DEFAULT_DISCLAIMER};
use rendering::theme::{PresetTable, SizePreset, ThemeId};
use sports::RateLimitConfig;

/// Application configuration
///
/// Every field has a conservative default, so a config file only needs the
/// keys it wants to change:
///
/// ```
/// let cfg: boletim::BoletimConfig = serde_json::from_str(r#"{"scale": 1}"#).unwrap();
/// assert_eq!(cfg.scale, 1);
/// assert_eq!(cfg.canvas_size, 1080);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoletimConfig {
    /// Directory holding the bulletin history and the logo cache
    pub data_dir: PathBuf,
    /// Local logos and badges (`logos/...` paths resolve here)
    pub asset_dir: PathBuf,
    /// Where exported PNGs are written
    pub output_dir: PathBuf,
    /// Force a theme instead of picking one per bulletin type
    pub theme: Option<ThemeId>,
    /// Supersampling factor (1 or 2)
    pub scale: u32,
    pub canvas_size: u32,
    pub overflow: OverflowPolicy,
    pub disclaimer: String,
    /// Replacement preset table (7 tiers, largest first)
    pub presets: Option<Vec<SizePreset>>,
    /// Skip the sports API and remote images entirely
    pub offline: bool,
    pub sports_api_base: String,
    /// Timeout for HTTP requests in milliseconds
    pub timeout_ms: u64,
    pub user_agent: String,
    pub rate_limit: RateLimitConfig,
}

impl Default for BoletimConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            asset_dir: PathBuf::from("public"),
            output_dir: PathBuf::from("."),
            theme: None,
            scale: 2,
            canvas_size: CANVAS_SIZE,
            overflow: OverflowPolicy::Shrink,
            disclaimer: DEFAULT_DISCLAIMER.to_string(),
            presets: None,
            offline: false,
            sports_api_base: sports::SPORTS_DB_BASE_URL.to_string(),
            timeout_ms: 10_000,
            user_agent: concat!("boletim/", env!("CARGO_PKG_VERSION")).to_string(),
            rate_limit: RateLimitConfig::default(),
        }
    }
}

impl BoletimConfig {
    /// Load a JSON config file; missing keys take their defaults.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| Error::ConfigError(format!("reading {}: {}", path.display(), e)))?;
        let config: Self = serde_json::from_str(&text)
            .map_err(|e| Error::ConfigError(format!("parsing {}: {}", path.display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !rendering::raster::SUPPORTED_SCALES.contains(&self.scale) {
            return Err(Error::ConfigError(format!("scale must be 1 or 2, got {}", self.scale)));
        }
        if self.canvas_size == 0 {
            return Err(Error::ConfigError("canvas_size must be positive".into()));
        }
        if rendering::raster::device_size(self.canvas_size, self.scale).is_none() {
            return Err(Error::ConfigError(format!(
                "canvas_size {} at scale {} exceeds {}px",
                self.canvas_size,
                self.scale,
                rendering::raster::MAX_DEVICE_SIZE
            )));
        }
        if let Some(tiers) = &self.presets {
            PresetTable::new(tiers)?;
        }
        Ok(())
    }

    pub fn render_options(&self) -> RenderOptions {
        RenderOptions {
            theme: self.theme,
            scale: self.scale,
            layout: LayoutOptions {
                canvas_size: self.canvas_size,
                overflow: self.overflow,
                disclaimer: self.disclaimer.clone(),
            },
            presets: self.presets.clone(),
        }
    }

    #[cfg(feature = "net")]
    pub fn client_config(&self) -> sports::client::ClientConfig {
        sports::client::ClientConfig {
            base_url: self.sports_api_base.clone(),
            timeout_ms: self.timeout_ms,
            user_agent: self.user_agent.clone(),
            rate_limit: self.rate_limit,
        }
    }
}
