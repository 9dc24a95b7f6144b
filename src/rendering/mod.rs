//! Bulletin rendering: layout, paint, rasterize, export
//!
//! [`Renderer`] ties the stages together. Layout is pure and cheap; the
//! rasterizer is the expensive part and is what [`crate::async_api`] moves
//! off the caller's thread.

pub mod export;
pub mod images;
pub mod layout;
pub mod paint;
pub mod raster;
pub mod theme;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use base64::Engine as _;
use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};

use crate::model::Bulletin;
use crate::Result;
use images::{ImageSource, NoImages};
use layout::{BulletinLayout, LayoutOptions};
use theme::{SizePreset, Theme, ThemeId};

/// Encoded output of one render.
#[derive(Debug, Clone)]
pub struct Screenshot {
    pub width: u32,
    pub height: u32,
    pub png_data: Vec<u8>,
}

impl Screenshot {
    /// Hex SHA-256 of the PNG bytes.
    pub fn digest(&self) -> String {
        hex::encode(Sha256::digest(&self.png_data))
    }

    pub fn to_data_url(&self) -> String {
        format!(
            "data:image/png;base64,{}",
            base64::engine::general_purpose::STANDARD.encode(&self.png_data)
        )
    }
}

#[derive(Debug, Clone)]
pub struct RenderOptions {
    /// Force a theme; otherwise picked from the bulletin type.
    pub theme: Option<ThemeId>,
    /// Supersampling factor, 1 or 2.
    pub scale: u32,
    pub layout: LayoutOptions,
    /// Replacement preset table applied to whichever theme is chosen.
    pub presets: Option<Vec<SizePreset>>,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            theme: None,
            scale: 2,
            layout: LayoutOptions::default(),
            presets: None,
        }
    }
}

pub struct Renderer {
    options: RenderOptions,
    images: Arc<dyn ImageSource>,
}

impl Renderer {
    pub fn new(options: RenderOptions, images: Arc<dyn ImageSource>) -> Self {
        Self { options, images }
    }

    /// Renderer that draws no logos or badges.
    pub fn without_images(options: RenderOptions) -> Self {
        Self::new(options, Arc::new(NoImages))
    }

    pub fn options(&self) -> &RenderOptions {
        &self.options
    }

    pub fn set_theme(&mut self, theme: Option<ThemeId>) {
        self.options.theme = theme;
    }

    pub fn theme_for(&self, bulletin: &Bulletin) -> Result<Theme> {
        let id = self.options.theme.unwrap_or_else(|| ThemeId::for_type(bulletin.kind));
        let theme = Theme::builtin(id);
        match &self.options.presets {
            Some(tiers) => theme.with_presets(tiers),
            None => Ok(theme),
        }
    }

    pub fn layout(&self, bulletin: &Bulletin) -> Result<BulletinLayout> {
        let theme = self.theme_for(bulletin)?;
        layout::layout_bulletin(bulletin, &theme, &self.options.layout)
    }

    pub fn render(&self, bulletin: &Bulletin) -> Result<Screenshot> {
        let theme = self.theme_for(bulletin)?;
        let laid_out = layout::layout_bulletin(bulletin, &theme, &self.options.layout)?;
        let commands = paint::paint_layout(&laid_out, &theme.palette);
        log::debug!(
            "rendering bulletin {} ({} rows, tier {}, theme {}, scale {})",
            bulletin.id,
            laid_out.rows.len(),
            laid_out.tier,
            theme.id,
            self.options.scale
        );
        raster::rasterize(&commands, self.options.layout.canvas_size, self.options.scale, self.images.as_ref())
    }

    /// Render and write `boletim-<type>-<millis>.png` into `dir`.
    pub fn export(&self, bulletin: &Bulletin, dir: &Path) -> Result<PathBuf> {
        self.export_at(bulletin, dir, Utc::now())
    }

    pub fn export_at(&self, bulletin: &Bulletin, dir: &Path, at: DateTime<Utc>) -> Result<PathBuf> {
        let path = dir.join(export::export_filename(bulletin.kind, at));
        let result = self
            .render(bulletin)
            .and_then(|shot| export::write_atomic(&path, &shot.png_data));
        match result {
            Ok(()) => {
                log::info!("exported bulletin {} to {}", bulletin.id, path.display());
                Ok(path)
            }
            Err(e) => {
                log::error!("export of bulletin {} failed: {}", bulletin.id, e);
                Err(e)
            }
        }
    }
}
