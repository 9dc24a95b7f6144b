//! Image sources for logos and badges
//!
//! Layout hands the painter a list of candidate references per image (the
//! provider URL first, then the local asset key). An [`ImageSource`] resolves
//! a single reference to pixels; the rasterizer asks for the first candidate
//! that loads. [`AssetLoader`] answers from its cache for any candidate
//! before touching files or the network. A reference that cannot be loaded
//! is not an error: the slot is simply left empty.

use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use base64::Engine as _;

use crate::{Error, Result};

/// Decoded RGBA8 pixels.
#[derive(Debug, Clone, PartialEq)]
pub struct Bitmap {
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

impl Bitmap {
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        let i = ((y * self.width + x) * 4) as usize;
        [self.rgba[i], self.rgba[i + 1], self.rgba[i + 2], self.rgba[i + 3]]
    }
}

/// Decode PNG bytes into an RGBA8 bitmap regardless of the source colour type.
pub fn decode_png(bytes: &[u8]) -> Result<Bitmap> {
    let mut decoder = png::Decoder::new(Cursor::new(bytes));
    decoder.set_transformations(png::Transformations::EXPAND | png::Transformations::STRIP_16);
    let mut reader = decoder
        .read_info()
        .map_err(|e| Error::RenderError(format!("PNG decode failed: {}", e)))?;
    let mut buf = vec![0; reader.output_buffer_size()];
    let info = reader
        .next_frame(&mut buf)
        .map_err(|e| Error::RenderError(format!("PNG decode failed: {}", e)))?;
    let data = &buf[..info.buffer_size()];
    let pixels = (info.width * info.height) as usize;

    let rgba = match info.color_type {
        png::ColorType::Rgba => data.to_vec(),
        png::ColorType::Rgb => data.chunks_exact(3).flat_map(|p| [p[0], p[1], p[2], 255]).collect(),
        png::ColorType::GrayscaleAlpha => data.chunks_exact(2).flat_map(|p| [p[0], p[0], p[0], p[1]]).collect(),
        png::ColorType::Grayscale => data.iter().flat_map(|&g| [g, g, g, 255]).collect(),
        png::ColorType::Indexed => {
            return Err(Error::RenderError("indexed PNG was not expanded".into()));
        }
    };
    if rgba.len() != pixels * 4 {
        return Err(Error::RenderError(format!(
            "PNG decode produced {} bytes for {}x{}",
            rgba.len(),
            info.width,
            info.height
        )));
    }
    Ok(Bitmap { width: info.width, height: info.height, rgba })
}

/// Decode a `data:image/png;base64,...` URL.
pub fn decode_data_url(reference: &str) -> Result<Bitmap> {
    let (_, payload) = reference
        .split_once(";base64,")
        .ok_or_else(|| Error::RenderError("only base64 data URLs are supported".into()))?;
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(payload.trim())
        .map_err(|e| Error::RenderError(format!("invalid base64 image: {}", e)))?;
    decode_png(&bytes)
}

/// Build a data URL, sniffing the media type from the magic bytes.
pub fn encode_data_url(bytes: &[u8]) -> String {
    let mime = if bytes.starts_with(b"\x89PNG\r\n\x1a\n") {
        "image/png"
    } else if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
        "image/jpeg"
    } else {
        "application/octet-stream"
    };
    format!("data:{};base64,{}", mime, base64::engine::general_purpose::STANDARD.encode(bytes))
}

/// Resolves an image reference to pixels. `None` means "draw nothing".
pub trait ImageSource: Send + Sync {
    fn load(&self, reference: &str) -> Option<Bitmap>;

    /// First candidate that loads, in order.
    fn load_first(&self, candidates: &[String]) -> Option<Bitmap> {
        candidates.iter().find_map(|c| self.load(c))
    }
}

impl<T: ImageSource + ?Sized> ImageSource for Arc<T> {
    fn load(&self, reference: &str) -> Option<Bitmap> {
        (**self).load(reference)
    }

    fn load_first(&self, candidates: &[String]) -> Option<Bitmap> {
        (**self).load_first(candidates)
    }
}

/// Source that never yields an image.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoImages;

impl ImageSource for NoImages {
    fn load(&self, _reference: &str) -> Option<Bitmap> {
        None
    }
}

/// Default loader: an optional cache source, `data:` URLs, remote URLs
/// (with the `net` feature) and files under an asset directory.
pub struct AssetLoader {
    asset_dir: PathBuf,
    cache: Option<Arc<dyn ImageSource>>,
    #[cfg(feature = "net")]
    http: Option<reqwest::blocking::Client>,
}

impl AssetLoader {
    pub fn new(asset_dir: impl Into<PathBuf>) -> Self {
        Self {
            asset_dir: asset_dir.into(),
            cache: None,
            #[cfg(feature = "net")]
            http: None,
        }
    }

    /// Consult `cache` before anything else.
    pub fn with_cache(mut self, cache: Arc<dyn ImageSource>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Allow `http(s)://` references to be fetched with `timeout_ms`.
    #[cfg(feature = "net")]
    pub fn with_remote(mut self, timeout_ms: u64, user_agent: &str) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_millis(timeout_ms))
            .user_agent(user_agent)
            .build()?;
        self.http = Some(client);
        Ok(self)
    }

    pub fn asset_dir(&self) -> &Path {
        &self.asset_dir
    }

    #[cfg(feature = "net")]
    fn load_remote(&self, reference: &str) -> Result<Option<Bitmap>> {
        let Some(client) = &self.http else {
            return Ok(None);
        };
        let resp = client.get(reference).send()?;
        if !resp.status().is_success() {
            return Err(Error::NetworkError(format!("HTTP {} for {}", resp.status(), reference)));
        }
        let bytes = resp.bytes()?;
        decode_png(&bytes).map(Some)
    }

    fn load_file(&self, reference: &str) -> Result<Option<Bitmap>> {
        let relative = reference.trim_start_matches('/');
        if relative.split('/').any(|part| part == "..") {
            return Err(Error::RenderError(format!("refusing path outside asset dir: {}", reference)));
        }
        let path = self.asset_dir.join(relative);
        if !path.is_file() {
            return Ok(None);
        }
        let bytes = std::fs::read(&path)?;
        decode_png(&bytes).map(Some)
    }

    fn try_load(&self, reference: &str) -> Result<Option<Bitmap>> {
        if let Some(hit) = self.cache.as_ref().and_then(|c| c.load(reference)) {
            return Ok(Some(hit));
        }
        if reference.starts_with("data:") {
            return decode_data_url(reference).map(Some);
        }
        if reference.starts_with("http://") || reference.starts_with("https://") {
            #[cfg(feature = "net")]
            return self.load_remote(reference);
            #[cfg(not(feature = "net"))]
            return Ok(None);
        }
        self.load_file(reference)
    }
}

impl ImageSource for AssetLoader {
    fn load(&self, reference: &str) -> Option<Bitmap> {
        match self.try_load(reference) {
            Ok(found) => found,
            Err(e) => {
                log::debug!("image '{}' unavailable: {}", reference, e);
                None
            }
        }
    }

    /// A cached badge under any candidate wins over remote or file lookups.
    fn load_first(&self, candidates: &[String]) -> Option<Bitmap> {
        if let Some(hit) = self.cache.as_ref().and_then(|c| candidates.iter().find_map(|r| c.load(r))) {
            return Some(hit);
        }
        candidates.iter().find_map(|r| self.load(r))
    }
}

/// Encode RGBA8 pixels as PNG.
pub fn encode_png(width: u32, height: u32, rgba: &[u8]) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    {
        let mut encoder = png::Encoder::new(&mut out, width, height);
        encoder.set_color(png::ColorType::Rgba);
        encoder.set_depth(png::BitDepth::Eight);
        let mut writer = encoder.write_header()?;
        writer.write_image_data(rgba)?;
        writer.finish()?;
    }
    Ok(out)
}
