use crate::model::Bulletin;
use crate::rendering::images::ImageSource;
use crate::rendering::theme::{PresetTable, ThemeId};
use crate::rendering::{RenderOptions, Renderer, Screenshot};
use crate::{Error, Result};
use std::path::PathBuf;
use std::sync::mpsc::{self, Sender};
use std::sync::Arc;
use std::thread;
use tokio::sync::oneshot;

enum Command {
    Render(Box<Bulletin>, oneshot::Sender<Result<Screenshot>>),
    Export(Box<Bulletin>, PathBuf, oneshot::Sender<Result<PathBuf>>),
    SetTheme(Option<ThemeId>, oneshot::Sender<Result<()>>),
    Close(oneshot::Sender<Result<()>>),
}

/// An async-friendly export facade backed by a dedicated worker thread.
///
/// The worker owns the [`Renderer`] and rasterizes one request at a time, so
/// async callers can keep editing bulletins while an export is running.
/// Requests carry a snapshot of the bulletin; later edits do not affect an
/// export already queued.
#[derive(Clone)]
pub struct Exporter {
    cmd_tx: Sender<Command>,
}

impl Exporter {
    /// Spawn the worker. Fails if the options carry an invalid preset table.
    pub async fn new(options: RenderOptions, images: Arc<dyn ImageSource>) -> Result<Self> {
        let (cmd_tx, cmd_rx) = mpsc::channel::<Command>();
        let (init_tx, init_rx) = oneshot::channel::<Result<()>>();

        thread::spawn(move || {
            if let Some(tiers) = &options.presets {
                if let Err(err) = PresetTable::new(tiers) {
                    let _ = init_tx.send(Err(err));
                    return;
                }
            }
            let mut renderer = Renderer::new(options, images);
            let _ = init_tx.send(Ok(()));

            while let Ok(cmd) = cmd_rx.recv() {
                match cmd {
                    Command::Render(bulletin, resp) => {
                        let _ = resp.send(renderer.render(&bulletin));
                    }
                    Command::Export(bulletin, dir, resp) => {
                        let _ = resp.send(renderer.export(&bulletin, &dir));
                    }
                    Command::SetTheme(theme, resp) => {
                        renderer.set_theme(theme);
                        let _ = resp.send(Ok(()));
                    }
                    Command::Close(resp) => {
                        let _ = resp.send(Ok(()));
                        break;
                    }
                }
            }
            log::debug!("exporter worker stopped");
        });

        init_rx
            .await
            .map_err(|e| Error::Other(format!("Worker init canceled: {}", e)))??;
        Ok(Self { cmd_tx })
    }

    fn send(&self, cmd: Command) -> Result<()> {
        self.cmd_tx
            .send(cmd)
            .map_err(|_| Error::Other("exporter worker is not running".into()))
    }

    /// Rasterize a snapshot of `bulletin`.
    pub async fn render(&self, bulletin: &Bulletin) -> Result<Screenshot> {
        let (tx, rx) = oneshot::channel();
        self.send(Command::Render(Box::new(bulletin.clone()), tx))?;
        rx.await
            .map_err(|e| Error::Other(format!("Render canceled: {}", e)))?
    }

    /// Render and write the PNG into `dir`, returning the file path.
    pub async fn export(&self, bulletin: &Bulletin, dir: impl Into<PathBuf>) -> Result<PathBuf> {
        let (tx, rx) = oneshot::channel();
        self.send(Command::Export(Box::new(bulletin.clone()), dir.into(), tx))?;
        rx.await
            .map_err(|e| Error::Other(format!("Export canceled: {}", e)))?
    }

    /// Force a theme for later requests (`None` = per bulletin type).
    pub async fn set_theme(&self, theme: Option<ThemeId>) -> Result<()> {
        let (tx, rx) = oneshot::channel();
        self.send(Command::SetTheme(theme, tx))?;
        rx.await
            .map_err(|e| Error::Other(format!("SetTheme canceled: {}", e)))?
    }

    /// Stop the worker after queued requests finish.
    pub async fn close(self) -> Result<()> {
        let (tx, rx) = oneshot::channel();
        self.send(Command::Close(tx))?;
        rx.await
            .map_err(|e| Error::Other(format!("Close canceled: {}", e)))?
    }
}
