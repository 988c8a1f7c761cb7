use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{self, Sender};
use std::sync::Arc;
use std::thread;

use log::debug;
use tokio::sync::oneshot;

use crate::{CaptureConfig, Error, GeneratedImage, HeadlessRasterizer, PreviewRegion, Rasterizer, Result};

enum Command {
    Capture(u64, PreviewRegion, oneshot::Sender<Result<GeneratedImage>>),
    Close(oneshot::Sender<Result<()>>),
}

/// An async-friendly capture service backed by a dedicated worker thread.
///
/// The worker thread owns the rasterizer and runs captures in the order they
/// were requested, so callers on an event loop never block on rendering or
/// image fetches. Every capture carries a ticket; once a newer ticket has
/// been announced with [`CaptureService::supersede_through`], queued older
/// captures are skipped instead of rendered.
#[derive(Clone)]
pub struct CaptureService {
    cmd_tx: Sender<Command>,
    latest: Arc<AtomicU64>,
}

impl CaptureService {
    /// Start a service running the default headless rasterizer.
    pub async fn start(config: CaptureConfig) -> Result<Self> {
        Self::start_with(move || HeadlessRasterizer::new(config)).await
    }

    /// Start a service whose rasterizer is built by `factory` on the worker
    /// thread.
    pub async fn start_with<R, F>(factory: F) -> Result<Self>
    where
        R: Rasterizer + 'static,
        F: FnOnce() -> Result<R> + Send + 'static,
    {
        let (cmd_tx, cmd_rx) = mpsc::channel::<Command>();
        let (init_tx, init_rx): (oneshot::Sender<Result<()>>, oneshot::Receiver<Result<()>>) =
            oneshot::channel();
        let latest = Arc::new(AtomicU64::new(0));
        let worker_latest = Arc::clone(&latest);

        thread::Builder::new()
            .name("ogsnap-capture".into())
            .spawn(move || {
                let mut rasterizer = match factory() {
                    Ok(r) => r,
                    Err(err) => {
                        let _ = init_tx.send(Err(err));
                        return;
                    }
                };
                let _ = init_tx.send(Ok(()));

                while let Ok(cmd) = cmd_rx.recv() {
                    match cmd {
                        Command::Capture(ticket, region, resp) => {
                            let res = if ticket < worker_latest.load(Ordering::SeqCst) {
                                debug!("skipping superseded capture {}", ticket);
                                Err(Error::Superseded(ticket))
                            } else {
                                rasterizer.capture(&region)
                            };
                            let _ = resp.send(res);
                        }
                        Command::Close(resp) => {
                            let _ = resp.send(Ok(()));
                            break;
                        }
                    }
                }
            })
            .map_err(|e| Error::InitializationError(format!("Failed to spawn capture worker: {}", e)))?;

        init_rx
            .await
            .map_err(|e| Error::InitializationError(format!("Worker init canceled: {}", e)))??;

        Ok(Self { cmd_tx, latest })
    }

    /// Queue a capture of `region`. The request is sent before this returns;
    /// the returned future resolves when the worker has finished it.
    pub fn capture(
        &self,
        ticket: u64,
        region: PreviewRegion,
    ) -> impl Future<Output = Result<GeneratedImage>> + Send + 'static {
        let (tx, rx) = oneshot::channel();
        let sent = self.cmd_tx.send(Command::Capture(ticket, region, tx)).is_ok();
        async move {
            if !sent {
                return Err(Error::Other("Capture worker has shut down".into()));
            }
            rx.await
                .map_err(|e| Error::Other(format!("Capture canceled: {}", e)))?
        }
    }

    /// Mark every ticket below `ticket` as stale.
    pub fn supersede_through(&self, ticket: u64) {
        self.latest.fetch_max(ticket, Ordering::SeqCst);
    }

    /// Shutdown the background worker.
    pub async fn shutdown(self) -> Result<()> {
        let (tx, rx) = oneshot::channel();
        if self.cmd_tx.send(Command::Close(tx)).is_err() {
            return Ok(());
        }
        rx.await
            .map_err(|e| Error::Other(format!("Close canceled: {}", e)))?
    }
}
