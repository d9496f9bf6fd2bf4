//! Off-thread image decoding for the compositor's two source textures.
//!
//! Decoding never blocks the render thread: [`spawn_decode`] hands the work to
//! a worker and returns a [`PendingDecode`] that the render step polls once per
//! frame. A worker whose [`CancelToken`] has fired, or whose receiver is gone,
//! throws its result away instead of reaching back into torn-down state.

use std::fmt;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use crossbeam_channel::{bounded, Receiver, TryRecvError};
use image::GenericImageView;

/// Opaque locator for an image resolved by the host.
#[derive(Clone)]
pub enum AssetRef {
    Path(PathBuf),
    /// Already-fetched encoded bytes (PNG, JPEG, ...), tagged for logs.
    Bytes { label: String, data: Arc<[u8]> },
}

impl AssetRef {
    pub fn path(path: impl Into<PathBuf>) -> Self {
        AssetRef::Path(path.into())
    }

    pub fn bytes(label: impl Into<String>, data: impl Into<Arc<[u8]>>) -> Self {
        AssetRef::Bytes {
            label: label.into(),
            data: data.into(),
        }
    }

    fn decode(&self) -> Result<DecodedImage, String> {
        let image = match self {
            AssetRef::Path(path) => image::open(path).map_err(|err| err.to_string())?,
            AssetRef::Bytes { data, .. } => {
                image::load_from_memory(data).map_err(|err| err.to_string())?
            }
        };
        let (width, height) = image.dimensions();
        if width == 0 || height == 0 {
            return Err(format!("image has empty dimensions {width}x{height}"));
        }
        Ok(DecodedImage {
            width,
            height,
            rgba: image.to_rgba8().into_raw(),
        })
    }
}

impl fmt::Display for AssetRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssetRef::Path(path) => write!(f, "{}", path.display()),
            AssetRef::Bytes { label, data } => write!(f, "{label} ({} bytes)", data.len()),
        }
    }
}

impl fmt::Debug for AssetRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AssetRef({self})")
    }
}

/// Tightly packed RGBA8 pixels, rows top to bottom.
#[derive(Clone, PartialEq, Eq)]
pub struct DecodedImage {
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

impl fmt::Debug for DecodedImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DecodedImage")
            .field("width", &self.width)
            .field("height", &self.height)
            .finish_non_exhaustive()
    }
}

/// Shared liveness flag; cancelling is sticky and visible to every clone.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Observed state of one asynchronous decode.
#[derive(Debug)]
pub enum LoadState {
    Pending,
    Ready(DecodedImage),
    Failed(String),
}

/// Receiving end of a decode started by [`spawn_decode`].
#[derive(Debug)]
pub struct PendingDecode {
    asset: AssetRef,
    receiver: Receiver<Result<DecodedImage, String>>,
}

impl PendingDecode {
    pub fn asset(&self) -> &AssetRef {
        &self.asset
    }

    /// Non-blocking check for a finished decode.
    pub fn poll(&self) -> LoadState {
        match self.receiver.try_recv() {
            Ok(Ok(image)) => LoadState::Ready(image),
            Ok(Err(reason)) => LoadState::Failed(reason),
            Err(TryRecvError::Empty) => LoadState::Pending,
            Err(TryRecvError::Disconnected) => {
                LoadState::Failed("decode worker exited without a result".to_string())
            }
        }
    }
}

/// Starts decoding `asset` on a worker thread.
pub fn spawn_decode(asset: AssetRef, token: CancelToken) -> PendingDecode {
    let (sender, receiver) = bounded(1);
    let worker_asset = asset.clone();
    let spawned = thread::Builder::new()
        .name("bamboo-decode".into())
        .spawn(move || {
            let result = worker_asset.decode();
            if token.is_cancelled() {
                tracing::debug!(asset = %worker_asset, "decode finished after cancellation; discarding");
                return;
            }
            // A dropped receiver means the texture cache is gone.
            let _ = sender.send(result);
        });
    if let Err(err) = spawned {
        let (failed_sender, failed_receiver) = bounded(1);
        let _ = failed_sender.send(Err(format!("failed to spawn decode worker: {err}")));
        return PendingDecode {
            asset,
            receiver: failed_receiver,
        };
    }
    PendingDecode { asset, receiver }
}
