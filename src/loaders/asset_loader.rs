use anyhow::Result;
use futures::channel::oneshot;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;

use crate::scene::LoadedAsset;
use crate::traits::AssetWaker;

pub type LoadResult = Result<LoadedAsset>;

type LoadFn = dyn Fn(&Path) -> LoadResult + Send + Sync;

/// Issues one background import per request
///
/// Cloning is cheap; the import function is shared.
#[derive(Clone)]
pub struct AssetLoader {
    load: Arc<LoadFn>,
}

impl AssetLoader {
    /// Loader backed by the glTF importer
    pub fn gltf() -> Self {
        Self::from_fn(|path| super::gltf::load_gltf(path))
    }

    /// Loader backed by any import function
    pub fn from_fn<F>(load: F) -> Self
    where
        F: Fn(&Path) -> LoadResult + Send + Sync + 'static,
    {
        Self { load: Arc::new(load) }
    }

    /// Start importing `path` on a worker thread
    ///
    /// `waker` runs after the result has been handed over (or dropped because
    /// the receiving side is gone).
    pub fn spawn(&self, path: impl Into<PathBuf>, generation: u64, waker: AssetWaker) -> PendingAsset {
        let path = path.into();
        let (sender, receiver) = oneshot::channel();
        let load = Arc::clone(&self.load);
        let thread_path = path.clone();

        let spawned = thread::Builder::new()
            .name("asset-loader".into())
            .spawn(move || {
                let result = load(&thread_path);
                if sender.send(result).is_err() {
                    log::debug!(
                        "Load of {:?} finished after its widget went away; discarding",
                        thread_path
                    );
                }
                waker();
            });

        if let Err(e) = spawned {
            // Sender was dropped with the closure, so polling reports Abandoned
            log::error!("Failed to start asset loader thread: {}", e);
        }

        PendingAsset {
            path,
            generation,
            receiver,
        }
    }
}

impl Default for AssetLoader {
    fn default() -> Self {
        Self::gltf()
    }
}

#[derive(Debug)]
pub enum LoadPoll {
    Pending,
    Ready(LoadResult),
    /// The worker vanished without producing a result
    Abandoned,
}

/// Receiving end of one in-flight load
///
/// Dropping it cancels delivery: a late result is thrown away by the worker.
#[derive(Debug)]
pub struct PendingAsset {
    path: PathBuf,
    generation: u64,
    receiver: oneshot::Receiver<LoadResult>,
}

impl PendingAsset {
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Mount generation that issued this load
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Non-blocking check for a result
    pub fn poll(&mut self) -> LoadPoll {
        match self.receiver.try_recv() {
            Ok(Some(result)) => LoadPoll::Ready(result),
            Ok(None) => LoadPoll::Pending,
            Err(oneshot::Canceled) => LoadPoll::Abandoned,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;
    use std::sync::mpsc;
    use std::time::Duration;

    fn waker_channel() -> (AssetWaker, mpsc::Receiver<()>) {
        let (tx, rx) = mpsc::channel();
        (
            Box::new(move || {
                let _ = tx.send(());
            }),
            rx,
        )
    }

    #[test]
    fn test_failed_load_is_delivered_as_error() {
        let loader = AssetLoader::from_fn(|path| Err(anyhow!("no such asset {:?}", path)));
        let (waker, woke) = waker_channel();
        let mut pending = loader.spawn("missing.gltf", 3, waker);

        woke.recv_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(pending.generation(), 3);
        assert_eq!(pending.path(), Path::new("missing.gltf"));
        match pending.poll() {
            LoadPoll::Ready(Err(e)) => assert!(e.to_string().contains("missing.gltf")),
            other => panic!("unexpected poll result: {:?}", other),
        }
    }

    #[test]
    fn test_dropped_pending_still_wakes() {
        let (gate_tx, gate_rx) = mpsc::channel::<()>();
        let gate_rx = std::sync::Mutex::new(gate_rx);
        let loader = AssetLoader::from_fn(move |_| {
            let _ = gate_rx.lock().unwrap().recv();
            Err(anyhow!("late"))
        });
        let (waker, woke) = waker_channel();
        let pending = loader.spawn("late.gltf", 0, waker);

        drop(pending);
        gate_tx.send(()).unwrap();
        woke.recv_timeout(Duration::from_secs(5)).unwrap();
    }

    #[test]
    fn test_pending_before_completion() {
        let (gate_tx, gate_rx) = mpsc::channel::<()>();
        let gate_rx = std::sync::Mutex::new(gate_rx);
        let loader = AssetLoader::from_fn(move |_| {
            let _ = gate_rx.lock().unwrap().recv();
            Err(anyhow!("done"))
        });
        let (waker, woke) = waker_channel();
        let mut pending = loader.spawn("slow.gltf", 0, waker);

        assert!(matches!(pending.poll(), LoadPoll::Pending));
        gate_tx.send(()).unwrap();
        woke.recv_timeout(Duration::from_secs(5)).unwrap();
        assert!(matches!(pending.poll(), LoadPoll::Ready(Err(_))));
    }
}
