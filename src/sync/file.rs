use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
    sync::Arc,
};

use futures::future::BoxFuture;
use tokio::{fs, sync::broadcast};
use tracing::debug;
use uuid::Uuid;

use super::slot::{NoticeHub, StateSlot, StorageError, StorageNotice, StorageResult, WindowId};

/// Slot persisted as `<dir>/<key>.json`, surviving process restarts.
///
/// Writes go to a temporary sibling file first and are renamed into place,
/// so a reader never observes a half-written payload.
#[derive(Debug, Clone)]
pub struct FileSlot {
    dir: Arc<PathBuf>,
    path: Arc<PathBuf>,
    notices: NoticeHub,
}

impl FileSlot {
    /// Open (and create if needed) the slot directory.
    pub async fn open(dir: impl Into<PathBuf>, key: &str) -> StorageResult<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir).await.map_err(|source| {
            StorageError::unavailable(
                format!("cannot create slot directory `{}`", dir.display()),
                source,
            )
        })?;

        let path = dir.join(format!("{key}.json"));
        debug!(path = %path.display(), "opened file slot");

        Ok(Self {
            dir: Arc::new(dir),
            path: Arc::new(path),
            notices: NoticeHub::new(key),
        })
    }

    /// Location of the payload file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl StateSlot for FileSlot {
    fn key(&self) -> &str {
        self.notices.key()
    }

    fn read(&self) -> BoxFuture<'static, StorageResult<Option<String>>> {
        let path = self.path.clone();
        Box::pin(async move {
            match fs::read_to_string(path.as_ref()).await {
                Ok(contents) => Ok(Some(contents)),
                Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
                Err(err) => Err(StorageError::unavailable(
                    format!("cannot read slot `{}`", path.display()),
                    err,
                )),
            }
        })
    }

    fn write(&self, origin: WindowId, payload: String) -> BoxFuture<'static, StorageResult<()>> {
        let slot = self.clone();
        Box::pin(async move {
            let staging = slot
                .dir
                .join(format!(".{}.{}.tmp", slot.key(), Uuid::new_v4().simple()));

            fs::write(&staging, payload.as_bytes())
                .await
                .map_err(|source| {
                    StorageError::unavailable(
                        format!("cannot write staging file `{}`", staging.display()),
                        source,
                    )
                })?;

            if let Err(source) = fs::rename(&staging, slot.path.as_ref()).await {
                let _ = fs::remove_file(&staging).await;
                return Err(StorageError::unavailable(
                    format!("cannot replace slot `{}`", slot.path.display()),
                    source,
                ));
            }

            slot.notices.notify(origin);
            Ok(())
        })
    }

    fn subscribe(&self) -> broadcast::Receiver<StorageNotice> {
        self.notices.subscribe()
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        let dir = self.dir.clone();
        Box::pin(async move {
            let metadata = fs::metadata(dir.as_ref()).await.map_err(|source| {
                StorageError::unavailable(
                    format!("slot directory `{}` is unreachable", dir.display()),
                    source,
                )
            })?;

            if metadata.is_dir() {
                Ok(())
            } else {
                Err(StorageError::unavailable(
                    format!("slot directory `{}` is not a directory", dir.display()),
                    std::io::Error::from(ErrorKind::NotADirectory),
                ))
            }
        })
    }
}
