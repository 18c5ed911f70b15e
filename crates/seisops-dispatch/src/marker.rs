//! Durable "already processed" markers shared by every dispatcher process on
//! the host.
//!
//! A marker is an empty-ish file `<composite_id>.flag` in one directory. It is
//! claimed with an exclusive create, so two processes racing on the same id
//! cannot both win. Markers are never removed.

use std::path::PathBuf;

use tokio::{fs, io::AsyncWriteExt};
use tracing::debug;

use crate::error::{DispatchError, Result};

const MARKER_EXT: &str = "flag";
const MARKER_BODY: &[u8] = b"processed";

/// Result of trying to claim a marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Claim {
    /// This caller created the marker and owns the sub-run.
    Claimed,
    /// Some earlier caller already created it.
    AlreadyClaimed,
}

#[derive(Debug, Clone)]
pub struct MarkerStore {
    dir: PathBuf,
}

impl MarkerStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, id: &str) -> PathBuf {
        self.dir.join(format!("{id}.{MARKER_EXT}"))
    }

    /// Atomically claim `id`. Creates the marker directory on first use.
    pub async fn claim(&self, id: &str) -> Result<Claim> {
        validate_id(id)?;
        fs::create_dir_all(&self.dir)
            .await
            .map_err(|source| DispatchError::Marker {
                path: self.dir.clone(),
                source,
            })?;

        let path = self.path_for(id);
        let opened = fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await;

        match opened {
            Ok(mut file) => {
                file.write_all(MARKER_BODY)
                    .await
                    .map_err(|source| DispatchError::Marker {
                        path: path.clone(),
                        source,
                    })?;
                debug!(path = %path.display(), "marker claimed");
                Ok(Claim::Claimed)
            }
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => Ok(Claim::AlreadyClaimed),
            Err(source) => Err(DispatchError::Marker { path, source }),
        }
    }
}

/// Reject ids that would escape the marker directory.
fn validate_id(id: &str) -> Result<()> {
    let bad = id.is_empty()
        || id == "."
        || id == ".."
        || id.contains(['/', '\\', '\0']);
    if bad {
        return Err(DispatchError::InvalidId(id.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn first_claim_wins_second_is_refused() {
        let tmp = tempfile::tempdir().unwrap();
        let store = MarkerStore::new(tmp.path().join("flags"));

        assert_eq!(store.claim("EVT1_5").await.unwrap(), Claim::Claimed);
        assert_eq!(store.claim("EVT1_5").await.unwrap(), Claim::AlreadyClaimed);
        assert!(store.path_for("EVT1_5").exists());
        assert!(!store.path_for("EVT1_10").exists());
    }

    #[tokio::test]
    async fn marker_file_contents() {
        let tmp = tempfile::tempdir().unwrap();
        let store = MarkerStore::new(tmp.path());
        store.claim("EVT9_20").await.unwrap();

        let body = std::fs::read_to_string(tmp.path().join("EVT9_20.flag")).unwrap();
        assert_eq!(body, "processed");
    }

    #[tokio::test]
    async fn separate_stores_share_the_directory() {
        let tmp = tempfile::tempdir().unwrap();
        let a = MarkerStore::new(tmp.path());
        let b = MarkerStore::new(tmp.path());

        assert_eq!(a.claim("EVT2_30").await.unwrap(), Claim::Claimed);
        assert_eq!(b.claim("EVT2_30").await.unwrap(), Claim::AlreadyClaimed);
    }

    #[tokio::test]
    async fn concurrent_claims_have_one_winner() {
        let tmp = tempfile::tempdir().unwrap();
        let store = MarkerStore::new(tmp.path());

        let mut handles = Vec::new();
        for _ in 0..16 {
            let store = store.clone();
            handles.push(tokio::spawn(async move { store.claim("EVT3_5").await }));
        }
        let mut winners = 0;
        for h in handles {
            if h.await.unwrap().unwrap() == Claim::Claimed {
                winners += 1;
            }
        }
        assert_eq!(winners, 1);
    }

    #[tokio::test]
    async fn path_separators_rejected() {
        let tmp = tempfile::tempdir().unwrap();
        let store = MarkerStore::new(tmp.path());
        assert!(matches!(
            store.claim("../escape_5").await,
            Err(DispatchError::InvalidId(_))
        ));
        assert!(matches!(store.claim("").await, Err(DispatchError::InvalidId(_))));
    }
}
