
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

use super::{STORE_FORMAT_VERSION, ChunkRecord, StoreFile};
use crate::{KokobotError, Result};

/// The store contents once resident in memory. Read-only after load.
#[derive(Debug)]
pub struct LoadedStore {
    pub records: Vec<ChunkRecord>,
    pub model: String,
    pub dimensions: usize,
    pub generated_at: String,
}

/// Process-scoped, lazily loaded vector store.
///
/// The underlying file is read at most once per process lifetime: the first
/// caller performs the load while concurrent callers await the same in-flight
/// initialization. A failed load is not cached, so the next call retries.
pub struct VectorStore {
    path: PathBuf,
    cell: OnceCell<Arc<LoadedStore>>,
    file_reads: AtomicUsize,
}

impl VectorStore {
    #[inline]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            cell: OnceCell::new(),
            file_reads: AtomicUsize::new(0),
        }
    }

    /// Return the resident store, loading it from disk on first use
    #[inline]
    pub async fn load(&self) -> Result<Arc<LoadedStore>> {
        let store = self
            .cell
            .get_or_try_init(|| self.read_from_disk())
            .await?;
        Ok(Arc::clone(store))
    }

    /// The resident store, if the one-time load already happened
    #[inline]
    pub fn loaded(&self) -> Option<Arc<LoadedStore>> {
        self.cell.get().map(Arc::clone)
    }

    /// How many times the underlying file has actually been read
    #[inline]
    pub fn file_reads(&self) -> usize {
        self.file_reads.load(Ordering::SeqCst)
    }

    #[inline]
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_from_disk(&self) -> Result<Arc<LoadedStore>> {
        self.file_reads.fetch_add(1, Ordering::SeqCst);
        debug!("Loading vector store from {}", self.path.display());

        let data = tokio::fs::read_to_string(&self.path).await.map_err(|e| {
            KokobotError::StoreUnavailable(format!(
                "Failed to read store file {}: {}",
                self.path.display(),
                e
            ))
        })?;

        let store_file: StoreFile = serde_json::from_str(&data).map_err(|e| {
            KokobotError::StoreUnavailable(format!(
                "Failed to parse store file {}: {}",
                self.path.display(),
                e
            ))
        })?;

        if store_file.version != STORE_FORMAT_VERSION {
            return Err(KokobotError::StoreUnavailable(format!(
                "Unsupported store format version {} (expected {})",
                store_file.version, STORE_FORMAT_VERSION
            )));
        }

        let model = store_file.model.clone();
        let dimensions = store_file.dimensions;
        let generated_at = store_file.generated_at.clone();
        let (records, quarantined) = store_file.validated_records();

        if quarantined > 0 {
            warn!(
                "Quarantined {} records with malformed embeddings in {}",
                quarantined,
                self.path.display()
            );
        }

        info!(
            "Vector store loaded: {} records, {} dimensions, generated {}",
            records.len(),
            dimensions,
            generated_at
        );

        Ok(Arc::new(LoadedStore {
            records,
            model,
            dimensions,
            generated_at,
        }))
    }
}
