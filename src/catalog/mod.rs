//! Catalog metadata lookups, paged to respect the remote payload ceiling.
//!
//! [`CatalogService::fetch`] returns `Ok(Some(records))` on success, `Ok(None)`
//! when the remote answered with no results for the chunk, and `Err` on
//! transport failures. [`fetch_all`] turns a request list into a sequential
//! stream of per-chunk batches.

use anyhow::Result;
use async_trait::async_trait;
use futures::stream::{self, Stream, StreamExt};

use crate::error::EngineError;
use crate::license::record::RawPackageRecord;
use crate::models::PackageRequest;

/// Largest number of packages sent in one catalog request.
pub const DEFAULT_CHUNK_SIZE: usize = 5000;

#[async_trait]
pub trait CatalogService: Send + Sync {
    async fn fetch(&self, chunk: &[PackageRequest]) -> Result<Option<Vec<RawPackageRecord>>>;
}

/// One chunk's worth of catalog records.
#[derive(Debug, Clone)]
pub struct ChunkBatch {
    pub index: usize,
    pub requested: usize,
    pub records: Vec<RawPackageRecord>,
}

/// Fetch `requests` in contiguous chunks of at most `chunk_size`, one remote call at a time.
///
/// The stream is lazy: nothing is requested until it is polled, and each chunk is
/// requested only after the previous batch was consumed. An empty or absent
/// response yields an empty batch. The first transport error ends the stream.
pub fn fetch_all<'a>(
    catalog: &'a dyn CatalogService,
    requests: &'a [PackageRequest],
    chunk_size: usize,
) -> impl Stream<Item = Result<ChunkBatch, EngineError>> + 'a {
    stream::iter(requests.chunks(chunk_size.max(1)).enumerate()).then(
        move |(index, chunk)| async move {
            tracing::debug!(chunk = index, size = chunk.len(), "requesting package info");

            let records = match catalog.fetch(chunk).await {
                Ok(Some(records)) => records,
                Ok(None) => {
                    tracing::warn!(chunk = index, "catalog returned no results for chunk");
                    Vec::new()
                }
                Err(e) => {
                    return Err(EngineError::Fetch {
                        chunk: index,
                        message: format!("{:#}", e),
                    })
                }
            };

            Ok(ChunkBatch {
                index,
                requested: chunk.len(),
                records,
            })
        },
    )
}
