//! Upload ingestion
//!
//! This module handles:
//! - The raw file blob model (from disk or from memory)
//! - Filtering a batch down to the supported document format
//! - Chunked reads with progress reporting
//! - Encoding file content into a transport-safe base64 payload
//!
//! Scheduling of reads and registration of the resulting documents belongs to
//! the session controller.

mod detection;

pub use detection::*;

use crate::error::{Error, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use std::path::{Path, PathBuf};
use tokio::io::AsyncReadExt;
use tracing::debug;

/// Where a blob's bytes come from
#[derive(Debug, Clone)]
pub enum BlobBody {
    Path(PathBuf),
    Bytes(Vec<u8>),
}

/// A raw file handed to the pipeline by a drop or a picker
#[derive(Debug, Clone)]
pub struct FileBlob {
    pub name: String,
    /// Declared media type, if the source provided one
    pub media_type: Option<String>,
    pub body: BlobBody,
}

impl FileBlob {
    /// Blob backed by a file on disk; the media type is guessed from its name
    pub fn from_path(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        let media_type = mime_guess::from_path(path)
            .first_raw()
            .map(|m| m.to_string());
        Self {
            name,
            media_type,
            body: BlobBody::Path(path.to_path_buf()),
        }
    }

    pub fn from_bytes(name: impl Into<String>, media_type: Option<&str>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            media_type: media_type.map(|m| m.to_string()),
            body: BlobBody::Bytes(bytes),
        }
    }
}

/// Content of a successfully read file
#[derive(Debug, Clone)]
pub struct EncodedFile {
    pub size: u64,
    pub data: String,
}

/// Split a batch into supported blobs and a count of skipped ones
pub fn partition_batch(batch: Vec<FileBlob>, filter: &FormatFilter) -> (Vec<FileBlob>, usize) {
    let total = batch.len();
    let accepted: Vec<FileBlob> = batch.into_iter().filter(|b| filter.accepts(b)).collect();
    let skipped = total - accepted.len();
    if skipped > 0 {
        debug!(skipped, accepted = accepted.len(), "Skipped unsupported files");
    }
    (accepted, skipped)
}

/// Read a blob in `chunk_bytes` pieces, reporting percent done, then encode it.
pub async fn read_and_encode<F>(
    blob: &FileBlob,
    chunk_bytes: usize,
    mut on_progress: F,
) -> Result<EncodedFile>
where
    F: FnMut(u8),
{
    let chunk_bytes = chunk_bytes.max(1);
    let bytes = match &blob.body {
        BlobBody::Path(path) => read_file_chunked(path, chunk_bytes, &mut on_progress).await?,
        BlobBody::Bytes(bytes) => {
            let total = bytes.len();
            let mut done = 0usize;
            for chunk in bytes.chunks(chunk_bytes) {
                done += chunk.len();
                on_progress(percent(done as u64, total as u64));
                tokio::task::yield_now().await;
            }
            bytes.clone()
        }
    };

    Ok(EncodedFile {
        size: bytes.len() as u64,
        data: STANDARD.encode(&bytes),
    })
}

async fn read_file_chunked<F>(path: &Path, chunk_bytes: usize, on_progress: &mut F) -> Result<Vec<u8>>
where
    F: FnMut(u8),
{
    let mut file = tokio::fs::File::open(path).await.map_err(|e| {
        Error::Ingestion(format!("Failed to open '{}': {}", path.display(), e))
    })?;
    let total = file.metadata().await?.len();

    let mut contents = Vec::with_capacity(total as usize);
    let mut buf = vec![0u8; chunk_bytes];
    loop {
        let n = file.read(&mut buf).await.map_err(|e| {
            Error::Ingestion(format!("Failed to read '{}': {}", path.display(), e))
        })?;
        if n == 0 {
            break;
        }
        contents.extend_from_slice(&buf[..n]);
        on_progress(percent(contents.len() as u64, total));
    }

    Ok(contents)
}

fn percent(done: u64, total: u64) -> u8 {
    if total == 0 {
        return 100;
    }
    ((done.min(total) * 100) / total) as u8
}
