//! Content hashing used for upload deduplication.
//!
//! Digests are SHA-256, base64 encoded with the standard padded alphabet. The result
//! depends only on the bytes, never on how a reader happens to chunk them.

use base64::{engine::general_purpose, Engine as _};
use sha2::{Digest, Sha256};
use tokio::io::{AsyncRead, AsyncReadExt};

use crate::constants::HASH_CHUNK_SIZE;
use crate::error::AppError;

/// Digest an in-memory buffer.
pub fn hash_bytes(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    for chunk in data.chunks(HASH_CHUNK_SIZE) {
        hasher.update(chunk);
    }
    general_purpose::STANDARD.encode(hasher.finalize())
}

/// Digest everything an async reader yields until EOF.
pub async fn hash_reader<R>(mut reader: R) -> Result<String, AppError>
where
    R: AsyncRead + Unpin,
{
    let mut hasher = Sha256::new();
    let mut buf = vec![0u8; HASH_CHUNK_SIZE];

    loop {
        let read = reader.read(&mut buf).await.map_err(AppError::Hashing)?;
        if read == 0 {
            break;
        }
        hasher.update(&buf[..read]);
    }

    Ok(general_purpose::STANDARD.encode(hasher.finalize()))
}
