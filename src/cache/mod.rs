//! Content-addressed cache of synthesized audio.
//!
//! Providers derive a [`CacheKey`] from every parameter that changes the
//! produced audio; the cache maps its digest to a file and knows nothing
//! about providers.

mod key;
mod store;

pub use key::{CacheKey, KeyValue};
pub use store::TtsCache;

use thiserror::Error;

/// Errors inside the cache. Never surfaced past [`TtsCache`].
#[derive(Error, Debug)]
pub enum CacheError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Key encoding error: {0}")]
    Encode(#[from] serde_json::Error),
}
