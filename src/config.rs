/// Default number of rows evaluated per chunk.
pub const DEFAULT_CHUNK_SIZE: usize = 100;

/// How a query's result rows are pulled from storage.
///
/// With `chunked_fetch` set, rows are evaluated `chunk_size` at a time as the
/// iterator is consumed; otherwise the whole result is evaluated on the first
/// pull.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchConfig {
    /// Evaluate rows lazily in chunks
    pub chunked_fetch: bool,

    /// Rows per chunk
    pub chunk_size: usize,
}

impl FetchConfig {
    pub fn new() -> Self {
        Self {
            chunked_fetch: false,
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }

    /// Chunked fetching with the given chunk size.
    pub fn chunked(chunk_size: usize) -> Self {
        Self::new().chunked_fetch(true).chunk_size(chunk_size)
    }

    pub fn chunked_fetch(mut self, chunked_fetch: bool) -> Self {
        self.chunked_fetch = chunked_fetch;
        self
    }

    /// Set the chunk size. Zero is clamped to one.
    pub fn chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = FetchConfig::default();
        assert!(!config.chunked_fetch);
        assert_eq!(config.chunk_size, DEFAULT_CHUNK_SIZE);
    }

    #[test]
    fn test_chunked_clamps_zero() {
        let config = FetchConfig::chunked(0);
        assert!(config.chunked_fetch);
        assert_eq!(config.chunk_size, 1);
    }
}
