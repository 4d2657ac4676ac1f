use std::collections::HashMap;
use std::path::PathBuf;

use crate::foundation::error::{StampError, StampResult};

/// Collaborator that turns a source location into raw bytes.
///
/// Network access, caching and retries live behind this seam; the pipeline only ever sees
/// bytes or a [`StampError::Fetch`].
pub trait SourceFetcher {
    /// Fetch the bytes at `location`.
    fn fetch(&self, location: &str) -> StampResult<Vec<u8>>;
}

/// Reads sources from the local filesystem, optionally relative to a root directory.
#[derive(Clone, Debug, Default)]
pub struct FileFetcher {
    root: Option<PathBuf>,
}

impl FileFetcher {
    /// Resolve locations as given (relative to the working directory).
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve relative locations against `root`.
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            root: Some(root.into()),
        }
    }
}

impl SourceFetcher for FileFetcher {
    fn fetch(&self, location: &str) -> StampResult<Vec<u8>> {
        let path = match &self.root {
            Some(root) => root.join(location),
            None => PathBuf::from(location),
        };
        std::fs::read(&path)
            .map_err(|e| StampError::fetch(format!("read '{}': {e}", path.display())))
    }
}

/// Serves fixed byte buffers by location.
#[derive(Clone, Debug, Default)]
pub struct StaticFetcher {
    sources: HashMap<String, Vec<u8>>,
}

impl StaticFetcher {
    /// Empty fetcher.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `bytes` under `location`.
    pub fn insert(&mut self, location: impl Into<String>, bytes: Vec<u8>) {
        self.sources.insert(location.into(), bytes);
    }

    /// Builder form of [`StaticFetcher::insert`].
    pub fn with(mut self, location: impl Into<String>, bytes: Vec<u8>) -> Self {
        self.insert(location, bytes);
        self
    }
}

impl SourceFetcher for StaticFetcher {
    fn fetch(&self, location: &str) -> StampResult<Vec<u8>> {
        self.sources
            .get(location)
            .cloned()
            .ok_or_else(|| StampError::fetch(format!("no source registered for '{location}'")))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/pipeline/source.rs"]
mod tests;
