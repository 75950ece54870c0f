use anyhow::{Context, Result};
use async_trait::async_trait;
use log::warn;
use std::path::{Path, PathBuf};

use crate::engine::FrameSource;

/// Replays the image files of a directory as a frame stream, in file-name order
pub struct DirectorySource {
    files: Vec<PathBuf>,
    next: usize,
}

impl DirectorySource {
    pub fn open(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        let mut files = Vec::new();
        for entry in std::fs::read_dir(dir).with_context(|| format!("reading {}", dir.display()))? {
            let path = entry?.path();
            if path.is_file() {
                files.push(path);
            }
        }
        files.sort();

        Ok(Self { files, next: 0 })
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

#[async_trait]
impl FrameSource for DirectorySource {
    async fn next_frame(&mut self) -> Option<Vec<u8>> {
        while let Some(path) = self.files.get(self.next) {
            self.next += 1;
            match tokio::fs::read(path).await {
                Ok(bytes) => return Some(bytes),
                Err(e) => warn!("Skipping unreadable frame {}: {}", path.display(), e),
            }
        }
        None
    }
}
