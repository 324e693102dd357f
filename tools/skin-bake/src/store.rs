//! Artifact persistence
//!
//! Saving is all-or-nothing: a failed save never leaves a partial artifact
//! at the destination.

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use bake_common::{BakedAsset, FormatError, write_baked_asset};

use crate::error::BakeError;

/// Destination for baked assets
pub trait ArtifactStore {
    fn save(&self, asset: &BakedAsset, path: &Path) -> Result<(), BakeError>;
}

/// Writes assets to the local filesystem
///
/// The asset is encoded in memory, written to a hidden sibling file and
/// renamed over the destination once fully flushed.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileStore;

impl FileStore {
    fn temp_path(path: &Path) -> PathBuf {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "asset".to_string());
        path.with_file_name(format!(".{name}.tmp"))
    }

    fn write_atomic(bytes: &[u8], path: &Path) -> std::io::Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let temp = Self::temp_path(path);
        let result = File::create(&temp)
            .and_then(|mut file| {
                file.write_all(bytes)?;
                file.sync_all()
            })
            .and_then(|()| fs::rename(&temp, path));

        if result.is_err() {
            let _ = fs::remove_file(&temp);
        }
        result
    }
}

impl ArtifactStore for FileStore {
    fn save(&self, asset: &BakedAsset, path: &Path) -> Result<(), BakeError> {
        let save_failure = |source: FormatError| BakeError::SaveFailure {
            path: path.to_path_buf(),
            source,
        };

        let mut bytes = Vec::new();
        write_baked_asset(&mut bytes, asset).map_err(save_failure)?;
        Self::write_atomic(&bytes, path).map_err(|e| save_failure(FormatError::Io(e)))?;

        tracing::debug!("Wrote {} bytes to {}", bytes.len(), path.display());
        Ok(())
    }
}
