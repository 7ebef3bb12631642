use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};

use base64::Engine;
use walkdir::WalkDir;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::error::StorageError;
use crate::sanitize::redact_path;

/// File extensions recognised as artifacts when listing a job directory.
pub const ARTIFACT_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "bmp"];

/// Handle to a job's artifact directory, returned by [`ArtifactStore::allocate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactDir {
    job_id: String,
    path: PathBuf,
}

impl ArtifactDir {
    pub fn job_id(&self) -> &str {
        &self.job_id
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Directory-per-job artifact storage rooted at the output directory.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    output_directory: PathBuf,
}

impl ArtifactStore {
    pub fn new<P: AsRef<Path>>(output_directory: P) -> Self {
        Self {
            output_directory: output_directory.as_ref().to_path_buf(),
        }
    }

    pub fn output_directory(&self) -> &Path {
        &self.output_directory
    }

    /// Path a job's artifacts live under. Does not touch the filesystem.
    pub fn job_directory(&self, job_id: &str) -> PathBuf {
        self.output_directory.join(job_id)
    }

    /// Creates the directory for `job_id`. Safe to call when it already exists.
    pub fn allocate(&self, job_id: &str) -> Result<ArtifactDir, StorageError> {
        let path = self.job_directory(job_id);
        std::fs::create_dir_all(&path).map_err(|e| StorageError::Unavailable {
            path: path.clone(),
            source: e,
        })?;

        log::debug!("Allocated artifact directory for job {}", job_id);

        Ok(ArtifactDir {
            job_id: job_id.to_string(),
            path,
        })
    }

    /// Writes one artifact. An existing file with the same name is replaced.
    pub fn write_artifact(
        &self,
        dir: &ArtifactDir,
        filename: &str,
        bytes: &[u8],
    ) -> Result<PathBuf, StorageError> {
        let path = dir.path.join(filename);
        std::fs::write(&path, bytes).map_err(|e| StorageError::WriteArtifact {
            path: path.clone(),
            source: e,
        })?;
        Ok(path)
    }

    /// Regular files directly under `dir` whose extension is one of
    /// `allowed_extensions` (case-insensitive), sorted by path.
    ///
    /// A missing directory is not an error and yields no artifacts.
    pub fn list_artifacts(
        &self,
        dir: &Path,
        allowed_extensions: &[&str],
    ) -> Result<Vec<PathBuf>, StorageError> {
        if !dir.is_dir() {
            return Ok(Vec::new());
        }

        let mut artifacts = Vec::new();
        for entry in WalkDir::new(dir).min_depth(1).max_depth(1) {
            let entry = entry.map_err(|e| StorageError::ListArtifacts {
                path: dir.to_path_buf(),
                source: e,
            })?;

            if !entry.file_type().is_file() {
                continue;
            }

            let matches = entry
                .path()
                .extension()
                .and_then(|ext| ext.to_str())
                .map(|ext| {
                    allowed_extensions
                        .iter()
                        .any(|allowed| allowed.eq_ignore_ascii_case(ext))
                })
                .unwrap_or(false);

            if matches {
                artifacts.push(entry.into_path());
            }
        }

        artifacts.sort();
        Ok(artifacts)
    }

    /// Base64 of the whole file, or `None` when it cannot be read.
    pub fn encode_for_preview(&self, path: &Path) -> Option<String> {
        match std::fs::read(path) {
            Ok(bytes) => Some(base64::engine::general_purpose::STANDARD.encode(bytes)),
            Err(e) => {
                log::debug!("Skipping preview for {}: {}", redact_path(path), e);
                None
            }
        }
    }

    /// Encodes up to `max_count` artifacts of `dir`, in listing order.
    pub fn previews(&self, dir: &Path, max_count: usize) -> Result<Vec<String>, StorageError> {
        let artifacts = self.list_artifacts(dir, ARTIFACT_EXTENSIONS)?;
        Ok(artifacts
            .iter()
            .take(max_count)
            .filter_map(|path| self.encode_for_preview(path))
            .collect())
    }

    /// Packs `paths` into a deflate ZIP archive. Entries are named by file
    /// name only.
    pub fn bundle(&self, paths: &[PathBuf]) -> Result<Vec<u8>, StorageError> {
        if paths.is_empty() {
            return Err(StorageError::Bundle("no artifacts to bundle".to_string()));
        }

        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

        for path in paths {
            let name = path
                .file_name()
                .and_then(|n| n.to_str())
                .ok_or_else(|| {
                    StorageError::Bundle(format!("artifact has no usable file name: {}", path.display()))
                })?
                .to_string();

            let bytes = std::fs::read(path).map_err(|e| {
                StorageError::Bundle(format!("failed to read '{}': {}", name, e))
            })?;

            writer
                .start_file(name.as_str(), options)
                .map_err(|e| StorageError::Bundle(format!("failed to add '{}': {}", name, e)))?;
            writer
                .write_all(&bytes)
                .map_err(|e| StorageError::Bundle(format!("failed to write '{}': {}", name, e)))?;
        }

        let cursor = writer
            .finish()
            .map_err(|e| StorageError::Bundle(format!("failed to finish archive: {}", e)))?;

        log::debug!("Bundled {} artifacts", paths.len());
        Ok(cursor.into_inner())
    }

    /// Deletes a job directory and everything in it. A missing directory is
    /// treated as already removed.
    pub fn remove(&self, dir: &Path) -> Result<(), StorageError> {
        match std::fs::remove_dir_all(dir) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StorageError::Remove {
                path: dir.to_path_buf(),
                source: e,
            }),
        }
    }
}
