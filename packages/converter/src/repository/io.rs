//! YAML serialization of repositories and loading of reference models.

use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::Path;

use super::adapter::RepositoryAdapter;
use super::model::Repository;
use crate::error::Result;

/// Sink for a finished repository.
pub trait RepositoryWriter {
    /// Write the whole repository. Failures are returned, never swallowed.
    fn write_repository(&mut self, repository: &Repository) -> Result<()>;
}

/// Writes YAML to any [`Write`]. The document is rendered completely before
/// the first byte is written, so a serialization error leaves no output.
pub struct YamlWriter<W: Write> {
    inner: W,
}

impl<W: Write> YamlWriter<W> {
    pub fn new(inner: W) -> Self {
        Self { inner }
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: Write> RepositoryWriter for YamlWriter<W> {
    fn write_repository(&mut self, repository: &Repository) -> Result<()> {
        let content = generate_yaml(repository)?;
        self.inner.write_all(content.as_bytes())?;
        self.inner.flush()?;
        Ok(())
    }
}

/// Render a repository as YAML.
///
/// # Examples
/// ```
/// use mdorchestra_converter::repository::{generate_yaml, Repository};
///
/// let repository = Repository {
///     name: "FIX.Latest".to_string(),
///     ..Repository::default()
/// };
/// assert_eq!(generate_yaml(&repository).unwrap(), "name: FIX.Latest\n");
/// ```
pub fn generate_yaml(repository: &Repository) -> Result<String> {
    Ok(serde_yaml_ng::to_string(repository)?)
}

/// Save a repository to `path`, going through a temporary file so a failed
/// write never leaves a truncated document behind.
pub fn save_yaml(repository: &Repository, path: &Path) -> Result<()> {
    let content = generate_yaml(repository)?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "repository.yaml".to_string());
    let temp_file = path.with_file_name(format!(".{file_name}.tmp"));

    {
        let mut file = File::create(&temp_file)?;
        file.write_all(content.as_bytes())?;
        file.sync_all()?;
    }

    #[cfg(target_os = "windows")]
    if path.exists() {
        fs::remove_file(path)?;
    }

    fs::rename(&temp_file, path)?;
    tracing::debug!(path = %path.display(), "Saved repository");
    Ok(())
}

/// Load a repository written by [`generate_yaml`] and index it.
pub fn load_repository(mut reader: impl Read) -> Result<RepositoryAdapter> {
    let mut content = String::new();
    reader.read_to_string(&mut content)?;
    let repository: Repository = serde_yaml_ng::from_str(&content)?;
    Ok(RepositoryAdapter::from_repository(repository))
}

/// Load a repository from a file.
pub fn load_repository_file(path: &Path) -> Result<RepositoryAdapter> {
    let file = File::open(path)?;
    load_repository(std::io::BufReader::new(file))
}
