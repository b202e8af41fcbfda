//! One-call conversion from Markdown text to a repository.

use std::fs;
use std::path::Path;

use crate::builder::{BuildOutput, RepositoryBuilder};
use crate::config::BuilderConfig;
use crate::error::{ConverterError, Result};
use crate::markdown::{emit_events, parse};
use crate::repository::{load_repository_file, RepositoryAdapter};

/// Convert a Markdown document.
///
/// # Arguments
/// * `markdown` - The document text
/// * `config` - Id range, copy depth and column aliases
/// * `reference` - Optional repository consulted for entities the document
///   references but does not define
///
/// # Returns
/// The built repository and the diagnostics recorded while building it.
/// Unresolved references and malformed cells are diagnostics, not errors.
///
/// # Examples
/// ```
/// use mdorchestra_converter::config::BuilderConfig;
/// use mdorchestra_converter::convert::convert_markdown;
///
/// let output = convert_markdown(
///     "# Orders\n\n## Fields\n\n| Name | Tag |\n|---|---|\n| Side | 54 |\n",
///     BuilderConfig::default(),
///     None,
/// )
/// .unwrap();
/// assert_eq!(output.repository.name, "Orders");
/// assert_eq!(output.repository.fields[0].id, 54);
/// ```
pub fn convert_markdown(
    markdown: &str,
    config: BuilderConfig,
    reference: Option<RepositoryAdapter>,
) -> Result<BuildOutput> {
    let mut builder = RepositoryBuilder::with_reference(config, reference)?;
    let tree = parse(markdown);
    emit_events(&tree, &mut builder);
    tracing::debug!(pending = builder.pending().len(), "Document read");
    Ok(builder.finish())
}

/// Load a reference repository, wrapping failures with the path.
pub fn load_reference(path: &Path) -> Result<RepositoryAdapter> {
    load_repository_file(path).map_err(|e| ConverterError::ReferenceLoad {
        path: path.display().to_string(),
        source: Box::new(e),
    })
}

/// Convert a Markdown file, optionally against a reference repository file.
pub fn convert_file(
    input: &Path,
    config: BuilderConfig,
    reference: Option<&Path>,
) -> Result<BuildOutput> {
    let markdown = fs::read_to_string(input)?;
    let reference = reference.map(load_reference).transpose()?;
    tracing::info!(input = %input.display(), reference = reference.is_some(), "Converting");
    convert_markdown(&markdown, config, reference)
}
