//! Command-line interface for the converter.

use std::fs;
use std::io;
use std::path::PathBuf;

use clap::Parser;
use console::style;

use crate::builder::{BuildOutput, KeyTable};
use crate::config::{BuilderConfig, DEFAULT_ID_MAX, DEFAULT_ID_MIN};
use crate::convert::convert_file;
use crate::diagnostics::Severity;
use crate::error::{ConverterError, Result};
use crate::repository::{save_yaml, CopyDepth, RepositoryWriter, YamlWriter};

/// md2orchestra - Build a protocol repository from a Markdown specification.
#[derive(Parser, Debug)]
#[command(name = "md2orchestra")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Markdown document to convert
    pub input: PathBuf,

    /// Output YAML file (default: standard output)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Reference repository (YAML) used to fill in missing entities
    #[arg(short, long)]
    pub reference: Option<PathBuf>,

    /// Write diagnostics as JSON to this file
    #[arg(short, long)]
    pub diagnostics: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Lowest generated id (inclusive)
    #[arg(long, default_value_t = DEFAULT_ID_MIN)]
    pub id_min: u32,

    /// Highest generated id (exclusive)
    #[arg(long, default_value_t = DEFAULT_ID_MAX)]
    pub id_max: u32,

    /// Member levels copied with an entity from the reference (number or 'unbounded')
    #[arg(long, default_value = "1")]
    pub depth: CopyDepth,

    /// Extra column heading, as HEADING=key (e.g., Code=value); repeatable
    #[arg(long = "alias", value_name = "HEADING=KEY")]
    pub aliases: Vec<String>,

    /// Fail when more errors than this are reported
    #[arg(long)]
    pub max_errors: Option<usize>,
}

impl Cli {
    /// Builder settings from the command-line flags.
    pub fn builder_config(&self) -> Result<BuilderConfig> {
        let mut config = BuilderConfig::default()
            .with_id_range(self.id_min, self.id_max)
            .with_copy_depth(self.depth);
        for definition in &self.aliases {
            let (heading, key) = KeyTable::parse_alias(definition)?;
            config = config.with_alias(&heading, key);
        }
        config.validate()?;
        Ok(config)
    }
}

/// Run the CLI.
pub fn run() -> Result<()> {
    execute(Cli::parse())
}

/// Run an already parsed command line.
pub fn execute(cli: Cli) -> Result<()> {
    let config = cli.builder_config()?;
    let output = convert_file(&cli.input, config, cli.reference.as_deref())?;

    match &cli.output {
        Some(path) => save_yaml(&output.repository, path)?,
        None => YamlWriter::new(io::stdout().lock()).write_repository(&output.repository)?,
    }
    if let Some(path) = &cli.diagnostics {
        fs::write(path, output.diagnostics.to_json()?)?;
    }

    print_summary(&cli, &output);

    let count = output.diagnostics.error_count();
    match cli.max_errors {
        Some(limit) if count > limit => Err(ConverterError::TooManyErrors { count, limit }),
        _ => Ok(()),
    }
}

/// Summary on stderr; stdout may carry the repository.
fn print_summary(cli: &Cli, output: &BuildOutput) {
    let repository = &output.repository;
    let diagnostics = &output.diagnostics;

    eprintln!(
        "{} {}",
        style("Converted").bold(),
        style(cli.input.display()).cyan()
    );
    if !repository.name.is_empty() {
        eprintln!("  Repository: {}", style(&repository.name).green());
    }
    eprintln!("  Fields: {}", repository.fields.len());
    eprintln!("  Code sets: {}", repository.code_sets.len());
    eprintln!("  Components: {}", repository.components.len());
    eprintln!("  Groups: {}", repository.groups.len());
    eprintln!("  Messages: {}", repository.messages.len());

    let warnings = diagnostics.count(Severity::Warn);
    if warnings > 0 {
        eprintln!("  Warnings: {}", style(warnings).yellow().bold());
    }
    let errors = diagnostics.error_count();
    if errors > 0 {
        eprintln!("  Errors: {}", style(errors).red().bold());
        for record in diagnostics.iter().filter(|d| d.severity >= Severity::Error) {
            eprintln!("    {record}");
        }
    }

    if let Some(path) = &cli.output {
        eprintln!();
        eprintln!("{} {}", style("Saved to:").green().bold(), path.display());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::ColumnKey;

    #[test]
    fn test_cli_parse_defaults() {
        let cli = Cli::parse_from(["md2orchestra", "orders.md"]);
        assert_eq!(cli.input, PathBuf::from("orders.md"));
        assert!(cli.output.is_none());
        assert_eq!(cli.depth, CopyDepth::Limited(1));
        assert_eq!(cli.id_min, DEFAULT_ID_MIN);
        assert!(cli.max_errors.is_none());
    }

    #[test]
    fn test_cli_parse_options() {
        let cli = Cli::parse_from([
            "md2orchestra",
            "orders.md",
            "-o",
            "out.yaml",
            "--depth",
            "unbounded",
            "--alias",
            "Code=value",
            "--alias",
            "Field=name",
            "--max-errors",
            "0",
        ]);
        assert_eq!(cli.output, Some(PathBuf::from("out.yaml")));
        assert_eq!(cli.depth, CopyDepth::Unbounded);
        assert_eq!(cli.aliases.len(), 2);
        assert_eq!(cli.max_errors, Some(0));

        let config = cli.builder_config().unwrap();
        assert_eq!(config.keys.key_for("field"), Some(ColumnKey::Name));
    }

    #[test]
    fn test_cli_rejects_bad_depth() {
        assert!(Cli::try_parse_from(["md2orchestra", "orders.md", "--depth", "deep"]).is_err());
    }

    #[test]
    fn test_bad_alias_is_config_error() {
        let cli = Cli::parse_from(["md2orchestra", "orders.md", "--alias", "Code"]);
        assert!(matches!(
            cli.builder_config(),
            Err(ConverterError::InvalidAlias(_))
        ));
    }

    #[test]
    fn test_bad_id_range_is_config_error() {
        let cli = Cli::parse_from(["md2orchestra", "orders.md", "--id-min", "9", "--id-max", "9"]);
        assert!(cli.builder_config().is_err());
    }
}
