//! # jsv-cli
//!
//! Command-line host for batch JSON Schema validation.
//!
//! Exit status is `0` when every document passed, `1` when at least one
//! document failed and `2` for configuration or usage errors.

use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, bail};
use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use jsv_pipeline::{BatchResult, BatchValidator, ValidateConfig};
use jsv_schema::{UriMapping, UriTranslator};
use serde_json::json;
use tracing::error;
use tracing_subscriber::EnvFilter;

const EXIT_VALIDATION_FAILED: u8 = 1;
const EXIT_CONFIGURATION: u8 = 2;

#[derive(Parser)]
#[command(name = "jsv")]
#[command(about = "Validate JSON documents against the schemas they declare")]
#[command(version)]
struct Cli {
    /// Path to a YAML or JSON configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// More log output (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate every matching document under a directory
    Validate(ValidateArgs),

    /// Print the location a schema URI is read from
    Resolve(ResolveArgs),
}

#[derive(Args)]
struct ValidateArgs {
    /// Directory containing the documents
    source_directory: Option<PathBuf>,

    /// Include pattern, replacing the configured includes (repeatable)
    #[arg(short, long = "include", value_name = "PATTERN")]
    includes: Vec<String>,

    /// Exclude pattern (repeatable)
    #[arg(short = 'x', long = "exclude", value_name = "PATTERN")]
    excludes: Vec<String>,

    /// Serve schemas published under URI from DIR (repeatable)
    #[arg(short, long = "mapping", value_name = "URI=DIR", value_parser = parse_mapping)]
    mappings: Vec<UriMapping>,

    /// Stop at the first violation in each document
    #[arg(long)]
    no_deep_check: bool,

    /// Fail documents without a $schema
    #[arg(long)]
    require_schema: bool,

    /// Do not check schemas against their meta-schema
    #[arg(long)]
    skip_schema_syntax_check: bool,

    /// Summary format written to stdout
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,
}

#[derive(Args)]
struct ResolveArgs {
    /// Schema URI, absolute or relative to the namespace
    uri: String,

    /// Directory relative URIs resolve against
    #[arg(short, long)]
    namespace: Option<PathBuf>,

    /// Serve schemas published under URI from DIR (repeatable)
    #[arg(short, long = "mapping", value_name = "URI=DIR", value_parser = parse_mapping)]
    mappings: Vec<UriMapping>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

/// Split `URI=DIR` at the first `=` following the URI's scheme separator,
/// so the directory may itself contain `=`.
fn parse_mapping(value: &str) -> Result<UriMapping, String> {
    let authority = value
        .find("://")
        .filter(|&i| !value[..i].contains('='))
        .map_or(0, |i| i + "://".len());

    let split = value[authority..]
        .find('=')
        .map(|i| (&value[..authority + i], &value[authority + i + 1..]));
    match split {
        Some((uri, dir)) if !uri.is_empty() && !dir.is_empty() => Ok(UriMapping::new(uri, dir)),
        _ => Err(format!("expected URI=DIR, got '{value}'")),
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.quiet);

    let outcome = match cli.command {
        Commands::Validate(args) => validate(cli.config.as_deref(), args),
        Commands::Resolve(args) => resolve(cli.config.as_deref(), args),
    };

    match outcome {
        Ok(code) => code,
        Err(e) => {
            error!("{e:#}");
            ExitCode::from(EXIT_CONFIGURATION)
        }
    }
}

fn init_tracing(verbose: u8, quiet: bool) {
    let default = match (quiet, verbose) {
        (true, _) => "error",
        (false, 0) => "info",
        (false, 1) => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .with_target(false)
        .init();
}

fn load_config(path: Option<&Path>) -> anyhow::Result<Option<ValidateConfig>> {
    path.map(|p| {
        ValidateConfig::from_file(p)
            .with_context(|| format!("Failed to load configuration {}", p.display()))
    })
    .transpose()
}

fn validate(config_path: Option<&Path>, args: ValidateArgs) -> anyhow::Result<ExitCode> {
    let mut config = match (load_config(config_path)?, args.source_directory) {
        (Some(config), Some(dir)) => ValidateConfig {
            source_directory: dir,
            ..config
        },
        (Some(config), None) => config,
        (None, Some(dir)) => ValidateConfig::new(dir),
        (None, None) => bail!("No source directory given; pass SOURCE_DIRECTORY or --config"),
    };

    if !args.includes.is_empty() {
        config.includes = args.includes;
    }
    config.excludes.extend(args.excludes);
    config.schema_mappings.extend(args.mappings);
    if args.no_deep_check {
        config.deep_check = false;
    }
    if args.require_schema {
        config.require_schema = true;
    }
    if args.skip_schema_syntax_check {
        config.check_schema_syntax = false;
    }

    let validator = BatchValidator::new(config).context("Invalid configuration")?;
    let result = validator
        .validate_source_directory()
        .context("Cannot scan source directory")?;

    match args.format {
        OutputFormat::Text => println!("{}", result.stats),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&json_summary(&result))?),
    }

    match result.into_result() {
        Ok(_) => Ok(ExitCode::SUCCESS),
        Err(e) => {
            error!("{e}");
            Ok(ExitCode::from(EXIT_VALIDATION_FAILED))
        }
    }
}

fn json_summary(result: &BatchResult) -> serde_json::Value {
    let documents: Vec<_> = result
        .outcomes
        .iter()
        .map(|outcome| match &outcome.result {
            Ok(report) => json!({
                "id": outcome.id,
                "success": report.is_success(),
                "messages": report.messages(),
            }),
            Err(e) => json!({
                "id": outcome.id,
                "success": false,
                "error": e.to_string(),
            }),
        })
        .collect();

    json!({
        "success": result.success,
        "documents": result.stats.documents,
        "succeeded": result.stats.succeeded,
        "failed": result.stats.failed,
        "errors": result.stats.errors,
        "warnings": result.stats.warnings,
        "outcomes": documents,
    })
}

fn resolve(config_path: Option<&Path>, args: ResolveArgs) -> anyhow::Result<ExitCode> {
    let config = load_config(config_path)?;

    let namespace = args
        .namespace
        .or_else(|| config.as_ref().map(|c| c.source_directory.clone()));
    let mut mappings = config.map(|c| c.schema_mappings).unwrap_or_default();
    mappings.extend(args.mappings);

    let mut builder = UriTranslator::builder();
    if let Some(dir) = namespace {
        builder = builder.namespace_directory(&dir)?;
    }
    let translator = builder.mappings(&mappings)?.freeze();

    let logical = translator
        .resolve_reference(&args.uri)
        .with_context(|| format!("Cannot resolve '{}'", args.uri))?;
    println!("{}", translator.translate(&logical));
    Ok(ExitCode::SUCCESS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mapping_splits_after_uri() {
        let mapping = parse_mapping("http://example.com/a/=/srv/a").unwrap();
        assert_eq!(mapping.uri, "http://example.com/a/");
        assert_eq!(mapping.directory, Path::new("/srv/a"));
    }

    #[test]
    fn test_mapping_directory_may_contain_equals() {
        let mapping = parse_mapping("http://example.com/=/srv/key=value/schemas").unwrap();
        assert_eq!(mapping.uri, "http://example.com/");
        assert_eq!(mapping.directory, Path::new("/srv/key=value/schemas"));
    }

    #[test]
    fn test_mapping_without_scheme_separator() {
        let mapping = parse_mapping("urn:schemas:=schemas").unwrap();
        assert_eq!(mapping.uri, "urn:schemas:");
        assert_eq!(mapping.directory, Path::new("schemas"));
    }

    #[test]
    fn test_malformed_mapping_rejected() {
        for value in ["no-separator", "=/srv/a", "http://example.com/="] {
            let err = parse_mapping(value).unwrap_err();
            assert!(err.contains("expected URI=DIR"), "{err}");
        }
    }
}
