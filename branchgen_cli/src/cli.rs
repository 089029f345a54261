use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};
use branchgen_rs::{BigUint, SelectionSpec, decode_json};
use clap::{Args, Parser, Subcommand, ValueEnum};

#[derive(Parser, Debug)]
#[command(
    name = "branchgen",
    about = "Count and enumerate pipeline branch variants"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print how many variants a selection spec yields
    #[command(name = "count")]
    Count(SpecArgs),
    /// Stream variants in canonical order
    #[command(name = "list")]
    List(ListArgs),
}

impl Commands {
    pub fn spec_args(&self) -> &SpecArgs {
        match self {
            Commands::Count(args) => args,
            Commands::List(args) => &args.spec,
        }
    }
}

#[derive(Args, Debug)]
pub struct SpecArgs {
    /// Number of base branches available for selection
    #[arg(long = "options", value_name = "N")]
    pub options: usize,

    /// JSON file holding the persisted selection record
    #[arg(
        long = "spec",
        value_name = "FILE",
        value_hint = clap::ValueHint::FilePath,
        conflicts_with = "spec_json"
    )]
    pub spec_path: Option<PathBuf>,

    /// Inline persisted selection record, e.g. '{"pick": [1, 3], "count": 10}'.
    /// When neither --spec nor --spec-json is given, every option is tried on its own.
    #[arg(long = "spec-json", value_name = "JSON")]
    pub spec_json: Option<String>,

    /// Also append logs to this file
    #[arg(long = "log-file", value_hint = clap::ValueHint::FilePath)]
    pub log_file: Option<PathBuf>,
}

#[derive(Parser, Debug)]
pub struct ListArgs {
    #[command(flatten)]
    pub spec: SpecArgs,

    /// Global position to resume enumeration from
    #[arg(long = "offset", alias = "resume-from", default_value = "0")]
    pub offset: BigUint,

    /// Variants pulled per batch
    #[arg(long = "batch-size", default_value_t = 1_000)]
    pub batch_size: usize,

    /// Stop after emitting this many variants in this run
    #[arg(long = "limit")]
    pub limit: Option<usize>,

    /// Output format for each emitted variant
    #[arg(long = "format", default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// `<rank>\t<variant>` lines
    Text,
    /// One JSON object per line
    Json,
}

/// Resolved settings for one invocation.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub option_count: usize,
    pub spec: SelectionSpec,
    pub offset: BigUint,
    pub batch_size: usize,
    pub limit: Option<usize>,
    pub format: OutputFormat,
}

impl SpecArgs {
    pub fn load_spec(&self) -> Result<SelectionSpec> {
        let raw = match (&self.spec_path, &self.spec_json) {
            (Some(path), _) => fs::read_to_string(path)
                .with_context(|| format!("Failed to read selection spec {}", path.display()))?,
            (None, Some(json)) => json.clone(),
            (None, None) => "{}".to_string(),
        };
        decode_json(&raw).context("Invalid selection spec")
    }

    pub fn into_config(self) -> Result<RunConfig> {
        Ok(RunConfig {
            option_count: self.options,
            spec: self.load_spec()?,
            offset: BigUint::default(),
            batch_size: 1,
            limit: None,
            format: OutputFormat::Text,
        })
    }
}

impl ListArgs {
    pub fn into_config(self) -> Result<RunConfig> {
        if self.batch_size == 0 {
            return Err(anyhow!("--batch-size must be at least 1"));
        }
        let base = self.spec.into_config()?;
        Ok(RunConfig {
            offset: self.offset,
            batch_size: self.batch_size,
            limit: self.limit,
            format: self.format,
            ..base
        })
    }
}

#[cfg(test)]
mod tests {
    use std::num::NonZeroU64;

    use super::*;
    use branchgen_rs::PrimarySelection;

    #[test]
    fn list_args_resolve_inline_spec() {
        let cli = Cli::try_parse_from([
            "branchgen",
            "list",
            "--options",
            "4",
            "--spec-json",
            r#"{"arrange": 2, "count": 5}"#,
            "--offset",
            "2",
            "--format",
            "json",
        ])
        .expect("parses");
        let Commands::List(args) = cli.command else {
            panic!("expected list command");
        };
        let config = args.into_config().expect("valid config");
        assert_eq!(config.option_count, 4);
        assert_eq!(config.offset, BigUint::from(2u8));
        assert_eq!(config.format, OutputFormat::Json);
        let cap = NonZeroU64::new(5).expect("positive");
        assert_eq!(config.spec, SelectionSpec::arrange(2).with_count_cap(cap));
    }

    #[test]
    fn missing_spec_means_each_option() {
        let cli = Cli::try_parse_from(["branchgen", "count", "--options", "3"]).expect("parses");
        let config = match cli.command {
            Commands::Count(args) => args.into_config().expect("valid config"),
            Commands::List(_) => panic!("expected count command"),
        };
        assert_eq!(config.spec.primary, PrimarySelection::Each);
    }

    #[test]
    fn rejects_conflicting_spec_sources() {
        let parsed = Cli::try_parse_from([
            "branchgen",
            "count",
            "--options",
            "3",
            "--spec",
            "a.json",
            "--spec-json",
            "{}",
        ]);
        assert!(parsed.is_err());
    }

    #[test]
    fn ambiguous_spec_is_an_error() {
        let cli = Cli::try_parse_from([
            "branchgen",
            "count",
            "--options",
            "3",
            "--spec-json",
            r#"{"pick": 1, "arrange": 1}"#,
        ])
        .expect("parses");
        let err = cli.command.spec_args().load_spec().expect_err("ambiguous");
        assert!(format!("{err:#}").contains("both `pick` and `arrange`"));
    }
}
