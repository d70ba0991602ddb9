use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use json_schema_allof_core::{
    create_deep_all_of_merge, create_merger, create_shallow_all_of_merge, CheckName,
    FailurePolicy, MergeOptions,
};
use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Write};
use std::path::PathBuf;
use tracing::level_filters::LevelFilter;

#[derive(Parser)]
#[command(name = "json-schema-allof")]
#[command(about = "Merge the allOf combinators of a JSON Schema into equivalent plain schemas")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging (sets log level to debug)
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Merge allOf in a JSON Schema document
    Merge {
        /// Input JSON Schema file
        input: PathBuf,

        /// Output merged schema file (defaults to stdout if not specified)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Only merge the root node's allOf, leaving nested schemas untouched
        #[arg(long)]
        shallow: bool,

        /// JSON file with merge options (kebab-case keys); flags below override it
        #[arg(long)]
        config: Option<PathBuf>,

        /// Checks to run, in evaluation order (defaults to all)
        #[arg(long, value_enum, value_delimiter = ',', conflicts_with = "no_checks")]
        checks: Option<Vec<CheckArg>>,

        /// Disable every check (best-effort merge)
        #[arg(long)]
        no_checks: bool,

        /// Max nesting depth for traversal and recursive merges [default: 50]
        #[arg(long)]
        max_depth: Option<usize>,

        /// What deep merge does when a subtree fails a check [default: abort]
        #[arg(long, value_enum)]
        on_failure: Option<FailureArg>,

        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Pretty)]
        format: OutputFormat,
    },
}

#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum)]
enum CheckArg {
    IncompatibleTypes,
    IncompatibleEnum,
    NoConsistentResolution,
    IncompatibleBounds,
    ResidualFragment,
}

impl From<CheckArg> for CheckName {
    fn from(val: CheckArg) -> Self {
        match val {
            CheckArg::IncompatibleTypes => CheckName::IncompatibleTypes,
            CheckArg::IncompatibleEnum => CheckName::IncompatibleEnum,
            CheckArg::NoConsistentResolution => CheckName::NoConsistentResolution,
            CheckArg::IncompatibleBounds => CheckName::IncompatibleBounds,
            CheckArg::ResidualFragment => CheckName::ResidualFragment,
        }
    }
}

#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum)]
enum FailureArg {
    Abort,
    PassThrough,
}

impl From<FailureArg> for FailurePolicy {
    fn from(val: FailureArg) -> Self {
        match val {
            FailureArg::Abort => FailurePolicy::Abort,
            FailureArg::PassThrough => FailurePolicy::PassThrough,
        }
    }
}

#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum)]
enum OutputFormat {
    Pretty,
    Compact,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so stdout stays clean for JSON
    let log_level = if cli.verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::WARN
    };
    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Merge {
            input,
            output,
            shallow,
            config,
            checks,
            no_checks,
            max_depth,
            on_failure,
            format,
        } => {
            let file = File::open(&input)
                .with_context(|| format!("Failed to open input file: {}", input.display()))?;
            let reader = BufReader::new(file);
            let schema: serde_json::Value = serde_json::from_reader(reader)
                .with_context(|| format!("Failed to parse schema from: {}", input.display()))?;

            let mut options = match &config {
                Some(path) => {
                    let text = fs::read_to_string(path).with_context(|| {
                        format!("Failed to read config file: {}", path.display())
                    })?;
                    MergeOptions::from_json(&text).map_err(|e| {
                        anyhow::Error::from(e)
                            .context(format!("Invalid config file: {}", path.display()))
                    })?
                }
                None => MergeOptions::default(),
            };
            if no_checks {
                options.checks = Vec::new();
            } else if let Some(selected) = checks {
                options.checks = selected.into_iter().map(CheckName::from).collect();
            }
            if let Some(max_depth) = max_depth {
                options.max_depth = max_depth;
            }
            if let Some(on_failure) = on_failure {
                options.on_failure = on_failure.into();
            }

            let shallow_merge = create_shallow_all_of_merge(create_merger(options));
            let result = if shallow {
                shallow_merge.merge(schema)
            } else {
                create_deep_all_of_merge(shallow_merge).merge(schema)
            }
            .map_err(|e| anyhow::Error::from(e).context("Merge failed"))?;

            for advisory in &result.advisories {
                eprintln!(
                    "Warning: [{}] {}: {}",
                    advisory.check, advisory.path, advisory.message
                );
            }

            write_json(&result.schema, output.as_ref(), format)?;
        }
    }

    Ok(())
}

fn write_json<T: serde::Serialize>(
    val: &T,
    path: Option<&PathBuf>,
    format: OutputFormat,
) -> Result<()> {
    let mut writer: Box<dyn Write> = if let Some(p) = path {
        let file = File::create(p)
            .with_context(|| format!("Failed to create output file: {}", p.display()))?;
        Box::new(BufWriter::new(file))
    } else {
        Box::new(BufWriter::new(io::stdout()))
    };

    match format {
        OutputFormat::Pretty => {
            serde_json::to_writer_pretty(&mut writer, val).context("Failed to write JSON")?;
        }
        OutputFormat::Compact => {
            serde_json::to_writer(&mut writer, val).context("Failed to write JSON")?;
        }
    }

    writeln!(writer).context("Failed to write trailing newline")?;
    writer.flush().context("Failed to flush output")?;

    Ok(())
}
