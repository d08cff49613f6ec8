//! binsbom: SBOM generation from compiled binaries.

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use binsbom::{
    cli,
    config::{self, AppConfig, ConfigPreset, DiffFormat},
    generate::OutputFormat,
    pipeline::exit_codes,
};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Long version string listing supported formats
const fn build_long_version() -> &'static str {
    concat!(
        env!("CARGO_PKG_VERSION"),
        "\n\nInput binaries:",
        "\n  ELF (32/64-bit), Mach-O (thin and universal), PE32/PE32+, ar archives",
        "\n\nOutput formats:",
        "\n  spdx-2.3 (tag-value), spdx-3.0, spdx-3.0.1 (JSON-LD)",
        "\n  cyclonedx-1.4, cyclonedx-1.5, cyclonedx-1.6 (JSON)"
    )
}

#[derive(Parser)]
#[command(name = "binsbom")]
#[command(version, long_version = build_long_version())]
#[command(about = "Generate SBOMs from compiled binaries", long_about = None)]
#[command(after_help = "EXIT CODES:
    0  Success
    1  Changes detected (diff with --fail-on-change), or validation failed
    2  Document written, but some inputs were skipped
    3  Error occurred

EXAMPLES:
    # CycloneDX for everything under build/
    binsbom generate build/ --recursive -O app.cdx.json

    # Reproducible SPDX 3 document
    binsbom generate app libfoo.so --format spdx-3.0.1 --preset reproducible

    # Compare two releases in CI
    binsbom diff v1.cdx.json v2.cdx.json --fail-on-change

    # Check a document before publishing it
    binsbom validate app.spdx --fail-on-warning")]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Path to configuration file
    #[arg(long, global = true, env = "BINSBOM_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

// ============================================================================
// Command argument structs
// ============================================================================

/// Arguments for the `generate` subcommand
#[derive(Parser)]
struct GenerateArgs {
    /// Binaries or directories to scan
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// Output format (spdx-2.3, spdx-3.0, spdx-3.0.1, cyclonedx-1.4, cyclonedx-1.5, cyclonedx-1.6)
    #[arg(short, long)]
    format: Option<String>,

    /// Output file path (stdout if not specified)
    #[arg(short = 'O', long)]
    output_file: Option<PathBuf>,

    /// Start from a named preset (default, reproducible, minimal, full)
    #[arg(long)]
    preset: Option<String>,

    /// Walk directories recursively
    #[arg(short, long)]
    recursive: bool,

    /// Worker threads for extraction (0 = one per core)
    #[arg(short = 'j', long)]
    threads: Option<usize>,

    /// Document name (defaults to the first root component)
    #[arg(long)]
    name: Option<String>,

    /// Fixed RFC 3339 creation time, for reproducible output
    #[arg(long, env = "BINSBOM_TIMESTAMP")]
    timestamp: Option<String>,

    /// Organization recorded as document creator
    #[arg(long)]
    organization: Option<String>,

    /// Compiler-plugin debug hints (JSON)
    #[arg(long)]
    debug_hints: Option<PathBuf>,

    /// Per-component metadata overrides (YAML)
    #[arg(long)]
    overrides: Option<PathBuf>,

    /// Stop at the first file that fails to extract
    #[arg(long)]
    strict: bool,

    /// Do not read license files or infer package managers from install paths
    #[arg(long)]
    no_detect: bool,

    /// Write compact JSON
    #[arg(long)]
    compact: bool,
}

/// Arguments for the `diff` subcommand
#[derive(Parser)]
struct DiffArgs {
    /// Path to the old/baseline document
    old: PathBuf,

    /// Path to the new document
    new: PathBuf,

    /// Report format
    #[arg(short, long, value_enum)]
    output: Option<DiffFormat>,

    /// Output file path (stdout if not specified)
    #[arg(short = 'O', long)]
    output_file: Option<PathBuf>,

    /// Component fields to leave out of modifications (comma separated)
    #[arg(long, value_delimiter = ',')]
    ignore: Vec<String>,

    /// Exit with code 1 if any changes detected
    #[arg(long)]
    fail_on_change: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract binaries and write an SBOM
    Generate(GenerateArgs),

    /// Show what extraction finds in binaries, without generating a document
    Inspect {
        /// Binaries or directories to scan
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        /// Output format
        #[arg(short, long, value_enum, default_value = "text")]
        output: cli::InspectFormat,

        /// Walk directories recursively
        #[arg(short, long)]
        recursive: bool,
    },

    /// Compare two generated documents
    Diff(DiffArgs),

    /// Check SPDX or CycloneDX documents for structural errors
    Validate {
        /// Documents to validate
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        /// Report format
        #[arg(short, long, value_enum, default_value = "text")]
        output: cli::ValidateFormat,

        /// Output file path (stdout if not specified)
        #[arg(short = 'O', long)]
        output_file: Option<PathBuf>,

        /// Treat warnings as failures
        #[arg(long)]
        fail_on_warning: bool,
    },

    /// Print the canonical bytes of a document for signing
    Canonicalize {
        /// Document to canonicalize
        input: PathBuf,

        /// Output file path (stdout if not specified)
        #[arg(short = 'O', long)]
        output_file: Option<PathBuf>,
    },

    /// Print an example configuration file, or the effective one
    Config {
        /// Show the configuration after discovery and presets instead of the example
        #[arg(long)]
        effective: bool,

        /// List available presets
        #[arg(long)]
        presets: bool,
    },

    /// Print the JSON Schema of the configuration file
    ConfigSchema {
        /// Output file path (stdout if not specified)
        #[arg(short = 'O', long)]
        output: Option<PathBuf>,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

// ============================================================================
// Configuration assembly
// ============================================================================

/// File config (or preset) with CLI flags layered on top.
fn load_config(cli: &Cli, preset: Option<&str>, overrides: &AppConfig) -> Result<AppConfig> {
    let (mut config, loaded_from) = config::load_or_default(cli.config.as_deref());
    if let Some(path) = &loaded_from {
        tracing::debug!("using config file {}", path.display());
    }
    if let Some(name) = preset {
        let preset = ConfigPreset::from_name(name)
            .with_context(|| format!("unknown preset '{name}'"))?;
        let mut base = AppConfig::from_preset(preset);
        base.merge(&config);
        config = base;
    }
    config.merge(overrides);
    if cli.quiet {
        config.behavior.quiet = true;
    }
    Ok(config)
}

fn generate_overrides(args: &GenerateArgs) -> Result<AppConfig> {
    if let Some(format) = &args.format {
        // Reject typos before any file is read.
        format.parse::<OutputFormat>()?;
    }
    let mut builder = AppConfig::builder()
        .recursive(args.recursive)
        .threads(args.threads.unwrap_or(0))
        .debug_hints(args.debug_hints.clone())
        .overrides(args.overrides.clone())
        .document_name(args.name.clone())
        .timestamp(args.timestamp.clone())
        .organization(args.organization.clone())
        .output_file(args.output_file.clone())
        .pretty(!args.compact)
        .strict(args.strict)
        .skip_detection(args.no_detect);
    if let Some(format) = &args.format {
        builder = builder.format(format.clone());
    }
    Ok(builder.build())
}

fn init_tracing(cli: &Cli) {
    let log_level = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else {
        "info"
    };
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| log_level.to_string()),
        ))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();
}

fn run(cli: &Cli) -> Result<i32> {
    match &cli.command {
        Commands::Generate(args) => {
            let overrides = generate_overrides(args)?;
            let config = load_config(cli, args.preset.as_deref(), &overrides)?;
            cli::run_generate(&args.inputs, &config)
        }

        Commands::Inspect {
            inputs,
            output,
            recursive,
        } => {
            let overrides = AppConfig::builder().recursive(*recursive).build();
            let config = load_config(cli, None, &overrides)?;
            cli::run_inspect(inputs, *output, &config)
        }

        Commands::Diff(args) => {
            let mut builder = AppConfig::builder()
                .output_file(args.output_file.clone())
                .ignore_fields(args.ignore.clone())
                .fail_on_change(args.fail_on_change);
            if let Some(format) = args.output {
                builder = builder.diff_format(format);
            }
            let config = load_config(cli, None, &builder.build())?;
            cli::run_diff(&args.old, &args.new, &config)
        }

        Commands::Validate {
            inputs,
            output,
            output_file,
            fail_on_warning,
        } => {
            let overrides = AppConfig::builder().output_file(output_file.clone()).build();
            let config = load_config(cli, None, &overrides)?;
            cli::run_validate(inputs, *output, *fail_on_warning, &config)
        }

        Commands::Canonicalize { input, output_file } => {
            cli::run_canonicalize(input, output_file.as_ref())
        }

        Commands::Config { effective, presets } => {
            if *presets {
                for preset in ConfigPreset::all() {
                    println!("{:<14} {}", preset.name(), preset.description());
                }
            } else if *effective {
                let config = load_config(cli, None, &AppConfig::default())?;
                print!("{}", serde_yaml::to_string(&config)?);
            } else {
                print!("{}", config::generate_example_config());
            }
            Ok(exit_codes::SUCCESS)
        }

        Commands::ConfigSchema { output } => {
            let schema = config::generate_json_schema();
            match output {
                Some(path) => {
                    std::fs::write(path, &schema)
                        .with_context(|| format!("writing {}", path.display()))?;
                    tracing::info!("schema written to {}", path.display());
                }
                None => println!("{schema}"),
            }
            Ok(exit_codes::SUCCESS)
        }

        Commands::Completions { shell } => {
            generate(*shell, &mut Cli::command(), "binsbom", &mut std::io::stdout());
            Ok(exit_codes::SUCCESS)
        }
    }
}

fn main() {
    let cli = Cli::parse();
    init_tracing(&cli);

    let code = match run(&cli) {
        Ok(code) => code,
        Err(e) => {
            tracing::error!("{e:#}");
            exit_codes::ERROR
        }
    };
    std::process::exit(code);
}
