//! Resolves per-directory code-generation policies for a source tree.
//! Directives are declared in `tsgen-config.toml` at the tree root, keyed
//! by directory, and inherited by every directory below.
use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use tsgen_config::builders::reporter::ReportFormat;
use tsgen_config::core::config::ConfigManager;
use tsgen_config::utils;

#[derive(Parser)]
#[command(name = "tsgen-config")]
#[command(about = "Resolve per-directory TypeScript rule generation policies")]
struct Cli {
    /// Root of the source tree (defaults to the nearest directory holding
    /// tsgen-config.toml)
    #[arg(long, global = true)]
    root: Option<PathBuf>,

    /// Print debug diagnostics
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Text,
    Json,
}

impl From<Format> for ReportFormat {
    fn from(format: Format) -> Self {
        match format {
            Format::Text => ReportFormat::Text,
            Format::Json => ReportFormat::Json,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Create an empty configuration at the tree root
    Init,
    /// Declare a directive for a directory
    Add {
        directory: String,
        directive: String,
        value: String,
    },
    /// Remove a directory's directives (all of them, or one name)
    Remove {
        directory: String,
        directive: Option<String>,
    },
    /// List configured directives
    List,
    /// Check the configuration for problems
    Validate,
    /// Classify files as source, test, excluded, ...
    Classify {
        #[arg(required = true)]
        files: Vec<String>,
        #[arg(long, value_enum, default_value = "text")]
        format: Format,
    },
    /// Show the effective policy of a directory
    Show {
        #[arg(default_value = "")]
        directory: String,
        #[arg(long, value_enum, default_value = "text")]
        format: Format,
    },
    /// Print the rule-shape catalog
    Kinds {
        #[arg(long, value_enum, default_value = "text")]
        format: Format,
    },
    /// Export the configuration as json, yaml or toml
    Export {
        file: PathBuf,
        #[arg(long, default_value = "toml")]
        format: String,
    },
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("tsgen_config=debug")
    } else {
        EnvFilter::new("tsgen_config=warn")
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).without_time())
        .with(filter)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let mut config_manager = match cli.root {
        Some(root) => ConfigManager::new_at(root)?,
        None => ConfigManager::discover()?,
    };

    match cli.command {
        Commands::Init => utils::initialize_repository(&config_manager),
        Commands::Add {
            directory,
            directive,
            value,
        } => utils::add_directive(&mut config_manager, directory, directive, value),
        Commands::Remove {
            directory,
            directive,
        } => utils::remove_directives(&mut config_manager, &directory, directive.as_deref()),
        Commands::List => utils::list_directives(&config_manager),
        Commands::Validate => utils::validate(&config_manager),
        Commands::Classify { files, format } => {
            utils::classify(&config_manager, &files, format.into())
        }
        Commands::Show { directory, format } => {
            utils::show(&config_manager, &directory, format.into())
        }
        Commands::Kinds { format } => utils::show_kinds(format.into()),
        Commands::Export { file, format } => utils::export(&config_manager, &file, &format),
    }
}
