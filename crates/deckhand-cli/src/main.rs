mod commands;

use clap::{Parser, Subcommand};
use clap_complete::Shell;
use commands::{EXIT_CONFIG_ERROR, EXIT_FAILURE, EXIT_MANIFEST_ERROR};
use deckhand_schema::DEFAULT_CONFIG_FILE;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(
    name = "deckhand",
    version,
    about = "Assemble deployment descriptors into one resolved build manifest"
)]
struct Cli {
    /// Path to the build config file.
    #[arg(short, long, default_value = DEFAULT_CONFIG_FILE, global = true)]
    config: PathBuf,

    /// Output results as structured JSON.
    #[arg(long, default_value_t = false, global = true)]
    json: bool,

    /// Enable verbose (debug) logging output.
    #[arg(short, long, default_value_t = false, global = true)]
    verbose: bool,

    /// Enable trace-level logging (more detailed than --verbose).
    #[arg(long, default_value_t = false, global = true)]
    trace: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Discover and merge descriptors into the bundle's build meta.
    Build {
        /// Bundle name; the meta is written to bundles/<bundle>/build_meta.json.
        #[arg(short, long)]
        bundle: String,
    },
    /// Apply aliases and the naming policy to a bundle's build meta.
    Resolve {
        /// Bundle name of a previously built meta.
        #[arg(short, long)]
        bundle: String,
        /// Write the resolved manifest to this file instead of stdout.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Check that every deployment package named by a bundle's meta exists.
    Validate {
        /// Bundle name of a previously built meta.
        #[arg(short, long)]
        bundle: String,
    },
    /// Generate shell completions for bash, zsh, fish, elvish, or powershell.
    Completions {
        /// Shell to generate completions for.
        shell: Shell,
    },
}

fn main() -> ExitCode {
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let msg = info.to_string();
        if msg.contains("Broken pipe")
            || msg.contains("broken pipe")
            || msg.contains("os error 32")
            || msg.contains("failed printing to stdout")
        {
            std::process::exit(0);
        }
        default_hook(info);
    }));

    let cli = Cli::parse();

    let default_level = if cli.trace {
        "trace"
    } else if cli.verbose {
        "debug"
    } else {
        "warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_env("DECKHAND_LOG")
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();

    let json_output = cli.json;

    let result = match cli.command {
        Commands::Build { bundle } => commands::load_builder(&cli.config)
            .and_then(|builder| commands::build::run(&builder, &bundle, json_output)),
        Commands::Resolve { bundle, output } => {
            commands::load_builder(&cli.config).and_then(|builder| {
                commands::resolve::run(&builder, &bundle, output.as_deref(), json_output)
            })
        }
        Commands::Validate { bundle } => commands::load_builder(&cli.config)
            .and_then(|builder| commands::validate::run(&builder, &bundle, json_output)),
        Commands::Completions { shell } => commands::completions::run::<Cli>(shell),
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(msg) => {
            eprintln!("error: {msg}");
            let code = if msg.starts_with("manifest error:") {
                EXIT_MANIFEST_ERROR
            } else if msg.starts_with("config error:") {
                EXIT_CONFIG_ERROR
            } else {
                EXIT_FAILURE
            };
            ExitCode::from(code)
        }
    }
}
