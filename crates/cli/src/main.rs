mod commands;

use clap::{CommandFactory, Parser, ValueEnum};
use clap_complete::{Shell, generate};
use nianouth_core::BuildMode;
use std::io;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "nianouth")]
#[command(version, about = "Static blog generator with a live preview server", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Parser)]
enum Command {
    /// Initialize a new blog directory
    Init {
        /// Path to create the blog in
        path: PathBuf,
    },

    /// Validate site configuration and posts
    Validate {
        /// Path to blog directory
        path: PathBuf,
    },

    /// Preview site locally with hot reload
    Preview {
        /// Path to blog directory
        path: PathBuf,

        /// Port to serve on (defaults to build.port from site.toml)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Build the static site
    Build {
        /// Path to blog directory
        path: PathBuf,

        /// Output directory (defaults to site.out_dir)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Which base path links are generated under (defaults to NIANOUTH_ENV)
        #[arg(long, value_enum)]
        mode: Option<Mode>,
    },

    /// Generate shell completion scripts
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Mode {
    Development,
    Production,
}

impl From<Mode> for BuildMode {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Development => BuildMode::Development,
            Mode::Production => BuildMode::Production,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("nianouth=info")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Init { path } => commands::init::run(path).await,
        Command::Validate { path } => commands::validate::run(path).await,
        Command::Preview { path, port } => commands::preview::run(path, port).await,
        Command::Build { path, output, mode } => {
            let mode = mode.map(BuildMode::from).unwrap_or_else(BuildMode::from_env);
            commands::build::run(path, output, mode).await
        }
        Command::Completions { shell } => {
            let mut cmd = Cli::command();
            generate(shell, &mut cmd, "nianouth", &mut io::stdout());
            Ok(())
        }
    }
}
