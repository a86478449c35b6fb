#![deny(unsafe_code)]

//! autorequire CLI: require completions and path queries over a Rojo project.

use std::path::PathBuf;

use anyhow::Result;
use autorequire_cli::{Project, cmd_complete, cmd_config, cmd_path, cmd_tree};
use autorequire_config::ConfigReader;
use autorequire_core::{Position, Session, SourcemapWatcher};
use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// autorequire: find, path, and insert `require`s for Rojo projects.
#[derive(Parser)]
#[command(name = "autorequire", version, about, long_about = None)]
struct Cli {
    /// Project root.
    #[arg(short = 'C', long, default_value = ".")]
    project: PathBuf,

    /// Path to the configuration file, relative to the project root.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Increase log verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List require candidates at a cursor position.
    Complete {
        /// Sourcemap JSON written by `rojo sourcemap`.
        #[arg(long, default_value = "sourcemap.json")]
        sourcemap: PathBuf,

        /// The file being edited.
        #[arg(long)]
        document: PathBuf,

        /// Zero-based cursor line.
        #[arg(long)]
        line: u32,

        /// Zero-based cursor column, in characters.
        #[arg(long)]
        column: u32,

        /// Print the document after accepting the first candidate instead.
        #[arg(long)]
        apply: bool,
    },

    /// Print the require expression from one file to a module.
    Path {
        #[arg(long, default_value = "sourcemap.json")]
        sourcemap: PathBuf,

        /// The requiring file.
        #[arg(long)]
        from: PathBuf,

        /// Name of the module to require.
        #[arg(long)]
        to: String,
    },

    /// Print the classified instance tree.
    Tree {
        #[arg(long, default_value = "sourcemap.json")]
        sourcemap: PathBuf,
    },

    /// Validate and display configuration.
    Config {
        /// Show the resolved configuration.
        #[arg(long)]
        show: bool,
    },

    /// Run `rojo sourcemap --watch` and rebuild the tree on every change.
    Watch,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    let project = Project::new(&cli.project, cli.config.as_deref());

    let output = match cli.command {
        Commands::Complete {
            sourcemap,
            document,
            line,
            column,
            apply,
        } => {
            cmd_complete(
                &project,
                &sourcemap,
                &document,
                Position::new(line, column),
                apply,
            )
            .await?
        }
        Commands::Path {
            sourcemap,
            from,
            to,
        } => cmd_path(&project, &sourcemap, &from, &to).await?,
        Commands::Tree { sourcemap } => cmd_tree(&project, &sourcemap).await?,
        Commands::Config { show } => cmd_config(&project, show).await?,
        Commands::Watch => {
            cmd_watch(&project).await?;
            return Ok(());
        }
    };

    println!("{output}");
    Ok(())
}

async fn cmd_watch(project: &Project) -> Result<()> {
    let reader = ConfigReader::new(&project.config_path);
    let mut session = Session::new(&project.root, reader.config().clone());
    let mut watcher = SourcemapWatcher::new(&project.root).with_config_reader(reader);

    let cancel = CancellationToken::new();
    let on_ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Ctrl-C received, stopping watcher");
        }
        on_ctrl_c.cancel();
    });

    let summary = watcher.run(&mut session, cancel).await?;
    info!(
        applied = summary.applied,
        rejected = summary.rejected,
        "Watcher stopped"
    );
    Ok(())
}
