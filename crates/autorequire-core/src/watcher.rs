//! Feeds snapshots from a long-running sourcemap process into a [`Session`].
//!
//! The process prints one complete sourcemap per line on stdout whenever the
//! project changes. Each line is applied as a whole-tree replacement. Lines
//! on stderr are logged and otherwise ignored.

use std::path::PathBuf;
use std::process::Stdio;

use autorequire_config::ConfigReader;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::session::Session;

/// Errors that stop the watcher.
#[derive(Debug, thiserror::Error)]
pub enum WatchError {
    #[error("failed to start `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to read sourcemap output: {0}")]
    Io(#[from] std::io::Error),
}

/// The command that emits sourcemaps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchCommand {
    pub program: String,
    pub args: Vec<String>,
}

impl Default for WatchCommand {
    fn default() -> Self {
        Self {
            program: "rojo".to_string(),
            args: vec!["sourcemap".to_string(), "--watch".to_string()],
        }
    }
}

/// Counts of snapshot lines seen during a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WatchSummary {
    pub applied: usize,
    pub rejected: usize,
}

/// Runs a [`WatchCommand`] in a project directory.
#[derive(Debug)]
pub struct SourcemapWatcher {
    command: WatchCommand,
    workdir: PathBuf,
    config: Option<ConfigReader>,
}

impl SourcemapWatcher {
    pub fn new(workdir: impl Into<PathBuf>) -> Self {
        Self {
            command: WatchCommand::default(),
            workdir: workdir.into(),
            config: None,
        }
    }

    pub fn with_command(mut self, command: WatchCommand) -> Self {
        self.command = command;
        self
    }

    /// Re-read configuration from `reader` before applying each snapshot.
    pub fn with_config_reader(mut self, reader: ConfigReader) -> Self {
        self.config = Some(reader);
        self
    }

    /// Apply snapshots to `session` until the process exits or `cancel` fires.
    pub async fn run(
        &mut self,
        session: &mut Session,
        cancel: CancellationToken,
    ) -> Result<WatchSummary, WatchError> {
        let mut child = Command::new(&self.command.program)
            .args(&self.command.args)
            .current_dir(&self.workdir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| WatchError::Spawn {
                program: self.command.program.clone(),
                source,
            })?;

        info!(
            program = %self.command.program,
            dir = %self.workdir.display(),
            "Sourcemap watcher started"
        );

        if let Some(stderr) = child.stderr.take() {
            tokio::spawn(async move {
                let mut lines = BufReader::new(stderr).lines();
                while let Ok(Some(line)) = lines.next_line().await {
                    warn!(target: "autorequire::watcher::stderr", "{line}");
                }
            });
        }

        let Some(stdout) = child.stdout.take() else {
            return Ok(WatchSummary::default());
        };
        let mut lines = BufReader::new(stdout).lines();
        let mut summary = WatchSummary::default();

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    info!("Sourcemap watcher cancelled");
                    if let Err(e) = child.kill().await {
                        debug!(error = %e, "Sourcemap process already gone");
                    }
                    break;
                }
                line = lines.next_line() => {
                    let Some(line) = line? else {
                        let status = child.wait().await?;
                        info!(%status, "Sourcemap process exited");
                        break;
                    };
                    if line.trim().is_empty() {
                        continue;
                    }
                    self.reload_config(session).await;
                    if session.apply_snapshot(&line) {
                        summary.applied += 1;
                        info!(
                            rebuild = summary.applied,
                            nodes = session.tree().map_or(0, |tree| tree.len()),
                            "Instance tree rebuilt"
                        );
                    } else {
                        summary.rejected += 1;
                    }
                }
            }
        }

        Ok(summary)
    }

    async fn reload_config(&mut self, session: &mut Session) {
        if let Some(reader) = &mut self.config {
            let config = reader.reload().await.clone();
            session.reconfigure(config);
        }
    }
}
