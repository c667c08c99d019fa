//! On-demand identification gateway.
//!
//! The engine only needs a yes/no answer within a bounded time. The
//! production answer comes from an external beacon scanner process; the
//! static variant serves bench runs and tests.

use async_trait::async_trait;
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::process::Command;
use tracing::{debug, warn};

use crate::config::{IdentificationConfig, IdentificationMode};

// ============================================================================
// Error Types
// ============================================================================

#[derive(Error, Debug)]
pub enum IdentificationError {
    #[error("Failed to spawn scanner '{command}': {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

// ============================================================================
// Identifier Trait
// ============================================================================

/// Bounded-duration authorization check.
#[async_trait]
pub trait Identifier: Send + Sync + 'static {
    /// Return `Ok(true)` when an authorized credential was seen within
    /// `max_duration`. Implementations must not exceed the bound.
    async fn identify(&self, max_duration: Duration) -> Result<bool, IdentificationError>;

    fn name(&self) -> &str;
}

/// Build the identifier selected by `identification.mode`.
pub fn build_identifier(config: &IdentificationConfig) -> Arc<dyn Identifier> {
    match config.mode {
        IdentificationMode::Command => {
            Arc::new(CommandIdentifier::new(&config.command, config.args.clone()))
        }
        IdentificationMode::AlwaysAuthorized => Arc::new(StaticIdentifier::new(true)),
        IdentificationMode::AlwaysDenied => Arc::new(StaticIdentifier::new(false)),
    }
}

// ============================================================================
// Command Identifier (external beacon scanner)
// ============================================================================

/// Runs `<command> <args..> --duration <secs>`; exit status 0 means a known
/// beacon was seen.
pub struct CommandIdentifier {
    command: String,
    args: Vec<String>,
}

impl CommandIdentifier {
    pub fn new(command: &str, args: Vec<String>) -> Self {
        Self {
            command: command.to_string(),
            args,
        }
    }
}

#[async_trait]
impl Identifier for CommandIdentifier {
    async fn identify(&self, max_duration: Duration) -> Result<bool, IdentificationError> {
        let mut child = Command::new(&self.command)
            .args(&self.args)
            .arg("--duration")
            .arg(format!("{:.2}", max_duration.as_secs_f64()))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| IdentificationError::Spawn {
                command: self.command.clone(),
                source,
            })?;

        match tokio::time::timeout(max_duration, child.wait()).await {
            Ok(status) => {
                let status = status?;
                debug!(command = %self.command, ?status, "Scanner finished");
                Ok(status.success())
            }
            Err(_elapsed) => {
                warn!(
                    command = %self.command,
                    max_ms = max_duration.as_millis(),
                    "Scanner exceeded its time budget, treating as no match"
                );
                if let Err(e) = child.kill().await {
                    debug!(error = %e, "Scanner already gone");
                }
                Ok(false)
            }
        }
    }

    fn name(&self) -> &str {
        &self.command
    }
}

// ============================================================================
// Static Identifier
// ============================================================================

/// Answers every request with a fixed result, optionally after a delay.
pub struct StaticIdentifier {
    authorized: bool,
    latency: Duration,
}

impl StaticIdentifier {
    pub const fn new(authorized: bool) -> Self {
        Self {
            authorized,
            latency: Duration::ZERO,
        }
    }

    /// Answer after `latency` (capped at the request's bound).
    #[must_use]
    pub const fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }
}

#[async_trait]
impl Identifier for StaticIdentifier {
    async fn identify(&self, max_duration: Duration) -> Result<bool, IdentificationError> {
        if self.latency > max_duration {
            tokio::time::sleep(max_duration).await;
            return Ok(false);
        }
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        Ok(self.authorized)
    }

    fn name(&self) -> &str {
        if self.authorized {
            "always-authorized"
        } else {
            "always-denied"
        }
    }
}
