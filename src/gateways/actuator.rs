//! Door actuator gateway.
//!
//! The door is opened by a 433 MHz relay receiver. `codesend <code>` keys the
//! transmitter; the code selects how long the relay holds. The gateway owns
//! its own minimum-interval limiter so a burst of triggers becomes one pulse.

use async_trait::async_trait;
use std::process::{ExitStatus, Stdio};
use thiserror::Error;
use tokio::process::Command;
use tokio::time::Instant;
use tracing::{info, warn};

use super::rate_limiter::MinIntervalLimiter;
use crate::config::{ActuatorConfig, ActuatorMode};

// ============================================================================
// Error Types
// ============================================================================

#[derive(Error, Debug)]
pub enum ActuatorError {
    #[error("Failed to spawn '{path}': {source}")]
    Spawn {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("codesend {code} exited with {status}")]
    Failed { code: u32, status: ExitStatus },
}

/// What happened to an open command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenOutcome {
    /// Command went out.
    Sent,
    /// Dropped by the minimum-interval limiter.
    Suppressed,
}

// ============================================================================
// Actuator Trait
// ============================================================================

#[async_trait]
pub trait DoorActuator: Send + 'static {
    async fn open(&mut self) -> Result<OpenOutcome, ActuatorError>;

    fn name(&self) -> &str;
}

/// Build the actuator selected by `actuator.mode`.
pub fn build_actuator(config: &ActuatorConfig) -> Box<dyn DoorActuator> {
    match config.mode {
        ActuatorMode::Codesend => Box::new(CodesendActuator::new(config)),
        ActuatorMode::LogOnly => Box::new(LogActuator::new(config)),
    }
}

// ============================================================================
// Codesend Actuator
// ============================================================================

pub struct CodesendActuator {
    path: String,
    code: u32,
    relay_secs: u32,
    limiter: MinIntervalLimiter,
}

impl CodesendActuator {
    pub fn new(config: &ActuatorConfig) -> Self {
        Self {
            path: config.codesend_path.clone(),
            code: config.relay_code(),
            relay_secs: config.relay_activation_secs,
            limiter: MinIntervalLimiter::new(config.min_interval()),
        }
    }
}

#[async_trait]
impl DoorActuator for CodesendActuator {
    async fn open(&mut self) -> Result<OpenOutcome, ActuatorError> {
        let now = Instant::now();
        if !self.limiter.permits(now) {
            info!(
                remaining_ms = self.limiter.remaining(now).as_millis(),
                "Door command suppressed (minimum interval)"
            );
            return Ok(OpenOutcome::Suppressed);
        }
        self.limiter.record(now);

        let status = Command::new(&self.path)
            .arg(self.code.to_string())
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .status()
            .await
            .map_err(|source| ActuatorError::Spawn {
                path: self.path.clone(),
                source,
            })?;

        if !status.success() {
            warn!(code = self.code, %status, "codesend failed");
            return Err(ActuatorError::Failed {
                code: self.code,
                status,
            });
        }
        info!(code = self.code, relay_secs = self.relay_secs, "📡 Door code sent");
        Ok(OpenOutcome::Sent)
    }

    fn name(&self) -> &str {
        "codesend"
    }
}

// ============================================================================
// Log-only Actuator (dry run)
// ============================================================================

pub struct LogActuator {
    code: u32,
    limiter: MinIntervalLimiter,
    sent: u64,
}

impl LogActuator {
    pub fn new(config: &ActuatorConfig) -> Self {
        Self {
            code: config.relay_code(),
            limiter: MinIntervalLimiter::new(config.min_interval()),
            sent: 0,
        }
    }

    pub const fn sent(&self) -> u64 {
        self.sent
    }
}

#[async_trait]
impl DoorActuator for LogActuator {
    async fn open(&mut self) -> Result<OpenOutcome, ActuatorError> {
        let now = Instant::now();
        if !self.limiter.permits(now) {
            info!("[dry-run] Door command suppressed (minimum interval)");
            return Ok(OpenOutcome::Suppressed);
        }
        self.limiter.record(now);
        self.sent += 1;
        info!(code = self.code, "[dry-run] Would send door code");
        Ok(OpenOutcome::Sent)
    }

    fn name(&self) -> &str {
        "log-only"
    }
}
