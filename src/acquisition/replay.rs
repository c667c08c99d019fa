//! JSON-lines replay of recorded radar sessions.
//!
//! One observation per line: `{"x": -120, "y": 1850, "speed": -35}` or
//! `null` for "no object". Lines are served one per poll, so replay speed
//! follows the reader cadence. Used with recordings or a simulator:
//! `./radar-entry --replay walk.jsonl` / `gen | ./radar-entry --replay -`

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::time::Instant;
use tracing::warn;

use super::{SampleSource, SourceError, SourceEvent};
use crate::types::Sample;

/// Serialized form of one recorded sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplayRecord {
    pub x: i32,
    pub y: i32,
    #[serde(default)]
    pub speed: i32,
}

impl ReplayRecord {
    pub const fn into_sample(self, timestamp: Instant) -> Sample {
        Sample::new(self.x, self.y, self.speed, timestamp)
    }
}

/// Replays observations from any line-oriented reader.
pub struct ReplaySource<R> {
    reader: R,
    line_buffer: String,
    name: String,
    skipped: u64,
}

impl<R> ReplaySource<R>
where
    R: AsyncBufRead + Unpin + Send + 'static,
{
    pub fn new(reader: R, name: impl Into<String>) -> Self {
        Self {
            reader,
            line_buffer: String::with_capacity(128),
            name: name.into(),
            skipped: 0,
        }
    }

    /// Lines that could not be parsed and were skipped.
    pub const fn skipped_lines(&self) -> u64 {
        self.skipped
    }
}

impl ReplaySource<BufReader<tokio::fs::File>> {
    pub async fn from_file(path: &Path) -> Result<Self, SourceError> {
        let file = tokio::fs::File::open(path)
            .await
            .map_err(|source| SourceError::Open {
                device: path.display().to_string(),
                source,
            })?;
        Ok(Self::new(BufReader::new(file), format!("replay:{}", path.display())))
    }
}

impl ReplaySource<BufReader<tokio::io::Stdin>> {
    pub fn stdin() -> Self {
        Self::new(BufReader::new(tokio::io::stdin()), "replay:stdin")
    }
}

#[async_trait]
impl<R> SampleSource for ReplaySource<R>
where
    R: AsyncBufRead + Unpin + Send + 'static,
{
    async fn poll_latest(&mut self) -> Result<SourceEvent, SourceError> {
        loop {
            self.line_buffer.clear();
            let bytes = self.reader.read_line(&mut self.line_buffer).await?;
            if bytes == 0 {
                return Ok(SourceEvent::Eof);
            }
            let line = self.line_buffer.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            match serde_json::from_str::<Option<ReplayRecord>>(line) {
                Ok(record) => {
                    let now = Instant::now();
                    return Ok(SourceEvent::Observation(
                        record.map(|r| r.into_sample(now)),
                    ));
                }
                Err(e) => {
                    self.skipped += 1;
                    warn!("[ReplaySource] Failed to parse line: {}", e);
                    // Skip malformed lines and keep reading
                }
            }
        }
    }

    fn source_name(&self) -> &str {
        &self.name
    }
}
