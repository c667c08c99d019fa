//! UART radar source shared by both supported modules.
//!
//! The port is opened at the modules' fixed 256000 baud, 8N1, no flow
//! control. Generic over the byte stream so tests can drive it with an
//! in-memory pipe.

use async_trait::async_trait;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::time::{timeout, Instant};
use tokio_serial::{DataBits, FlowControl, Parity, SerialPortBuilderExt, SerialStream, StopBits};
use tracing::{debug, error, info, trace};

use super::frame::{decode_target, find, Frame, FrameBuffer, RawTarget};
use super::{SampleSource, SourceError, SourceEvent};
use crate::config::defaults::{ACK_TIMEOUT_MS, RADAR_BAUD_RATE, READ_SLICE_MS};
use crate::types::{Observation, Sample};

/// Tail of command and ACK frames (both modules).
pub const COMMAND_TAIL: &[u8] = &[0x04, 0x03, 0x02, 0x01];

const READ_CHUNK: usize = 256;
const MAX_READS_PER_POLL: usize = 4;

// ============================================================================
// Protocol Descriptors
// ============================================================================

/// One configuration command sent on connect.
#[derive(Debug)]
pub struct SetupCommand {
    pub name: &'static str,
    pub bytes: &'static [u8],
    /// Required ACK; `None` for fire-and-forget commands.
    pub ack_prefix: Option<&'static [u8]>,
}

/// Everything that differs between radar modules.
#[derive(Debug)]
pub struct RadarProtocol {
    pub name: &'static str,
    pub header: &'static [u8],
    pub setup: &'static [SetupCommand],
    /// Pause after each setup command.
    pub settle: Duration,
    /// Whether a decoded slot holds a real target.
    pub is_present: fn(&RawTarget) -> bool,
}

// ============================================================================
// Serial Radar Source
// ============================================================================

/// Reads report frames from a radar module and keeps the newest target.
pub struct SerialRadarSource<IO> {
    io: IO,
    protocol: &'static RadarProtocol,
    frames: FrameBuffer,
    chunk: Vec<u8>,
    last: Observation,
    last_frame_at: Instant,
    frame_timeout: Duration,
    frames_decoded: u64,
    artifacts_dropped: u64,
}

impl SerialRadarSource<SerialStream> {
    /// Open the serial port and run the module's configuration sequence.
    pub async fn open(
        device: &str,
        protocol: &'static RadarProtocol,
        frame_timeout: Duration,
    ) -> Result<Self, SourceError> {
        info!(
            device,
            model = protocol.name,
            baud = RADAR_BAUD_RATE,
            "Opening radar UART"
        );
        let port = tokio_serial::new(device, RADAR_BAUD_RATE)
            .data_bits(DataBits::Eight)
            .parity(Parity::None)
            .stop_bits(StopBits::One)
            .flow_control(FlowControl::None)
            .open_native_async()
            .map_err(|e| SourceError::Open {
                device: device.to_string(),
                source: e.into(),
            })?;
        Self::connect(port, protocol, frame_timeout).await
    }
}

impl<IO> SerialRadarSource<IO>
where
    IO: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    /// Configure the module over an already open byte stream.
    pub async fn connect(
        io: IO,
        protocol: &'static RadarProtocol,
        frame_timeout: Duration,
    ) -> Result<Self, SourceError> {
        let mut source = Self {
            io,
            protocol,
            frames: FrameBuffer::new(protocol.header),
            chunk: vec![0u8; READ_CHUNK],
            last: None,
            last_frame_at: Instant::now(),
            frame_timeout,
            frames_decoded: 0,
            artifacts_dropped: 0,
        };
        source.configure().await?;
        source.last_frame_at = Instant::now();
        Ok(source)
    }

    async fn configure(&mut self) -> Result<(), SourceError> {
        for cmd in self.protocol.setup {
            debug!(model = self.protocol.name, step = cmd.name, "Sending radar command");
            self.io.write_all(cmd.bytes).await?;
            self.io.flush().await?;
            match cmd.ack_prefix {
                Some(prefix) => self.await_ack(cmd.name, prefix).await?,
                None => {
                    tokio::time::sleep(self.protocol.settle).await;
                    // Frames received before the mode switch are stale
                    self.frames.clear();
                    continue;
                }
            }
            tokio::time::sleep(self.protocol.settle).await;
        }
        info!(model = self.protocol.name, "Radar configured for single-target tracking");
        Ok(())
    }

    async fn await_ack(&mut self, step: &'static str, prefix: &[u8]) -> Result<(), SourceError> {
        let deadline = Instant::now() + Duration::from_millis(ACK_TIMEOUT_MS);
        let mut received = Vec::new();
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                error!(
                    model = self.protocol.name,
                    step,
                    received = received.len(),
                    "Timed out waiting for radar ACK"
                );
                return Err(SourceError::Handshake { step });
            }
            match timeout(remaining, self.io.read(&mut self.chunk)).await {
                Err(_elapsed) => continue,
                Ok(Err(e)) => return Err(e.into()),
                Ok(Ok(0)) => return Err(SourceError::Disconnected),
                Ok(Ok(n)) => {
                    received.extend_from_slice(&self.chunk[..n]);
                    if let Some(idx) = find(&received, prefix) {
                        // Bytes after the ACK frame already belong to the report stream
                        let rest = find(&received[idx..], COMMAND_TAIL)
                            .map_or(received.len(), |t| idx + t + COMMAND_TAIL.len());
                        self.frames.push(&received[rest..]);
                        debug!(model = self.protocol.name, step, "Radar command acknowledged");
                        return Ok(());
                    }
                }
            }
        }
    }

    /// Move whatever the UART has buffered into the frame buffer.
    async fn drain_uart(&mut self) -> Result<(), SourceError> {
        let slice = Duration::from_millis(READ_SLICE_MS);
        for _ in 0..MAX_READS_PER_POLL {
            match timeout(slice, self.io.read(&mut self.chunk)).await {
                Err(_elapsed) => break,
                Ok(Err(e)) => return Err(e.into()),
                Ok(Ok(0)) => return Err(SourceError::Disconnected),
                Ok(Ok(n)) => {
                    self.frames.push(&self.chunk[..n]);
                    if n < self.chunk.len() {
                        break;
                    }
                }
            }
        }
        Ok(())
    }

    fn decode(&mut self, frame: &Frame, now: Instant) -> Observation {
        let target = decode_target(frame, 0)?;
        if !(self.protocol.is_present)(&target) {
            return None;
        }
        if target.y < 0 {
            self.artifacts_dropped += 1;
            trace!(x = target.x, y = target.y, "Dropping target behind the sensor");
            return None;
        }
        Some(Sample::new(target.x, target.y, target.speed, now))
    }

    /// Complete frames decoded since connect.
    pub const fn frames_decoded(&self) -> u64 {
        self.frames_decoded
    }

    /// Frames discarded for a bad tail plus targets dropped as artifacts.
    pub const fn frames_rejected(&self) -> u64 {
        self.frames.corrupt_frames() + self.artifacts_dropped
    }
}

#[async_trait]
impl<IO> SampleSource for SerialRadarSource<IO>
where
    IO: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    async fn poll_latest(&mut self) -> Result<SourceEvent, SourceError> {
        self.drain_uart().await?;
        let now = Instant::now();
        if let Some(frame) = self.frames.take_latest() {
            self.frames_decoded += 1;
            self.last_frame_at = now;
            self.last = self.decode(&frame, now);
        } else {
            let silent_for = now.duration_since(self.last_frame_at);
            if silent_for > self.frame_timeout {
                error!(
                    model = self.protocol.name,
                    silent_ms = silent_for.as_millis(),
                    decoded = self.frames_decoded,
                    "Radar stopped delivering frames"
                );
                return Err(SourceError::Stalled { silent_for });
            }
        }
        // Without a new frame the previous view of the scene still stands
        Ok(SourceEvent::Observation(self.last))
    }

    fn source_name(&self) -> &str {
        self.protocol.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::acquisition::frame::build_frame;
    use crate::acquisition::{ld2450, rd03d};

    #[tokio::test]
    async fn missing_port_is_open_error() {
        let dir = tempfile::tempdir().unwrap();
        let device = dir.path().join("ttyRADAR0");
        let device = device.to_str().unwrap();
        let result = SerialRadarSource::open(device, &rd03d::RD03D, Duration::from_secs(2)).await;
        assert!(
            matches!(result, Err(SourceError::Open { device: ref d, .. }) if d == device),
            "expected open error"
        );
    }

    #[tokio::test(start_paused = true)]
    async fn rd03d_reports_latest_target() {
        let (ours, mut radar) = tokio::io::duplex(1024);
        let mut source =
            SerialRadarSource::connect(ours, &rd03d::RD03D, Duration::from_secs(2))
                .await
                .unwrap();

        let mut cmd = [0u8; 12];
        radar.read_exact(&mut cmd).await.unwrap();
        assert_eq!(cmd, rd03d::SINGLE_TARGET_CMD);

        radar.write_all(&build_frame(rd03d::HEADER, 300, 1500, -20)).await.unwrap();
        radar.write_all(&build_frame(rd03d::HEADER, 250, 1400, -20)).await.unwrap();

        let SourceEvent::Observation(Some(s)) = source.poll_latest().await.unwrap() else {
            panic!("expected a sample");
        };
        assert_eq!((s.x, s.y, s.speed), (250, 1400, -20));
        assert_eq!(source.frames_decoded(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn repeats_last_observation_until_stalled() {
        let (ours, mut radar) = tokio::io::duplex(1024);
        let mut source =
            SerialRadarSource::connect(ours, &rd03d::RD03D, Duration::from_millis(500))
                .await
                .unwrap();
        radar.write_all(&build_frame(rd03d::HEADER, -80, 900, 0)).await.unwrap();

        let first = source.poll_latest().await.unwrap();
        let second = source.poll_latest().await.unwrap();
        assert_eq!(first, second);

        tokio::time::sleep(Duration::from_millis(600)).await;
        let err = source.poll_latest().await.unwrap_err();
        assert!(matches!(err, SourceError::Stalled { .. }));
        drop(radar);
    }

    #[tokio::test(start_paused = true)]
    async fn closed_link_is_an_error() {
        let (ours, radar) = tokio::io::duplex(1024);
        let mut source =
            SerialRadarSource::connect(ours, &rd03d::RD03D, Duration::from_secs(2))
                .await
                .unwrap();
        drop(radar);
        let err = source.poll_latest().await.unwrap_err();
        assert!(matches!(err, SourceError::Disconnected));
    }

    #[tokio::test]
    async fn ld2450_handshake_checks_every_ack() {
        let mut reply = ld2450::ACK_ENABLE_CONFIG.to_vec();
        reply.extend_from_slice(&[0x00, 0x00, 0x40, 0x00]);
        reply.extend_from_slice(COMMAND_TAIL);

        let mut single = ld2450::ACK_SINGLE_TARGET.to_vec();
        single.extend_from_slice(COMMAND_TAIL);
        let mut end = ld2450::ACK_END_CONFIG.to_vec();
        end.extend_from_slice(COMMAND_TAIL);

        let frame = build_frame(ld2450::HEADER, -150, 2100, -45);
        let mut end_then_frame = end.clone();
        end_then_frame.extend_from_slice(&frame);

        let mock = tokio_test::io::Builder::new()
            .write(ld2450::CMD_ENABLE_CONFIG)
            .read(&reply)
            .write(ld2450::CMD_SINGLE_TARGET)
            .read(&single)
            .write(ld2450::CMD_END_CONFIG)
            .read(&end_then_frame)
            .build();

        let mut source = SerialRadarSource::connect(mock, &ld2450::LD2450, Duration::from_secs(2))
            .await
            .unwrap();
        // The report frame that trailed the last ACK is already buffered
        let latest = source.frames.take_latest().unwrap();
        assert_eq!(decode_target(&latest, 0).unwrap().y, 2100);
    }

    #[tokio::test(start_paused = true)]
    async fn missing_ack_fails_handshake() {
        let (ours, mut radar) = tokio::io::duplex(1024);
        let result = tokio::join!(
            SerialRadarSource::connect(ours, &ld2450::LD2450, Duration::from_secs(2)),
            async {
                let mut cmd = [0u8; 14];
                radar.read_exact(&mut cmd).await.unwrap();
                radar.write_all(&[0x00; 8]).await.unwrap();
                radar
            }
        );
        assert!(matches!(
            result.0,
            Err(SourceError::Handshake { step: "Enable Config" })
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn target_behind_sensor_is_dropped() {
        let (ours, mut radar) = tokio::io::duplex(1024);
        let mut source =
            SerialRadarSource::connect(ours, &rd03d::RD03D, Duration::from_secs(2))
                .await
                .unwrap();
        radar.write_all(&build_frame(rd03d::HEADER, 40, -200, 0)).await.unwrap();
        let event = source.poll_latest().await.unwrap();
        assert_eq!(event, SourceEvent::Observation(None));
        assert_eq!(source.frames_rejected(), 1);
    }
}
