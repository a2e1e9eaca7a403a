//! Simulated FPGA peripheral for the PC debug host.
//!
//! Implements [`LinkTransport`] in memory. The peripheral answers probes,
//! checks that every chunk follows the ReadRequest/Ack handshake and keeps
//! the streamed bytes so a run can be inspected afterwards.

use fpga_stream_core::link::frame::{self, Opcode, ACK_LEN, CHUNK_FRAME_LEN, PROBE_LEN};
use fpga_stream_hal::{DisplayMode, LinkTransport};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SimError {
    #[error("protocol violation: {0}")]
    ProtocolViolation(&'static str),

    #[error("{opcode:?} frame is {actual} bytes, expected {expected}")]
    LengthMismatch {
        opcode: Opcode,
        expected: usize,
        actual: usize,
    },

    #[error("unknown opcode 0x{0:02X}")]
    UnknownOpcode(u8),

    #[error("empty configuration image")]
    EmptyImage,
}

/// Where the peripheral is in the chunk handshake.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Ready,
    Requested,
    Acked,
}

/// In-memory stand-in for the SPI-attached FPGA.
#[derive(Debug)]
pub struct SimulatedFpga {
    busy_polls: u32,
    busy_remaining: u32,
    phase: Phase,
    enabled: bool,
    display_mode: DisplayMode,
    stream: Vec<u8>,
    loaded_memory: Vec<u8>,
    configurations: Vec<usize>,
    reports: Vec<(u16, u16)>,
    chunks: u64,
    probes: u64,
    exit_requested: bool,
}

impl SimulatedFpga {
    /// `busy_polls` probes answer "not ready" before every chunk.
    pub fn new(busy_polls: u32) -> Self {
        Self {
            busy_polls,
            busy_remaining: busy_polls,
            phase: Phase::Ready,
            enabled: false,
            display_mode: DisplayMode::Passthrough,
            stream: Vec::new(),
            loaded_memory: Vec::new(),
            configurations: Vec::new(),
            reports: Vec::new(),
            chunks: 0,
            probes: 0,
            exit_requested: false,
        }
    }

    fn expect_len(opcode: Opcode, expected: usize, actual: usize) -> Result<(), SimError> {
        if expected == actual {
            Ok(())
        } else {
            Err(SimError::LengthMismatch {
                opcode,
                expected,
                actual,
            })
        }
    }

    fn opcode_of(bytes: &[u8]) -> Result<Opcode, SimError> {
        let first = *bytes
            .first()
            .ok_or(SimError::ProtocolViolation("empty frame"))?;
        Opcode::from_byte(first).ok_or(SimError::UnknownOpcode(first))
    }

    fn probe(&mut self, rx: &mut [u8]) {
        self.probes += 1;
        rx.fill(0);
        if self.busy_remaining > 0 {
            self.busy_remaining -= 1;
        } else {
            rx[1] = 1;
        }
    }

    fn accept_chunk(&mut self, frame: &[u8]) -> Result<(), SimError> {
        if self.phase != Phase::Acked {
            return Err(SimError::ProtocolViolation("chunk without acknowledged read request"));
        }
        Self::expect_len(Opcode::ChunkPut, CHUNK_FRAME_LEN, frame.len())?;
        self.stream.extend_from_slice(&frame[1..]);
        self.phase = Phase::Ready;
        self.busy_remaining = self.busy_polls;
        self.chunks += 1;
        log::trace!("chunk {} accepted", self.chunks);
        Ok(())
    }

    fn accept_report(&mut self, bytes: &[u8]) -> Result<(), SimError> {
        let (state, changed) = frame::decode_input_report(bytes).ok_or(
            SimError::LengthMismatch {
                opcode: Opcode::InputReport,
                expected: frame::INPUT_REPORT_LEN,
                actual: bytes.len(),
            },
        )?;
        if self.display_mode != DisplayMode::Run {
            log::warn!("input report while the display is not running");
        }
        log::debug!("input report: state {state:#06x} changed {changed:#06x}");
        self.reports.push((state, changed));
        Ok(())
    }

    /// Memory image loaded by the most recent configuration.
    pub fn loaded_memory(&self) -> &[u8] {
        &self.loaded_memory
    }

    /// Sizes of every configuration image loaded, in order.
    pub fn configurations(&self) -> &[usize] {
        &self.configurations
    }

    /// Decoded `(state, changed)` input reports, in order.
    pub fn reports(&self) -> &[(u16, u16)] {
        &self.reports
    }

    pub fn display_mode(&self) -> DisplayMode {
        self.display_mode
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn exit_requested(&self) -> bool {
        self.exit_requested
    }

    pub fn chunks(&self) -> u64 {
        self.chunks
    }

    pub fn probes(&self) -> u64 {
        self.probes
    }
}

impl LinkTransport for SimulatedFpga {
    type Error = SimError;

    fn transact(&mut self, tx: &[u8], rx: &mut [u8]) -> Result<(), SimError> {
        let opcode = Self::opcode_of(tx)?;
        if rx.len() != tx.len() {
            return Err(SimError::LengthMismatch {
                opcode,
                expected: tx.len(),
                actual: rx.len(),
            });
        }
        match opcode {
            Opcode::Probe => {
                Self::expect_len(opcode, PROBE_LEN, tx.len())?;
                self.probe(rx);
                Ok(())
            }
            Opcode::Ack => {
                Self::expect_len(opcode, ACK_LEN, tx.len())?;
                if self.phase != Phase::Requested {
                    return Err(SimError::ProtocolViolation("ack without read request"));
                }
                rx.fill(0);
                self.phase = Phase::Acked;
                Ok(())
            }
            _ => Err(SimError::ProtocolViolation("opcode is send-only")),
        }
    }

    fn send(&mut self, bytes: &[u8]) -> Result<(), SimError> {
        match Self::opcode_of(bytes)? {
            Opcode::ReadRequest => {
                Self::expect_len(Opcode::ReadRequest, frame::READ_REQUEST_LEN, bytes.len())?;
                if !self.enabled {
                    return Err(SimError::ProtocolViolation("read request before configuration"));
                }
                if self.phase != Phase::Ready {
                    return Err(SimError::ProtocolViolation("read request during handshake"));
                }
                self.phase = Phase::Requested;
                Ok(())
            }
            Opcode::ChunkPut => self.accept_chunk(bytes),
            Opcode::InputReport => self.accept_report(bytes),
            Opcode::Probe | Opcode::Ack => {
                Err(SimError::ProtocolViolation("opcode needs a response"))
            }
        }
    }

    fn load_configuration(&mut self, image: &[u8]) -> Result<(), SimError> {
        if image.is_empty() {
            return Err(SimError::EmptyImage);
        }
        if !self.stream.is_empty() {
            self.loaded_memory = std::mem::take(&mut self.stream);
            log::debug!("{} streamed bytes latched", self.loaded_memory.len());
        }
        log::info!("configuration loaded ({} bytes)", image.len());
        self.configurations.push(image.len());
        self.enabled = true;
        self.phase = Phase::Ready;
        self.busy_remaining = self.busy_polls;
        Ok(())
    }

    fn set_display_mode(&mut self, mode: DisplayMode) -> Result<(), SimError> {
        log::debug!("display mode {mode:?}");
        self.display_mode = mode;
        Ok(())
    }

    fn disable(&mut self) -> Result<(), SimError> {
        self.enabled = false;
        self.phase = Phase::Ready;
        self.stream.clear();
        Ok(())
    }

    fn request_exit(&mut self) {
        log::info!("exit requested");
        self.exit_requested = true;
    }
}
