//! Fixed-size command frames exchanged with the FPGA.
//!
//! Every frame starts with an opcode byte. Construction is pure: nothing in
//! this module touches the link.

use core::fmt;

/// Payload bytes carried by one `ChunkPut` frame.
pub const CHUNK_PAYLOAD_LEN: usize = 1024;

pub const PROBE_LEN: usize = 2;
pub const READ_REQUEST_LEN: usize = 1;
pub const ACK_LEN: usize = 12;
pub const CHUNK_FRAME_LEN: usize = 1 + CHUNK_PAYLOAD_LEN;
pub const INPUT_REPORT_LEN: usize = 5;

/// Leading byte of every frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Opcode {
    InputReport = 0xF4,
    ReadRequest = 0xF8,
    ChunkPut = 0xF9,
    Ack = 0xFE,
    Probe = 0xFF,
}

impl Opcode {
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0xF4 => Some(Opcode::InputReport),
            0xF8 => Some(Opcode::ReadRequest),
            0xF9 => Some(Opcode::ChunkPut),
            0xFE => Some(Opcode::Ack),
            0xFF => Some(Opcode::Probe),
            _ => None,
        }
    }
}

/// Codec misuse.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodecError {
    /// Chunk payload longer than [`CHUNK_PAYLOAD_LEN`].
    InvalidPayload { len: usize },
}

impl fmt::Display for CodecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CodecError::InvalidPayload { len } => write!(
                f,
                "chunk payload of {len} bytes exceeds {CHUNK_PAYLOAD_LEN}"
            ),
        }
    }
}

impl core::error::Error for CodecError {}

/// An immutable frame of exactly `N` bytes.
#[derive(Clone, PartialEq, Eq)]
pub struct Frame<const N: usize> {
    bytes: [u8; N],
}

pub type ProbeFrame = Frame<PROBE_LEN>;
pub type ReadRequestFrame = Frame<READ_REQUEST_LEN>;
pub type AckFrame = Frame<ACK_LEN>;
pub type ChunkFrame = Frame<CHUNK_FRAME_LEN>;
pub type InputReportFrame = Frame<INPUT_REPORT_LEN>;

impl<const N: usize> Frame<N> {
    const fn with_opcode(opcode: Opcode) -> Self {
        let mut bytes = [0u8; N];
        bytes[0] = opcode as u8;
        Self { bytes }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn opcode(&self) -> Option<Opcode> {
        Opcode::from_byte(self.bytes[0])
    }

    /// Everything after the opcode byte.
    pub fn payload(&self) -> &[u8] {
        &self.bytes[1..]
    }
}

impl<const N: usize> AsRef<[u8]> for Frame<N> {
    fn as_ref(&self) -> &[u8] {
        &self.bytes
    }
}

impl<const N: usize> fmt::Debug for Frame<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Frame")
            .field("opcode", &self.opcode())
            .field("len", &N)
            .finish()
    }
}

impl ChunkFrame {
    /// All-zero chunk, filled in place by the bulk loader.
    pub(crate) const fn zeroed() -> Self {
        Self::with_opcode(Opcode::ChunkPut)
    }

    pub(crate) fn payload_mut(&mut self) -> &mut [u8] {
        &mut self.bytes[1..]
    }
}

/// `0xFF 0x00`: the peripheral answers in the second byte.
pub const fn encode_probe() -> ProbeFrame {
    Frame::with_opcode(Opcode::Probe)
}

/// True iff the peripheral raised its ready flag in a probe response.
pub fn is_ready(response: &[u8]) -> bool {
    response.get(1).is_some_and(|&flag| flag != 0)
}

pub const fn encode_read_request() -> ReadRequestFrame {
    Frame::with_opcode(Opcode::ReadRequest)
}

pub const fn encode_ack() -> AckFrame {
    Frame::with_opcode(Opcode::Ack)
}

/// Build a `ChunkPut` frame, zero padding `payload` to [`CHUNK_PAYLOAD_LEN`].
///
/// Payloads longer than `max_len` are rejected. `max_len` above
/// [`CHUNK_PAYLOAD_LEN`] is capped to it; the frame size never changes.
pub fn encode_chunk(payload: &[u8], max_len: usize) -> Result<ChunkFrame, CodecError> {
    if payload.len() > max_len.min(CHUNK_PAYLOAD_LEN) {
        return Err(CodecError::InvalidPayload { len: payload.len() });
    }
    let mut frame = ChunkFrame::zeroed();
    frame.payload_mut()[..payload.len()].copy_from_slice(payload);
    Ok(frame)
}

/// Pack the cumulative button state and the bit(s) that just changed,
/// both big-endian.
pub fn encode_input_report(state: u16, changed: u16) -> InputReportFrame {
    let mut frame = InputReportFrame::with_opcode(Opcode::InputReport);
    frame.bytes[1..3].copy_from_slice(&state.to_be_bytes());
    frame.bytes[3..5].copy_from_slice(&changed.to_be_bytes());
    frame
}

/// Inverse of [`encode_input_report`]: `(state, changed)`.
pub fn decode_input_report(bytes: &[u8]) -> Option<(u16, u16)> {
    if bytes.len() != INPUT_REPORT_LEN || bytes[0] != Opcode::InputReport as u8 {
        return None;
    }
    let state = u16::from_be_bytes([bytes[1], bytes[2]]);
    let changed = u16::from_be_bytes([bytes[3], bytes[4]]);
    Some((state, changed))
}
