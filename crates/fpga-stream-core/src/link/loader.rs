//! Flow-controlled bulk transfer of an asset into FPGA memory.
//!
//! Each chunk goes through the same cycle: wait for the ready flag, request a
//! read, complete the ack handshake, then push 1024 payload bytes. The cycle
//! runs a fixed number of times; end of asset does not stop it.

use core::fmt;

use fpga_stream_hal::{AssetRead, LinkTransport};

use super::frame::{self, ChunkFrame, PROBE_LEN};

/// Chunk count of the stock level payloads.
pub const DEFAULT_EXPECTED_CHUNKS: u32 = 1643;

/// Load failure, generic over the transport and asset error types.
#[derive(Debug)]
pub enum LoadError<L: fmt::Debug, A: fmt::Debug> {
    /// The asset could not be read.
    Io(A),
    /// A link exchange failed. Not retried.
    LinkFailure(L),
}

impl<L: fmt::Debug, A: fmt::Debug> fmt::Display for LoadError<L, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadError::Io(e) => write!(f, "asset read failed: {e:?}"),
            LoadError::LinkFailure(e) => write!(f, "link exchange failed: {e:?}"),
        }
    }
}

impl<L: fmt::Debug, A: fmt::Debug> core::error::Error for LoadError<L, A> {}

type Error<L, R> = LoadError<<L as LinkTransport>::Error, <R as AssetRead>::Error>;

/// One readiness check. Implementations decide how the ready flag is sampled.
pub trait ReadyPoll<L: LinkTransport> {
    /// Returns `Ok(true)` once the peripheral can accept the next chunk.
    fn poll_once(&mut self, link: &mut L) -> Result<bool, L::Error>;
}

/// Default strategy: exchange a `Probe` frame and test the ready byte.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProbePoll;

impl<L: LinkTransport> ReadyPoll<L> for ProbePoll {
    fn poll_once(&mut self, link: &mut L) -> Result<bool, L::Error> {
        let probe = frame::encode_probe();
        let mut response = [0u8; PROBE_LEN];
        link.transact(probe.as_bytes(), &mut response)?;
        Ok(frame::is_ready(&response))
    }
}

/// Totals for a completed load.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadStats {
    /// ChunkPut frames sent.
    pub chunks: u32,
    /// Asset bytes carried, padding excluded.
    pub payload_bytes: u64,
    /// Readiness polls issued, including the successful ones.
    pub polls: u64,
}

/// Stream `asset` into FPGA memory as exactly `expected_chunks` chunks.
///
/// Busy-waits on `poll` before each chunk with no timeout. On error the FPGA
/// memory image is undefined and the caller must not run the peripheral.
pub fn load<L, P, R>(
    link: &mut L,
    poll: &mut P,
    asset: &mut R,
    expected_chunks: u32,
) -> Result<LoadStats, Error<L, R>>
where
    L: LinkTransport,
    P: ReadyPoll<L>,
    R: AssetRead,
{
    let read_request = frame::encode_read_request();
    let ack = frame::encode_ack();
    let mut ack_response = [0u8; frame::ACK_LEN];
    let mut stats = LoadStats::default();
    let mut exhausted_at: Option<u32> = None;

    for index in 0..expected_chunks {
        loop {
            stats.polls += 1;
            if poll.poll_once(link).map_err(Error::<L, R>::LinkFailure)? {
                break;
            }
            core::hint::spin_loop();
        }

        link.send(read_request.as_bytes())
            .map_err(Error::<L, R>::LinkFailure)?;
        link.transact(ack.as_bytes(), &mut ack_response)
            .map_err(Error::<L, R>::LinkFailure)?;

        let mut chunk = ChunkFrame::zeroed();
        let filled = fill(asset, chunk.payload_mut()).map_err(Error::<L, R>::Io)?;
        if filled < frame::CHUNK_PAYLOAD_LEN && exhausted_at.is_none() {
            exhausted_at = Some(index);
        }

        link.send(chunk.as_bytes()).map_err(Error::<L, R>::LinkFailure)?;
        stats.chunks += 1;
        stats.payload_bytes += filled as u64;
    }

    if let Some(index) = exhausted_at {
        if index + 1 < expected_chunks {
            log::warn!(
                "asset ended in chunk {} of {}, remaining chunks sent zeroed",
                index + 1,
                expected_chunks
            );
        }
    }
    log::debug!(
        "bulk load done: {} chunks, {} payload bytes, {} polls",
        stats.chunks,
        stats.payload_bytes,
        stats.polls
    );
    Ok(stats)
}

/// Read until `buf` is full or the asset ends. Returns the bytes filled.
fn fill<R: AssetRead>(asset: &mut R, buf: &mut [u8]) -> Result<usize, R::Error> {
    let mut filled = 0;
    while filled < buf.len() {
        match asset.read(&mut buf[filled..])? {
            0 => break,
            n => filled += n,
        }
    }
    Ok(filled)
}
