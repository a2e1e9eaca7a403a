pub mod frame;
pub mod loader;

pub use frame::{CodecError, Frame, Opcode};
pub use loader::{load, LoadError, LoadStats, ProbePoll, ReadyPoll, DEFAULT_EXPECTED_CHUNKS};
