//! Platform-agnostic FPGA stream loader.
//!
//! Streams level payloads into FPGA memory over the flow-controlled SPI
//! protocol, forwards button state reports to the running design, and
//! sequences both with a small menu/session state machine. All hardware is
//! reached through the traits in `fpga-stream-hal`.

#![no_std]

pub mod input;
pub mod link;
pub mod session;

pub use input::{ButtonMap, ButtonRole, ButtonState, InputBridge};
pub use link::{LoadError, LoadStats, ProbePoll, ReadyPoll, DEFAULT_EXPECTED_CHUNKS};
pub use session::{Session, SessionConfig, SessionContext, SessionError, SessionMode, Variant};
