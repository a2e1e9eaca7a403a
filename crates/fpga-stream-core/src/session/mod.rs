//! Session state: which level is selected, what the peripheral is doing, and
//! the state machine that sequences loads, mode switches and teardown.

pub mod machine;
pub mod menu;

pub use machine::{Session, SessionError};

use crate::input::ButtonState;
use crate::link::DEFAULT_EXPECTED_CHUNKS;

/// Levels shipped with the stock asset set.
pub const DEFAULT_LEVELS: u8 = 7;

/// Most levels a menu can list while keeping room for Quit.
pub const MAX_LEVELS: u8 = (menu::MAX_MENU_ENTRIES - 1) as u8;

/// Driver flavour.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Variant {
    /// No menu: level 1 loads at start, Home exits, Menu/Select step levels.
    Simple,
    /// Menu-driven: Up/Down select, confirm loads, Menu returns to the menu.
    #[default]
    Enhanced,
}

/// Peripheral/session mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionMode {
    /// Menu navigation active, nothing forwarded.
    Idle,
    /// Bulk load in progress. Input is recorded but not acted on.
    Loading,
    /// FPGA running, button reports forwarded.
    Playing,
    /// Idle after a failed load. The FPGA image is undefined; only a full
    /// reload leaves this state.
    LoadFailed,
    /// Peripheral disabled and exit requested.
    Terminated,
}

impl SessionMode {
    /// Whether menu navigation and confirm are live.
    pub fn is_idle(self) -> bool {
        matches!(self, SessionMode::Idle | SessionMode::LoadFailed)
    }
}

/// Static session configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionConfig {
    pub variant: Variant,
    /// Chunks streamed per load. Not checked against the asset length.
    pub expected_chunks: u32,
    /// Selectable levels, numbered from 1. Clamped to `1..=MAX_LEVELS`.
    pub levels: u8,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self::enhanced()
    }
}

impl SessionConfig {
    pub fn simple() -> Self {
        Self {
            variant: Variant::Simple,
            expected_chunks: DEFAULT_EXPECTED_CHUNKS,
            levels: DEFAULT_LEVELS,
        }
    }

    pub fn enhanced() -> Self {
        Self {
            variant: Variant::Enhanced,
            expected_chunks: DEFAULT_EXPECTED_CHUNKS,
            levels: DEFAULT_LEVELS,
        }
    }

    pub fn with_expected_chunks(mut self, expected_chunks: u32) -> Self {
        self.expected_chunks = expected_chunks;
        self
    }
}

/// Highlighted menu entry, 1-based. In the enhanced variant the entry after
/// the last level means "quit".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Selection {
    index: u8,
    levels: u8,
    quit_entry: bool,
}

impl Selection {
    pub fn new(levels: u8, quit_entry: bool) -> Self {
        Self {
            index: 1,
            levels: levels.clamp(1, MAX_LEVELS),
            quit_entry,
        }
    }

    pub fn index(&self) -> u8 {
        self.index
    }

    /// Highest selectable index.
    pub fn last(&self) -> u8 {
        self.levels + u8::from(self.quit_entry)
    }

    /// Menu entries, quit included.
    pub fn entries(&self) -> u8 {
        self.last()
    }

    pub fn levels(&self) -> u8 {
        self.levels
    }

    pub fn is_quit(&self) -> bool {
        self.quit_entry && self.index == self.last()
    }

    /// The selected level, `None` on the quit entry.
    pub fn level(&self) -> Option<u8> {
        (!self.is_quit()).then_some(self.index)
    }

    /// Move towards entry 1. Returns false when already there.
    pub fn up(&mut self) -> bool {
        if self.index > 1 {
            self.index -= 1;
            true
        } else {
            false
        }
    }

    /// Move towards the last entry. Returns false when already there.
    pub fn down(&mut self) -> bool {
        if self.index < self.last() {
            self.index += 1;
            true
        } else {
            false
        }
    }

    /// Step to the next level, never onto the quit entry.
    pub fn next_level(&mut self) -> bool {
        if self.index < self.levels {
            self.index += 1;
            true
        } else {
            false
        }
    }

    pub fn prev_level(&mut self) -> bool {
        self.up()
    }
}

/// All mutable session state, owned in one place and handed by `&mut` to
/// the input bridge and the state machine.
#[derive(Debug, Clone)]
pub struct SessionContext {
    pub buttons: ButtonState,
    pub selection: Selection,
    pub mode: SessionMode,
}

impl SessionContext {
    pub fn new(config: &SessionConfig) -> Self {
        let quit_entry = config.variant == Variant::Enhanced;
        Self {
            buttons: ButtonState::default(),
            selection: Selection::new(config.levels, quit_entry),
            mode: SessionMode::Idle,
        }
    }
}
