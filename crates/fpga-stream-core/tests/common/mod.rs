//! Shared mock collaborators for the integration tests.
//!
//! Link, asset store and display all append to one journal so tests can
//! check the order of operations across them.

#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::rc::Rc;

use fpga_stream_core::link::frame::{Opcode, CHUNK_FRAME_LEN};
use fpga_stream_hal::{AssetId, AssetRead, AssetStore, DisplayMode, LinkTransport, StatusDisplay};

/// One observable collaborator call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Op {
    Probe,
    Transact(Vec<u8>),
    Send(Vec<u8>),
    LoadConfiguration(Vec<u8>),
    DisplayMode(DisplayMode),
    Disable,
    RequestExit,
    Open(AssetId),
    ShowMenu { items: Vec<String>, selected: usize },
    ShowLoading(String),
}

pub type Journal = Rc<RefCell<Vec<Op>>>;

pub fn journal() -> Journal {
    Rc::new(RefCell::new(Vec::new()))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockError(pub &'static str);

#[derive(Default)]
struct LinkState {
    /// Ready bytes answered to successive probes; ready once exhausted.
    probe_script: VecDeque<u8>,
    /// Fail the n-th (0-based) ChunkPut send.
    fail_chunk: Option<usize>,
    chunks_sent: usize,
    fail_configuration: bool,
    fail_disable: bool,
}

/// Recording link. Clones share state.
#[derive(Clone)]
pub struct MockLink {
    journal: Journal,
    state: Rc<RefCell<LinkState>>,
}

impl MockLink {
    pub fn new(journal: &Journal) -> Self {
        Self {
            journal: Rc::clone(journal),
            state: Rc::new(RefCell::new(LinkState::default())),
        }
    }

    /// Queue ready-byte answers for the next probes.
    pub fn script_probes(&self, answers: &[u8]) {
        self.state.borrow_mut().probe_script.extend(answers.iter().copied());
    }

    pub fn fail_chunk(&self, index: usize) {
        self.state.borrow_mut().fail_chunk = Some(index);
    }

    pub fn fail_configuration(&self) {
        self.state.borrow_mut().fail_configuration = true;
    }

    pub fn fail_disable(&self) {
        self.state.borrow_mut().fail_disable = true;
    }

    fn record(&self, op: Op) {
        self.journal.borrow_mut().push(op);
    }
}

impl LinkTransport for MockLink {
    type Error = MockError;

    fn transact(&mut self, tx: &[u8], rx: &mut [u8]) -> Result<(), Self::Error> {
        assert_eq!(tx.len(), rx.len(), "transact buffers must match");
        rx.fill(0);
        if tx.first() == Some(&(Opcode::Probe as u8)) {
            self.record(Op::Probe);
            let ready = self.state.borrow_mut().probe_script.pop_front().unwrap_or(1);
            rx[1] = ready;
        } else {
            self.record(Op::Transact(tx.to_vec()));
        }
        Ok(())
    }

    fn send(&mut self, frame: &[u8]) -> Result<(), Self::Error> {
        if frame.len() == CHUNK_FRAME_LEN {
            let mut state = self.state.borrow_mut();
            let index = state.chunks_sent;
            state.chunks_sent += 1;
            if state.fail_chunk == Some(index) {
                return Err(MockError("chunk send failed"));
            }
        }
        self.record(Op::Send(frame.to_vec()));
        Ok(())
    }

    fn load_configuration(&mut self, image: &[u8]) -> Result<(), Self::Error> {
        if self.state.borrow().fail_configuration {
            return Err(MockError("configuration rejected"));
        }
        self.record(Op::LoadConfiguration(image.to_vec()));
        Ok(())
    }

    fn set_display_mode(&mut self, mode: DisplayMode) -> Result<(), Self::Error> {
        self.record(Op::DisplayMode(mode));
        Ok(())
    }

    fn disable(&mut self) -> Result<(), Self::Error> {
        if self.state.borrow().fail_disable {
            return Err(MockError("disable rejected"));
        }
        self.record(Op::Disable);
        Ok(())
    }

    fn request_exit(&mut self) {
        self.record(Op::RequestExit);
    }
}

/// In-memory reader that can hand out short reads and fail on demand.
pub struct MockReader {
    data: Vec<u8>,
    pos: usize,
    max_read: usize,
    fail_at: Option<usize>,
}

impl MockReader {
    pub fn new(data: Vec<u8>) -> Self {
        Self {
            data,
            pos: 0,
            max_read: usize::MAX,
            fail_at: None,
        }
    }

    /// Never return more than `max_read` bytes per call.
    pub fn with_max_read(mut self, max_read: usize) -> Self {
        self.max_read = max_read;
        self
    }

    /// Fail the first read that starts at or after `offset`.
    pub fn failing_at(mut self, offset: usize) -> Self {
        self.fail_at = Some(offset);
        self
    }
}

impl AssetRead for MockReader {
    type Error = MockError;

    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        if self.fail_at.is_some_and(|offset| self.pos >= offset) {
            return Err(MockError("asset read failed"));
        }
        let n = buf.len().min(self.max_read).min(self.data.len() - self.pos);
        buf[..n].copy_from_slice(&self.data[self.pos..self.pos + n]);
        self.pos += n;
        Ok(n)
    }
}

/// Asset store over a map of named blobs.
#[derive(Clone)]
pub struct MockAssets {
    journal: Journal,
    assets: Rc<RefCell<HashMap<AssetId, Vec<u8>>>>,
}

impl MockAssets {
    pub fn new(journal: &Journal) -> Self {
        Self {
            journal: Rc::clone(journal),
            assets: Rc::new(RefCell::new(HashMap::new())),
        }
    }

    pub fn insert(&self, id: AssetId, data: Vec<u8>) {
        self.assets.borrow_mut().insert(id, data);
    }

    pub fn remove(&self, id: AssetId) {
        self.assets.borrow_mut().remove(&id);
    }

    /// Bootstrap image plus payload and configuration for `levels`.
    pub fn with_levels(journal: &Journal, levels: u8, payload_len: usize) -> Self {
        let assets = Self::new(journal);
        assets.insert(AssetId::Bootstrap, b"bootstrap".to_vec());
        for level in 1..=levels {
            assets.insert(AssetId::FlowPayload(level), payload(level, payload_len));
            assets.insert(AssetId::Configuration(level), configuration(level));
        }
        assets
    }
}

impl AssetStore for MockAssets {
    type Error = MockError;
    type Reader = MockReader;

    fn open(&mut self, id: AssetId) -> Result<Self::Reader, Self::Error> {
        self.journal.borrow_mut().push(Op::Open(id));
        self.assets
            .borrow()
            .get(&id)
            .cloned()
            .map(MockReader::new)
            .ok_or(MockError("asset missing"))
    }

    fn with_contents<R>(
        &mut self,
        id: AssetId,
        f: impl FnOnce(&[u8]) -> R,
    ) -> Result<R, Self::Error> {
        let assets = self.assets.borrow();
        let data = assets.get(&id).ok_or(MockError("asset missing"))?;
        Ok(f(data.as_slice()))
    }
}

/// Display that records what it was asked to draw.
#[derive(Clone)]
pub struct MockDisplay {
    journal: Journal,
}

impl MockDisplay {
    pub fn new(journal: &Journal) -> Self {
        Self {
            journal: Rc::clone(journal),
        }
    }
}

impl StatusDisplay for MockDisplay {
    fn show_menu(&mut self, items: &[&str], selected: usize) {
        self.journal.borrow_mut().push(Op::ShowMenu {
            items: items.iter().map(|s| s.to_string()).collect(),
            selected,
        });
    }

    fn show_loading(&mut self, title: &str) {
        self.journal.borrow_mut().push(Op::ShowLoading(title.to_string()));
    }
}

/// Deterministic payload bytes for a level.
pub fn payload(level: u8, len: usize) -> Vec<u8> {
    (0..len)
        .map(|i| (i as u8).wrapping_mul(31).wrapping_add(level) | 1)
        .collect()
}

pub fn configuration(level: u8) -> Vec<u8> {
    vec![0xB1, 0x75, level]
}

/// ChunkPut frames in journal order.
pub fn chunk_frames(ops: &[Op]) -> Vec<Vec<u8>> {
    ops.iter()
        .filter_map(|op| match op {
            Op::Send(frame) if frame.first() == Some(&(Opcode::ChunkPut as u8)) => {
                Some(frame.clone())
            }
            _ => None,
        })
        .collect()
}

/// InputReport frames in journal order.
pub fn input_reports(ops: &[Op]) -> Vec<Vec<u8>> {
    ops.iter()
        .filter_map(|op| match op {
            Op::Send(frame) if frame.first() == Some(&(Opcode::InputReport as u8)) => {
                Some(frame.clone())
            }
            _ => None,
        })
        .collect()
}
