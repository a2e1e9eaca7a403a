#![no_std]

/// Abstracts the byte link to the FPGA peripheral and the FPGA subsystem
/// primitives exposed alongside it.
///
/// Implementations own chip-select handling. No two calls may overlap; the
/// session guarantees this by holding the transport exclusively.
pub trait LinkTransport {
    type Error: core::fmt::Debug;

    /// Full-duplex exchange. `rx` receives as many bytes as `tx` sends.
    fn transact(&mut self, tx: &[u8], rx: &mut [u8]) -> Result<(), Self::Error>;

    /// One-way write, the response is not clocked back.
    fn send(&mut self, frame: &[u8]) -> Result<(), Self::Error>;

    /// Load an FPGA configuration image (bitstream).
    fn load_configuration(&mut self, image: &[u8]) -> Result<(), Self::Error>;

    /// Switch the display between passthrough and FPGA-driven output.
    fn set_display_mode(&mut self, mode: DisplayMode) -> Result<(), Self::Error>;

    /// Stop the FPGA peripheral.
    fn disable(&mut self) -> Result<(), Self::Error>;

    /// Ask the host runtime to shut down once control returns to it.
    fn request_exit(&mut self);
}

/// Display routing selected through [`LinkTransport::set_display_mode`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayMode {
    /// Display driven by the host (menus, loading screen).
    Passthrough = 0,
    /// Display driven by the running FPGA design.
    Run = 1,
}

/// Assets the session asks for. Levels are 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssetId {
    /// Shared loader image, configured before every stream (`write_spi.bin`).
    Bootstrap,
    /// Flow-loaded memory payload for a level (`<level>.raw`).
    FlowPayload(u8),
    /// Configuration image that runs a level (`<level>.bit`).
    Configuration(u8),
}

/// Sequential, read-only access to an opened asset.
pub trait AssetRead {
    type Error: core::fmt::Debug;

    /// Read up to `buf.len()` bytes. `Ok(0)` signals end of asset.
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error>;
}

/// Storage holding the per-level payloads and configuration images.
pub trait AssetStore {
    type Error: core::fmt::Debug;
    type Reader: AssetRead<Error = Self::Error>;

    /// Open an asset for streaming. The reader is released by dropping it.
    fn open(&mut self, id: AssetId) -> Result<Self::Reader, Self::Error>;

    /// Run `f` over the complete contents of an asset.
    fn with_contents<R>(
        &mut self,
        id: AssetId,
        f: impl FnOnce(&[u8]) -> R,
    ) -> Result<R, Self::Error>;
}

/// Abstracts the host-side screen used while the FPGA is not running.
pub trait StatusDisplay {
    /// Draw the selection menu with `selected` (0-based) highlighted.
    fn show_menu(&mut self, items: &[&str], selected: usize);

    /// Draw the loading screen.
    fn show_loading(&mut self, title: &str);
}

/// Abstracts user input across platforms.
pub trait InputSource {
    /// Initialize the input subsystem.
    fn init(&mut self);

    /// Poll for input events. Non-blocking.
    fn poll(&mut self) -> Option<ButtonEvent>;
}

/// Logical buttons of the badge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ButtonId {
    A,
    B,
    Home,
    Menu,
    Select,
    Start,
    Left,
    Right,
    Up,
    Down,
    Press,
}

impl ButtonId {
    /// Every button, in registration-table order.
    pub const ALL: [ButtonId; 11] = [
        ButtonId::A,
        ButtonId::B,
        ButtonId::Home,
        ButtonId::Menu,
        ButtonId::Select,
        ButtonId::Start,
        ButtonId::Left,
        ButtonId::Right,
        ButtonId::Up,
        ButtonId::Down,
        ButtonId::Press,
    ];

    /// Position of this button in [`ButtonId::ALL`].
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Parse a lowercase button name (`"a"`, `"home"`, `"up"`, ...).
    pub fn from_name(name: &str) -> Option<Self> {
        let button = match name {
            "a" => ButtonId::A,
            "b" => ButtonId::B,
            "home" => ButtonId::Home,
            "menu" => ButtonId::Menu,
            "select" => ButtonId::Select,
            "start" => ButtonId::Start,
            "left" => ButtonId::Left,
            "right" => ButtonId::Right,
            "up" => ButtonId::Up,
            "down" => ButtonId::Down,
            "press" => ButtonId::Press,
            _ => return None,
        };
        Some(button)
    }
}

/// A debounced button transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ButtonEvent {
    pub button: ButtonId,
    pub pressed: bool,
}

impl ButtonEvent {
    pub const fn press(button: ButtonId) -> Self {
        Self {
            button,
            pressed: true,
        }
    }

    pub const fn release(button: ButtonId) -> Self {
        Self {
            button,
            pressed: false,
        }
    }
}
