//! Session state machine.
//!
//! ```text
//!   Idle --confirm(level)--> Loading --ok--> Playing --Menu--> Idle
//!     |                         |                |
//!     | confirm(quit)           | error          | Home (simple)
//!     v                         v                v
//!   Terminated             LoadFailed        Terminated
//! ```
//!
//! `LoadFailed` navigates like `Idle`; confirming again redoes the whole
//! load, bootstrap image included. There is no way back to `Playing`
//! without a reload.

use core::fmt;

use fpga_stream_hal::{
    AssetId, AssetStore, ButtonEvent, DisplayMode, InputSource, LinkTransport, StatusDisplay,
};

use super::menu::{self, MAX_MENU_ENTRIES};
use super::{SessionConfig, SessionContext, SessionMode, Variant};
use crate::input::{ButtonMap, ButtonState, Dispatch, InputBridge, LevelStep};
use crate::link::loader::{self, LoadError, LoadStats, ProbePoll, ReadyPoll};

/// Session failure, generic over the transport and asset error types.
#[derive(Debug)]
pub enum SessionError<L: fmt::Debug, A: fmt::Debug> {
    /// Loading aborted; the session is now in [`SessionMode::LoadFailed`].
    Load(LoadError<L, A>),
    /// A link call outside of loading failed (report forwarding, teardown).
    Link(L),
}

impl<L: fmt::Debug, A: fmt::Debug> From<LoadError<L, A>> for SessionError<L, A> {
    fn from(e: LoadError<L, A>) -> Self {
        SessionError::Load(e)
    }
}

impl<L: fmt::Debug, A: fmt::Debug> fmt::Display for SessionError<L, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionError::Load(e) => write!(f, "load failed: {e}"),
            SessionError::Link(e) => write!(f, "link failure: {e:?}"),
        }
    }
}

impl<L: fmt::Debug, A: fmt::Debug> core::error::Error for SessionError<L, A> {}

type Failure<L, A> = SessionError<<L as LinkTransport>::Error, <A as AssetStore>::Error>;
type LoadFailure<L, A> = LoadError<<L as LinkTransport>::Error, <A as AssetStore>::Error>;
type Result<T, L, A> = core::result::Result<T, Failure<L, A>>;

/// Owns the link, the asset store and the display, and drives them from
/// button events.
pub struct Session<L, A, D, P = ProbePoll>
where
    L: LinkTransport,
    A: AssetStore,
    D: StatusDisplay,
    P: ReadyPoll<L>,
{
    ctx: SessionContext,
    config: SessionConfig,
    bridge: InputBridge,
    link: L,
    assets: A,
    display: D,
    poll: P,
}

impl<L, A, D> Session<L, A, D, ProbePoll>
where
    L: LinkTransport,
    A: AssetStore,
    D: StatusDisplay,
{
    pub fn new(link: L, assets: A, display: D, config: SessionConfig) -> Self {
        Session::with_poll(link, assets, display, ProbePoll, config)
    }
}

impl<L, A, D, P> Session<L, A, D, P>
where
    L: LinkTransport,
    A: AssetStore,
    D: StatusDisplay,
    P: ReadyPoll<L>,
{
    /// Build a session with a custom readiness strategy.
    pub fn with_poll(link: L, assets: A, display: D, poll: P, config: SessionConfig) -> Self {
        Self {
            ctx: SessionContext::new(&config),
            bridge: InputBridge::new(ButtonMap::for_variant(config.variant)),
            config,
            link,
            assets,
            display,
            poll,
        }
    }

    /// Replace the button table.
    pub fn with_button_map(mut self, map: ButtonMap) -> Self {
        self.bridge = InputBridge::new(map);
        self
    }

    /// Enter the initial state: the menu (enhanced) or level 1 (simple).
    pub fn start(&mut self) -> Result<(), L, A> {
        log::info!("session starting ({:?} variant)", self.config.variant);
        match self.config.variant {
            Variant::Enhanced => {
                self.ctx.mode = SessionMode::Idle;
                self.redraw_menu();
                Ok(())
            }
            Variant::Simple => self.confirm(),
        }
    }

    /// Feed one button transition through the bridge and act on it.
    pub fn on_button(&mut self, event: ButtonEvent) -> Result<(), L, A> {
        let dispatch = self
            .bridge
            .on_button(&mut self.ctx, &mut self.link, event)
            .map_err(Failure::<L, A>::Link)?;

        match dispatch {
            Dispatch::None => Ok(()),
            Dispatch::RedrawMenu => {
                self.redraw_menu();
                Ok(())
            }
            Dispatch::Confirm => self.confirm(),
            Dispatch::ReturnToMenu => self.return_to_menu(),
            Dispatch::Exit => self.exit(),
            Dispatch::StepLevel(step) => self.step_level(step),
        }
    }

    /// Process at most one pending input event. Returns whether one was
    /// handled.
    pub fn poll_input<I: InputSource>(&mut self, input: &mut I) -> Result<bool, L, A> {
        match input.poll() {
            Some(event) => self.on_button(event).map(|()| true),
            None => Ok(false),
        }
    }

    /// Act on the highlighted entry: quit, or load the level.
    pub fn confirm(&mut self) -> Result<(), L, A> {
        match self.ctx.selection.level() {
            None => self.exit(),
            Some(level) => self.load_level(level),
        }
    }

    /// Playing -> Idle. The running image is abandoned. If the teardown
    /// fails the session stays in its current mode.
    pub fn return_to_menu(&mut self) -> Result<(), L, A> {
        log::info!("returning to menu");
        self.link.disable().map_err(Failure::<L, A>::Link)?;
        self.link
            .set_display_mode(DisplayMode::Passthrough)
            .map_err(Failure::<L, A>::Link)?;
        self.ctx.mode = SessionMode::Idle;
        self.redraw_menu();
        Ok(())
    }

    /// Disable the peripheral, hand the display back and request exit.
    pub fn exit(&mut self) -> Result<(), L, A> {
        log::info!("session terminating");
        let result = self
            .link
            .disable()
            .and_then(|()| self.link.set_display_mode(DisplayMode::Passthrough));
        self.link.request_exit();
        self.ctx.mode = SessionMode::Terminated;
        result.map_err(SessionError::Link)
    }

    fn step_level(&mut self, step: LevelStep) -> Result<(), L, A> {
        let moved = match step {
            LevelStep::Next => self.ctx.selection.next_level(),
            LevelStep::Prev => self.ctx.selection.prev_level(),
        };
        if moved || self.ctx.mode == SessionMode::LoadFailed {
            self.confirm()
        } else {
            Ok(())
        }
    }

    fn load_level(&mut self, level: u8) -> Result<(), L, A> {
        log::info!("loading level {level}");
        self.ctx.mode = SessionMode::Loading;
        match self.run_load(level) {
            Ok(stats) => {
                log::info!(
                    "level {level} running ({} chunks, {} bytes)",
                    stats.chunks,
                    stats.payload_bytes
                );
                self.ctx.mode = SessionMode::Playing;
                Ok(())
            }
            Err(e) => {
                log::error!("loading level {level} failed: {e}");
                self.ctx.mode = SessionMode::LoadFailed;
                if self.config.variant == Variant::Enhanced {
                    self.redraw_menu();
                }
                Err(e.into())
            }
        }
    }

    fn run_load(&mut self, level: u8) -> core::result::Result<LoadStats, LoadFailure<L, A>> {
        self.link.disable().map_err(LoadFailure::<L, A>::LinkFailure)?;
        self.link
            .set_display_mode(DisplayMode::Passthrough)
            .map_err(LoadFailure::<L, A>::LinkFailure)?;
        self.display.show_loading(&menu::level_title(level));

        self.configure(AssetId::Bootstrap)?;

        let mut payload = self
            .assets
            .open(AssetId::FlowPayload(level))
            .map_err(LoadFailure::<L, A>::Io)?;
        let stats = loader::load(
            &mut self.link,
            &mut self.poll,
            &mut payload,
            self.config.expected_chunks,
        )?;
        drop(payload);

        self.configure(AssetId::Configuration(level))?;
        self.link
            .set_display_mode(DisplayMode::Run)
            .map_err(LoadFailure::<L, A>::LinkFailure)?;
        Ok(stats)
    }

    fn configure(&mut self, id: AssetId) -> core::result::Result<(), LoadFailure<L, A>> {
        log::debug!("loading configuration {id:?}");
        let link = &mut self.link;
        self.assets
            .with_contents(id, |image| link.load_configuration(image))
            .map_err(LoadFailure::<L, A>::Io)?
            .map_err(LoadFailure::<L, A>::LinkFailure)
    }

    fn redraw_menu(&mut self) {
        let labels = menu::menu_labels(&self.ctx.selection);
        let mut items: heapless::Vec<&str, MAX_MENU_ENTRIES> = heapless::Vec::new();
        for label in labels.iter() {
            let _ = items.push(label.as_str());
        }
        let selected = usize::from(self.ctx.selection.index() - 1);
        self.display.show_menu(&items, selected);
    }

    pub fn mode(&self) -> SessionMode {
        self.ctx.mode
    }

    pub fn is_terminated(&self) -> bool {
        self.ctx.mode == SessionMode::Terminated
    }

    pub fn context(&self) -> &SessionContext {
        &self.ctx
    }

    pub fn buttons(&self) -> ButtonState {
        self.ctx.buttons
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn link(&self) -> &L {
        &self.link
    }

    pub fn display(&self) -> &D {
        &self.display
    }

    /// Give back the collaborators.
    pub fn into_parts(self) -> (L, A, D) {
        (self.link, self.assets, self.display)
    }
}
