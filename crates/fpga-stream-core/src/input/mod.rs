//! Button handling: the held-button bitmask, the per-variant button table,
//! and the bridge that turns transitions into wire reports.

use fpga_stream_hal::{ButtonEvent, ButtonId, LinkTransport};

use crate::link::frame;
use crate::session::{SessionContext, SessionMode, Variant};

/// Report bit for a button.
pub const fn report_mask(button: ButtonId) -> u16 {
    let bit = match button {
        ButtonId::Down => 0,
        ButtonId::Up => 1,
        ButtonId::Left => 2,
        ButtonId::Right => 3,
        ButtonId::Press => 4,
        ButtonId::Home => 5,
        ButtonId::Menu => 6,
        ButtonId::Select => 7,
        ButtonId::Start => 8,
        ButtonId::A => 9,
        ButtonId::B => 10,
    };
    1 << bit
}

/// Currently held buttons. A bit is set iff its button is down.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ButtonState(u16);

impl ButtonState {
    pub fn bits(self) -> u16 {
        self.0
    }

    pub fn is_held(self, button: ButtonId) -> bool {
        self.0 & report_mask(button) != 0
    }

    /// Set on press, clear on release.
    pub fn apply(&mut self, event: ButtonEvent) {
        let mask = report_mask(event.button);
        if event.pressed {
            self.0 |= mask;
        } else {
            self.0 &= !mask;
        }
    }
}

/// What a button means to the session, besides its report bit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonRole {
    /// Only reported while playing.
    Plain,
    /// Idle: move the cursor towards entry 1.
    NavigateUp,
    /// Idle: move the cursor towards the last entry.
    NavigateDown,
    /// Idle: act on the highlighted entry.
    Confirm,
    /// Playing: leave the running level for the menu. Never reported.
    ReturnToMenu,
    /// Reported, then the session shuts down.
    Exit,
    /// Reported, then the next level is loaded.
    NextLevel,
    /// Reported, then the previous level is loaded.
    PrevLevel,
}

/// Registration table from button to role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ButtonMap {
    roles: [ButtonRole; ButtonId::ALL.len()],
}

impl ButtonMap {
    pub fn for_variant(variant: Variant) -> Self {
        match variant {
            Variant::Simple => Self::simple(),
            Variant::Enhanced => Self::enhanced(),
        }
    }

    pub fn simple() -> Self {
        let mut map = Self::plain();
        map.attach(ButtonId::Home, ButtonRole::Exit);
        map.attach(ButtonId::Menu, ButtonRole::NextLevel);
        map.attach(ButtonId::Select, ButtonRole::PrevLevel);
        map
    }

    pub fn enhanced() -> Self {
        let mut map = Self::plain();
        map.attach(ButtonId::Menu, ButtonRole::ReturnToMenu);
        map.attach(ButtonId::Up, ButtonRole::NavigateUp);
        map.attach(ButtonId::Down, ButtonRole::NavigateDown);
        map.attach(ButtonId::A, ButtonRole::Confirm);
        map.attach(ButtonId::Start, ButtonRole::Confirm);
        map.attach(ButtonId::Press, ButtonRole::Confirm);
        map
    }

    fn plain() -> Self {
        Self {
            roles: [ButtonRole::Plain; ButtonId::ALL.len()],
        }
    }

    pub fn attach(&mut self, button: ButtonId, role: ButtonRole) {
        self.roles[button.index()] = role;
    }

    pub fn role(&self, button: ButtonId) -> ButtonRole {
        self.roles[button.index()]
    }
}

/// Follow-up the state machine has to perform after a button event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    None,
    /// Navigation press, clamped or not; redraw the menu.
    RedrawMenu,
    /// Act on the highlighted entry.
    Confirm,
    /// Leave Playing for the menu.
    ReturnToMenu,
    /// Shut the session down.
    Exit,
    /// Step to a neighbouring level and reload.
    StepLevel(LevelStep),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LevelStep {
    Next,
    Prev,
}

/// Maintains [`ButtonState`] and forwards input reports while playing.
#[derive(Debug, Clone)]
pub struct InputBridge {
    map: ButtonMap,
}

impl InputBridge {
    pub fn new(map: ButtonMap) -> Self {
        Self { map }
    }

    pub fn map(&self) -> &ButtonMap {
        &self.map
    }

    /// Record a transition and report it if the FPGA is running.
    ///
    /// The state bit is updated in every mode, so a release always clears
    /// the bit even if the matching press was never reported.
    pub fn on_button<L: LinkTransport>(
        &self,
        ctx: &mut SessionContext,
        link: &mut L,
        event: ButtonEvent,
    ) -> Result<Dispatch, L::Error> {
        ctx.buttons.apply(event);
        let role = self.map.role(event.button);

        match ctx.mode {
            SessionMode::Playing => {
                if role != ButtonRole::ReturnToMenu {
                    let report = frame::encode_input_report(
                        ctx.buttons.bits(),
                        report_mask(event.button),
                    );
                    link.send(report.as_bytes())?;
                }
                if !event.pressed {
                    return Ok(Dispatch::None);
                }
                Ok(match role {
                    ButtonRole::ReturnToMenu => Dispatch::ReturnToMenu,
                    ButtonRole::Exit => Dispatch::Exit,
                    ButtonRole::NextLevel => Dispatch::StepLevel(LevelStep::Next),
                    ButtonRole::PrevLevel => Dispatch::StepLevel(LevelStep::Prev),
                    _ => Dispatch::None,
                })
            }
            SessionMode::Idle | SessionMode::LoadFailed => {
                if !event.pressed {
                    return Ok(Dispatch::None);
                }
                Ok(match role {
                    ButtonRole::NavigateUp => {
                        ctx.selection.up();
                        Dispatch::RedrawMenu
                    }
                    ButtonRole::NavigateDown => {
                        ctx.selection.down();
                        Dispatch::RedrawMenu
                    }
                    ButtonRole::Confirm => Dispatch::Confirm,
                    ButtonRole::Exit => Dispatch::Exit,
                    ButtonRole::NextLevel => Dispatch::StepLevel(LevelStep::Next),
                    ButtonRole::PrevLevel => Dispatch::StepLevel(LevelStep::Prev),
                    _ => Dispatch::None,
                })
            }
            SessionMode::Loading | SessionMode::Terminated => Ok(Dispatch::None),
        }
    }
}
