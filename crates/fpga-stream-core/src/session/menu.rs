//! Menu and loading-screen text.

use core::fmt::Write;

use heapless::{String, Vec};

use super::Selection;

/// Upper bound on menu entries rendered.
pub const MAX_MENU_ENTRIES: usize = 16;

pub const LABEL_CAPACITY: usize = 32;

pub type Label = String<LABEL_CAPACITY>;

const LEVEL_PREFIX: &str = "Another world level";
const QUIT_LABEL: &str = "Quit";

/// Title of one level, e.g. `Another world level 3`.
pub fn level_title(level: u8) -> Label {
    let mut label = Label::new();
    // 19 + 1 + 3 digits always fits.
    let _ = write!(label, "{LEVEL_PREFIX} {level}");
    label
}

/// One label per menu entry, quit entry last.
pub fn menu_labels(selection: &Selection) -> Vec<Label, MAX_MENU_ENTRIES> {
    let mut labels = Vec::new();
    for level in 1..=selection.levels() {
        if labels.push(level_title(level)).is_err() {
            log::warn!("menu truncated at {MAX_MENU_ENTRIES} entries");
            return labels;
        }
    }
    if selection.entries() > selection.levels() {
        let mut quit = Label::new();
        let _ = quit.push_str(QUIT_LABEL);
        if labels.push(quit).is_err() {
            log::warn!("menu truncated at {MAX_MENU_ENTRIES} entries");
        }
    }
    labels
}
