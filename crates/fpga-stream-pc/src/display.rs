//! Console rendering of the host-side screens.

use std::io::{self, Write};

use fpga_stream_hal::StatusDisplay;

/// Prints the menu and loading screen to a writer (stdout by default).
pub struct ConsoleDisplay<W: Write = io::Stdout> {
    out: W,
}

impl ConsoleDisplay<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> ConsoleDisplay<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    #[cfg(test)]
    fn into_inner(self) -> W {
        self.out
    }

    fn render_menu(&mut self, items: &[&str], selected: usize) -> io::Result<()> {
        writeln!(self.out)?;
        for (i, item) in items.iter().enumerate() {
            let marker = if i == selected { '>' } else { ' ' };
            writeln!(self.out, "{marker} {item}")?;
        }
        self.out.flush()
    }
}

impl<W: Write> StatusDisplay for ConsoleDisplay<W> {
    fn show_menu(&mut self, items: &[&str], selected: usize) {
        if let Err(e) = self.render_menu(items, selected) {
            log::warn!("menu not drawn: {e}");
        }
    }

    fn show_loading(&mut self, title: &str) {
        log::info!("loading screen: {title}");
        if let Err(e) = writeln!(self.out, "\n{title}\nLoading...").and_then(|()| self.out.flush())
        {
            log::warn!("loading screen not drawn: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_menu_marks_selected_entry() {
        let mut display = ConsoleDisplay::new(Vec::new());
        display.show_menu(&["Another world level 1", "Another world level 2", "Quit"], 1);

        let text = String::from_utf8(display.into_inner()).unwrap();
        let lines: Vec<&str> = text.lines().filter(|l| !l.is_empty()).collect();
        assert_eq!(
            lines,
            vec![
                "  Another world level 1",
                "> Another world level 2",
                "  Quit"
            ]
        );
    }

    #[test]
    fn test_loading_screen_shows_title() {
        let mut display = ConsoleDisplay::new(Vec::new());
        display.show_loading("Another world level 5");

        let text = String::from_utf8(display.into_inner()).unwrap();
        assert!(text.contains("Another world level 5"));
        assert!(text.contains("Loading..."));
    }
}
