use std::io::{self, Stderr};

use crossterm::cursor::MoveToColumn;
use crossterm::execute;
use crossterm::style::Print;
use crossterm::terminal::{Clear, ClearType};

const FRAMES: [&str; 4] = ["|", "/", "-", "\\"];

/// Single-line spinner drawn on stderr while an exchange is pending.
/// The line is wiped when the indicator is dropped.
pub struct ThinkingIndicator {
    label: String,
    frame: usize,
    out: Stderr,
}

impl ThinkingIndicator {
    pub fn new(agent_name: &str) -> Self {
        Self {
            label: format!("{} is thinking...", agent_name),
            frame: 0,
            out: io::stderr(),
        }
    }

    pub fn tick(&mut self) -> io::Result<()> {
        let frame = FRAMES[self.frame % FRAMES.len()];
        self.frame = self.frame.wrapping_add(1);
        execute!(
            self.out,
            MoveToColumn(0),
            Clear(ClearType::CurrentLine),
            Print(format!("{} {}", frame, self.label))
        )
    }
}

impl Drop for ThinkingIndicator {
    fn drop(&mut self) {
        let _ = execute!(self.out, MoveToColumn(0), Clear(ClearType::CurrentLine));
    }
}
