//! Terminal clipboard via the OSC 52 escape sequence.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use complib::catalog::Clipboard;
use crossterm::{execute, style::Print};
use std::io;

/// Asks the terminal emulator to place text on the system clipboard.
#[derive(Debug, Default)]
pub struct Osc52Clipboard;

impl Clipboard for Osc52Clipboard {
    fn copy(&mut self, text: &str) -> io::Result<()> {
        let mut stdout = io::stdout();
        execute!(stdout, Print(osc52_sequence(text)))
    }
}

fn osc52_sequence(text: &str) -> String {
    let encoded = STANDARD.encode(text.as_bytes());
    format!("\x1b]52;c;{encoded}\x1b\\")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_osc52_sequence_encodes_payload() {
        assert_eq!(osc52_sequence("<nav/>"), "\x1b]52;c;PG5hdi8+\x1b\\");
    }
}
