//! Clipboard seam.

use std::io;

/// Somewhere copied code can be written.
pub trait Clipboard {
    fn copy(&mut self, text: &str) -> io::Result<()>;
}

/// Keeps every copied payload; optionally refuses writes.
#[derive(Debug, Default)]
pub struct RecordingClipboard {
    pub copied: Vec<String>,
    pub fail: bool,
}

impl RecordingClipboard {
    pub fn failing() -> Self {
        Self {
            copied: Vec::new(),
            fail: true,
        }
    }

    pub fn last(&self) -> Option<&str> {
        self.copied.last().map(String::as_str)
    }
}

impl Clipboard for RecordingClipboard {
    fn copy(&mut self, text: &str) -> io::Result<()> {
        if self.fail {
            return Err(io::Error::new(io::ErrorKind::Unsupported, "clipboard disabled"));
        }
        self.copied.push(text.to_string());
        Ok(())
    }
}
