//! The window the shell runs in: redraws and the system clipboard.

use std::io::{self, Write};

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;

/// Host-window capabilities the navigation manager relies on.
pub trait HostWindow {
    /// The window contents are stale.
    fn invalidate(&mut self);

    /// Ask for clipboard contents. They arrive later as a clipboard
    /// delivery event, or never.
    fn read_clipboard(&mut self, out: &mut dyn Write) -> io::Result<()>;

    fn write_clipboard(&mut self, out: &mut dyn Write, text: &str) -> io::Result<()>;

    /// Clipboard contents were just delivered to the shell.
    fn clipboard_delivered(&mut self) {}

    /// One-line status the host wants shown, if any.
    fn status(&self) -> Option<&str> {
        None
    }
}

const PASTE_HINT: &str = "Paste now with your terminal's paste shortcut";

/// Host for a terminal with bracketed paste. Writes go out as OSC 52; reads
/// can only prompt the user, whose paste then arrives as a delivery.
#[derive(Debug, Default)]
pub struct TerminalHost {
    awaiting_paste: bool,
}

impl TerminalHost {
    pub fn new() -> Self {
        Self::default()
    }
}

pub fn osc52_sequence(text: &str) -> String {
    let encoded = STANDARD.encode(text.as_bytes());
    format!("\x1b]52;c;{encoded}\x1b\\")
}

impl HostWindow for TerminalHost {
    fn invalidate(&mut self) {}

    fn read_clipboard(&mut self, _out: &mut dyn Write) -> io::Result<()> {
        self.awaiting_paste = true;
        Ok(())
    }

    fn write_clipboard(&mut self, out: &mut dyn Write, text: &str) -> io::Result<()> {
        out.write_all(osc52_sequence(text).as_bytes())?;
        out.flush()
    }

    fn clipboard_delivered(&mut self) {
        self.awaiting_paste = false;
    }

    fn status(&self) -> Option<&str> {
        self.awaiting_paste.then_some(PASTE_HINT)
    }
}

/// Records host effects; scripted runs and tests use it in place of a
/// terminal.
#[derive(Debug, Default)]
pub struct MemoryHost {
    pub invalidations: usize,
    pub reads: usize,
    pub clipboard: Option<String>,
}

impl MemoryHost {
    pub fn new() -> Self {
        Self::default()
    }
}

impl HostWindow for MemoryHost {
    fn invalidate(&mut self) {
        self.invalidations += 1;
    }

    fn read_clipboard(&mut self, _out: &mut dyn Write) -> io::Result<()> {
        self.reads += 1;
        Ok(())
    }

    fn write_clipboard(&mut self, _out: &mut dyn Write, text: &str) -> io::Result<()> {
        self.clipboard = Some(text.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn osc52_wraps_base64_payload() {
        assert_eq!(osc52_sequence("hi"), "\x1b]52;c;aGk=\x1b\\");
    }

    #[test]
    fn terminal_host_prompts_until_paste_arrives() {
        let mut host = TerminalHost::new();
        let mut out = Vec::new();
        assert!(host.status().is_none());
        host.read_clipboard(&mut out).unwrap();
        assert_eq!(host.status(), Some(PASTE_HINT));
        host.clipboard_delivered();
        assert!(host.status().is_none());

        host.write_clipboard(&mut out, "hi").unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), osc52_sequence("hi"));
    }
}
