//! I/O boundary traits for testability
//!
//! These traits abstract the terminal and the driven process, allowing the
//! session to be tested with scripted input and mock processes.

use std::io::{self, Write};

use crate::application::{Session, SessionEvent};

/// Source of session events (keyboard, mouse, process exit).
pub trait EventSource {
    /// Block until the next event is available.
    fn next_event(&mut self) -> io::Result<SessionEvent>;
}

/// Something the session can be drawn on.
pub trait View {
    /// Draw the current state. May adjust the session's viewport.
    fn draw(&mut self, session: &mut Session) -> io::Result<()>;
}

/// Process whose yes/no prompt is being answered.
///
/// Writing goes to the process's stdin.
pub trait DrivenProcess: Write {
    /// Ask the process to stop. Only the first call has an effect.
    fn interrupt(&mut self) -> io::Result<()>;
}
