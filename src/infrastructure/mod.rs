//! Infrastructure layer: terminal, rendering and the driven process
//!
//! This layer implements the I/O boundary traits used by the session.

pub mod error;
pub mod process;
pub mod terminal;
pub mod traits;
pub mod ui;

pub use error::{InfraError, InfraResult};
pub use process::{ChildProcess, Exit, ExitWatcher, Spawned};
pub use terminal::{TerminalEvents, TerminalUi};
