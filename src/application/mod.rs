//! Application layer: reading, navigation, confirmation and the session loop
//!
//! This layer orchestrates domain logic and depends on I/O boundary traits.

pub mod confirm;
pub mod error;
pub mod error_ext;
pub mod navigator;
pub mod reader;
pub mod session;

pub use confirm::{dialog_buttons, send_answer, Answer, ConfirmDialog};
pub use error::{ApplicationError, ApplicationResult};
pub use error_ext::IoResultExt;
pub use navigator::{Activation, Navigator};
pub use reader::EchoLines;
pub use session::{interrupt_unanswered, terminates_session, Input, Mode, Session, SessionEnd, SessionEvent, Viewport};
