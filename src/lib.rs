// Library surface for the binary, headless runs and integration tests.
pub mod app;
pub mod app_dirs;
pub mod clock;
pub mod config;
pub mod display;
pub mod error;
pub mod input;
pub mod logging;
pub mod passages;
pub mod runtime;
pub mod scoring;
pub mod session;
pub mod ui;
pub mod util;

pub use error::{PassageError, SessionError};
pub use session::{SessionEvent, SessionPhase, TypingSession};
