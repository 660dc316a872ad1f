//! Create and spool Asterisk call files.
//!
//! A call file is a small `Key: Value` text document dropped into a
//! directory that Asterisk polls; the daemon picks it up and places the
//! call. This crate renders such documents from typed descriptors and
//! delivers them atomically, optionally scheduled for a future time via
//! the file's modification timestamp.
//!
//! ```no_run
//! use rustcall::{Action, CallFile, CallTarget};
//!
//! fn main() -> Result<(), rustcall::CallFileError> {
//!     let call = CallTarget::new("SIP/1234").with_wait_time(30);
//!     let action = Action::application_with_data("Playback", "hello-world");
//!
//!     CallFile::new(&call, &action)
//!         .with_variable("GREETING", "morning")
//!         .spool(None)
//! }
//! ```

pub mod action;
pub mod call;
pub mod callfile;
pub mod config;
pub mod error;
pub mod spool;
pub mod version;

pub use action::Action;
pub use call::CallTarget;
pub use callfile::CallFile;
pub use config::{Config, DEFAULT_SPOOL_DIR};
pub use error::CallFileError;
