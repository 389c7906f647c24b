//! Collaborators reached through the built-in functions: the console sink,
//! SQLite storage and the HTTP service.
pub mod console;
pub mod service;
pub mod storage;

pub use console::{CapturedConsole, Console, Notice, StdoutConsole};
pub use service::{ApiService, ServiceError};
pub use storage::{Rows, SharedStorage, Storage, StorageError};
