//! Terminal multiplexer sessions, as seen by the rest of the crate.
//!
//! The core only needs to create, rename, kill, list and attach sessions by
//! name. `TmuxSessions` drives a real tmux server; `MemorySessions` keeps
//! everything in memory and records each call.

pub mod memory;
pub mod tmux;

use std::io;
use std::path::Path;

use serde::Serialize;

pub use memory::{MemorySessions, SessionCall};
pub use tmux::TmuxSessions;

/// Error type for session control
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("session control unavailable: {0}")]
    Unavailable(#[source] io::Error),
    #[error("`{command}` failed: {stderr}")]
    Command { command: String, stderr: String },
    #[error("no such session: {0}")]
    NotFound(String),
}

/// A live session and how many windows it has
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionInfo {
    pub name: String,
    pub windows: usize,
}

pub trait SessionControl: Send + Sync {
    fn create_session(&self, name: &str, start_dir: &Path) -> Result<(), SessionError>;
    fn rename_session(&self, old_name: &str, new_name: &str) -> Result<(), SessionError>;
    fn kill_session(&self, name: &str) -> Result<(), SessionError>;
    fn list_sessions(&self) -> Result<Vec<SessionInfo>, SessionError>;
    /// Hand the terminal over to the session. Blocks until detached.
    fn attach(&self, name: &str) -> Result<(), SessionError>;
}
