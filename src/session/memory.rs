use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use super::{SessionControl, SessionError, SessionInfo};
use crate::model::session_name;

/// One recorded call against `MemorySessions`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionCall {
    Create { name: String, start_dir: PathBuf },
    Rename { from: String, to: String },
    Kill(String),
    Attach(String),
}

#[derive(Debug, Default)]
struct State {
    sessions: BTreeMap<String, PathBuf>,
    calls: Vec<SessionCall>,
    fail_renames: bool,
    fail_kills: bool,
    tmux_names: bool,
}

impl State {
    fn stored_name(&self, requested: &str) -> String {
        if self.tmux_names {
            session_name(requested)
        } else {
            requested.to_string()
        }
    }
}

/// In-process session backend. Used when no multiplexer is wanted and by
/// tests that need to observe which session calls were made.
#[derive(Debug, Default)]
pub struct MemorySessions {
    state: Mutex<State>,
}

impl MemorySessions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with live sessions already present.
    pub fn with_sessions<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let sessions = MemorySessions::new();
        {
            let mut state = sessions.lock();
            for name in names {
                state.sessions.insert(name.into(), PathBuf::new());
            }
        }
        sessions
    }

    /// Make every rename fail with a command error.
    pub fn fail_renames(&self, fail: bool) {
        self.lock().fail_renames = fail;
    }

    /// Store names the way tmux does, with `.` and `:` rewritten to `_`.
    /// Lookups still match the exact name given.
    pub fn tmux_names(&self, enabled: bool) {
        self.lock().tmux_names = enabled;
    }

    /// Make every kill fail with a command error.
    pub fn fail_kills(&self, fail: bool) {
        self.lock().fail_kills = fail;
    }

    pub fn calls(&self) -> Vec<SessionCall> {
        self.lock().calls.clone()
    }

    pub fn names(&self) -> Vec<String> {
        self.lock().sessions.keys().cloned().collect()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl SessionControl for MemorySessions {
    fn create_session(&self, name: &str, start_dir: &Path) -> Result<(), SessionError> {
        let mut state = self.lock();
        state.calls.push(SessionCall::Create {
            name: name.to_string(),
            start_dir: start_dir.to_path_buf(),
        });
        let stored = state.stored_name(name);
        if state.sessions.contains_key(&stored) {
            return Err(SessionError::Command {
                command: format!("new-session -s {}", name),
                stderr: format!("duplicate session: {}", stored),
            });
        }
        state.sessions.insert(stored, start_dir.to_path_buf());
        Ok(())
    }

    fn rename_session(&self, old_name: &str, new_name: &str) -> Result<(), SessionError> {
        let mut state = self.lock();
        state.calls.push(SessionCall::Rename {
            from: old_name.to_string(),
            to: new_name.to_string(),
        });
        if state.fail_renames {
            return Err(SessionError::Command {
                command: format!("rename-session -t {} {}", old_name, new_name),
                stderr: "rename refused".to_string(),
            });
        }
        let dir = state
            .sessions
            .remove(old_name)
            .ok_or_else(|| SessionError::NotFound(old_name.to_string()))?;
        let stored = state.stored_name(new_name);
        state.sessions.insert(stored, dir);
        Ok(())
    }

    fn kill_session(&self, name: &str) -> Result<(), SessionError> {
        let mut state = self.lock();
        state.calls.push(SessionCall::Kill(name.to_string()));
        if state.fail_kills {
            return Err(SessionError::Command {
                command: format!("kill-session -t {}", name),
                stderr: "kill refused".to_string(),
            });
        }
        state
            .sessions
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| SessionError::NotFound(name.to_string()))
    }

    fn list_sessions(&self) -> Result<Vec<SessionInfo>, SessionError> {
        Ok(self
            .lock()
            .sessions
            .keys()
            .map(|name| SessionInfo {
                name: name.clone(),
                windows: 1,
            })
            .collect())
    }

    fn attach(&self, name: &str) -> Result<(), SessionError> {
        let mut state = self.lock();
        state.calls.push(SessionCall::Attach(name.to_string()));
        if state.sessions.contains_key(name) {
            Ok(())
        } else {
            Err(SessionError::NotFound(name.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_rename_kill() {
        let s = MemorySessions::new();
        s.create_session("alpha/w1", Path::new("/tmp")).unwrap();
        s.rename_session("alpha/w1", "beta/w1").unwrap();
        assert_eq!(s.names(), vec!["beta/w1"]);
        s.kill_session("beta/w1").unwrap();
        assert!(s.list_sessions().unwrap().is_empty());
        assert_eq!(s.calls().len(), 3);
    }

    #[test]
    fn rename_missing_session_errors() {
        let s = MemorySessions::new();
        assert!(matches!(
            s.rename_session("nope", "other"),
            Err(SessionError::NotFound(_))
        ));
    }

    #[test]
    fn tmux_names_rewrite_dots_and_colons() {
        let s = MemorySessions::new();
        s.tmux_names(true);
        s.create_session("web/site.com", Path::new("/tmp")).unwrap();
        assert_eq!(s.names(), vec!["web/site_com"]);
        assert!(matches!(
            s.create_session("web/site.com", Path::new("/tmp")),
            Err(SessionError::Command { .. })
        ));
        assert!(matches!(
            s.kill_session("web/site.com"),
            Err(SessionError::NotFound(_))
        ));
        s.kill_session("web/site_com").unwrap();
        assert!(s.names().is_empty());
    }

    #[test]
    fn forced_failures() {
        let s = MemorySessions::with_sessions(["a/b"]);
        s.fail_kills(true);
        assert!(s.kill_session("a/b").is_err());
        assert_eq!(s.names(), vec!["a/b"]);
    }
}
