use std::path::Path;
use std::process::{Command, Output, Stdio};

use super::{SessionControl, SessionError, SessionInfo};

/// Sessions on the default tmux server.
#[derive(Debug, Clone)]
pub struct TmuxSessions {
    program: String,
}

impl Default for TmuxSessions {
    fn default() -> Self {
        TmuxSessions {
            program: "tmux".to_string(),
        }
    }
}

impl TmuxSessions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a different tmux binary (e.g. a wrapper script).
    pub fn with_program(program: impl Into<String>) -> Self {
        TmuxSessions {
            program: program.into(),
        }
    }

    fn run(&self, args: &[&str]) -> Result<Output, SessionError> {
        let output = Command::new(&self.program)
            .args(args)
            .stdin(Stdio::null())
            .output()
            .map_err(SessionError::Unavailable)?;
        if output.status.success() {
            Ok(output)
        } else {
            Err(SessionError::Command {
                command: format!("{} {}", self.program, args.join(" ")),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            })
        }
    }
}

/// Exact-match target, so `alpha/w1` never resolves to `alpha/w10`.
fn target(name: &str) -> String {
    format!("={}", name)
}

fn parse_sessions(stdout: &str) -> Vec<SessionInfo> {
    stdout
        .lines()
        .filter_map(|line| {
            let (name, windows) = line.rsplit_once('\t')?;
            Some(SessionInfo {
                name: name.to_string(),
                windows: windows.trim().parse().unwrap_or(0),
            })
        })
        .collect()
}

/// tmux reports "no server running" (or a missing socket) when there are
/// simply no sessions yet.
fn is_no_server(stderr: &str) -> bool {
    stderr.contains("no server running") || stderr.contains("error connecting to")
}

impl SessionControl for TmuxSessions {
    fn create_session(&self, name: &str, start_dir: &Path) -> Result<(), SessionError> {
        let dir = start_dir.to_string_lossy();
        self.run(&["new-session", "-d", "-s", name, "-c", &dir])?;
        Ok(())
    }

    fn rename_session(&self, old_name: &str, new_name: &str) -> Result<(), SessionError> {
        self.run(&["rename-session", "-t", &target(old_name), new_name])?;
        Ok(())
    }

    fn kill_session(&self, name: &str) -> Result<(), SessionError> {
        self.run(&["kill-session", "-t", &target(name)])?;
        Ok(())
    }

    fn list_sessions(&self) -> Result<Vec<SessionInfo>, SessionError> {
        match self.run(&["list-sessions", "-F", "#{session_name}\t#{session_windows}"]) {
            Ok(output) => Ok(parse_sessions(&String::from_utf8_lossy(&output.stdout))),
            Err(SessionError::Command { stderr, .. }) if is_no_server(&stderr) => Ok(Vec::new()),
            Err(e) => Err(e),
        }
    }

    fn attach(&self, name: &str) -> Result<(), SessionError> {
        let inside_tmux = std::env::var_os("TMUX").is_some();
        let verb = if inside_tmux {
            "switch-client"
        } else {
            "attach-session"
        };
        let status = Command::new(&self.program)
            .args([verb, "-t", &target(name)])
            .status()
            .map_err(SessionError::Unavailable)?;
        if status.success() {
            Ok(())
        } else {
            Err(SessionError::Command {
                command: format!("{} {} -t {}", self.program, verb, name),
                stderr: format!("exited with {}", status),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_list_output() {
        let out = "alpha/w1\t3\nbeta/main\t1\n";
        assert_eq!(
            parse_sessions(out),
            vec![
                SessionInfo {
                    name: "alpha/w1".into(),
                    windows: 3
                },
                SessionInfo {
                    name: "beta/main".into(),
                    windows: 1
                },
            ]
        );
    }

    #[test]
    fn parse_ignores_malformed_lines() {
        assert!(parse_sessions("garbage\n\n").is_empty());
    }

    #[test]
    fn exact_match_target() {
        assert_eq!(target("alpha/w1"), "=alpha/w1");
    }

    #[test]
    fn no_server_detection() {
        assert!(is_no_server("no server running on /tmp/tmux-1000/default"));
        assert!(!is_no_server("can't find session: x"));
    }

    #[test]
    fn missing_binary_is_unavailable() {
        let tmux = TmuxSessions::with_program("hangar-no-such-tmux-binary");
        assert!(matches!(
            tmux.list_sessions(),
            Err(SessionError::Unavailable(_))
        ));
    }
}
