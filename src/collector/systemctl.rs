//! Service manager backed by the `systemctl` command line tool.
//!
//! Units are listed with
//! `systemctl list-units --all --no-legend --no-pager --plain`, which prints
//! one unit per line as `UNIT LOAD ACTIVE SUB DESCRIPTION...`.

use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::debug;

use super::traits::{ConnectionError, ServiceManager, UnitConnection, UnitStatus};

/// Default location of the `systemctl` binary (resolved through `$PATH`).
pub const DEFAULT_SYSTEMCTL: &str = "systemctl";

/// Which systemd instance to talk to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ManagerScope {
    /// The system-wide manager (PID 1).
    #[default]
    System,
    /// The calling user's manager.
    User,
}

/// Production service manager.
#[derive(Debug, Clone)]
pub struct Systemctl {
    binary: PathBuf,
    scope: ManagerScope,
}

impl Default for Systemctl {
    fn default() -> Self {
        Self::new(DEFAULT_SYSTEMCTL)
    }
}

impl Systemctl {
    /// Creates a provider using the given `systemctl` binary.
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
            scope: ManagerScope::System,
        }
    }

    /// Selects the system or user manager.
    pub fn with_scope(mut self, scope: ManagerScope) -> Self {
        self.scope = scope;
        self
    }

    /// Returns the configured binary path.
    pub fn binary(&self) -> &Path {
        &self.binary
    }
}

/// Open handle to `systemctl`.
///
/// The tool is stateless between invocations, so the handle only remembers
/// how to reach the manager.
#[derive(Debug)]
pub struct SystemctlConnection {
    binary: PathBuf,
    scope: ManagerScope,
}

impl SystemctlConnection {
    fn command(&self) -> Command {
        let mut cmd = Command::new(&self.binary);
        if self.scope == ManagerScope::User {
            cmd.arg("--user");
        }
        cmd
    }
}

impl ServiceManager for Systemctl {
    type Connection = SystemctlConnection;

    fn open(&self) -> Result<SystemctlConnection, ConnectionError> {
        let output = Command::new(&self.binary)
            .arg("--version")
            .output()
            .map_err(|e| {
                ConnectionError::Unavailable(format!("{}: {}", self.binary.display(), e))
            })?;

        if !output.status.success() {
            return Err(ConnectionError::Unavailable(format!(
                "{} --version exited with {}",
                self.binary.display(),
                output.status
            )));
        }

        let version = String::from_utf8_lossy(&output.stdout);
        debug!(
            version = version.lines().next().unwrap_or_default(),
            "connected to service manager"
        );

        Ok(SystemctlConnection {
            binary: self.binary.clone(),
            scope: self.scope,
        })
    }
}

impl UnitConnection for SystemctlConnection {
    fn list_units(&mut self) -> Result<Vec<UnitStatus>, ConnectionError> {
        let output = self
            .command()
            .args(["list-units", "--all", "--no-legend", "--no-pager", "--plain"])
            .output()
            .map_err(|e| ConnectionError::CallFailed(e.to_string()))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ConnectionError::CallFailed(format!(
                "list-units exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }

        parse_list_units(&String::from_utf8_lossy(&output.stdout))
    }

    fn close(self) {
        debug!("released service manager connection");
    }
}

/// Parses `systemctl list-units --plain --no-legend` output.
///
/// Blank lines are skipped. A leading status bullet (`●`, `*`) is tolerated
/// since some systemd versions print it even in plain mode.
pub fn parse_list_units(content: &str) -> Result<Vec<UnitStatus>, ConnectionError> {
    let mut units = Vec::new();

    for line in content.lines() {
        let mut parts = line.split_whitespace().peekable();
        if matches!(parts.peek(), Some(&"●") | Some(&"*")) {
            parts.next();
        }

        let Some(name) = parts.next() else {
            continue;
        };

        let (Some(load), Some(active), Some(sub)) = (parts.next(), parts.next(), parts.next())
        else {
            return Err(ConnectionError::Malformed(line.trim().to_string()));
        };

        units.push(UnitStatus {
            name: name.to_string(),
            load_state: load.to_string(),
            active_state: active.to_string(),
            sub_state: sub.to_string(),
            description: parts.collect::<Vec<_>>().join(" "),
        });
    }

    Ok(units)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_list_units() {
        let content = "\
-.mount                      loaded    active   mounted   Root Mount
sshd.service                 loaded    active   running   OpenSSH Daemon
cups.service                 loaded    inactive dead      CUPS Scheduler
● nginx.service              loaded    failed   failed    A high performance web server
systemd-journald.socket      loaded    active   listening Journal Socket
";
        let units = parse_list_units(content).unwrap();
        assert_eq!(units.len(), 5);

        assert_eq!(units[1].name, "sshd.service");
        assert_eq!(units[1].load_state, "loaded");
        assert_eq!(units[1].active_state, "active");
        assert_eq!(units[1].sub_state, "running");
        assert_eq!(units[1].description, "OpenSSH Daemon");

        assert_eq!(units[3].name, "nginx.service");
        assert_eq!(units[3].active_state, "failed");
        assert_eq!(units[3].description, "A high performance web server");

        assert_eq!(units.iter().filter(|u| u.is_active()).count(), 3);
    }

    #[test]
    fn test_parse_without_description() {
        let units = parse_list_units("foo.service loaded active running\n").unwrap();
        assert_eq!(units.len(), 1);
        assert!(units[0].description.is_empty());
    }

    #[test]
    fn test_parse_empty() {
        assert!(parse_list_units("").unwrap().is_empty());
        assert!(parse_list_units("\n   \n").unwrap().is_empty());
    }

    #[test]
    fn test_parse_truncated_line() {
        let err = parse_list_units("foo.service loaded\n").unwrap_err();
        assert_eq!(err, ConnectionError::Malformed("foo.service loaded".to_string()));
    }

    #[test]
    fn test_open_missing_binary() {
        let manager = Systemctl::new("/nonexistent/bin/systemctl-12345");
        let err = manager.open().unwrap_err();
        assert!(matches!(err, ConnectionError::Unavailable(_)));
    }

    #[test]
    fn test_user_scope_adds_flag() {
        let conn = SystemctlConnection {
            binary: PathBuf::from(DEFAULT_SYSTEMCTL),
            scope: ManagerScope::User,
        };
        let cmd = conn.command();
        let args: Vec<_> = cmd.get_args().collect();
        assert_eq!(args, [std::ffi::OsStr::new("--user")]);
    }
}
