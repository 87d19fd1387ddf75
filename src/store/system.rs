//! OS clipboard access through platform helper programs.
//!
//! - macOS: `pbpaste` / `pbcopy`
//! - Wayland: `wl-paste` / `wl-copy`
//! - X11: `xclip`
//! - Windows: PowerShell `Get-Clipboard` / `Set-Clipboard`
//!
//! Every helper call is bounded by a timeout. Writes run under the replicated
//! value's exclusive lock, so a hung helper would otherwise stall the node.

use crate::error::StoreError;
use crate::store::LocalStore;
use async_trait::async_trait;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tokio::time::timeout;

/// Default bound on a single helper invocation
pub const HELPER_TIMEOUT: Duration = Duration::from_secs(5);

/// One helper invocation: program plus fixed arguments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HelperCommand {
    pub program: &'static str,
    pub args: &'static [&'static str],
}

impl HelperCommand {
    const fn new(program: &'static str, args: &'static [&'static str]) -> Self {
        Self { program, args }
    }

    fn describe(&self) -> String {
        if self.args.is_empty() {
            self.program.to_string()
        } else {
            format!("{} {}", self.program, self.args.join(" "))
        }
    }
}

/// Paste/copy helper pair for one platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Backend {
    pub name: &'static str,
    pub paste: HelperCommand,
    pub copy: HelperCommand,
}

pub const MACOS: Backend = Backend {
    name: "pbcopy",
    paste: HelperCommand::new("pbpaste", &[]),
    copy: HelperCommand::new("pbcopy", &[]),
};

pub const WAYLAND: Backend = Backend {
    name: "wl-clipboard",
    paste: HelperCommand::new("wl-paste", &["--no-newline"]),
    copy: HelperCommand::new("wl-copy", &[]),
};

pub const X11: Backend = Backend {
    name: "xclip",
    paste: HelperCommand::new("xclip", &["-selection", "clipboard", "-o"]),
    copy: HelperCommand::new("xclip", &["-selection", "clipboard", "-i"]),
};

pub const WINDOWS: Backend = Backend {
    name: "powershell",
    paste: HelperCommand::new(
        "powershell",
        &["-NoProfile", "-Command", "Get-Clipboard -Raw"],
    ),
    copy: HelperCommand::new(
        "powershell",
        &[
            "-NoProfile",
            "-Command",
            "[Console]::In.ReadToEnd() | Set-Clipboard",
        ],
    ),
};

/// Pick a unix backend from the display environment.
fn unix_backend(wayland: bool, x11: bool) -> Option<Backend> {
    if wayland {
        Some(WAYLAND)
    } else if x11 {
        Some(X11)
    } else {
        None
    }
}

/// The OS clipboard.
#[derive(Debug, Clone)]
pub struct SystemStore {
    backend: Backend,
    timeout: Duration,
}

impl SystemStore {
    pub fn with_backend(backend: Backend) -> Self {
        Self {
            backend,
            timeout: HELPER_TIMEOUT,
        }
    }

    /// Override how long one helper call may run before it is killed.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Choose the helper programs for the current platform.
    pub fn detect() -> Result<Self, StoreError> {
        if cfg!(target_os = "macos") {
            return Ok(Self::with_backend(MACOS));
        }
        if cfg!(windows) {
            return Ok(Self::with_backend(WINDOWS));
        }

        let wayland = std::env::var_os("WAYLAND_DISPLAY").is_some();
        let x11 = std::env::var_os("DISPLAY").is_some();

        unix_backend(wayland, x11)
            .map(Self::with_backend)
            .ok_or_else(|| {
                StoreError::Unavailable(
                    "neither WAYLAND_DISPLAY nor DISPLAY is set".to_string(),
                )
            })
    }

    pub fn backend(&self) -> &Backend {
        &self.backend
    }

    fn timed_out(&self, helper: HelperCommand) -> StoreError {
        StoreError::Timeout {
            command: helper.describe(),
            after: self.timeout,
        }
    }
}

#[async_trait]
impl LocalStore for SystemStore {
    async fn get(&self) -> Result<String, StoreError> {
        let helper = self.backend.paste;
        let output = Command::new(helper.program)
            .args(helper.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output();
        let output = timeout(self.timeout, output)
            .await
            .map_err(|_| self.timed_out(helper))??;

        if !output.status.success() {
            return Err(StoreError::CommandFailed {
                command: helper.describe(),
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        String::from_utf8(output.stdout).map_err(|_| StoreError::InvalidUtf8)
    }

    async fn set(&self, text: &str) -> Result<(), StoreError> {
        let helper = self.backend.copy;

        // xclip and wl-copy fork to keep serving the selection; the forked
        // child inherits stdout/stderr, so they must not be pipes we wait on.
        let mut child = Command::new(helper.program)
            .args(helper.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()?;

        let stdin = child.stdin.take();
        let finished = timeout(self.timeout, async {
            if let Some(mut stdin) = stdin {
                stdin.write_all(text.as_bytes()).await?;
                stdin.shutdown().await?;
            }
            child.wait().await
        })
        .await;

        let status = match finished {
            Ok(status) => status?,
            Err(_) => {
                let _ = child.kill().await;
                return Err(self.timed_out(helper));
            }
        };
        if !status.success() {
            return Err(StoreError::CommandFailed {
                command: helper.describe(),
                status: status.to_string(),
                stderr: String::new(),
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unix_backend_prefers_wayland() {
        assert_eq!(unix_backend(true, true), Some(WAYLAND));
        assert_eq!(unix_backend(false, true), Some(X11));
        assert_eq!(unix_backend(false, false), None);
    }

    #[test]
    fn test_helper_describe() {
        assert_eq!(MACOS.paste.describe(), "pbpaste");
        assert_eq!(X11.paste.describe(), "xclip -selection clipboard -o");
    }

    #[tokio::test]
    async fn test_missing_helper_is_store_error() {
        let store = SystemStore::with_backend(Backend {
            name: "missing",
            paste: HelperCommand::new("clipsync-no-such-helper", &[]),
            copy: HelperCommand::new("clipsync-no-such-helper", &[]),
        });

        assert!(matches!(store.get().await, Err(StoreError::Io(_))));
        assert!(matches!(store.set("x").await, Err(StoreError::Io(_))));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_helper_roundtrip_through_shell() {
        let store = SystemStore::with_backend(Backend {
            name: "shell",
            paste: HelperCommand::new("sh", &["-c", "printf 'from helper'"]),
            copy: HelperCommand::new("sh", &["-c", "cat > /dev/null"]),
        });

        assert_eq!(store.get().await.unwrap(), "from helper");
        store.set("ignored").await.unwrap();
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_helper_nonzero_exit() {
        let store = SystemStore::with_backend(Backend {
            name: "failing",
            paste: HelperCommand::new("sh", &["-c", "echo boom >&2; exit 3"]),
            copy: HelperCommand::new("sh", &["-c", "cat > /dev/null; exit 1"]),
        });

        match store.get().await {
            Err(StoreError::CommandFailed { stderr, .. }) => assert_eq!(stderr, "boom"),
            other => panic!("Expected CommandFailed, got {:?}", other),
        }
        assert!(matches!(
            store.set("x").await,
            Err(StoreError::CommandFailed { .. })
        ));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_hung_helper_times_out() {
        let store = SystemStore::with_backend(Backend {
            name: "hung",
            paste: HelperCommand::new("sh", &["-c", "sleep 30"]),
            copy: HelperCommand::new("sh", &["-c", "sleep 30"]),
        })
        .with_timeout(Duration::from_millis(200));

        let started = std::time::Instant::now();
        match store.get().await {
            Err(StoreError::Timeout { command, after }) => {
                assert_eq!(command, "sh -c sleep 30");
                assert_eq!(after, Duration::from_millis(200));
            }
            other => panic!("Expected Timeout, got {:?}", other),
        }
        assert!(matches!(
            store.set("x").await,
            Err(StoreError::Timeout { .. })
        ));
        assert!(started.elapsed() < Duration::from_secs(10));
    }

    #[test]
    fn test_default_timeout() {
        assert_eq!(SystemStore::with_backend(X11).timeout, HELPER_TIMEOUT);
    }
}
