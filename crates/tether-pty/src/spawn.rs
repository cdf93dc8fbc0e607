//! PTY spawn logic: create a new PTY running the user's default shell.

use std::io::{Read, Write};
use std::path::Path;

use portable_pty::{native_pty_system, Child, CommandBuilder, MasterPty, PtySize};

/// Default terminal columns.
pub const DEFAULT_COLS: u16 = 80;

/// Default terminal rows.
pub const DEFAULT_ROWS: u16 = 24;

/// Maximum bytes to read from a PTY in a single read (8 KB).
pub const PTY_READ_CHUNK: usize = 8_192;

/// Get the user's default shell.
///
/// - Unix: reads `$SHELL`, falls back to `/bin/sh`
/// - Windows: reads `$COMSPEC`, falls back to `cmd.exe`
pub fn default_shell() -> String {
    #[cfg(unix)]
    {
        std::env::var("SHELL").unwrap_or_else(|_| "/bin/sh".to_string())
    }
    #[cfg(windows)]
    {
        std::env::var("COMSPEC").unwrap_or_else(|_| "cmd.exe".to_string())
    }
}

/// Allowed environment variables to inherit.
///
/// A minimal set so the daemon's own secrets (tokens, keys) never leak into
/// shells driven from a phone.
const ALLOWED_ENV_VARS: &[&str] = &[
    "HOME",
    "USER",
    "LOGNAME",
    "SHELL",
    "PATH",
    "TERM",
    "LANG",
    "LC_ALL",
    "LC_CTYPE",
    "TMPDIR",
    "TMP",
    "TEMP",
    // Windows-specific
    "USERPROFILE",
    "APPDATA",
    "LOCALAPPDATA",
    "SYSTEMROOT",
    "COMSPEC",
    "HOMEDRIVE",
    "HOMEPATH",
];

/// Build a sanitized `CommandBuilder` for the given shell, rooted at `cwd`.
fn build_shell_command(shell: &str, cwd: &Path) -> CommandBuilder {
    let mut cmd = CommandBuilder::new(shell);

    cmd.env_clear();
    for key in ALLOWED_ENV_VARS {
        if let Ok(val) = std::env::var(key) {
            cmd.env(key, val);
        }
    }
    cmd.env("TERM", "xterm-256color");
    cmd.cwd(cwd);

    // On Unix, -l loads the user's profile so the remote shell behaves like
    // a local login.
    #[cfg(unix)]
    {
        cmd.arg("-l");
    }

    cmd
}

/// The master side of a spawned PTY pair.
pub(crate) struct PtyHandle {
    pub(crate) writer: Box<dyn Write + Send>,
    pub(crate) reader: Box<dyn Read + Send>,
    pub(crate) child: Box<dyn Child + Send + Sync>,
    pub(crate) master: Box<dyn MasterPty + Send>,
}

/// Spawn the default shell on a fresh PTY rooted at `cwd`.
pub(crate) fn spawn_pty(cols: u16, rows: u16, cwd: &Path) -> Result<PtyHandle, String> {
    // The chdir happens in the forked child, so a bad directory would
    // otherwise surface as an instantly-dead shell instead of an error.
    if !cwd.is_dir() {
        return Err(format!(
            "working directory {} does not exist",
            cwd.display()
        ));
    }

    let pty_system = native_pty_system();

    let size = PtySize {
        rows,
        cols,
        pixel_width: 0,
        pixel_height: 0,
    };

    let pair = pty_system
        .openpty(size)
        .map_err(|e| format!("Failed to open PTY: {e}"))?;

    let shell = default_shell();
    let cmd = build_shell_command(&shell, cwd);

    let child = pair
        .slave
        .spawn_command(cmd)
        .map_err(|e| format!("Failed to spawn shell '{shell}': {e}"))?;

    // Drop the slave side — we only need the master
    drop(pair.slave);

    let writer = pair
        .master
        .take_writer()
        .map_err(|e| format!("Failed to take PTY writer: {e}"))?;

    let reader = pair
        .master
        .try_clone_reader()
        .map_err(|e| format!("Failed to clone PTY reader: {e}"))?;

    Ok(PtyHandle {
        writer,
        reader,
        child,
        master: pair.master,
    })
}
