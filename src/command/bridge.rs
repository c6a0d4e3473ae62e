//! Host/subsystem path translation.

use std::path::Path;

/// Command that enters the Linux subsystem on a Windows host.
pub const BRIDGE_COMMAND: &str = "wsl";

/// Operating environment the process is running on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostOs {
    Windows,
    MacOs,
    Unix,
}

impl HostOs {
    /// Detect the host this binary was compiled for.
    pub fn current() -> Self {
        if cfg!(target_os = "windows") {
            HostOs::Windows
        } else if cfg!(target_os = "macos") {
            HostOs::MacOs
        } else {
            HostOs::Unix
        }
    }

    /// Whether commands may run through the subsystem bridge on this host.
    pub fn supports_bridge(&self) -> bool {
        matches!(self, HostOs::Windows)
    }

    /// Name of the "which"-style lookup command.
    pub fn which_command(&self) -> &'static str {
        match self {
            HostOs::Windows => "where",
            HostOs::MacOs | HostOs::Unix => "which",
        }
    }
}

/// Returns true when `command` will execute through the bridge.
pub fn is_bridged(command: &[String]) -> bool {
    command.first().is_some_and(|c| c == BRIDGE_COMMAND)
}

/// Returns true for drive-letter-rooted paths such as `D:\x` or `d:/x`.
pub fn is_drive_path(path: &str) -> bool {
    let bytes = path.as_bytes();
    bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':'
}

/// Translate `path` into the form expected where `command` executes.
///
/// Translation only happens on a bridge-capable host, when bridging is not
/// disabled, and when the command vector starts with [`BRIDGE_COMMAND`].
/// Anything that runs natively gets the path back untouched.
pub fn to_execution_path(path: &Path, command: &[String], skip_bridge: bool) -> String {
    to_execution_path_on(HostOs::current(), path, command, skip_bridge)
}

/// Same as [`to_execution_path`] with an explicit host.
pub fn to_execution_path_on(
    host: HostOs,
    path: &Path,
    command: &[String],
    skip_bridge: bool,
) -> String {
    let raw = path.to_string_lossy();
    if host.supports_bridge() && !skip_bridge && is_bridged(command) {
        let cwd = std::env::current_dir()
            .ok()
            .map(|d| d.to_string_lossy().into_owned());
        windows_to_bridge_path(&raw, cwd.as_deref())
    } else {
        raw.into_owned()
    }
}

/// Map a Windows path to the subsystem mount convention.
///
/// `C:\Users\a\f.txt` becomes `/mnt/c/Users/a/f.txt`. Relative paths are
/// joined onto `cwd` first. Paths already rooted with `/` carry no drive
/// and only have their separators normalised, so a translated path maps to
/// itself.
pub fn windows_to_bridge_path(path: &str, cwd: Option<&str>) -> String {
    if path.is_empty() {
        return String::new();
    }

    let absolute = if is_drive_path(path) || path.starts_with('/') || path.starts_with('\\') {
        path.to_string()
    } else {
        match cwd {
            Some(dir) => format!("{}\\{}", dir.trim_end_matches(['\\', '/']), path),
            None => path.to_string(),
        }
    };

    let unix = absolute.replace('\\', "/");
    if is_drive_path(&unix) {
        let drive = unix[..1].to_ascii_lowercase();
        format!("/mnt/{}{}", drive, &unix[2..])
    } else {
        unix
    }
}
