//! Process execution on the host or through the subsystem bridge.

use std::path::Path;
use std::process::Command;
use std::sync::Arc;

use tracing::{debug, warn};

use super::CommandRunner;
use super::bridge::{self, BRIDGE_COMMAND, HostOs};
use super::types::{CommandError, CommandOutput};

/// Spawns commands as-is on the host.
pub struct DirectRunner {
    host: HostOs,
}

impl DirectRunner {
    pub fn new(host: HostOs) -> Self {
        Self { host }
    }
}

impl Default for DirectRunner {
    fn default() -> Self {
        Self::new(HostOs::current())
    }
}

impl CommandRunner for DirectRunner {
    fn output(&self, command: &str, args: &[String]) -> Result<CommandOutput, CommandError> {
        debug!(command, ?args, "spawning");
        let output = Command::new(command)
            .args(args)
            .output()
            .map_err(|source| CommandError::Spawn {
                command: command.to_string(),
                source,
            })?;

        Ok(CommandOutput {
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }

    fn convert_path(&self, path: &Path) -> String {
        path.to_string_lossy().into_owned()
    }

    fn is_command_available(&self, command: &str) -> bool {
        self.output(self.host.which_command(), &[command.to_string()])
            .is_ok_and(|out| out.success())
    }
}

/// Runs every command inside the subsystem bridge.
///
/// Each invocation is prefixed with [`BRIDGE_COMMAND`] and every
/// drive-rooted argument is mapped to the subsystem mount. A command that
/// already is the bridge entry is not prefixed twice.
pub struct BridgedRunner {
    inner: Arc<dyn CommandRunner>,
}

impl BridgedRunner {
    /// Wrap the runner that actually spawns processes on the host.
    pub fn new(inner: Arc<dyn CommandRunner>) -> Self {
        Self { inner }
    }

    fn bridge_args(&self, command: &str, args: &[String]) -> Vec<String> {
        let mut full = Vec::with_capacity(args.len() + 1);
        if command != BRIDGE_COMMAND {
            full.push(command.to_string());
        }
        full.extend(args.iter().map(|arg| {
            if bridge::is_drive_path(arg) {
                bridge::windows_to_bridge_path(arg, None)
            } else {
                arg.clone()
            }
        }));
        full
    }
}

impl CommandRunner for BridgedRunner {
    fn output(&self, command: &str, args: &[String]) -> Result<CommandOutput, CommandError> {
        let full = self.bridge_args(command, args);
        self.inner.output(BRIDGE_COMMAND, &full)
    }

    fn convert_path(&self, path: &Path) -> String {
        let cwd = std::env::current_dir()
            .ok()
            .map(|d| d.to_string_lossy().into_owned());
        bridge::windows_to_bridge_path(&path.to_string_lossy(), cwd.as_deref())
    }

    fn is_command_available(&self, command: &str) -> bool {
        self.output("which", &[command.to_string()])
            .is_ok_and(|out| out.success())
    }
}

/// Build a bridged runner when the host supports it and the bridge answers.
///
/// Returns `None` when bridging is not wanted or not possible. A failed
/// bridge probe is logged so the caller knows bridged tools are skipped.
pub fn bridge_runner(
    host: HostOs,
    use_bridge: bool,
    direct: Arc<dyn CommandRunner>,
) -> Option<Arc<dyn CommandRunner>> {
    if !host.supports_bridge() || !use_bridge {
        return None;
    }

    match direct.output(BRIDGE_COMMAND, &["--version".to_string()]) {
        Ok(out) if out.success() => Some(Arc::new(BridgedRunner::new(direct))),
        Ok(out) => {
            warn!(code = ?out.code, "WSL not available, falling back to native runner");
            None
        }
        Err(e) => {
            warn!(error = %e, "WSL not available, falling back to native runner");
            None
        }
    }
}

/// Pick the runner for `host`: bridged when requested and present, direct otherwise.
pub fn create_runner(host: HostOs, use_bridge: bool) -> Arc<dyn CommandRunner> {
    let direct: Arc<dyn CommandRunner> = Arc::new(DirectRunner::new(host));
    bridge_runner(host, use_bridge, Arc::clone(&direct)).unwrap_or(direct)
}
