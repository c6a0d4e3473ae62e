//! External tool discovery with per-process memoization.

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use thiserror::Error;
use tracing::{debug, info};

use super::CommandRunner;
use super::bridge::{BRIDGE_COMMAND, HostOs};
use super::types::CommandVector;

/// External tools the providers depend on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToolId {
    Ffmpeg,
    Pico2Wave,
    Coqui,
    Gtts,
    OsVoice,
}

impl ToolId {
    pub fn as_str(&self) -> &'static str {
        match self {
            ToolId::Ffmpeg => "ffmpeg",
            ToolId::Pico2Wave => "pico2wave",
            ToolId::Coqui => "tts",
            ToolId::Gtts => "gtts-cli",
            ToolId::OsVoice => "os-voice",
        }
    }

    /// Describe how to find and validate this tool on `host`.
    ///
    /// `tools_dir` is where bundled native executables live on Windows.
    pub fn descriptor(&self, host: HostOs, tools_dir: &Path) -> ToolDescriptor {
        use Candidate::{Bridged, Native};

        let bundled = |exe: &str| Native(tools_dir.join(exe).to_string_lossy().into_owned());
        let native = |name: &str| Native(name.to_string());
        let bridged = |name: &str| Bridged(name.to_string());

        match self {
            ToolId::Ffmpeg => ToolDescriptor {
                probe_args: &["-version"],
                expected_exit_code: 0,
                candidates: match host {
                    HostOs::Windows => vec![bundled("ffmpeg.exe"), bridged("ffmpeg")],
                    _ => vec![native("ffmpeg")],
                },
                install_hint: match host {
                    HostOs::Windows => "check your install, ffmpeg should be present in tools\\ffmpeg.exe",
                    _ => "install ffmpeg: sudo apt install -y ffmpeg",
                },
            },
            // pico2wave answers --version with exit code 1
            ToolId::Pico2Wave => ToolDescriptor {
                probe_args: &["--version"],
                expected_exit_code: 1,
                candidates: match host {
                    HostOs::Windows => vec![bridged("pico2wave")],
                    _ => vec![native("pico2wave")],
                },
                install_hint: match host {
                    HostOs::Windows => {
                        "install pico2wave: wsl sudo apt update && wsl sudo apt install -y libttspico-utils"
                    }
                    _ => "install pico2wave: sudo apt install -y libttspico-utils",
                },
            },
            ToolId::Coqui => ToolDescriptor {
                probe_args: &["-h"],
                expected_exit_code: 0,
                candidates: match host {
                    HostOs::Windows => vec![bridged("tts"), native("tts")],
                    _ => vec![native("tts")],
                },
                install_hint: "install coqui-tts: pip install coqui-tts",
            },
            ToolId::Gtts => ToolDescriptor {
                probe_args: &["-h"],
                expected_exit_code: 0,
                candidates: match host {
                    HostOs::Windows => vec![bridged("gtts-cli"), native("gtts-cli")],
                    _ => vec![native("gtts-cli")],
                },
                install_hint: "install gTTS: pip install gTTS",
            },
            ToolId::OsVoice => match host {
                HostOs::Windows => ToolDescriptor {
                    probe_args: &["-NoProfile", "-Command", "exit 0"],
                    expected_exit_code: 0,
                    candidates: vec![native("powershell")],
                    install_hint: "PowerShell with System.Speech is required for the Windows voice",
                },
                HostOs::MacOs => ToolDescriptor {
                    probe_args: &["-v", "?"],
                    expected_exit_code: 0,
                    candidates: vec![native("say")],
                    install_hint: "the macOS `say` command is required for the system voice",
                },
                HostOs::Unix => ToolDescriptor {
                    probe_args: &[],
                    expected_exit_code: 0,
                    candidates: Vec::new(),
                    install_hint: "no system voice on this platform, use pico2wave instead",
                },
            },
        }
    }
}

impl fmt::Display for ToolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One way of invoking a tool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Candidate {
    /// Executable spawned directly on the host.
    Native(String),
    /// Executable run inside the subsystem bridge.
    Bridged(String),
}

impl Candidate {
    fn vector(&self) -> CommandVector {
        match self {
            Candidate::Native(program) => vec![program.clone()],
            Candidate::Bridged(program) => vec![BRIDGE_COMMAND.to_string(), program.clone()],
        }
    }
}

/// Candidates in priority order plus the probe that validates each one.
#[derive(Debug, Clone)]
pub struct ToolDescriptor {
    pub probe_args: &'static [&'static str],
    /// Exit code the probe must return for the tool to count as present.
    pub expected_exit_code: i32,
    pub candidates: Vec<Candidate>,
    pub install_hint: &'static str,
}

/// No candidate for a tool passed its probe.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Command {tool} not found, {hint}")]
pub struct ToolNotFoundError {
    pub tool: ToolId,
    pub hint: String,
}

/// Resolves tools to command vectors, probing each candidate once.
///
/// Successful resolutions are kept for the lifetime of the resolver;
/// failures are not, so a later call probes again.
pub struct CommandResolver {
    host: HostOs,
    tools_dir: PathBuf,
    direct: Arc<dyn CommandRunner>,
    bridge: Option<Arc<dyn CommandRunner>>,
    resolved: Mutex<HashMap<ToolId, CommandVector>>,
}

impl CommandResolver {
    /// Create a resolver.
    ///
    /// # Arguments
    /// * `direct` - runner used to probe native candidates
    /// * `bridge` - runner used to probe bridged candidates; `None` skips them
    pub fn new(
        host: HostOs,
        tools_dir: PathBuf,
        direct: Arc<dyn CommandRunner>,
        bridge: Option<Arc<dyn CommandRunner>>,
    ) -> Self {
        Self {
            host,
            tools_dir,
            direct,
            bridge,
            resolved: Mutex::new(HashMap::new()),
        }
    }

    /// Directory holding bundled executables: `tools/` beside the current binary.
    pub fn default_tools_dir() -> PathBuf {
        std::env::current_exe()
            .ok()
            .and_then(|exe| exe.parent().map(Path::to_path_buf))
            .unwrap_or_else(|| PathBuf::from("."))
            .join("tools")
    }

    pub fn host(&self) -> HostOs {
        self.host
    }

    /// Resolve `tool` to the vector used to invoke it.
    pub fn resolve(&self, tool: ToolId) -> Result<CommandVector, ToolNotFoundError> {
        if let Some(vector) = self.lock().get(&tool) {
            return Ok(vector.clone());
        }

        let descriptor = tool.descriptor(self.host, &self.tools_dir);
        for candidate in &descriptor.candidates {
            if self.probe(candidate, &descriptor) {
                let vector = candidate.vector();
                info!(%tool, ?vector, "resolved command");
                self.lock().insert(tool, vector.clone());
                return Ok(vector);
            }
        }

        Err(ToolNotFoundError {
            tool,
            hint: descriptor.install_hint.to_string(),
        })
    }

    /// Whether `tool` resolves, without surfacing the error.
    pub fn is_resolvable(&self, tool: ToolId) -> bool {
        self.resolve(tool).is_ok()
    }

    fn probe(&self, candidate: &Candidate, descriptor: &ToolDescriptor) -> bool {
        let (runner, program) = match candidate {
            Candidate::Native(program) => (&self.direct, program),
            Candidate::Bridged(program) => match &self.bridge {
                Some(bridge) => (bridge, program),
                None => return false,
            },
        };

        let args: Vec<String> = descriptor.probe_args.iter().map(|a| a.to_string()).collect();
        let result = runner.output(program, &args);
        debug!(?candidate, ?result, "probe");
        matches!(result, Ok(out) if out.code == Some(descriptor.expected_exit_code))
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<ToolId, CommandVector>> {
        self.resolved.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
