//! External command discovery and execution.
//!
//! Tools are resolved once into a [`CommandVector`] by the
//! [`CommandResolver`], executed through a [`CommandRunner`], and any
//! path passed to them is translated by the [`bridge`] helpers when the
//! tool runs inside the Linux subsystem of a Windows host.

pub mod bridge;
mod resolver;
mod runner;
mod types;

pub use bridge::{BRIDGE_COMMAND, HostOs, to_execution_path, to_execution_path_on};
pub use resolver::{Candidate, CommandResolver, ToolDescriptor, ToolId, ToolNotFoundError};
pub use runner::{BridgedRunner, DirectRunner, bridge_runner, create_runner};
pub use types::{CommandError, CommandOutput, CommandVector};

use std::path::Path;

/// Trait for running external commands.
///
/// Implementations capture stdout/stderr and report the exit code without
/// treating a non-zero code as an error; use [`CommandRunnerExt::run`] for
/// the failing variant.
#[cfg_attr(test, mockall::automock)]
pub trait CommandRunner: Send + Sync {
    /// Run `command` with `args` and return its captured output.
    fn output(&self, command: &str, args: &[String]) -> Result<CommandOutput, CommandError>;

    /// Convert a host path for the environment commands run in.
    fn convert_path(&self, path: &Path) -> String;

    /// Check whether `command` can be found by this runner.
    fn is_command_available(&self, command: &str) -> bool;
}

/// Helpers shared by every runner.
pub trait CommandRunnerExt: CommandRunner {
    /// Run and return stdout, failing on a non-zero exit.
    fn run(&self, command: &str, args: &[String]) -> Result<String, CommandError> {
        self.output(command, args)?.into_stdout(command)
    }

    /// Run a resolved vector with extra arguments appended, without failing on exit code.
    fn output_vector(
        &self,
        vector: &[String],
        args: &[String],
    ) -> Result<CommandOutput, CommandError> {
        let Some((program, prefix)) = vector.split_first() else {
            return Err(CommandError::Spawn {
                command: String::new(),
                source: std::io::Error::new(std::io::ErrorKind::InvalidInput, "empty command"),
            });
        };
        let mut full = prefix.to_vec();
        full.extend_from_slice(args);
        self.output(program, &full)
    }
}

impl<R: CommandRunner + ?Sized> CommandRunnerExt for R {}
