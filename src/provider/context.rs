//! Shared state handed to every provider.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tempfile::TempDir;
use tracing::{error, info};

use crate::audio::AudioConverter;
use crate::cache::{CacheKey, TtsCache};
use crate::command::{
    CommandError, CommandOutput, CommandResolver, CommandRunner, CommandRunnerExt, CommandVector,
    DirectRunner, HostOs, ToolId, ToolNotFoundError, bridge_runner, to_execution_path_on,
};
use crate::config::{CachePolicy, TtsConfig};

use super::{SynthesisError, SynthesisOutcome, SynthesisRequest};

/// Resolver, runner and cache shared by the providers of one process.
pub struct ProviderContext {
    resolver: Arc<CommandResolver>,
    runner: Arc<dyn CommandRunner>,
    converter: AudioConverter,
    cache: TtsCache,
    policy: CachePolicy,
    skip_bridge: bool,
}

impl ProviderContext {
    /// Assemble a context from explicit parts.
    ///
    /// `runner` executes resolved command vectors; vectors that go through
    /// the bridge already carry the bridge prefix.
    pub fn new(
        resolver: Arc<CommandResolver>,
        runner: Arc<dyn CommandRunner>,
        cache: TtsCache,
        policy: CachePolicy,
        skip_bridge: bool,
    ) -> Self {
        let converter = AudioConverter::new(Arc::clone(&resolver), Arc::clone(&runner), skip_bridge);
        Self {
            resolver,
            runner,
            converter,
            cache,
            policy,
            skip_bridge,
        }
    }

    /// Build the context for the current host from configuration.
    pub fn from_config(config: &TtsConfig) -> Self {
        let host = HostOs::current();
        let direct: Arc<dyn CommandRunner> = Arc::new(DirectRunner::new(host));
        let bridge = bridge_runner(host, !config.skip_wsl, Arc::clone(&direct));
        let resolver = CommandResolver::new(
            host,
            CommandResolver::default_tools_dir(),
            Arc::clone(&direct),
            bridge,
        );

        Self::new(
            Arc::new(resolver),
            direct,
            TtsCache::new(config.cache_root()),
            config.cache_policy(),
            config.skip_wsl,
        )
    }

    pub fn host(&self) -> HostOs {
        self.resolver.host()
    }

    pub fn skip_bridge(&self) -> bool {
        self.skip_bridge
    }

    pub fn cache(&self) -> &TtsCache {
        &self.cache
    }

    pub fn converter(&self) -> &AudioConverter {
        &self.converter
    }

    pub fn resolve(&self, tool: ToolId) -> Result<CommandVector, ToolNotFoundError> {
        self.resolver.resolve(tool)
    }

    pub fn is_resolvable(&self, tool: ToolId) -> bool {
        self.resolver.is_resolvable(tool)
    }

    /// Path as seen by the process `command` will run in.
    pub fn exec_path(&self, path: &Path, command: &[String]) -> String {
        to_execution_path_on(self.host(), path, command, self.skip_bridge)
    }

    /// Run a resolved vector; a non-zero exit is returned, not raised.
    pub fn run_tool(
        &self,
        command: &[String],
        args: &[String],
    ) -> Result<CommandOutput, CommandError> {
        self.runner.output_vector(command, args)
    }

    /// Private scratch directory beside `output`, removed when dropped.
    pub fn scratch_dir(&self, output: &Path) -> std::io::Result<TempDir> {
        let parent = output
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        tempfile::Builder::new()
            .prefix(".narrator-")
            .tempdir_in(parent)
    }

    /// Cache-aware synthesis skeleton.
    ///
    /// Serves `key` from the cache when allowed; otherwise runs `generate`,
    /// which must write a non-empty `request.output_path`. On success the
    /// result is stored; when the backend fails after it may have written
    /// the output, the partial file is removed.
    pub fn synthesize_cached<F>(
        &self,
        provider: &str,
        key: &CacheKey,
        request: &SynthesisRequest,
        generate: F,
    ) -> Result<SynthesisOutcome, SynthesisError>
    where
        F: FnOnce() -> Result<(), SynthesisError>,
    {
        let output = &request.output_path;
        if self.policy.read && self.cache.lookup(key, output) {
            return Ok(SynthesisOutcome::Cached);
        }

        info!(provider, text = %request.text, path = %output.display(), "generating");
        let result = generate().and_then(|()| {
            if has_audio(output) {
                Ok(())
            } else {
                Err(SynthesisError::backend(provider, &request.text, "backend produced no audio"))
            }
        });
        match result {
            Ok(()) => {
                if self.policy.write {
                    self.cache.store(key, output);
                }
                Ok(SynthesisOutcome::Generated)
            }
            Err(e) => {
                // Errors raised before invocation leave an earlier file alone
                if touches_output(&e) && output.exists() {
                    let _ = std::fs::remove_file(output);
                }
                error!(provider, text = %request.text, error = %e, "generation KO");
                Err(e)
            }
        }
    }
}

fn has_audio(path: &Path) -> bool {
    std::fs::metadata(path).is_ok_and(|m| m.is_file() && m.len() > 0)
}

/// Whether the failure happened after a backend may have written the output.
fn touches_output(error: &SynthesisError) -> bool {
    matches!(
        error,
        SynthesisError::Backend { .. } | SynthesisError::PostProcess { .. } | SynthesisError::Io(_)
    )
}
