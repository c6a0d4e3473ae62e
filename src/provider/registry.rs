//! Name-keyed provider lookup.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::config::TtsConfig;

use super::{
    BasicProvider, CoquiProvider, GeminiProvider, GttsProvider, OpenAiProvider, OsVoiceProvider,
    PicoProvider, ProviderContext, SynthesisError, TtsProvider,
};

/// Name of the provider used when nothing else is selected.
pub const DEFAULT_PROVIDER: &str = "basic";

/// Registered providers by name.
#[derive(Default)]
pub struct ProviderRegistry {
    providers: HashMap<String, Arc<dyn TtsProvider>>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding every built-in provider over one shared context.
    pub fn with_defaults(ctx: Arc<ProviderContext>, config: &TtsConfig) -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(BasicProvider::new(Arc::clone(&ctx))));
        registry.register(Arc::new(OsVoiceProvider::new(Arc::clone(&ctx))));
        registry.register(Arc::new(PicoProvider::new(Arc::clone(&ctx))));
        registry.register(Arc::new(GttsProvider::new(Arc::clone(&ctx))));
        registry.register(Arc::new(CoquiProvider::new(
            Arc::clone(&ctx),
            config.coqui.clone(),
        )));
        registry.register(Arc::new(OpenAiProvider::new(
            Arc::clone(&ctx),
            config.openai.clone(),
            config.openai.api_key(),
        )));
        registry.register(Arc::new(GeminiProvider::new(
            ctx,
            config.gemini.clone(),
            config.gemini.api_key(),
        )));
        registry
    }

    /// Add a provider under its own name, replacing any previous one.
    pub fn register(&mut self, provider: Arc<dyn TtsProvider>) {
        let name = provider.name().to_string();
        if self.providers.insert(name.clone(), provider).is_some() {
            debug!(provider = %name, "provider replaced");
        }
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn TtsProvider>> {
        self.providers.get(name).cloned()
    }

    /// Look up `name`, failing with [`SynthesisError::ProviderNotFound`].
    pub fn require(&self, name: &str) -> Result<Arc<dyn TtsProvider>, SynthesisError> {
        self.get(name)
            .ok_or_else(|| SynthesisError::ProviderNotFound(name.to_string()))
    }

    pub fn default_provider(&self) -> Option<Arc<dyn TtsProvider>> {
        self.get(DEFAULT_PROVIDER)
    }

    /// Registered names, sorted.
    pub fn list(&self) -> Vec<String> {
        let mut names: Vec<String> = self.providers.keys().cloned().collect();
        names.sort();
        names
    }

    /// Names of the providers that report themselves available, sorted.
    ///
    /// A provider whose probe fails is logged and left out; the others are
    /// still listed.
    pub fn list_available(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .providers
            .iter()
            .filter(|(name, provider)| match provider.is_available() {
                Ok(available) => available,
                Err(e) => {
                    warn!(provider = %name, error = %e, "availability probe failed");
                    false
                }
            })
            .map(|(name, _)| name.clone())
            .collect();
        names.sort();
        names
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }
}
