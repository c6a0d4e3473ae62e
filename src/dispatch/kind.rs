//! Provider selection from configuration flags.

use crate::config::TtsConfig;

/// Providers the dispatcher can select.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    OpenAi,
    Gemini,
    Gtts,
    Coqui,
    Basic,
}

type Predicate = fn(&TtsConfig) -> bool;

/// First matching flag wins.
const PRIORITY: [(Predicate, ProviderKind); 4] = [
    (|c| c.use_openai, ProviderKind::OpenAi),
    (|c| c.use_gemini, ProviderKind::Gemini),
    (|c| c.use_gtts, ProviderKind::Gtts),
    (|c| c.use_coqui, ProviderKind::Coqui),
];

impl ProviderKind {
    /// Kind selected by `config`, [`ProviderKind::Basic`] when no flag is set.
    pub fn select(config: &TtsConfig) -> Self {
        PRIORITY
            .iter()
            .find(|(enabled, _)| enabled(config))
            .map_or(ProviderKind::Basic, |(_, kind)| *kind)
    }

    /// Registry name of the provider.
    pub fn provider_name(self) -> &'static str {
        match self {
            ProviderKind::OpenAi => "openai",
            ProviderKind::Gemini => "gemini",
            ProviderKind::Gtts => "gtts",
            ProviderKind::Coqui => "coqui",
            ProviderKind::Basic => "basic",
        }
    }
}
