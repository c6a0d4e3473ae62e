//! CLI argument definitions.

use clap::Parser;
use std::path::PathBuf;

use crate::config::TtsConfig;

/// Narrate text into audio files for story packs.
#[derive(Parser, Debug)]
#[command(name = "pack-narrator")]
#[command(about = "Generate narration audio through local or cloud TTS backends")]
#[command(version)]
pub struct Args {
    /// Text to generate speech from
    #[arg(short, long)]
    pub generate: Option<String>,

    /// Output audio file (the extension follows the provider)
    #[arg(short, long, default_value = "output.wav")]
    pub output: PathBuf,

    /// File of "output_path;text" lines to narrate in order
    #[arg(long, conflicts_with = "generate")]
    pub batch: Option<PathBuf>,

    /// Language tag, e.g. "fr-FR"
    #[arg(short, long)]
    pub lang: Option<String>,

    /// TOML configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Use the OpenAI speech API
    #[arg(long)]
    pub openai: bool,

    /// OpenAI model
    #[arg(long)]
    pub openai_model: Option<String>,

    /// OpenAI voice
    #[arg(long)]
    pub openai_voice: Option<String>,

    /// OpenAI speech speed multiplier (0.25 to 4.0)
    #[arg(long)]
    pub openai_speed: Option<f32>,

    /// Use Gemini speech generation
    #[arg(long)]
    pub gemini: bool,

    /// Gemini model
    #[arg(long)]
    pub gemini_model: Option<String>,

    /// Gemini prebuilt voice
    #[arg(long)]
    pub gemini_voice: Option<String>,

    /// Use gtts-cli
    #[arg(long)]
    pub gtts: bool,

    /// Use the coqui `tts` CLI
    #[arg(long)]
    pub coqui: bool,

    /// Coqui model name
    #[arg(long)]
    pub coqui_model: Option<String>,

    /// Coqui speaker id
    #[arg(long)]
    pub coqui_speaker: Option<String>,

    /// Coqui language id
    #[arg(long)]
    pub coqui_language: Option<String>,

    /// Run coqui on the GPU
    #[arg(long)]
    pub coqui_cuda: bool,

    /// Cache directory
    #[arg(long)]
    pub cache_path: Option<PathBuf>,

    /// Never run tools through WSL
    #[arg(long)]
    pub skip_wsl: bool,

    /// Always regenerate, ignoring cached audio
    #[arg(long)]
    pub skip_read_cache: bool,

    /// Do not store generated audio in the cache
    #[arg(long)]
    pub skip_write_cache: bool,

    /// List registered providers and whether they can run here
    #[arg(long)]
    pub list_providers: bool,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

impl Args {
    /// Overlay the command line on `config`.
    ///
    /// Flags only ever switch options on; values replace the configured ones.
    pub fn apply(&self, config: &mut TtsConfig) {
        config.use_openai |= self.openai;
        config.use_gemini |= self.gemini;
        config.use_gtts |= self.gtts;
        config.use_coqui |= self.coqui;
        config.skip_wsl |= self.skip_wsl;
        config.skip_read_cache |= self.skip_read_cache;
        config.skip_write_cache |= self.skip_write_cache;
        config.coqui.use_cuda |= self.coqui_cuda;

        if let Some(lang) = &self.lang {
            config.lang = lang.clone();
        }
        if let Some(path) = &self.cache_path {
            config.cache_path = Some(path.clone());
        }
        if let Some(model) = &self.openai_model {
            config.openai.model = model.clone();
        }
        if let Some(voice) = &self.openai_voice {
            config.openai.voice = voice.clone();
        }
        if self.openai_speed.is_some() {
            config.openai.speed = self.openai_speed;
        }
        if let Some(model) = &self.gemini_model {
            config.gemini.model = model.clone();
        }
        if let Some(voice) = &self.gemini_voice {
            config.gemini.voice = voice.clone();
        }
        if let Some(model) = &self.coqui_model {
            config.coqui.model = model.clone();
        }
        if self.coqui_speaker.is_some() {
            config.coqui.speaker_idx = self.coqui_speaker.clone();
        }
        if self.coqui_language.is_some() {
            config.coqui.language_idx = self.coqui_language.clone();
        }
    }
}
