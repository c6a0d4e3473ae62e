//! OpenAI speech endpoint.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;

use crate::cache::CacheKey;
use crate::config::{ApiKey, OpenAiSettings};

use super::{ProviderContext, SynthesisError, SynthesisOutcome, SynthesisRequest, TtsProvider};

const NAME: &str = "openai";

#[derive(Serialize, Debug)]
struct SpeechRequest<'a> {
    model: &'a str,
    input: &'a str,
    voice: &'a str,
    response_format: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    speed: Option<f32>,
}

/// Calls `POST {base_url}/audio/speech` and writes the returned mp3 as is.
pub struct OpenAiProvider {
    ctx: Arc<ProviderContext>,
    settings: OpenAiSettings,
    api_key: Option<ApiKey>,
    client: reqwest::blocking::Client,
}

impl OpenAiProvider {
    /// `api_key` is usually [`OpenAiSettings::api_key`], resolved once.
    pub fn new(ctx: Arc<ProviderContext>, settings: OpenAiSettings, api_key: Option<ApiKey>) -> Self {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .unwrap_or_else(|_| reqwest::blocking::Client::new());
        Self {
            ctx,
            settings,
            api_key,
            client,
        }
    }

    fn cache_key(&self, text: &str) -> CacheKey {
        CacheKey::new(NAME)
            .text("text", text)
            .text("model", &self.settings.model)
            .text("voice", &self.settings.voice)
            .speed("speed", self.settings.speed)
    }

    fn body<'a>(&'a self, text: &'a str) -> SpeechRequest<'a> {
        SpeechRequest {
            model: &self.settings.model,
            input: text,
            voice: &self.settings.voice,
            response_format: "mp3",
            speed: self.settings.speed,
        }
    }

    fn generate(&self, request: &SynthesisRequest) -> Result<(), SynthesisError> {
        let api_key = self.api_key.as_ref().ok_or_else(|| {
            SynthesisError::Configuration("OpenAI API key is not set".to_string())
        })?;
        let url = format!("{}/audio/speech", self.settings.base_url.trim_end_matches('/'));

        let response = self
            .client
            .post(&url)
            .bearer_auth(api_key.expose())
            .json(&self.body(&request.text))
            .send()
            .map_err(|e| SynthesisError::backend(NAME, &request.text, e))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().unwrap_or_default();
            return Err(SynthesisError::backend(
                NAME,
                &request.text,
                format!("HTTP {status}: {}", detail.trim()),
            ));
        }

        let audio = response
            .bytes()
            .map_err(|e| SynthesisError::backend(NAME, &request.text, e))?;
        std::fs::write(&request.output_path, &audio)?;
        Ok(())
    }
}

impl TtsProvider for OpenAiProvider {
    fn name(&self) -> &'static str {
        NAME
    }

    fn is_available(&self) -> Result<bool, SynthesisError> {
        Ok(self.api_key.is_some())
    }

    fn output_extension(&self) -> &'static str {
        "mp3"
    }

    fn synthesize(&self, request: &SynthesisRequest) -> Result<SynthesisOutcome, SynthesisError> {
        let key = self.cache_key(&request.text);
        self.ctx
            .synthesize_cached(NAME, &key, request, || self.generate(request))
    }
}
