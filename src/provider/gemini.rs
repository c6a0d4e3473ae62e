//! Gemini speech generation.
//!
//! The API answers with base64 signed 16-bit PCM. It is wrapped into a WAV
//! in a scratch directory and resampled to the canonical format.

use std::sync::Arc;
use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde::{Deserialize, Serialize};

use crate::audio::write_pcm16_wav;
use crate::cache::CacheKey;
use crate::config::{ApiKey, GeminiSettings};

use super::{ProviderContext, SynthesisError, SynthesisOutcome, SynthesisRequest, TtsProvider};

const NAME: &str = "gemini";

const DEFAULT_PCM_RATE: u32 = 24_000;

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
    generation_config: GenerationConfig<'a>,
}

#[derive(Serialize, Debug)]
struct Content<'a> {
    parts: Vec<TextPart<'a>>,
}

#[derive(Serialize, Debug)]
struct TextPart<'a> {
    text: &'a str,
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig<'a> {
    response_modalities: [&'static str; 1],
    speech_config: SpeechConfig<'a>,
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
struct SpeechConfig<'a> {
    voice_config: VoiceConfig<'a>,
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
struct VoiceConfig<'a> {
    prebuilt_voice_config: PrebuiltVoice<'a>,
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
struct PrebuiltVoice<'a> {
    voice_name: &'a str,
}

#[derive(Deserialize, Debug)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize, Debug)]
struct Candidate {
    content: Option<ResponseContent>,
}

#[derive(Deserialize, Debug)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct ResponsePart {
    inline_data: Option<InlineData>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    #[serde(default)]
    mime_type: String,
    data: String,
}

impl InlineData {
    /// `audio/L16;codec=pcm;rate=24000` gives 24000.
    fn sample_rate(&self) -> u32 {
        self.mime_type
            .split(';')
            .filter_map(|p| p.trim().strip_prefix("rate="))
            .find_map(|r| r.parse().ok())
            .unwrap_or(DEFAULT_PCM_RATE)
    }
}

/// Decoded audio payload of a response.
#[derive(Debug, PartialEq)]
struct Pcm {
    samples: Vec<u8>,
    sample_rate: u32,
}

fn parse_response(body: &str) -> Result<Pcm, String> {
    let response: GenerateResponse =
        serde_json::from_str(body).map_err(|e| format!("invalid response: {e}"))?;
    let inline = response
        .candidates
        .into_iter()
        .filter_map(|c| c.content)
        .flat_map(|c| c.parts)
        .find_map(|p| p.inline_data)
        .ok_or_else(|| "no audio in response".to_string())?;

    let samples = BASE64
        .decode(inline.data.as_bytes())
        .map_err(|e| format!("invalid audio payload: {e}"))?;
    Ok(Pcm {
        sample_rate: inline.sample_rate(),
        samples,
    })
}

/// Calls `models/{model}:generateContent` with an audio response modality.
pub struct GeminiProvider {
    ctx: Arc<ProviderContext>,
    settings: GeminiSettings,
    api_key: Option<ApiKey>,
    client: reqwest::blocking::Client,
}

impl GeminiProvider {
    pub fn new(ctx: Arc<ProviderContext>, settings: GeminiSettings, api_key: Option<ApiKey>) -> Self {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(120))
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
    }

    fn body<'a>(&'a self, text: &'a str) -> GenerateRequest<'a> {
        GenerateRequest {
            contents: vec![Content {
                parts: vec![TextPart { text }],
            }],
            generation_config: GenerationConfig {
                response_modalities: ["AUDIO"],
                speech_config: SpeechConfig {
                    voice_config: VoiceConfig {
                        prebuilt_voice_config: PrebuiltVoice {
                            voice_name: &self.settings.voice,
                        },
                    },
                },
            },
        }
    }

    fn fetch_pcm(&self, api_key: &ApiKey, text: &str) -> Result<Pcm, SynthesisError> {
        let url = format!(
            "{}/models/{}:generateContent",
            self.settings.base_url.trim_end_matches('/'),
            self.settings.model
        );

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", api_key.expose())
            .json(&self.body(text))
            .send()
            .map_err(|e| SynthesisError::backend(NAME, text, e))?;

        let status = response.status();
        let body = response
            .text()
            .map_err(|e| SynthesisError::backend(NAME, text, e))?;
        if !status.is_success() {
            return Err(SynthesisError::backend(
                NAME,
                text,
                format!("HTTP {status}: {}", body.trim()),
            ));
        }

        parse_response(&body).map_err(|e| SynthesisError::backend(NAME, text, e))
    }

    fn generate(&self, request: &SynthesisRequest) -> Result<(), SynthesisError> {
        let api_key = self.api_key.as_ref().ok_or_else(|| {
            SynthesisError::Configuration("Gemini API key is not set".to_string())
        })?;
        let pcm = self.fetch_pcm(api_key, &request.text)?;

        let scratch = self.ctx.scratch_dir(&request.output_path)?;
        let raw = scratch.path().join("gemini.wav");
        write_pcm16_wav(&raw, &pcm.samples, pcm.sample_rate, 1)
            .map_err(|e| SynthesisError::post_process(NAME, &request.text, e))?;

        self.ctx
            .converter()
            .to_canonical_wav(&raw, &request.output_path)
            .map_err(|e| SynthesisError::post_process(NAME, &request.text, e))
    }
}

impl TtsProvider for GeminiProvider {
    fn name(&self) -> &'static str {
        NAME
    }

    fn is_available(&self) -> Result<bool, SynthesisError> {
        Ok(self.api_key.is_some())
    }

    fn output_extension(&self) -> &'static str {
        "wav"
    }

    fn synthesize(&self, request: &SynthesisRequest) -> Result<SynthesisOutcome, SynthesisError> {
        let key = self.cache_key(&request.text);
        self.ctx
            .synthesize_cached(NAME, &key, request, || self.generate(request))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::{HostOs, MockCommandRunner};
    use crate::config::CachePolicy;
    use crate::provider::test_support::context;
    use tempfile::TempDir;

    #[test]
    fn test_request_body_shape() {
        let temp = TempDir::new().unwrap();
        let ctx = context(MockCommandRunner::new(), HostOs::Unix, &temp, CachePolicy::default());
        let provider = GeminiProvider::new(ctx, GeminiSettings::default(), None);

        let json = serde_json::to_value(provider.body("Salut")).unwrap();
        assert_eq!(json["contents"][0]["parts"][0]["text"], "Salut");
        assert_eq!(json["generationConfig"]["responseModalities"][0], "AUDIO");
        assert_eq!(
            json["generationConfig"]["speechConfig"]["voiceConfig"]["prebuiltVoiceConfig"]["voiceName"],
            "Kore"
        );
    }

    #[test]
    fn test_parse_response() {
        let data = BASE64.encode([0x01u8, 0x00, 0xff, 0x7f]);
        let body = format!(
            r#"{{"candidates":[{{"content":{{"parts":[{{"inlineData":{{"mimeType":"audio/L16;codec=pcm;rate=16000","data":"{data}"}}}}]}}}}]}}"#
        );

        let pcm = parse_response(&body).unwrap();
        assert_eq!(pcm.samples, vec![0x01, 0x00, 0xff, 0x7f]);
        assert_eq!(pcm.sample_rate, 16000);
    }

    #[test]
    fn test_parse_response_defaults_rate() {
        let data = BASE64.encode([0u8; 4]);
        let body = format!(r#"{{"candidates":[{{"content":{{"parts":[{{"inlineData":{{"data":"{data}"}}}}]}}}}]}}"#);
        assert_eq!(parse_response(&body).unwrap().sample_rate, 24000);
    }

    #[test]
    fn test_parse_response_without_audio() {
        let err = parse_response(r#"{"candidates":[{"content":{"parts":[{"text":"no"}]}}]}"#)
            .unwrap_err();
        assert!(err.contains("no audio"));
        assert!(parse_response(r#"{"promptFeedback":{}}"#).is_err());
    }

    #[test]
    fn test_missing_key_is_a_configuration_error() {
        let temp = TempDir::new().unwrap();
        let ctx = context(MockCommandRunner::new(), HostOs::Unix, &temp, CachePolicy::default());
        let provider = GeminiProvider::new(ctx, GeminiSettings::default(), None);
        assert!(!provider.is_available().unwrap());

        let err = provider
            .synthesize(&SynthesisRequest::new("Salut", "fr-FR", temp.path().join("a.wav")))
            .unwrap_err();
        assert!(matches!(err, SynthesisError::Configuration(_)));
    }
}
