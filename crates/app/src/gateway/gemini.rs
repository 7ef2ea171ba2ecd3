//! Gemini HTTP client for the sticker gateway.

use std::time::Instant;

use async_trait::async_trait;
use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use humanize_duration::{Truncate, prelude::DurationExt};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use crate::{audio::TTS_SAMPLE_RATE, config::GatewayConfig};

use super::{
    errors::GatewayError,
    models::{AspectRatio, ChatTranscript, ImageData, SpeechAudio, VideoData, VideoJob},
    polling::poll_until_complete,
    service::StickerGateway,
};

const IMAGE_MODEL: &str = "gemini-2.5-flash-image";
const CHAT_MODEL: &str = "gemini-3-pro-preview";
const TRANSCRIPTION_MODEL: &str = "gemini-3-flash-preview";
const TTS_MODEL: &str = "gemini-2.5-flash-preview-tts";
const VIDEO_MODEL: &str = "veo-3.1-fast-generate-preview";

const API_KEY_HEADER: &str = "x-goog-api-key";

const STICKER_ASPECT_RATIO: &str = "1:1";
const VIDEO_RESOLUTION: &str = "720p";
const ANALYSIS_THINKING_BUDGET: u32 = 32_768;
const TTS_VOICE: &str = "Kore";

const CHAT_SYSTEM_INSTRUCTION: &str = "You are the assistant of an AI sticker storefront. \
     Answer in a friendly, creative tone about stickers, design and the platform.";
const TRANSCRIPTION_INSTRUCTION: &str = "Transcribe this audio message. Output only the text.";

fn sticker_prompt(prompt: &str) -> String {
    format!(
        "A high quality die-cut sticker design of: {prompt}. White border, vector art style, \
         vibrant colors, isolated on plain white background."
    )
}

fn edit_prompt(instructions: &str) -> String {
    format!(
        "Edit this sticker according to these instructions: {instructions}. Maintain the \
         die-cut sticker look."
    )
}

fn video_prompt(prompt: &str) -> String {
    format!("Cinematic commercial for a sticker company: {prompt}")
}

fn analysis_prompt(idea: &str) -> String {
    format!("Analyze this sticker idea and give creative feedback to improve it: {idea}")
}

fn tts_prompt(text: &str) -> String {
    format!("Say with enthusiasm: {text}")
}

/// HTTP client for the Gemini generative model API.
#[derive(Debug, Clone)]
pub struct GeminiClient {
    config: GatewayConfig,
    http: Client,
}

impl GeminiClient {
    /// Create a new client from the given configuration.
    ///
    /// # Errors
    ///
    /// Returns an error when the underlying HTTP client cannot be built.
    pub fn new(config: GatewayConfig) -> Result<Self, GatewayError> {
        let http = Client::builder().timeout(config.request_timeout()).build()?;

        Ok(Self { config, http })
    }

    fn model_url(&self, model: &str, verb: &str) -> String {
        format!("{}/v1beta/models/{model}:{verb}", self.config.base_url)
    }

    async fn generate_content(
        &self,
        model: &str,
        request: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse, GatewayError> {
        let response = self
            .http
            .post(self.model_url(model, "generateContent"))
            .header(API_KEY_HEADER, &self.config.api_key)
            .json(request)
            .send()
            .await?;

        let response = check_success(model, response).await?;

        Ok(response.json().await?)
    }

    async fn submit_video(
        &self,
        prompt: &str,
        aspect_ratio: AspectRatio,
    ) -> Result<VideoJob, GatewayError> {
        let request = VideoRequest {
            instances: vec![VideoInstance {
                prompt: video_prompt(prompt),
            }],
            parameters: VideoParameters {
                aspect_ratio: aspect_ratio.as_str().to_owned(),
                resolution: VIDEO_RESOLUTION.to_owned(),
                number_of_videos: 1,
            },
        };

        let response = self
            .http
            .post(self.model_url(VIDEO_MODEL, "predictLongRunning"))
            .header(API_KEY_HEADER, &self.config.api_key)
            .json(&request)
            .send()
            .await?;

        let response = check_success(VIDEO_MODEL, response).await?;
        let handle: OperationHandle = response.json().await?;

        Ok(VideoJob {
            operation: handle.name,
            prompt: prompt.to_owned(),
            aspect_ratio,
            submitted_at: Instant::now(),
        })
    }

    /// One status poll for a submitted video job.
    ///
    /// Yields `None` while the operation is still running and the download
    /// URI once it is done.
    async fn poll_video(&self, job: &VideoJob) -> Result<Option<String>, GatewayError> {
        let url = format!("{}/v1beta/{}", self.config.base_url, job.operation);

        let response = self
            .http
            .get(&url)
            .header(API_KEY_HEADER, &self.config.api_key)
            .send()
            .await?;

        let response = check_success(VIDEO_MODEL, response).await?;
        let status: OperationStatus = response.json().await?;

        if !status.done {
            return Ok(None);
        }

        let uri = status
            .response
            .and_then(|inner| inner.generated_videos.into_iter().next())
            .and_then(|generated| generated.video)
            .and_then(|video| video.uri);

        match uri {
            Some(uri) => Ok(Some(uri)),
            None => Err(GatewayError::EmptyModelOutput),
        }
    }

    async fn fetch_video(&self, uri: &str) -> Result<Vec<u8>, GatewayError> {
        // The download link already carries query parameters; the API key
        // is appended rather than sent as a header.
        let url = format!("{uri}&key={}", self.config.api_key);

        let response = self.http.get(&url).send().await?;
        let response = check_success(VIDEO_MODEL, response).await?;

        Ok(response.bytes().await?.to_vec())
    }
}

#[async_trait]
impl StickerGateway for GeminiClient {
    async fn generate_image(&self, prompt: &str) -> Result<ImageData, GatewayError> {
        let request = GenerateContentRequest {
            contents: vec![Content::text(sticker_prompt(prompt))],
            system_instruction: None,
            generation_config: Some(GenerationConfig {
                image_config: Some(ImageConfig {
                    aspect_ratio: STICKER_ASPECT_RATIO.to_owned(),
                }),
                ..GenerationConfig::default()
            }),
        };

        let response = self.generate_content(IMAGE_MODEL, &request).await?;

        into_first_inline(response)
            .ok_or(GatewayError::EmptyModelOutput)
            .and_then(decode_inline)
    }

    async fn edit_image(
        &self,
        base: &ImageData,
        instructions: &str,
    ) -> Result<ImageData, GatewayError> {
        let request = GenerateContentRequest {
            contents: vec![Content {
                role: None,
                parts: vec![
                    Part::inline(base.mime_type.clone(), BASE64.encode(&base.bytes)),
                    Part::text(edit_prompt(instructions)),
                ],
            }],
            system_instruction: None,
            generation_config: None,
        };

        let response = self.generate_content(IMAGE_MODEL, &request).await?;

        into_first_inline(response)
            .ok_or(GatewayError::EmptyModelOutput)
            .and_then(decode_inline)
    }

    async fn send_chat(&self, transcript: &ChatTranscript) -> Result<String, GatewayError> {
        let contents = transcript
            .messages()
            .iter()
            .map(|message| Content {
                role: Some(message.role.wire_name().to_owned()),
                parts: vec![Part::text(message.text.clone())],
            })
            .collect();

        let request = GenerateContentRequest {
            contents,
            system_instruction: Some(Content::text(CHAT_SYSTEM_INSTRUCTION.to_owned())),
            generation_config: None,
        };

        let response = self.generate_content(CHAT_MODEL, &request).await?;

        into_first_text(response).ok_or(GatewayError::EmptyModelOutput)
    }

    async fn analyze_idea(&self, idea: &str) -> Result<String, GatewayError> {
        let request = GenerateContentRequest {
            contents: vec![Content::text(analysis_prompt(idea))],
            system_instruction: None,
            generation_config: Some(GenerationConfig {
                thinking_config: Some(ThinkingConfig {
                    thinking_budget: ANALYSIS_THINKING_BUDGET,
                }),
                ..GenerationConfig::default()
            }),
        };

        let response = self.generate_content(CHAT_MODEL, &request).await?;

        into_first_text(response).ok_or(GatewayError::EmptyModelOutput)
    }

    async fn transcribe_audio(&self, wav: &[u8]) -> Result<String, GatewayError> {
        let request = GenerateContentRequest {
            contents: vec![Content {
                role: None,
                parts: vec![
                    Part::inline("audio/wav".to_owned(), BASE64.encode(wav)),
                    Part::text(TRANSCRIPTION_INSTRUCTION.to_owned()),
                ],
            }],
            system_instruction: None,
            generation_config: None,
        };

        let response = self.generate_content(TRANSCRIPTION_MODEL, &request).await?;

        into_first_text(response).ok_or(GatewayError::EmptyModelOutput)
    }

    async fn synthesize_speech(&self, text: &str) -> Result<SpeechAudio, GatewayError> {
        let request = GenerateContentRequest {
            contents: vec![Content::text(tts_prompt(text))],
            system_instruction: None,
            generation_config: Some(GenerationConfig {
                response_modalities: Some(vec!["AUDIO".to_owned()]),
                speech_config: Some(SpeechConfig {
                    voice_config: VoiceConfig {
                        prebuilt_voice_config: PrebuiltVoiceConfig {
                            voice_name: TTS_VOICE.to_owned(),
                        },
                    },
                }),
                ..GenerationConfig::default()
            }),
        };

        let response = self.generate_content(TTS_MODEL, &request).await?;
        let inline = into_first_inline(response).ok_or(GatewayError::EmptyModelOutput)?;
        let data = decode_inline(inline)?;

        Ok(SpeechAudio {
            sample_rate: TTS_SAMPLE_RATE,
            pcm: data.bytes,
        })
    }

    async fn generate_video(
        &self,
        prompt: &str,
        aspect_ratio: AspectRatio,
        cancel: &CancellationToken,
    ) -> Result<VideoData, GatewayError> {
        let job = self.submit_video(prompt, aspect_ratio).await?;

        tracing::info!(operation = %job.operation, aspect_ratio = %job.aspect_ratio, "video generation submitted");

        let uri = poll_until_complete(
            self.config.poll_interval(),
            self.config.poll_max_attempts,
            cancel,
            || self.poll_video(&job),
        )
        .await?;

        tracing::info!(
            elapsed = %job.elapsed().human(Truncate::Second),
            "video generation complete"
        );

        let bytes = self.fetch_video(&uri).await?;

        Ok(VideoData {
            mime_type: "video/mp4".to_owned(),
            bytes,
        })
    }
}

async fn check_success(
    model: &str,
    response: reqwest::Response,
) -> Result<reqwest::Response, GatewayError> {
    if response.status().is_success() {
        return Ok(response);
    }

    let status = response.status();
    let text = response.text().await.unwrap_or_default();

    Err(GatewayError::UnexpectedResponse(format!(
        "{model} request failed with status {status}: {text}"
    )))
}

fn into_first_inline(response: GenerateContentResponse) -> Option<InlineData> {
    response
        .candidates
        .into_iter()
        .next()?
        .content?
        .parts
        .into_iter()
        .find_map(|part| part.inline_data)
}

fn into_first_text(response: GenerateContentResponse) -> Option<String> {
    response
        .candidates
        .into_iter()
        .next()?
        .content?
        .parts
        .into_iter()
        .find_map(|part| part.text)
}

fn decode_inline(inline: InlineData) -> Result<ImageData, GatewayError> {
    let bytes = BASE64.decode(inline.data.as_bytes()).map_err(|error| {
        GatewayError::UnexpectedResponse(format!("invalid base64 in inline data: {error}"))
    })?;

    Ok(ImageData {
        mime_type: inline.mime_type,
        bytes,
    })
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Content {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

impl Content {
    fn text(text: String) -> Self {
        Self {
            role: None,
            parts: vec![Part::text(text)],
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Part {
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    inline_data: Option<InlineData>,
}

impl Part {
    fn text(text: String) -> Self {
        Self {
            text: Some(text),
            inline_data: None,
        }
    }

    fn inline(mime_type: String, data: String) -> Self {
        Self {
            text: None,
            inline_data: Some(InlineData { mime_type, data }),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    image_config: Option<ImageConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_modalities: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    speech_config: Option<SpeechConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    thinking_config: Option<ThinkingConfig>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ImageConfig {
    aspect_ratio: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SpeechConfig {
    voice_config: VoiceConfig,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct VoiceConfig {
    prebuilt_voice_config: PrebuiltVoiceConfig,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PrebuiltVoiceConfig {
    voice_name: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ThinkingConfig {
    thinking_budget: u32,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Debug, Serialize)]
struct VideoRequest {
    instances: Vec<VideoInstance>,
    parameters: VideoParameters,
}

#[derive(Debug, Serialize)]
struct VideoInstance {
    prompt: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct VideoParameters {
    aspect_ratio: String,
    resolution: String,
    number_of_videos: u32,
}

#[derive(Debug, Deserialize)]
struct OperationHandle {
    name: String,
}

#[derive(Debug, Deserialize)]
struct OperationStatus {
    #[serde(default)]
    done: bool,
    response: Option<VideoOperationResponse>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VideoOperationResponse {
    #[serde(default)]
    generated_videos: Vec<GeneratedVideo>,
}

#[derive(Debug, Deserialize)]
struct GeneratedVideo {
    video: Option<VideoFile>,
}

#[derive(Debug, Deserialize)]
struct VideoFile {
    uri: Option<String>,
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use super::*;

    #[test]
    fn sticker_prompt_wraps_the_idea() {
        let wrapped = sticker_prompt("astronaut cat");

        assert!(
            wrapped.starts_with("A high quality die-cut sticker design of: astronaut cat."),
            "unexpected prompt: {wrapped}"
        );
        assert!(
            wrapped.contains("White border"),
            "unexpected prompt: {wrapped}"
        );
    }

    #[test]
    fn edit_prompt_keeps_the_die_cut_look() {
        let wrapped = edit_prompt("add sunglasses");

        assert!(
            wrapped.contains("add sunglasses"),
            "unexpected prompt: {wrapped}"
        );
        assert!(
            wrapped.ends_with("Maintain the die-cut sticker look."),
            "unexpected prompt: {wrapped}"
        );
    }

    #[test]
    fn request_serializes_to_camel_case() -> TestResult {
        let request = GenerateContentRequest {
            contents: vec![Content::text("hello".to_owned())],
            system_instruction: Some(Content::text("be nice".to_owned())),
            generation_config: Some(GenerationConfig {
                image_config: Some(ImageConfig {
                    aspect_ratio: "1:1".to_owned(),
                }),
                ..GenerationConfig::default()
            }),
        };

        let value = serde_json::to_value(&request)?;

        assert!(value.get("systemInstruction").is_some(), "missing field");
        assert_eq!(
            value["generationConfig"]["imageConfig"]["aspectRatio"],
            "1:1"
        );
        assert!(
            value["contents"][0].get("role").is_none(),
            "role should be omitted when unset"
        );

        Ok(())
    }

    #[test]
    fn video_parameters_serialize_to_camel_case() -> TestResult {
        let request = VideoRequest {
            instances: vec![VideoInstance {
                prompt: video_prompt("summer sale"),
            }],
            parameters: VideoParameters {
                aspect_ratio: "9:16".to_owned(),
                resolution: VIDEO_RESOLUTION.to_owned(),
                number_of_videos: 1,
            },
        };

        let value = serde_json::to_value(&request)?;

        assert_eq!(value["parameters"]["aspectRatio"], "9:16");
        assert_eq!(value["parameters"]["resolution"], "720p");
        assert_eq!(value["parameters"]["numberOfVideos"], 1);
        assert_eq!(
            value["instances"][0]["prompt"],
            "Cinematic commercial for a sticker company: summer sale"
        );

        Ok(())
    }

    #[test]
    fn first_inline_data_is_extracted_and_decoded() -> TestResult {
        let response: GenerateContentResponse = serde_json::from_str(
            r#"{
                "candidates": [{
                    "content": {
                        "parts": [
                            {"text": "here you go"},
                            {"inlineData": {"mimeType": "image/png", "data": "aGVsbG8="}}
                        ]
                    }
                }]
            }"#,
        )?;

        let inline = into_first_inline(response).ok_or("expected inline data")?;
        let image = decode_inline(inline)?;

        assert_eq!(image.mime_type, "image/png");
        assert_eq!(image.bytes, b"hello");

        Ok(())
    }

    #[test]
    fn missing_candidates_yield_no_output() -> TestResult {
        let response: GenerateContentResponse = serde_json::from_str("{}")?;

        assert!(into_first_text(response).is_none());

        Ok(())
    }

    #[test]
    fn invalid_base64_is_an_unexpected_response() {
        let result = decode_inline(InlineData {
            mime_type: "image/png".to_owned(),
            data: "not-base64!!!".to_owned(),
        });

        assert!(
            matches!(result, Err(GatewayError::UnexpectedResponse(_))),
            "expected UnexpectedResponse, got {result:?}"
        );
    }

    #[test]
    fn pending_operation_parses_as_not_done() -> TestResult {
        let status: OperationStatus =
            serde_json::from_str(r#"{"name": "operations/abc123"}"#)?;

        assert!(!status.done);

        Ok(())
    }

    #[test]
    fn completed_operation_carries_the_download_uri() -> TestResult {
        let status: OperationStatus = serde_json::from_str(
            r#"{
                "done": true,
                "response": {
                    "generatedVideos": [
                        {"video": {"uri": "https://example.test/video?alt=media"}}
                    ]
                }
            }"#,
        )?;

        assert!(status.done);

        let uri = status
            .response
            .and_then(|inner| inner.generated_videos.into_iter().next())
            .and_then(|generated| generated.video)
            .and_then(|video| video.uri);

        assert_eq!(uri.as_deref(), Some("https://example.test/video?alt=media"));

        Ok(())
    }
}
