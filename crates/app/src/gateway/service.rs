//! Sticker gateway service trait.

use async_trait::async_trait;
use mockall::automock;
use tokio_util::sync::CancellationToken;

use super::{
    errors::GatewayError,
    models::{AspectRatio, ChatTranscript, ImageData, SpeechAudio, VideoData},
};

/// Boundary to the external generative model service.
///
/// Every operation is a discrete request/response (or request/poll/
/// response) exchange with a slow, possibly failing dependency. Errors are
/// typed and returned to the caller, which decides the display strategy;
/// nothing here panics or swallows a failure silently.
#[automock]
#[async_trait]
pub trait StickerGateway: Send + Sync {
    /// Generate die-cut sticker artwork from a prompt.
    async fn generate_image(&self, prompt: &str) -> Result<ImageData, GatewayError>;

    /// Produce new artwork by editing `base` per the instructions.
    async fn edit_image(
        &self,
        base: &ImageData,
        instructions: &str,
    ) -> Result<ImageData, GatewayError>;

    /// Answer the latest user message given the full transcript.
    async fn send_chat(&self, transcript: &ChatTranscript) -> Result<String, GatewayError>;

    /// Creative feedback on a sticker idea.
    async fn analyze_idea(&self, idea: &str) -> Result<String, GatewayError>;

    /// Transcribe a WAV-encoded voice note.
    async fn transcribe_audio(&self, wav: &[u8]) -> Result<String, GatewayError>;

    /// Synthesize an enthusiastic reading of `text`.
    async fn synthesize_speech(&self, text: &str) -> Result<SpeechAudio, GatewayError>;

    /// Generate a promotional video, polling until the job completes.
    ///
    /// Long-running: the job is polled at a fixed interval under a bounded
    /// attempt budget, and `cancel` is honoured at every poll boundary.
    async fn generate_video(
        &self,
        prompt: &str,
        aspect_ratio: AspectRatio,
        cancel: &CancellationToken,
    ) -> Result<VideoData, GatewayError>;
}
