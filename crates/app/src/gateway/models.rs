//! Gateway Models

use std::{
    fmt,
    str::FromStr,
    time::{Duration, Instant},
};

/// Opening line shown before any user input.
pub const ASSISTANT_GREETING: &str =
    "Hello! I'm your sticker studio assistant. How can I help you today?";

/// Aspect ratio options for promotional video generation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AspectRatio {
    /// 16:9, landscape.
    #[default]
    Landscape,
    /// 9:16, portrait.
    Portrait,
}

impl AspectRatio {
    /// Wire representation expected by the video model.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            AspectRatio::Landscape => "16:9",
            AspectRatio::Portrait => "9:16",
        }
    }
}

impl fmt::Display for AspectRatio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AspectRatio {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "16:9" | "landscape" => Ok(AspectRatio::Landscape),
            "9:16" | "portrait" => Ok(AspectRatio::Portrait),
            other => Err(format!(
                "unknown aspect ratio {other:?}; expected 16:9 or 9:16"
            )),
        }
    }
}

/// Inline image payload returned by the image model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageData {
    /// MIME type of the encoded image, e.g. `image/png`.
    pub mime_type: String,
    /// Encoded image bytes.
    pub bytes: Vec<u8>,
}

/// Synthesized speech as raw signed 16-bit little-endian PCM.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpeechAudio {
    /// Samples per second.
    pub sample_rate: u32,
    /// Raw PCM bytes, two per sample.
    pub pcm: Vec<u8>,
}

/// A fetched promotional video, playable locally.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoData {
    /// MIME type of the container, e.g. `video/mp4`.
    pub mime_type: String,
    /// Container bytes.
    pub bytes: Vec<u8>,
}

/// Handle to a long-running video generation operation.
///
/// Created on submit, polled until the service reports completion, then
/// either resolved into a playable reference or discarded on failure.
#[derive(Debug, Clone)]
pub struct VideoJob {
    /// Server-side operation name used for status polls.
    pub operation: String,
    /// Prompt the job was submitted with.
    pub prompt: String,
    /// Requested aspect ratio.
    pub aspect_ratio: AspectRatio,
    /// When the job was submitted.
    pub submitted_at: Instant,
}

impl VideoJob {
    /// Time since the job was submitted.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.submitted_at.elapsed()
    }
}

/// Chat participant role.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatRole {
    /// The shopper.
    User,
    /// The storefront assistant.
    Assistant,
}

impl ChatRole {
    /// Role name on the model wire format.
    #[must_use]
    pub fn wire_name(self) -> &'static str {
        match self {
            ChatRole::User => "user",
            ChatRole::Assistant => "model",
        }
    }
}

/// One chat message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    /// Who said it.
    pub role: ChatRole,
    /// What was said.
    pub text: String,
}

/// Append-only conversation transcript.
///
/// Used both for display and as conversation context for the next model
/// call; messages are never truncated or rewritten.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChatTranscript {
    messages: Vec<ChatMessage>,
}

impl ChatTranscript {
    /// Create an empty transcript.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a transcript opened by the assistant greeting.
    #[must_use]
    pub fn with_greeting() -> Self {
        let mut transcript = Self::new();
        transcript.push_assistant(ASSISTANT_GREETING);
        transcript
    }

    /// Append a shopper message.
    pub fn push_user(&mut self, text: impl Into<String>) {
        self.messages.push(ChatMessage {
            role: ChatRole::User,
            text: text.into(),
        });
    }

    /// Append an assistant message.
    pub fn push_assistant(&mut self, text: impl Into<String>) {
        self.messages.push(ChatMessage {
            role: ChatRole::Assistant,
            text: text.into(),
        });
    }

    /// Messages in order.
    #[must_use]
    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    /// The most recent message, if any.
    #[must_use]
    pub fn last(&self) -> Option<&ChatMessage> {
        self.messages.last()
    }

    /// Number of messages.
    #[must_use]
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Check whether the transcript has no messages.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aspect_ratio_round_trips_wire_names() {
        assert_eq!(AspectRatio::Landscape.as_str(), "16:9");
        assert_eq!(AspectRatio::Portrait.as_str(), "9:16");
        assert_eq!("16:9".parse::<AspectRatio>(), Ok(AspectRatio::Landscape));
        assert_eq!("portrait".parse::<AspectRatio>(), Ok(AspectRatio::Portrait));
        assert!("4:3".parse::<AspectRatio>().is_err());
    }

    #[test]
    fn transcript_with_greeting_opens_with_assistant() {
        let transcript = ChatTranscript::with_greeting();

        assert_eq!(transcript.len(), 1);
        assert_eq!(transcript.messages()[0].role, ChatRole::Assistant);
    }

    #[test]
    fn transcript_appends_in_order() {
        let mut transcript = ChatTranscript::new();

        transcript.push_user("hi");
        transcript.push_assistant("hello");
        transcript.push_user("bye");

        let roles: Vec<ChatRole> = transcript
            .messages()
            .iter()
            .map(|message| message.role)
            .collect();

        assert_eq!(
            roles,
            [ChatRole::User, ChatRole::Assistant, ChatRole::User]
        );
        assert_eq!(transcript.last().map(|m| m.text.as_str()), Some("bye"));
    }
}
