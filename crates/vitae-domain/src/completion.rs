//! Completion requests and responses

use serde::{Deserialize, Serialize};

/// Sampling parameters passed to the completion service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationParams {
    /// Maximum tokens to generate
    pub max_tokens: u32,
    /// Sampling temperature
    pub temperature: f32,
    /// Nucleus sampling cutoff
    pub top_p: f32,
    /// Penalty applied to repeated tokens
    pub repeat_penalty: f32,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            max_tokens: 3096,
            temperature: 0.7,
            top_p: 0.9,
            repeat_penalty: 1.1,
        }
    }
}

/// A prompt plus the parameters to complete it with
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionRequest {
    /// Full prompt text
    pub prompt: String,
    /// Sampling parameters
    pub params: GenerationParams,
}

impl CompletionRequest {
    /// Create a request
    pub fn new(prompt: impl Into<String>, params: GenerationParams) -> Self {
        Self {
            prompt: prompt.into(),
            params,
        }
    }
}

/// Why the service stopped generating
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinishReason {
    /// Natural end of output (end-of-sequence or stop word)
    Stop,
    /// Hit `max_tokens`; the output is probably cut off
    Length,
    /// Anything else the backend reported
    Other(String),
}

impl FinishReason {
    /// Map a backend's reason string
    pub fn from_label(label: &str) -> Self {
        match label {
            "stop" | "eos" => FinishReason::Stop,
            "length" | "limit" => FinishReason::Length,
            other => FinishReason::Other(other.to_string()),
        }
    }
}

/// What a provider returns for one request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionResponse {
    /// Generated text
    pub text: String,
    /// Why generation stopped
    pub finish_reason: FinishReason,
}

/// Completion text paired with what is known about how it was produced
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Completion {
    /// Text exactly as returned by the service
    pub raw_text: String,

    /// The prompt's input excerpt was truncated to fit the context window
    pub truncated: bool,

    /// Why the service stopped generating
    pub finish_reason: FinishReason,
}

impl Completion {
    /// A completion for an untruncated prompt that stopped naturally
    pub fn new(raw_text: impl Into<String>) -> Self {
        Self {
            raw_text: raw_text.into(),
            truncated: false,
            finish_reason: FinishReason::Stop,
        }
    }

    /// Pair a provider response with the prompt's truncation flag
    pub fn from_response(response: CompletionResponse, truncated: bool) -> Self {
        Self {
            raw_text: response.text,
            truncated,
            finish_reason: response.finish_reason,
        }
    }

    /// True when the output itself was cut off at `max_tokens`
    pub fn hit_token_limit(&self) -> bool {
        self.finish_reason == FinishReason::Length
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_generation_params() {
        let params = GenerationParams::default();
        assert_eq!(params.max_tokens, 3096);
        assert_eq!(params.temperature, 0.7);
        assert_eq!(params.top_p, 0.9);
        assert_eq!(params.repeat_penalty, 1.1);
    }

    #[test]
    fn test_finish_reason_labels() {
        assert_eq!(FinishReason::from_label("stop"), FinishReason::Stop);
        assert_eq!(FinishReason::from_label("length"), FinishReason::Length);
        assert_eq!(
            FinishReason::from_label("load"),
            FinishReason::Other("load".to_string())
        );
    }

    #[test]
    fn test_completion_from_response() {
        let response = CompletionResponse {
            text: "{}".to_string(),
            finish_reason: FinishReason::Length,
        };
        let completion = Completion::from_response(response, true);
        assert!(completion.truncated);
        assert!(completion.hit_token_limit());
        assert_eq!(completion.raw_text, "{}");
    }
}
