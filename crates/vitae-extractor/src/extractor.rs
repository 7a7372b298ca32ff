//! The résumé parsing pipeline

use crate::config::ExtractorConfig;
use crate::decoder::decode_with_source;
use crate::document::DocumentTextExtractor;
use crate::error::ExtractorError;
use crate::prompt::{Prompt, PromptBuilder};
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};
use vitae_domain::{
    Completion, CompletionProvider, CompletionRequest, DecodeOutcome, ExtractedText, FinishReason,
    RawDocument,
};
use vitae_llm::CompletionPool;

/// Result of parsing one document
#[derive(Debug, Clone, Serialize)]
pub struct ParseReport {
    /// What the decoder recovered
    pub outcome: DecodeOutcome,

    /// True if the document was cut to fit the context window
    pub truncated: bool,

    /// Why the completion service stopped
    pub finish_reason: FinishReason,

    /// True if some page or paragraph had no text
    pub has_empty_segments: bool,

    /// Estimated prompt size in tokens
    pub prompt_tokens: usize,

    /// Model that produced the completion
    pub model_name: String,

    /// Wall-clock time for the whole pipeline (milliseconds)
    pub processing_time_ms: u64,
}

/// Extract → prompt → complete → decode
///
/// Holds no per-request state; one parser serves every request and shares
/// the completion pool it was built with.
pub struct ResumeParser<P: CompletionProvider> {
    documents: DocumentTextExtractor,
    prompts: PromptBuilder,
    pool: Arc<CompletionPool<P>>,
    config: ExtractorConfig,
}

impl<P> ResumeParser<P>
where
    P: CompletionProvider + 'static,
{
    /// Create a parser over a shared completion pool
    ///
    /// # Errors
    ///
    /// Returns [`ExtractorError::Config`] if the configuration is invalid.
    pub fn new(pool: Arc<CompletionPool<P>>, config: ExtractorConfig) -> Result<Self, ExtractorError> {
        config.validate().map_err(ExtractorError::Config)?;

        Ok(Self {
            documents: DocumentTextExtractor::new(config.max_document_bytes),
            prompts: PromptBuilder::from_config(&config),
            pool,
            config,
        })
    }

    /// The completion pool
    pub fn pool(&self) -> &Arc<CompletionPool<P>> {
        &self.pool
    }

    /// The active configuration
    pub fn config(&self) -> &ExtractorConfig {
        &self.config
    }

    /// Extract normalized text on the blocking thread pool
    pub async fn extract_text(&self, document: RawDocument) -> Result<ExtractedText, ExtractorError> {
        let documents = self.documents.clone();
        tokio::task::spawn_blocking(move || documents.extract(&document))
            .await
            .map_err(|e| ExtractorError::Extraction(format!("Extraction task failed: {}", e)))?
    }

    /// Build the prompt for extracted text without calling the model
    pub fn build_prompt(&self, text: &ExtractedText) -> Result<Prompt, ExtractorError> {
        self.prompts.build(text)
    }

    /// Parse a document end to end
    ///
    /// An undecodable completion is returned as
    /// [`DecodeOutcome::Undecodable`] inside an `Ok` report.
    pub async fn parse(&self, document: RawDocument) -> Result<ParseReport, ExtractorError> {
        let started = Instant::now();
        info!(
            "Parsing {} byte document declared as '{}'",
            document.bytes.len(),
            document.declared_format
        );

        let text = self.extract_text(document).await?;
        self.finish(text, started).await
    }

    /// Parse text that has already been extracted
    pub async fn parse_text(&self, text: ExtractedText) -> Result<ParseReport, ExtractorError> {
        self.finish(text, Instant::now()).await
    }

    async fn finish(&self, text: ExtractedText, started: Instant) -> Result<ParseReport, ExtractorError> {
        debug!(
            "Extracted {} chars from {} (empty segments: {})",
            text.char_count(),
            text.format,
            text.has_empty_segments
        );

        let prompt = self.prompts.build(&text)?;
        let rendered = prompt.render();
        let prompt_tokens = prompt.token_estimate();

        let request = CompletionRequest::new(rendered, self.config.generation.clone());
        let response = self.pool.complete(&request).await?;
        let completion = Completion::from_response(response, prompt.truncated());
        debug!(
            "Completion: {} chars, finish reason {:?}",
            completion.raw_text.len(),
            completion.finish_reason
        );

        let outcome = decode_with_source(&completion, Some(&text.text));
        let processing_time_ms = elapsed_ms(started);

        match &outcome {
            DecodeOutcome::Undecodable { reason, .. } => {
                warn!("Parse finished undecodable ({}) in {}ms", reason, processing_time_ms)
            }
            _ => info!(
                "Parse finished {} in {}ms ({} low-confidence fields)",
                outcome.label(),
                processing_time_ms,
                outcome.low_confidence_fields().len()
            ),
        }

        Ok(ParseReport {
            outcome,
            truncated: completion.truncated,
            finish_reason: completion.finish_reason,
            has_empty_segments: text.has_empty_segments,
            prompt_tokens,
            model_name: self.pool.model_name().to_string(),
            processing_time_ms,
        })
    }
}

fn elapsed_ms(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}

impl ParseReport {
    /// Processing time as a Duration
    pub fn processing_time(&self) -> Duration {
        Duration::from_millis(self.processing_time_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vitae_domain::DocumentFormat;
    use vitae_llm::{MockProvider, PoolConfig};

    fn parser(provider: MockProvider) -> ResumeParser<MockProvider> {
        let pool = Arc::new(CompletionPool::single(provider, PoolConfig::default()));
        ResumeParser::new(pool, ExtractorConfig::default()).unwrap()
    }

    #[test]
    fn test_invalid_config_rejected() {
        let pool = Arc::new(CompletionPool::single(MockProvider::new("{}"), PoolConfig::default()));
        let mut config = ExtractorConfig::default();
        config.context_window_tokens = 0;

        let result = ResumeParser::new(pool, config);
        assert!(matches!(result, Err(ExtractorError::Config(_))));
    }

    #[tokio::test]
    async fn test_unsupported_format_never_reaches_model() {
        let provider = MockProvider::new("{}");
        let log = provider.clone();
        let parser = parser(provider);

        let result = parser.parse(RawDocument::new(b"plain text".to_vec(), "txt")).await;
        assert!(matches!(result, Err(ExtractorError::UnsupportedFormat(_))));
        assert_eq!(log.call_count(), 0);
    }

    #[tokio::test]
    async fn test_parse_text_sends_rendered_prompt() {
        let provider = MockProvider::new(r#"{"skills": ["Rust"]}"#);
        let log = provider.clone();
        let parser = parser(provider);

        let text = ExtractedText::new("Jane Doe\nRust developer", DocumentFormat::Docx, false);
        let report = parser.parse_text(text.clone()).await.unwrap();

        let expected = parser.build_prompt(&text).unwrap().render();
        assert_eq!(log.prompts(), vec![expected]);
        assert_eq!(report.model_name, "mock");
        assert!(!report.truncated);
        assert!(report.outcome.is_usable());
    }
}
