//! LLM-assisted extractor
//!
//! Sends paragraphs that pass a cheap keyword pre-filter to a language model
//! and turns its structured answer into links. Model calls run concurrently
//! up to `max_in_flight`; each call has a timeout and is retried with
//! exponential backoff. Unparseable answers count as failures. A paragraph
//! whose calls keep failing contributes nothing, and the batch carries on.

use crate::authority::AuthorityDeterminer;
use crate::config::LlmExtractorConfig;
use crate::cost::CostTracker;
use crate::error::ExtractorError;
use crate::parser::parse_llm_response;
use crate::prompt::PromptBuilder;
use crate::statute_map::StatuteIdMapper;
use crate::types::{LlmExtraction, LlmLinkCandidate, LlmExtractionStats};
use futures::stream::{self, StreamExt};
use lexlink_domain::{
    Authority, CaseParagraphInput, ExtractedLink, ExtractionMethod, InterpretationType, LinkDraft,
    LlmProvider,
};
use regex::Regex;
use std::sync::{Arc, LazyLock};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Boost scale applied to model-derived links relative to the authority default
const LLM_BOOST_SCALE: f64 = 0.9;

/// Cues that a paragraph may discuss legislation
static KEYWORD_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(?:sections?|act|statute|statutory|provisions?|subsection|regulations?|rules?|order|code|held that|interpreted|construed|construction|means|requires|applies)\b|\bss?\.?\s?\d",
    )
    .expect("keyword pattern is valid")
});

/// Model-backed link extractor
pub struct LlmAssistedExtractor<P: LlmProvider> {
    provider: P,
    mapper: StatuteIdMapper,
    authority: AuthorityDeterminer,
    config: LlmExtractorConfig,
    cost: Arc<CostTracker>,
}

enum Outcome {
    Linked(Vec<ExtractedLink>),
    Failed,
    Refused,
    Cancelled,
}

impl<P: LlmProvider> LlmAssistedExtractor<P> {
    /// Create an extractor sharing `cost` with the rest of the run
    ///
    /// Fails with [`ExtractorError::Config`] if `config` does not validate.
    pub fn new(
        provider: P,
        config: LlmExtractorConfig,
        cost: Arc<CostTracker>,
    ) -> Result<Self, ExtractorError> {
        config.validate().map_err(ExtractorError::Config)?;
        Ok(Self {
            provider,
            mapper: StatuteIdMapper::new(),
            authority: AuthorityDeterminer::new(),
            config,
            cost,
        })
    }

    /// Use a custom statute mapper
    pub fn with_mapper(mut self, mapper: StatuteIdMapper) -> Self {
        self.mapper = mapper;
        self
    }

    /// Name of the underlying model
    pub fn model_name(&self) -> &str {
        self.provider.model_name()
    }

    /// Whether a paragraph is worth a model call
    pub fn passes_prefilter(&self, text: &str) -> bool {
        text.chars().count() >= self.config.min_paragraph_chars && KEYWORD_RE.is_match(text)
    }

    /// Extract links from a batch of paragraphs
    ///
    /// Never fails: per-paragraph errors are logged and counted. Links are
    /// returned sorted by key.
    pub async fn extract_batch(
        &self,
        paragraphs: &[CaseParagraphInput],
        cancel: &CancellationToken,
    ) -> LlmExtraction {
        let mut stats = LlmExtractionStats {
            screened: paragraphs.len(),
            ..Default::default()
        };

        let mut candidates: Vec<&CaseParagraphInput> = paragraphs
            .iter()
            .filter(|p| self.passes_prefilter(p.text()))
            .collect();
        stats.prefiltered_out = paragraphs.len() - candidates.len();
        if let Some(cap) = self.config.max_paragraphs {
            stats.over_cap = candidates.len().saturating_sub(cap);
            candidates.truncate(cap);
        }

        info!(
            model = self.model_name(),
            candidates = candidates.len(),
            prefiltered_out = stats.prefiltered_out,
            over_cap = stats.over_cap,
            "Starting LLM-assisted extraction"
        );

        let outcomes: Vec<Outcome> = stream::iter(candidates)
            .map(|p| self.outcome_for(p, cancel))
            .buffer_unordered(self.config.max_in_flight.max(1))
            .collect()
            .await;

        let mut links = Vec::new();
        for outcome in outcomes {
            match outcome {
                Outcome::Linked(found) => {
                    stats.succeeded += 1;
                    links.extend(found);
                }
                Outcome::Failed => stats.failed += 1,
                Outcome::Refused => stats.refused += 1,
                Outcome::Cancelled => stats.cancelled += 1,
            }
        }
        links.sort_by_cached_key(ExtractedLink::key);
        stats.links = links.len();

        if stats.refused > 0 {
            warn!(refused = stats.refused, "LLM budget exhausted, paragraphs skipped");
        }
        info!(
            succeeded = stats.succeeded,
            failed = stats.failed,
            links = stats.links,
            "LLM-assisted extraction complete"
        );

        LlmExtraction { links, stats }
    }

    async fn outcome_for(&self, paragraph: &CaseParagraphInput, cancel: &CancellationToken) -> Outcome {
        match self.extract_paragraph(paragraph, cancel).await {
            Ok(links) => Outcome::Linked(links),
            Err(ExtractorError::BudgetExhausted { .. }) => Outcome::Refused,
            Err(ExtractorError::Cancelled) => Outcome::Cancelled,
            Err(e) => {
                warn!(
                    paragraph = %paragraph.paragraph(),
                    error = %e,
                    "Dropping LLM contribution for paragraph"
                );
                Outcome::Failed
            }
        }
    }

    /// Extract links from one paragraph, retrying failed calls
    ///
    /// Skips the pre-filter. Budget refusal and cancellation are returned
    /// immediately; other errors are retried up to `max_attempts`.
    pub async fn extract_paragraph(
        &self,
        paragraph: &CaseParagraphInput,
        cancel: &CancellationToken,
    ) -> Result<Vec<ExtractedLink>, ExtractorError> {
        let prompt = PromptBuilder::new(paragraph)
            .with_max_chars(self.config.max_paragraph_chars)
            .build();

        let mut attempt = 0;
        loop {
            attempt += 1;
            if cancel.is_cancelled() {
                return Err(ExtractorError::Cancelled);
            }
            self.cost.check_budget()?;

            let result = tokio::select! {
                _ = cancel.cancelled() => return Err(ExtractorError::Cancelled),
                result = self.call(&prompt) => result,
            };

            match result {
                Ok(candidates) => return Ok(self.build_links(paragraph, candidates)),
                Err(e) if e.is_retryable() && attempt < self.config.max_attempts => {
                    let delay = self.config.backoff(attempt);
                    warn!(
                        paragraph = %paragraph.paragraph(),
                        attempt,
                        error = %e,
                        delay_ms = delay.as_millis() as u64,
                        "LLM call failed, retrying"
                    );
                    tokio::select! {
                        _ = cancel.cancelled() => return Err(ExtractorError::Cancelled),
                        _ = tokio::time::sleep(delay) => {}
                    }
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// One timed model call, parsed
    async fn call(&self, prompt: &str) -> Result<Vec<LlmLinkCandidate>, ExtractorError> {
        let completion =
            match tokio::time::timeout(self.config.call_timeout(), self.provider.generate(prompt)).await {
                Err(_) => {
                    self.cost.record_failure();
                    return Err(ExtractorError::Timeout);
                }
                Ok(Err(e)) => {
                    self.cost.record_failure();
                    return Err(ExtractorError::Llm(e.to_string()));
                }
                Ok(Ok(completion)) => completion,
            };
        self.cost.record(completion.usage);
        parse_llm_response(&completion.text)
    }

    fn build_links(
        &self,
        paragraph: &CaseParagraphInput,
        candidates: Vec<LlmLinkCandidate>,
    ) -> Vec<ExtractedLink> {
        let authority = self.authority.determine(paragraph.metadata(), paragraph.text());
        let mut links = Vec::new();

        for candidate in candidates {
            let Some(statute_id) = self.mapper.resolve(&candidate.statute_name, &candidate.section) else {
                warn!(
                    paragraph = %paragraph.paragraph(),
                    statute = %candidate.statute_name,
                    section = %candidate.section,
                    "Model named an unresolvable provision"
                );
                continue;
            };

            let interpretation_type = candidate
                .interpretation_type
                .as_deref()
                .and_then(|label| label.parse::<InterpretationType>().ok())
                .unwrap_or_default();

            let confidence = candidate
                .confidence
                .filter(|c| c.is_finite())
                .unwrap_or(self.config.default_confidence)
                .clamp(self.config.min_confidence, self.config.max_confidence);

            // The model may recognise obiter the lexical cues missed
            let authority = match (authority, candidate.is_binding) {
                (Authority::Binding, Some(false)) => Authority::Obiter,
                (authority, _) => authority,
            };

            let draft = LinkDraft {
                statute_id,
                paragraph: paragraph.paragraph().clone(),
                interpretation_type,
                authority,
                confidence,
                boost_factor: authority.default_boost() * LLM_BOOST_SCALE,
                method: ExtractionMethod::LlmAssisted,
                holding: candidate.holding.map(|h| truncate_chars(&h, crate::holding::MAX_HOLDING_CHARS)),
                fact_pattern_tags: candidate.fact_pattern_tags.unwrap_or_default(),
            };

            match ExtractedLink::new(draft.clamped()) {
                Ok(link) => links.push(link),
                Err(e) => {
                    warn!(paragraph = %paragraph.paragraph(), error = %e, "Rejected LLM link");
                }
            }
        }

        debug!(paragraph = %paragraph.paragraph(), links = links.len(), "LLM extraction");
        links
    }
}

fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => text[..idx].trim_end().to_string(),
        None => text.to_string(),
    }
}
