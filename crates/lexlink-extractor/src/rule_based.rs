//! Rule-based extractor
//!
//! Composes citation extraction, interpretation classification, authority
//! determination and holding extraction into high-precision candidate links.
//! A citation alone never produces a link: an interpretive pattern must be
//! present in the sentence window around it, and the citation must name a
//! section.

use crate::authority::AuthorityDeterminer;
use crate::citation::{CitationExtractor, StatuteCitation};
use crate::classifier::InterpretationClassifier;
use crate::config::RuleConfig;
use crate::holding::{split_sentences, HoldingExtractor, Sentence};
use crate::statute_map::StatuteIdMapper;
use lexlink_domain::{CaseParagraphInput, ExtractedLink, ExtractionMethod, LinkDraft};
use rayon::prelude::*;
use std::any::Any;
use std::ops::Range;
use std::panic::{self, AssertUnwindSafe};
use tracing::{debug, warn};

/// Pattern-based link extractor
#[derive(Debug, Clone)]
pub struct RuleBasedExtractor {
    citations: CitationExtractor,
    classifier: InterpretationClassifier,
    authority: AuthorityDeterminer,
    holdings: HoldingExtractor,
    mapper: StatuteIdMapper,
    config: RuleConfig,
}

impl Default for RuleBasedExtractor {
    fn default() -> Self {
        Self::new(RuleConfig::default())
    }
}

impl RuleBasedExtractor {
    /// Create an extractor with the built-in statute alias table
    pub fn new(config: RuleConfig) -> Self {
        Self {
            citations: CitationExtractor::new(),
            classifier: InterpretationClassifier::new(),
            authority: AuthorityDeterminer::new(),
            holdings: HoldingExtractor::new(config.max_holding_chars),
            mapper: StatuteIdMapper::new(),
            config,
        }
    }

    /// Use a custom statute mapper
    pub fn with_mapper(mut self, mapper: StatuteIdMapper) -> Self {
        self.mapper = mapper;
        self
    }

    /// Extract links from one paragraph
    ///
    /// Returns an empty vector when the paragraph cites no statute.
    pub fn extract(&self, paragraph: &CaseParagraphInput) -> Vec<ExtractedLink> {
        let text = paragraph.text();
        let citations = self.citations.extract(text);
        if citations.is_empty() {
            return Vec::new();
        }

        let sentences = split_sentences(text);
        let authority = self.authority.determine(paragraph.metadata(), text);
        let mut links = Vec::new();

        for citation in &citations {
            if let Some(link) = self.link_for(paragraph, citation, &sentences, authority) {
                links.push(link);
            }
        }

        debug!(
            paragraph = %paragraph.paragraph(),
            citations = citations.len(),
            links = links.len(),
            "Rule-based extraction"
        );
        links
    }

    /// Extract links from a batch on the current rayon pool
    ///
    /// Output is sorted by link key so the result does not depend on
    /// scheduling. A paragraph whose extraction panics contributes no links;
    /// the rest of the batch is unaffected.
    pub fn extract_batch(&self, paragraphs: &[CaseParagraphInput]) -> Vec<ExtractedLink> {
        extract_isolated(paragraphs, |p| self.extract(p))
    }

    fn link_for(
        &self,
        paragraph: &CaseParagraphInput,
        citation: &StatuteCitation,
        sentences: &[Sentence<'_>],
        authority: lexlink_domain::Authority,
    ) -> Option<ExtractedLink> {
        let Some(section) = citation.section.as_deref() else {
            debug!(statute = %citation.name, "Citation without section, no link");
            return None;
        };
        let statute_id = self.mapper.resolve(&citation.name, section)?;

        let text = paragraph.text();
        let window = &text[self.window(sentences, citation.span(), text.len())];
        let Some(classification) = self.classifier.match_rules(window) else {
            debug!(%statute_id, "Statute mentioned but not interpreted");
            return None;
        };

        let extra_hits = classification.hits.saturating_sub(1) as f64;
        let confidence = (self.config.base_confidence + self.config.confidence_step * extra_hits)
            .min(self.config.max_confidence);
        let holding = self.holdings.extract_from(sentences, citation.span());

        let draft = LinkDraft {
            statute_id,
            paragraph: paragraph.paragraph().clone(),
            interpretation_type: classification.label,
            authority,
            confidence,
            boost_factor: authority.default_boost(),
            method: ExtractionMethod::RuleBased,
            holding: Some(holding),
            fact_pattern_tags: Vec::new(),
        };

        match ExtractedLink::new(draft) {
            Ok(link) => Some(link),
            Err(e) => {
                warn!(paragraph = %paragraph.paragraph(), error = %e, "Rejected rule-based link");
                None
            }
        }
    }

    /// Byte range of the sentences around a citation
    fn window(&self, sentences: &[Sentence<'_>], citation: Range<usize>, text_len: usize) -> Range<usize> {
        let containing = |offset: usize| {
            sentences
                .iter()
                .position(|s| s.range.start <= offset && offset < s.range.end)
        };
        let first = containing(citation.start);
        let last = containing(citation.end.saturating_sub(1)).or(first);
        match (first, last) {
            (Some(first), Some(last)) => {
                let lo = first.saturating_sub(self.config.window_sentences);
                let hi = (last + self.config.window_sentences).min(sentences.len() - 1);
                sentences[lo].range.start..sentences[hi].range.end
            }
            _ => 0..text_len,
        }
    }
}

/// Run `extract` over every paragraph in parallel, containing panics per paragraph
fn extract_isolated<F>(paragraphs: &[CaseParagraphInput], extract: F) -> Vec<ExtractedLink>
where
    F: Fn(&CaseParagraphInput) -> Vec<ExtractedLink> + Sync,
{
    let mut links: Vec<ExtractedLink> = paragraphs
        .par_iter()
        .flat_map_iter(|p| {
            panic::catch_unwind(AssertUnwindSafe(|| extract(p))).unwrap_or_else(|payload| {
                warn!(
                    paragraph = %p.paragraph(),
                    error = panic_message(payload.as_ref()),
                    "Rule-based extraction failed, skipping paragraph"
                );
                Vec::new()
            })
        })
        .collect();
    links.sort_by_cached_key(ExtractedLink::key);
    links
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("unknown panic")
}
