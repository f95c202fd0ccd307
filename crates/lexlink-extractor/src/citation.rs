//! Statute citation extraction
//!
//! Finds statute name and section references in free text. Recognized forms
//! include `s.7 of the Defamation Act`, `section 2(1) of the Companies Act`,
//! `Evidence Act (Cap 97) s 32`, `Companies Act 1967, s 216`, the `Rules of
//! Court`, and a small table of abbreviations (`ROC`, `CPC`, `CLA`, ...).
//! Every occurrence is reported; deduplication happens downstream.

use lexlink_domain::StatuteId;
use regex::Regex;
use std::ops::Range;
use std::sync::LazyLock;

/// Capitalized statute names ending in a statute type word
static NAME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?x)
        \b(?P<name>
            Rules\s+of\s+Court
          |
            [A-Z][A-Za-z'’\-]*
            (?:\s+(?:(?:of|and|for|on|in|to|the|with|&)\s+)*[A-Z][A-Za-z'’\-]*)*?
            \s+(?:Act|Code|Ordinance|Regulations|Rules|Decree)
        )\b",
    )
    .expect("statute name pattern is valid")
});

/// Abbreviated statute names
static ABBREVIATION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(?P<abbr>ROC|CPC|CLA|IA|EA)\b").expect("abbreviation pattern is valid")
});

/// `s 7(1) of the` immediately before a statute name
static SECTION_BEFORE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(?:sections?|secs?\.?|ss?\.?)\s*(?P<section>\d+[a-z]{0,2})(?P<sub>(?:\s*\(\s*[0-9a-z]+\s*\))*)\s+of\s+(?:the\s+)?$",
    )
    .expect("section-before pattern is valid")
});

/// `s 7 of the` or `s 7` immediately before an abbreviation
static SECTION_BEFORE_ABBR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(?:sections?|secs?\.?|ss?\.?)\s*(?P<section>\d+[a-z]{0,2})(?P<sub>(?:\s*\(\s*[0-9a-z]+\s*\))*)\s+(?:of\s+)?(?:the\s+)?$",
    )
    .expect("section-before-abbreviation pattern is valid")
});

/// Chapter or year directly after a statute name
static SUFFIX_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?:\s*,)?\s*(?:\(\s*(?:Cap(?:ter)?\.?|Chapter)\s*(?P<chapter>\d+[A-Za-z]?)[^)]*\)|\(\s*\d{4}\s+Rev\.?\s+Ed\.?\s*\)|(?P<year>(?:1[89]|20)\d{2})\b)",
    )
    .expect("suffix pattern is valid")
});

/// `s 32` or `, section 216(1)` directly after a statute name
static SECTION_AFTER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^\s*,?\s*(?:sections?|secs?\.?|ss?\.?)\s*(?P<section>\d+[a-z]{0,2})(?P<sub>(?:\s*\(\s*[0-9a-z]+\s*\))*)",
    )
    .expect("section-after pattern is valid")
});

/// Capitalized words that may open a match but are never part of a statute name
const LEADING_STOPWORDS: &[&str] = &[
    "the", "in", "under", "by", "of", "and", "section", "pursuant", "see", "as", "since",
    "although", "for", "on", "if", "when", "while", "this", "that", "per", "thus", "however",
    "moreover", "accordingly", "both", "whereas", "applying", "following", "regarding",
    "whether", "a", "an", "to", "with", "from", "unlike", "like", "after", "before", "where",
    "here", "there", "it", "notwithstanding", "contrary",
];

/// Abbreviation table: abbreviation → full statute name
pub const ABBREVIATIONS: &[(&str, &str)] = &[
    ("ROC", "Rules of Court"),
    ("CPC", "Criminal Procedure Code"),
    ("CLA", "Civil Law Act"),
    ("IA", "Interpretation Act"),
    ("EA", "Evidence Act"),
];

/// How far back to look for a leading section reference (bytes)
const LOOKBEHIND_BYTES: usize = 80;

/// One statute citation found in text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatuteCitation {
    /// Statute name as cited (abbreviations expanded)
    pub name: String,
    /// Chapter number, e.g. `97` from `(Cap 97)`
    pub chapter: Option<String>,
    /// Year, e.g. `1967` from `Companies Act 1967`
    pub year: Option<String>,
    /// Section number, e.g. `7` or `2A`
    pub section: Option<String>,
    /// Subsection reference, e.g. `(1)(a)`
    pub subsection: Option<String>,
    /// Byte offset where the citation starts (section prefix included)
    pub start: usize,
    /// Byte offset just past the citation
    pub end: usize,
}

impl StatuteCitation {
    /// Byte range of the citation
    pub fn span(&self) -> Range<usize> {
        self.start..self.end
    }

    /// Canonical identifier, when a section was cited
    pub fn statute_id(&self) -> Option<StatuteId> {
        let section = self.section.as_deref()?;
        StatuteId::new(&self.name, section).ok()
    }
}

/// Finds statute citations in paragraph text
#[derive(Debug, Clone, Copy, Default)]
pub struct CitationExtractor;

impl CitationExtractor {
    /// Create a citation extractor
    pub fn new() -> Self {
        Self
    }

    /// Extract every citation in `text`, ordered by position
    ///
    /// Returns an empty vector when nothing is found.
    pub fn extract(&self, text: &str) -> Vec<StatuteCitation> {
        let mut citations: Vec<StatuteCitation> = NAME_RE
            .captures_iter(text)
            .filter_map(|caps| {
                let name = caps.name("name")?;
                let (name_start, name) = strip_leading_stopwords(text, name.range())?;
                Some(self.complete(text, name_start, name_start + name.len(), name.to_string(), &SECTION_BEFORE_RE))
            })
            .collect();

        for caps in ABBREVIATION_RE.captures_iter(text) {
            let Some(abbr) = caps.name("abbr") else { continue };
            if citations.iter().any(|c| c.span().contains(&abbr.start())) {
                continue;
            }
            let Some((_, full)) = ABBREVIATIONS.iter().find(|(a, _)| *a == abbr.as_str()) else {
                continue;
            };
            citations.push(self.complete(
                text,
                abbr.start(),
                abbr.end(),
                full.to_string(),
                &SECTION_BEFORE_ABBR_RE,
            ));
        }

        citations.sort_by_key(|c| (c.start, c.end));
        citations
    }

    /// Attach chapter, year and section details around a located name
    fn complete(
        &self,
        text: &str,
        name_start: usize,
        name_end: usize,
        name: String,
        before_re: &Regex,
    ) -> StatuteCitation {
        let mut citation = StatuteCitation {
            name,
            chapter: None,
            year: None,
            section: None,
            subsection: None,
            start: name_start,
            end: name_end,
        };

        // Chapter and year suffixes, e.g. "(Cap 97)" or "1967"
        for _ in 0..3 {
            let Some(caps) = SUFFIX_RE.captures(&text[citation.end..]) else { break };
            if let Some(chapter) = caps.name("chapter") {
                citation.chapter = Some(chapter.as_str().to_string());
            }
            if let Some(year) = caps.name("year") {
                citation.year = Some(year.as_str().to_string());
            }
            let Some(whole) = caps.get(0) else { break };
            citation.end += whole.end();
        }

        let lookbehind_start = floor_char_boundary(text, name_start.saturating_sub(LOOKBEHIND_BYTES));
        let before = &text[lookbehind_start..name_start];
        if let Some(caps) = before_re.captures(before) {
            citation.section = caps.name("section").map(|m| m.as_str().to_uppercase());
            citation.subsection = caps.name("sub").and_then(|m| compact_subsection(m.as_str()));
            if let Some(whole) = caps.get(0) {
                citation.start = lookbehind_start + whole.start();
            }
        } else if let Some(caps) = SECTION_AFTER_RE.captures(&text[citation.end..]) {
            citation.section = caps.name("section").map(|m| m.as_str().to_uppercase());
            citation.subsection = caps.name("sub").and_then(|m| compact_subsection(m.as_str()));
            if let Some(whole) = caps.get(0) {
                citation.end += whole.end();
            }
        }

        citation
    }
}

/// Drop leading function words from a matched name
///
/// Returns the new start offset and the trimmed name, or `None` when fewer
/// than two words remain (a bare `Act` is not a citation).
fn strip_leading_stopwords(text: &str, range: Range<usize>) -> Option<(usize, &str)> {
    let matched = &text[range.clone()];
    let mut offset = 0;
    let mut rest = matched;
    loop {
        let word_end = rest.find(char::is_whitespace).unwrap_or(rest.len());
        let word = &rest[..word_end];
        if word_end == rest.len() || !LEADING_STOPWORDS.iter().any(|s| s.eq_ignore_ascii_case(word)) {
            break;
        }
        let next = rest[word_end..].trim_start();
        offset += rest.len() - next.len();
        rest = next;
    }
    if rest.split_whitespace().count() < 2 {
        return None;
    }
    Some((range.start + offset, rest))
}

fn compact_subsection(raw: &str) -> Option<String> {
    let compact: String = raw.chars().filter(|c| !c.is_whitespace()).collect();
    if compact.is_empty() {
        None
    } else {
        Some(compact)
    }
}

fn floor_char_boundary(text: &str, mut index: usize) -> usize {
    while index > 0 && !text.is_char_boundary(index) {
        index -= 1;
    }
    index
}
