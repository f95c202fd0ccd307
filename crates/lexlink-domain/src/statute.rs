//! Canonical statute provision identifiers
//!
//! Both extraction paths must land on the same identifier for the same
//! provision, otherwise the merge step cannot recognize duplicates. The only
//! ways to build a [`StatuteId`] are [`StatuteId::new`], which normalizes a
//! free-form name and section, and [`StatuteId::parse`], which reads the
//! canonical `Name§Section` form back.

use crate::error::StatuteIdError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Separator between statute name and section in the canonical form
pub const SECTION_MARK: char = '§';

/// Words kept in lower case inside a statute name (never the first word)
const CONNECTORS: &[&str] = &["of", "and", "for", "on", "to", "in", "the", "with", "by", "or"];

/// Trailing tokens dropped from a statute name (chapter and edition markers)
const TRAILING_NOISE: &[&str] = &["cap", "cap.", "chapter", "rev", "rev.", "ed", "ed.", "edn", "no", "no."];

/// Section prefixes accepted in front of a section number, longest first
const SECTION_PREFIXES: &[&str] = &["sections", "section", "sec.", "sec", "ss.", "ss", "s.", "s", "§"];

/// Normalized statute provision identifier, e.g. `Defamation Act§7`
///
/// Identifiers are section-level: subsection references such as `(1)` are
/// dropped, so `s 7(1)` and `s 7(2)` of the same Act share one identifier.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct StatuteId {
    name: String,
    section: String,
}

impl StatuteId {
    /// Build an identifier from a free-form statute name and section reference
    ///
    /// # Examples
    ///
    /// ```
    /// use lexlink_domain::StatuteId;
    ///
    /// let id = StatuteId::new("the Evidence Act (Cap 97)", "s. 32(1)").unwrap();
    /// assert_eq!(id.to_string(), "Evidence Act§32");
    /// ```
    pub fn new(name: &str, section: &str) -> Result<Self, StatuteIdError> {
        let name = normalize_name(name).ok_or(StatuteIdError::EmptyName)?;
        let section = normalize_section(section)
            .ok_or_else(|| StatuteIdError::InvalidSection(section.to_string()))?;
        Ok(Self { name, section })
    }

    /// Parse the canonical `Name§Section` form
    pub fn parse(value: &str) -> Result<Self, StatuteIdError> {
        let (name, section) = value
            .split_once(SECTION_MARK)
            .ok_or_else(|| StatuteIdError::Malformed(value.to_string()))?;
        Self::new(name, section)
    }

    /// Normalized statute name, e.g. `Defamation Act`
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Normalized section number, e.g. `7` or `2A`
    pub fn section(&self) -> &str {
        &self.section
    }
}

impl fmt::Display for StatuteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.name, SECTION_MARK, self.section)
    }
}

impl FromStr for StatuteId {
    type Err = StatuteIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for StatuteId {
    type Error = StatuteIdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<StatuteId> for String {
    fn from(id: StatuteId) -> Self {
        id.to_string()
    }
}

/// Normalize a statute name into canonical title case
///
/// Collapses whitespace, drops a leading article, any parenthesized suffix
/// (`(Cap 97)`, `(2020 Rev Ed)`) and trailing year or chapter tokens.
/// Returns `None` when nothing is left.
pub fn normalize_name(raw: &str) -> Option<String> {
    let head = match raw.find('(') {
        Some(idx) => &raw[..idx],
        None => raw,
    };
    let head = head.trim_matches(|c: char| c.is_whitespace() || matches!(c, ',' | ';' | ':' | '.'));

    let mut words: Vec<&str> = head.split_whitespace().collect();
    while words.first().is_some_and(|w| w.eq_ignore_ascii_case("the")) {
        words.remove(0);
    }
    while let Some(last) = words.last() {
        let lower = last.trim_end_matches(',').to_lowercase();
        let numeric = !lower.is_empty() && lower.chars().all(|c| c.is_ascii_digit());
        if numeric || TRAILING_NOISE.contains(&lower.as_str()) {
            words.pop();
        } else {
            break;
        }
    }
    if words.is_empty() {
        return None;
    }

    let titled: Vec<String> = words
        .iter()
        .enumerate()
        .map(|(idx, word)| {
            let lower = word.trim_end_matches(',').to_lowercase();
            if idx > 0 && CONNECTORS.contains(&lower.as_str()) {
                lower
            } else {
                capitalize(&lower)
            }
        })
        .collect();
    Some(titled.join(" "))
}

/// Normalize a section reference into its canonical number
///
/// Accepts `7`, `s 7`, `s.7`, `section 2(1)`, `§ 12A`; the subsection and
/// anything after the section number is dropped. Returns `None` when the
/// reference does not start with a digit.
pub fn normalize_section(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    let mut rest = trimmed;
    for prefix in SECTION_PREFIXES {
        if let Some(head) = trimmed.get(..prefix.len()) {
            if head.eq_ignore_ascii_case(prefix) {
                rest = &trimmed[prefix.len()..];
                break;
            }
        }
    }
    let rest = rest.trim_start_matches(|c: char| c.is_whitespace() || c == '.');

    let digits: String = rest.chars().take_while(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return None;
    }
    let suffix: String = rest[digits.len()..]
        .chars()
        .take_while(|c| c.is_ascii_alphabetic())
        .collect();
    // Long alphabetic runs are words ("7of"), not section letters
    if suffix.len() > 2 {
        return Some(digits);
    }
    Some(format!("{}{}", digits, suffix.to_ascii_uppercase()))
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
