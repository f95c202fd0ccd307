//! Holding extraction and sentence splitting

use regex::Regex;
use std::ops::Range;
use std::sync::LazyLock;

/// Default cap on holding length (characters)
pub const MAX_HOLDING_CHARS: usize = 300;

/// Abbreviations that end in a full stop without ending a sentence
const ABBREVIATIONS: &[&str] = &[
    "s.", "ss.", "v.", "vs.", "no.", "nos.", "cap.", "cf.", "e.g.", "i.e.", "para.", "paras.",
    "art.", "arts.", "reg.", "regs.", "r.", "rr.", "o.", "ltd.", "pte.", "co.", "inc.", "corp.",
    "j.", "jj.", "ja.", "jc.", "cj.", "mr.", "mrs.", "ms.", "dr.", "sec.", "ch.", "pt.", "sch.",
    "vol.", "ed.", "rev.", "p.", "pp.", "etc.", "viz.", "op.", "cit.", "ibid.", "id.",
];

/// Phrases signalling that a sentence states a holding
static HOLDING_INDICATOR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(?:held|hold|holds|find|found|conclude[ds]?|concluding|requires?|means|must be|should be|is to be|are to be|applies|does not apply|do not apply|in (?:our|my) (?:judgment|view)|we are (?:of the view|satisfied)|it follows that|accordingly|the proper (?:approach|construction|interpretation))\b",
    )
    .expect("holding indicator pattern is valid")
});

/// One sentence of a paragraph with its byte range
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sentence<'a> {
    /// Sentence text, trimmed
    pub text: &'a str,
    /// Byte range of the trimmed sentence within the paragraph
    pub range: Range<usize>,
}

/// Split text into sentences
///
/// A sentence ends at `.`, `?` or `!` followed by whitespace and then an
/// upper-case letter, digit, quote or bracket (or the end of the text). A full
/// stop after a known legal abbreviation or a single-letter initial does not
/// end a sentence.
pub fn split_sentences(text: &str) -> Vec<Sentence<'_>> {
    let mut sentences = Vec::new();
    let mut start = 0;
    let chars: Vec<(usize, char)> = text.char_indices().collect();

    for (i, &(idx, ch)) in chars.iter().enumerate() {
        if !matches!(ch, '.' | '?' | '!') {
            continue;
        }
        let end = idx + ch.len_utf8();
        let next = chars.get(i + 1).map(|&(_, c)| c);
        if !next.map_or(true, char::is_whitespace) {
            continue;
        }
        let following = chars[i + 1..].iter().map(|&(_, c)| c).find(|c| !c.is_whitespace());
        let opens_sentence = following.map_or(true, |c| {
            c.is_uppercase() || c.is_ascii_digit() || matches!(c, '"' | '\'' | '“' | '‘' | '(' | '[')
        });
        if !opens_sentence {
            continue;
        }
        if ch == '.' && is_abbreviation(&text[start..end]) {
            continue;
        }
        push_sentence(&mut sentences, text, start..end);
        start = end;
    }
    push_sentence(&mut sentences, text, start..text.len());
    sentences
}

fn push_sentence<'a>(sentences: &mut Vec<Sentence<'a>>, text: &'a str, range: Range<usize>) {
    let raw = &text[range.clone()];
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return;
    }
    let lead = raw.len() - raw.trim_start().len();
    let start = range.start + lead;
    sentences.push(Sentence {
        text: trimmed,
        range: start..start + trimmed.len(),
    });
}

/// Whether the chunk ends with an abbreviation or an initial
fn is_abbreviation(chunk: &str) -> bool {
    let last = chunk
        .rsplit(|c: char| c.is_whitespace() || c == '(' || c == '[')
        .next()
        .unwrap_or("");
    let lower = last.to_lowercase();
    if ABBREVIATIONS.contains(&lower.as_str()) {
        return true;
    }
    // Single-letter initials such as "J." or "A."
    let letters: Vec<char> = last.trim_end_matches('.').chars().collect();
    letters.len() == 1 && letters[0].is_alphabetic()
}

/// Isolates the one or two sentences that state a holding about a citation
#[derive(Debug, Clone, Copy)]
pub struct HoldingExtractor {
    max_chars: usize,
}

impl Default for HoldingExtractor {
    fn default() -> Self {
        Self::new(MAX_HOLDING_CHARS)
    }
}

impl HoldingExtractor {
    /// Create an extractor capping holdings at `max_chars` characters
    pub fn new(max_chars: usize) -> Self {
        Self { max_chars }
    }

    /// Extract the holding for the citation at `citation` (byte range) in `text`
    pub fn extract(&self, text: &str, citation: Range<usize>) -> String {
        self.extract_from(&split_sentences(text), citation)
    }

    /// Same as [`extract`](Self::extract) on pre-split sentences
    ///
    /// The sentence containing the citation must carry a holding indicator,
    /// otherwise the result is empty. The best-scoring neighbouring sentence
    /// is appended when it also carries one. Sentences are scored by
    /// proximity to the citation plus the number of indicator phrases.
    pub fn extract_from(&self, sentences: &[Sentence<'_>], citation: Range<usize>) -> String {
        let Some(anchor) = sentences
            .iter()
            .position(|s| s.range.start <= citation.start && citation.start < s.range.end.max(s.range.start + 1))
        else {
            return String::new();
        };
        if indicator_hits(sentences[anchor].text) == 0 {
            return String::new();
        }

        let neighbour = [anchor.checked_sub(1), Some(anchor + 1)]
            .into_iter()
            .flatten()
            .filter(|&i| i < sentences.len())
            .filter(|&i| indicator_hits(sentences[i].text) > 0)
            .max_by(|&a, &b| {
                score(&sentences[a], anchor, a)
                    .total_cmp(&score(&sentences[b], anchor, b))
                    // Prefer the following sentence on ties
                    .then(a.cmp(&b))
            });

        let holding = match neighbour {
            Some(i) if i < anchor => format!("{} {}", sentences[i].text, sentences[anchor].text),
            Some(i) => format!("{} {}", sentences[anchor].text, sentences[i].text),
            None => sentences[anchor].text.to_string(),
        };
        truncate_chars(&holding, self.max_chars)
    }
}

fn indicator_hits(sentence: &str) -> usize {
    HOLDING_INDICATOR_RE.find_iter(sentence).count()
}

fn score(sentence: &Sentence<'_>, anchor: usize, index: usize) -> f64 {
    let proximity = 1.0 / (1.0 + anchor.abs_diff(index) as f64);
    proximity + 0.5 * indicator_hits(sentence.text).min(2) as f64
}

fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => text[..idx].trim_end().to_string(),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_basic() {
        let sentences = split_sentences("First sentence. Second one? Third!");
        let texts: Vec<&str> = sentences.iter().map(|s| s.text).collect();
        assert_eq!(texts, vec!["First sentence.", "Second one?", "Third!"]);
    }

    #[test]
    fn test_split_respects_legal_abbreviations() {
        let text = "See s. 7 of the Act and Lim v. Tan at para. 12. The court held otherwise.";
        let sentences = split_sentences(text);
        assert_eq!(sentences.len(), 2);
        assert!(sentences[0].text.ends_with("para. 12."));
    }

    #[test]
    fn test_split_ignores_inner_dots_and_lowercase_continuations() {
        let text = "Under s.7 the test is strict. it continues here. Another sentence.";
        let sentences = split_sentences(text);
        assert_eq!(sentences.len(), 2);
        assert_eq!(sentences[1].text, "Another sentence.");
    }

    #[test]
    fn test_split_ranges_point_into_text() {
        let text = "  One.   Two.  ";
        for s in split_sentences(text) {
            assert_eq!(&text[s.range.clone()], s.text);
        }
    }

    #[test]
    fn test_holding_single_sentence() {
        let text = "In Lim v SPH [2015] SGCA 33, the Court of Appeal held that s.7 of the \
                    Defamation Act requires proof of positive public benefit, narrowing the \
                    prior broad reading.";
        let start = text.find("s.7").unwrap();
        let holding = HoldingExtractor::default().extract(text, start..start + 25);
        assert_eq!(holding, text);
    }

    #[test]
    fn test_holding_appends_supporting_sentence() {
        let text = "Counsel referred to many authorities. We hold that s 2 of the \
                    Misrepresentation Act applies to silence. It follows that the claim succeeds.";
        let start = text.find("s 2").unwrap();
        let holding = HoldingExtractor::default().extract(text, start..start + 30);
        assert!(holding.starts_with("We hold that s 2"));
        assert!(holding.ends_with("the claim succeeds."));
    }

    #[test]
    fn test_no_indicator_gives_empty_holding() {
        let text = "The defendant relied on s 7 of the Defamation Act. The hearing was adjourned.";
        let start = text.find("s 7").unwrap();
        assert_eq!(HoldingExtractor::default().extract(text, start..start + 10), "");
    }

    #[test]
    fn test_holding_is_truncated() {
        let long = format!("We hold that s 7 of the Defamation Act {}.", "x ".repeat(400));
        let holding = HoldingExtractor::new(50).extract(&long, 13..16);
        assert!(holding.chars().count() <= 50);
    }

    #[test]
    fn test_citation_outside_text() {
        assert_eq!(HoldingExtractor::default().extract("Short.", 100..110), "");
    }
}
