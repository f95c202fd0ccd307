//! LLM prompt engineering for interpretation link extraction

use lexlink_domain::CaseParagraphInput;

/// Builds prompts asking the model for the statutes a paragraph interprets
pub struct PromptBuilder<'a> {
    paragraph: &'a CaseParagraphInput,
    max_chars: usize,
}

impl<'a> PromptBuilder<'a> {
    /// Create a new prompt builder
    pub fn new(paragraph: &'a CaseParagraphInput) -> Self {
        Self {
            paragraph,
            max_chars: usize::MAX,
        }
    }

    /// Cut paragraph text beyond `max_chars` characters
    pub fn with_max_chars(mut self, max_chars: usize) -> Self {
        self.max_chars = max_chars;
        self
    }

    /// Build the complete extraction prompt
    pub fn build(&self) -> String {
        let metadata = self.paragraph.metadata();
        let mut prompt = String::new();

        // 1. Instructions and output format
        prompt.push_str(EXTRACTION_INSTRUCTIONS);
        prompt.push_str("\n\n");

        // 2. Case context
        if let Some(name) = &metadata.case_name {
            prompt.push_str(&format!("Case: {}\n", name));
        }
        if let Some(citation) = &metadata.citation {
            prompt.push_str(&format!("Citation: {}\n", citation));
        }
        prompt.push_str(&format!("Court: {}\n", metadata.court));
        prompt.push_str(&format!("Paragraph: {}\n\n", self.paragraph.paragraph_number()));

        // 3. The text to analyze
        prompt.push_str("Paragraph text:\n");
        prompt.push_str("---\n");
        prompt.push_str(self.text());
        prompt.push_str("\n---\n\n");

        // 4. Output format reminder
        prompt.push_str(OUTPUT_FORMAT_REMINDER);

        prompt
    }

    fn text(&self) -> &str {
        let text = self.paragraph.text();
        match text.char_indices().nth(self.max_chars) {
            Some((idx, _)) => &text[..idx],
            None => text,
        }
    }
}

const EXTRACTION_INSTRUCTIONS: &str = r#"You are a legal research assistant. Identify every statutory provision that the following judgment paragraph INTERPRETS.

A paragraph interprets a provision when the court states what it means, how far it reaches, or how it must be read. Merely quoting, citing or applying a provision without saying anything about its meaning is NOT an interpretation.

For each interpreted provision report:
- statute_name: full name of the statute (e.g. "Misrepresentation Act")
- section: section number only (e.g. "2" for s 2(1))
- interpretation_type: one of "narrow", "broad", "purposive", "clarify", "distinguish", "overrule"
- confidence: 0.6-0.85, lower when the paragraph is ambiguous
- holding: one or two sentences stating the court's reading, quoted or closely paraphrased
- is_binding: true if this is part of the court's ratio, false for obiter remarks or a dissent
- fact_pattern_tags: short lowercase labels for the facts the reading applies to (e.g. "silence", "fraud")

Rules:
- Only report provisions with an explicit section number
- Do not invent provisions that are not mentioned in the paragraph
- One entry per provision; if a paragraph interprets two sections, return two entries"#;

const OUTPUT_FORMAT_REMINDER: &str = r#"Output format (JSON object only, no additional text):
{
  "links": [
    {
      "statute_name": "Misrepresentation Act",
      "section": "2",
      "interpretation_type": "narrow",
      "confidence": 0.8,
      "holding": "exact or closely paraphrased holding",
      "is_binding": true,
      "fact_pattern_tags": ["silence"]
    }
  ]
}

If the paragraph interprets no provision, return {"links": []}.

Remember: Return ONLY valid JSON, no markdown code blocks, no explanations."#;
