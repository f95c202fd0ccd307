//! Case paragraphs, the unit of extraction work

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Court codes treated as apex or appellate (binding) courts
const APPELLATE_CODES: &[&str] = &[
    "SGCA", "CA", "UKSC", "UKHL", "UKPC", "EWCA", "HCA", "SCC", "SGHC(A)", "SGCA(I)",
];

/// Court names treated as apex or appellate courts
const APPELLATE_NAMES: &[&str] = &[
    "COURT OF APPEAL",
    "SUPREME COURT",
    "HOUSE OF LORDS",
    "PRIVY COUNCIL",
    "APPELLATE DIVISION",
    "HIGH COURT OF AUSTRALIA",
];

/// Role of a paragraph within the judgment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParagraphRole {
    /// Part of the majority (or sole) judgment
    #[default]
    Majority,
    /// Explicitly marked as obiter by the ingestion layer
    Obiter,
    /// Part of a dissenting or minority opinion
    Dissent,
}

/// Position of the deciding court in the hierarchy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CourtLevel {
    /// Apex or appellate court; its ratio binds lower courts
    Appellate,
    /// First-instance or unknown court
    FirstInstance,
}

impl CourtLevel {
    /// Classify a court from its code, full name or a neutral citation
    ///
    /// Unknown courts are treated as first instance.
    ///
    /// # Examples
    ///
    /// ```
    /// use lexlink_domain::CourtLevel;
    ///
    /// assert_eq!(CourtLevel::from_court("SGCA"), CourtLevel::Appellate);
    /// assert_eq!(CourtLevel::from_court("[2015] SGCA 33"), CourtLevel::Appellate);
    /// assert_eq!(CourtLevel::from_court("SGHC"), CourtLevel::FirstInstance);
    /// ```
    pub fn from_court(court: &str) -> Self {
        let upper = court.trim().to_uppercase();
        let by_code = upper
            .split(|c: char| c.is_whitespace() || c == ',' || c == '[' || c == ']')
            .any(|token| APPELLATE_CODES.contains(&token));
        if by_code || APPELLATE_NAMES.iter().any(|name| upper.contains(name)) {
            CourtLevel::Appellate
        } else {
            CourtLevel::FirstInstance
        }
    }

    /// Whether decisions of this court bind lower courts
    pub fn is_binding(&self) -> bool {
        matches!(self, CourtLevel::Appellate)
    }
}

/// Metadata describing the case a paragraph belongs to
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CaseMetadata {
    /// Court code or name (e.g. `SGCA`, `High Court`)
    pub court: String,

    /// Case name (e.g. `Lim v SPH`)
    #[serde(default)]
    pub case_name: Option<String>,

    /// Neutral citation (e.g. `[2015] SGCA 33`)
    #[serde(default)]
    pub citation: Option<String>,

    /// Decision date as supplied by the ingestion layer
    #[serde(default)]
    pub decision_date: Option<String>,

    /// Outcome of the case (e.g. `appeal allowed`)
    #[serde(default)]
    pub outcome: Option<String>,

    /// Role of this paragraph within the judgment
    #[serde(default)]
    pub role: ParagraphRole,
}

impl CaseMetadata {
    /// Create metadata for a court with every other field unset
    pub fn new(court: impl Into<String>) -> Self {
        Self {
            court: court.into(),
            ..Default::default()
        }
    }

    /// Set the paragraph role
    pub fn with_role(mut self, role: ParagraphRole) -> Self {
        self.role = role;
        self
    }

    /// Set the neutral citation
    pub fn with_citation(mut self, citation: impl Into<String>) -> Self {
        self.citation = Some(citation.into());
        self
    }

    /// Court level derived from the court field, falling back to the citation
    pub fn court_level(&self) -> CourtLevel {
        match CourtLevel::from_court(&self.court) {
            CourtLevel::Appellate => CourtLevel::Appellate,
            CourtLevel::FirstInstance => self
                .citation
                .as_deref()
                .map(CourtLevel::from_court)
                .unwrap_or(CourtLevel::FirstInstance),
        }
    }
}

/// Identifier of one paragraph: case id plus paragraph number
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ParagraphRef {
    /// Case identifier assigned by the ingestion layer
    pub case_id: String,
    /// Paragraph number within the judgment
    pub paragraph_number: u32,
}

impl ParagraphRef {
    /// Create a paragraph reference
    pub fn new(case_id: impl Into<String>, paragraph_number: u32) -> Self {
        Self {
            case_id: case_id.into(),
            paragraph_number,
        }
    }
}

impl fmt::Display for ParagraphRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.case_id, self.paragraph_number)
    }
}

/// One unit of extraction work
///
/// Immutable once created: fields are only reachable through accessors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaseParagraphInput {
    #[serde(flatten)]
    paragraph: ParagraphRef,
    text: String,
    #[serde(default)]
    metadata: CaseMetadata,
}

impl CaseParagraphInput {
    /// Create a paragraph input
    pub fn new(
        case_id: impl Into<String>,
        paragraph_number: u32,
        text: impl Into<String>,
        metadata: CaseMetadata,
    ) -> Self {
        Self {
            paragraph: ParagraphRef::new(case_id, paragraph_number),
            text: text.into(),
            metadata,
        }
    }

    /// Paragraph identifier
    pub fn paragraph(&self) -> &ParagraphRef {
        &self.paragraph
    }

    /// Case identifier
    pub fn case_id(&self) -> &str {
        &self.paragraph.case_id
    }

    /// Paragraph number
    pub fn paragraph_number(&self) -> u32 {
        self.paragraph.paragraph_number
    }

    /// Paragraph text
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Case metadata
    pub fn metadata(&self) -> &CaseMetadata {
        &self.metadata
    }
}

/// Lookup from paragraph reference to its source paragraph
#[derive(Debug, Default)]
pub struct ParagraphIndex<'a> {
    by_ref: HashMap<&'a ParagraphRef, &'a CaseParagraphInput>,
}

impl<'a> ParagraphIndex<'a> {
    /// Index a batch of paragraphs; later duplicates replace earlier ones
    pub fn new(paragraphs: &'a [CaseParagraphInput]) -> Self {
        let by_ref = paragraphs.iter().map(|p| (p.paragraph(), p)).collect();
        Self { by_ref }
    }

    /// Find the source paragraph for a reference
    pub fn get(&self, paragraph: &ParagraphRef) -> Option<&'a CaseParagraphInput> {
        self.by_ref.get(paragraph).copied()
    }

    /// Number of indexed paragraphs
    pub fn len(&self) -> usize {
        self.by_ref.len()
    }

    /// Whether the index is empty
    pub fn is_empty(&self) -> bool {
        self.by_ref.is_empty()
    }
}
