//! Output formatting for the CLI.

use crate::cli::CliFormat;
use crate::error::Result;
use colored::*;
use lexlink_domain::ExtractedLink;
use lexlink_pipeline::{ExportReport, ExportStatus};
use tabled::{
    builder::Builder,
    settings::{object::Rows, Alignment, Modify, Style},
};

/// Holdings longer than this are cut in table output
const HOLDING_PREVIEW_CHARS: usize = 60;

/// Output formatter.
pub struct Formatter {
    format: CliFormat,
    color_enabled: bool,
}

impl Formatter {
    /// Create a new formatter.
    pub fn new(format: CliFormat, color_enabled: bool) -> Self {
        Self {
            format,
            color_enabled,
        }
    }

    /// Format accepted links.
    pub fn format_links(&self, links: &[ExtractedLink]) -> Result<String> {
        match self.format {
            CliFormat::Json => Ok(serde_json::to_string_pretty(links)?),
            CliFormat::Table => Ok(self.format_links_table(links)),
            CliFormat::Quiet => Ok(links
                .iter()
                .map(|l| format!("{}\t{}", l.statute_id(), l.paragraph()))
                .collect::<Vec<_>>()
                .join("\n")),
        }
    }

    fn format_links_table(&self, links: &[ExtractedLink]) -> String {
        if links.is_empty() {
            return self.colorize("No links accepted.", "yellow");
        }

        let mut builder = Builder::default();
        builder.push_record([
            "Statute", "Paragraph", "Type", "Authority", "Confidence", "Boost", "Method", "Holding",
        ]);
        for link in links {
            builder.push_record([
                link.statute_id().to_string(),
                link.paragraph().to_string(),
                link.interpretation_type().to_string(),
                link.authority().to_string(),
                format!("{:.2}", link.confidence()),
                format!("{:.2}", link.boost_factor()),
                link.method().to_string(),
                link.holding().map(preview).unwrap_or_default(),
            ]);
        }

        let mut table = builder.build();
        table
            .with(Style::rounded())
            .with(Modify::new(Rows::first()).with(Alignment::center()));
        table.to_string()
    }

    /// One line per artifact.
    pub fn format_exports(&self, exports: &ExportReport) -> String {
        [
            ("Links", &exports.links),
            ("Failed review", &exports.failed_review),
            ("Statistics", &exports.statistics),
        ]
        .into_iter()
        .map(|(label, status)| match status {
            ExportStatus::Written { path, records } => self.success(&format!(
                "{}: {} ({} record(s))",
                label,
                path.display(),
                records
            )),
            ExportStatus::Failed { path, error } => {
                self.error(&format!("{}: {} not written: {}", label, path.display(), error))
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
    }

    /// Format a success message.
    pub fn success(&self, message: &str) -> String {
        self.colorize(&format!("✓ {}", message), "green")
    }

    /// Format an error message.
    pub fn error(&self, message: &str) -> String {
        self.colorize(&format!("✗ {}", message), "red")
    }

    /// Format an info message.
    pub fn info(&self, message: &str) -> String {
        self.colorize(&format!("ℹ {}", message), "blue")
    }

    /// Format a warning message.
    pub fn warning(&self, message: &str) -> String {
        self.colorize(&format!("⚠ {}", message), "yellow")
    }

    /// Colorize text if color is enabled.
    fn colorize(&self, text: &str, color: &str) -> String {
        if !self.color_enabled {
            return text.to_string();
        }

        match color {
            "red" => text.red().to_string(),
            "green" => text.green().to_string(),
            "blue" => text.blue().to_string(),
            "yellow" => text.yellow().to_string(),
            _ => text.to_string(),
        }
    }
}

fn preview(text: &str) -> String {
    match text.char_indices().nth(HOLDING_PREVIEW_CHARS) {
        Some((idx, _)) => format!("{}…", &text[..idx]),
        None => text.to_string(),
    }
}
