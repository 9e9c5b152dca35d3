//! Output formatting for CLI results

use std::io::Write;

use clap::ValueEnum;
use serde::Serialize;

use itreality_core::domain::{Report, SignalBundle};

#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable text (default)
    #[default]
    Pretty,
    /// JSON for machine processing
    Json,
}

/// Writes command results to stdout in the selected format
pub struct OutputWriter {
    format: OutputFormat,
}

impl OutputWriter {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    pub fn format(&self) -> OutputFormat {
        self.format
    }

    pub fn json<T: Serialize>(&self, value: &T) -> anyhow::Result<()> {
        let mut stdout = std::io::stdout().lock();
        serde_json::to_writer_pretty(&mut stdout, value)?;
        writeln!(stdout)?;
        Ok(())
    }

    pub fn header(&self, title: &str) {
        println!("\n{title}");
        println!("{}", "=".repeat(title.len()));
    }

    pub fn line(&self, text: impl AsRef<str>) {
        println!("{}", text.as_ref());
    }

    pub fn error(&self, text: impl AsRef<str>) {
        eprintln!("error: {}", text.as_ref());
    }

    /// One line per signal category with its confidence and any error
    pub fn signals(&self, bundle: &SignalBundle) {
        self.header(&format!("Signals for {}", bundle.domain()));
        for (category, block) in bundle.blocks() {
            match &block.error {
                Some(error) => self.line(format!(
                    "  {:<12} {:<6} failed: {error}",
                    category.as_str(),
                    block.confidence.to_string()
                )),
                None => self.line(format!("  {:<12} {}", category.as_str(), block.confidence)),
            }
        }
        self.line(format!(
            "  collected in {} ms at {}",
            bundle.collection_duration_ms(),
            bundle.collected_at().to_rfc3339()
        ));
    }

    pub fn report(&self, report: &Report) {
        self.header(&format!("IT reality report for {}", report.domain));
        self.line(&report.owner_summary);

        if !report.top_findings.is_empty() {
            self.header("Top findings");
            for (rank, finding) in report.top_findings.iter().enumerate() {
                self.line(format!(
                    "{}. [{}] {} ({} confidence)",
                    rank + 1,
                    finding.severity,
                    finding.title,
                    finding.confidence
                ));
                self.line(format!("   {}", finding.description));
            }
        }

        self.header("By category");
        for narrative in &report.block_narratives {
            self.line(format!("{} ({})", narrative.category.label(), narrative.confidence));
            self.line(format!("   {}", narrative.explanation));
            self.line(format!("   {}", narrative.why_it_matters));
            if let Some(note) = &narrative.confidence_note {
                self.line(format!("   {note}"));
            }
        }

        for (title, items) in [
            ("Assumptions", &report.assumptions),
            ("Questions for your IT provider", &report.questions),
        ] {
            if !items.is_empty() {
                self.header(title);
                for item in items {
                    self.line(format!("  - {item}"));
                }
            }
        }

        if let Some(url) = &report.context_url {
            self.line(format!("\nFull report: {url}"));
        }
    }
}
