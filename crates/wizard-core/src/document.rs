//! Combined markdown document for a session.

use chrono::{DateTime, SecondsFormat, Utc};

use crate::session::Session;
use crate::steps;

pub const COMBINED_FILE_NAME: &str = "COMPLETE-DOCUMENTATION.md";

const TITLE: &str = "# Software Development Lifecycle Documentation";
const SEPARATOR: &str = "\n\n---\n\n";

/// Render every documented step that has output, in registry order.
///
/// Steps flagged out of the document (the requirements review) are skipped
/// even when they have output.
pub fn render(session: &Session, generated: DateTime<Utc>) -> String {
    let mut sections = vec![format!(
        "{TITLE}\n\nGenerated: {}\n\n## System Description\n\n{}",
        generated.to_rfc3339_opts(SecondsFormat::Secs, true),
        session.description.trim()
    )];

    for def in steps::registry().iter().filter(|d| d.in_document) {
        if let Some(text) = session.output(def.output_key) {
            sections.push(format!("## {}\n\n{}", def.name, text.trim_end()));
        }
    }

    let mut doc = sections.join(SEPARATOR);
    doc.push('\n');
    doc
}
