//! JSON output formatter for machine processing

use crate::output::OutputFormatter;
use crate::update::{PlannedUpdate, UpdatePlan};
use serde::Serialize;
use std::io::Write;

/// JSON formatter for machine-readable output
#[derive(Debug, Default)]
pub struct JsonFormatter;

impl JsonFormatter {
    /// Create a new JSON formatter
    pub fn new() -> Self {
        Self
    }
}

/// JSON representation of a dry-run plan
#[derive(Serialize)]
struct JsonPlan<'a> {
    dry_run: bool,
    count: usize,
    updates: Vec<JsonUpdate<'a>>,
}

/// JSON representation of one planned update
#[derive(Serialize)]
struct JsonUpdate<'a> {
    /// Group label (`main` or the extra/group name)
    group: &'a str,
    /// Package name as written in the manifest
    package: &'a str,
    /// Name with extras and marker
    display: String,
    from: &'a str,
    to: &'a str,
    /// Specifier that would be passed to `uv add`
    spec: String,
}

impl<'a> From<&'a PlannedUpdate> for JsonUpdate<'a> {
    fn from(entry: &'a PlannedUpdate) -> Self {
        Self {
            group: entry.site.label(),
            package: &entry.requirement.name,
            display: entry.requirement.display_name(),
            from: entry.current(),
            to: &entry.latest,
            spec: entry.spec(),
        }
    }
}

impl OutputFormatter for JsonFormatter {
    fn format_plan(&self, plan: &UpdatePlan, writer: &mut dyn Write) -> std::io::Result<()> {
        let output = JsonPlan {
            dry_run: true,
            count: plan.len(),
            updates: plan.entries().iter().map(JsonUpdate::from).collect(),
        };
        let json = serde_json::to_string_pretty(&output)?;
        writeln!(writer, "{}", json)
    }
}
