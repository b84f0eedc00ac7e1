//! Text output formatter for human-readable display
//!
//! Renders the dry-run table:
//!
//! ```text
//! GROUP        PACKAGE                                FROM               TO
//! --------------------------------------------------------------------------------------
//! main         requests                               2.28.0             2.28.1
//! ```

use crate::output::OutputFormatter;
use crate::update::{PlannedUpdate, UpdatePlan};
use colored::Colorize;
use std::io::Write;

const GROUP_WIDTH: usize = 12;
const PACKAGE_WIDTH: usize = 38;
const FROM_WIDTH: usize = 18;
const RULE_WIDTH: usize = 86;

/// Kind of version jump, used to color the target column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VersionChangeType {
    /// First release segment changed
    Major,
    /// Second release segment changed
    Minor,
    /// Anything smaller
    Patch,
    /// Unparseable
    Unknown,
}

impl VersionChangeType {
    /// Classify the change between two versions
    pub fn from_versions(old: &str, new: &str) -> Self {
        let parse = |v: &str| -> Option<(u64, u64)> {
            let mut parts = v.strip_prefix('v').unwrap_or(v).split(['.', '-']);
            let major = parts.next()?.parse().ok()?;
            let minor = parts.next().and_then(|p| p.parse().ok()).unwrap_or(0);
            Some((major, minor))
        };

        match (parse(old), parse(new)) {
            (Some((old_major, _)), Some((new_major, _))) if old_major != new_major => {
                VersionChangeType::Major
            }
            (Some((_, old_minor)), Some((_, new_minor))) if old_minor != new_minor => {
                VersionChangeType::Minor
            }
            (Some(_), Some(_)) => VersionChangeType::Patch,
            _ => VersionChangeType::Unknown,
        }
    }

    fn paint(&self, text: &str) -> String {
        match self {
            VersionChangeType::Major => text.red().bold().to_string(),
            VersionChangeType::Minor => text.yellow().to_string(),
            VersionChangeType::Patch => text.green().to_string(),
            VersionChangeType::Unknown => text.to_string(),
        }
    }
}

/// Text formatter for human-readable output
pub struct TextFormatter {
    /// Whether to use colors
    color: bool,
}

impl TextFormatter {
    /// Create a new text formatter with color option
    pub fn with_color(color: bool) -> Self {
        Self { color }
    }

    fn write_row(&self, entry: &PlannedUpdate, writer: &mut dyn Write) -> std::io::Result<()> {
        let group = format!("{:<width$}", entry.site.label(), width = GROUP_WIDTH);
        let package = format!(
            "{:<width$}",
            entry.requirement.display_name(),
            width = PACKAGE_WIDTH
        );
        let from = format!("{:<width$}", entry.current(), width = FROM_WIDTH);

        if self.color {
            let change = VersionChangeType::from_versions(entry.current(), &entry.latest);
            writeln!(
                writer,
                "{} {} {} {}",
                group.dimmed(),
                package,
                from.dimmed(),
                change.paint(&entry.latest)
            )
        } else {
            writeln!(writer, "{} {} {} {}", group, package, from, entry.latest)
        }
    }
}

impl Default for TextFormatter {
    fn default() -> Self {
        Self::with_color(true)
    }
}

impl OutputFormatter for TextFormatter {
    fn format_plan(&self, plan: &UpdatePlan, writer: &mut dyn Write) -> std::io::Result<()> {
        if plan.is_empty() {
            writeln!(
                writer,
                "Dry run: all pinned dependencies are already at their latest versions."
            )?;
            return Ok(());
        }

        writeln!(writer, "\nDry run: would update these direct dependencies:\n")?;
        let header = format!(
            "{:<gw$} {:<pw$} {:<fw$} TO",
            "GROUP",
            "PACKAGE",
            "FROM",
            gw = GROUP_WIDTH,
            pw = PACKAGE_WIDTH,
            fw = FROM_WIDTH
        );
        if self.color {
            writeln!(writer, "{}", header.bold())?;
        } else {
            writeln!(writer, "{}", header)?;
        }
        writeln!(writer, "{}", "-".repeat(RULE_WIDTH))?;

        for entry in plan.entries() {
            self.write_row(entry, writer)?;
        }

        writeln!(writer, "\n(No files changed.)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{parse_requirement, DeclarationSite, DependencyGroup, ParsedRequirement};
    use crate::update::plan_updates;
    use std::collections::HashMap;

    fn plan(lines: &[(DeclarationSite, &str)], latest: &[(&str, &str)]) -> UpdatePlan {
        let groups: Vec<DependencyGroup> = lines
            .iter()
            .map(|(site, line)| {
                let Some(ParsedRequirement::Requirement(req)) = parse_requirement(line) else {
                    panic!("bad fixture {line}");
                };
                DependencyGroup::new(site.clone(), vec![req])
            })
            .collect();
        let latest: HashMap<String, String> = latest
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        plan_updates(&groups, &latest)
    }

    fn render(plan: &UpdatePlan) -> String {
        let mut buf = Vec::new();
        TextFormatter::with_color(false)
            .format_plan(plan, &mut buf)
            .unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn test_single_row_table() {
        let plan = plan(&[(DeclarationSite::Main, "requests==2.28.0")], &[("requests", "2.28.1")]);
        let output = render(&plan);

        let rows: Vec<&str> = output
            .lines()
            .filter(|l| l.starts_with("main"))
            .collect();
        assert_eq!(rows.len(), 1);
        let cells: Vec<&str> = rows[0].split_whitespace().collect();
        assert_eq!(cells, vec!["main", "requests", "2.28.0", "2.28.1"]);
        assert!(output.contains(&"-".repeat(86)));
        assert!(output.trim_end().ends_with("(No files changed.)"));
    }

    #[test]
    fn test_column_widths() {
        let plan = plan(&[(DeclarationSite::Main, "requests==2.28.0")], &[("requests", "2.28.1")]);
        let output = render(&plan);
        let header = output.lines().find(|l| l.starts_with("GROUP")).unwrap();
        assert_eq!(header.find("PACKAGE"), Some(13));
        assert_eq!(header.find("FROM"), Some(52));
        assert_eq!(header.find("TO"), Some(71));
    }

    #[test]
    fn test_row_shows_extras_and_marker() {
        let plan = plan(
            &[(
                DeclarationSite::Optional("dev".into()),
                "uvicorn[standard]==0.23.2; python_version >= \"3.9\"",
            )],
            &[("uvicorn", "0.30.0")],
        );
        let output = render(&plan);
        assert!(output.contains("dev          uvicorn[standard]; python_version >= \"3.9\""));
    }

    #[test]
    fn test_empty_plan_message() {
        let output = render(&UpdatePlan::default());
        assert_eq!(
            output,
            "Dry run: all pinned dependencies are already at their latest versions.\n"
        );
    }

    #[test]
    fn test_version_change_type() {
        assert_eq!(VersionChangeType::from_versions("1.2.3", "2.0.0"), VersionChangeType::Major);
        assert_eq!(VersionChangeType::from_versions("1.2.3", "1.3.0"), VersionChangeType::Minor);
        assert_eq!(VersionChangeType::from_versions("1.2.3", "1.2.4"), VersionChangeType::Patch);
        assert_eq!(VersionChangeType::from_versions("abc", "1.0"), VersionChangeType::Unknown);
    }
}
