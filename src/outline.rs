//! Turns a raw outline completion into a title and ordered unit descriptors.
//!
//! The outline prompt asks for monthly topics broken into weekly subtopics,
//! so a line starting with `Month` opens a unit and `Week` lines (plus any
//! other body text) become that unit's description. Parsing never fails: text
//! without the expected structure yields a fallback title and no units.

use std::sync::LazyLock;

use regex::Regex;

use crate::sanitize::{sanitize, sanitize_line};

/// Title used when the outline has no usable lines at all.
pub const DEFAULT_TITLE: &str = "Course Outline";

/// Unit name used when weekly content shows up before any monthly heading.
pub const DEFAULT_UNIT_NAME: &str = "Introduction";

/// Marker that opens a unit.
pub const UNIT_MARKER: &str = "Month";

/// Marker for lines that belong to the current unit.
pub const SECTION_MARKER: &str = "Week";

/// Openers the model uses for chatter around the outline itself.
const PREAMBLE_PREFIXES: &[&str] = &["Here's", "Here is", "The course", "Sure", "Certainly"];

static LABEL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z][A-Za-z0-9 ()/&'-]{0,60}:\s*\S").expect("valid label regex")
});

/// A unit as described by the outline, before content generation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitDescriptor {
    pub name: String,
    pub description: String,
}

/// Result of parsing an outline completion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedOutline {
    pub title: String,
    pub units: Vec<UnitDescriptor>,
}

impl ParsedOutline {
    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }
}

/// Parse raw outline text. Never fails.
pub fn parse_outline(raw: &str) -> ParsedOutline {
    let lines: Vec<String> = raw.lines().map(normalize_line).collect();

    let title = select_title(&lines);

    let mut units = Vec::new();
    let mut current: Option<(String, Vec<String>)> = None;

    for line in lines.iter().filter(|l| !l.is_empty()) {
        if starts_with_marker(line, UNIT_MARKER) {
            if let Some((name, description)) = current.take() {
                units.push(finish_unit(name, description));
            }
            current = Some((line.clone(), Vec::new()));
        } else if starts_with_marker(line, SECTION_MARKER) {
            current
                .get_or_insert_with(|| (DEFAULT_UNIT_NAME.to_string(), Vec::new()))
                .1
                .push(line.clone());
        } else if is_preamble(line) {
            continue;
        } else if let Some((_, description)) = current.as_mut() {
            description.push(line.clone());
        }
    }

    // A trailing heading with no body is dropped.
    if let Some((name, description)) = current {
        if !description.is_empty() {
            units.push(finish_unit(name, description));
        }
    }

    tracing::debug!(title = %title, units = units.len(), "Parsed outline");

    ParsedOutline { title, units }
}

fn finish_unit(name: String, description: Vec<String>) -> UnitDescriptor {
    UnitDescriptor {
        name: sanitize(&name),
        description: sanitize(&description.join("\n")),
    }
}

/// Title: the first unit heading, else the first `label: text` line, else the
/// first non-blank line, else [`DEFAULT_TITLE`].
fn select_title(lines: &[String]) -> String {
    let non_blank = || lines.iter().filter(|l| !l.is_empty());

    non_blank()
        .find(|l| starts_with_marker(l, UNIT_MARKER))
        .or_else(|| non_blank().find(|l| LABEL_RE.is_match(l)))
        .or_else(|| non_blank().next())
        .map(|l| sanitize(l))
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| DEFAULT_TITLE.to_string())
}

/// Strip list/heading markup and bold emphasis so markers can be matched
/// regardless of how the model decorated the line.
fn normalize_line(line: &str) -> String {
    let cleaned = sanitize_line(line).unwrap_or_default();
    let cleaned = cleaned.trim();
    let cleaned = cleaned
        .strip_prefix(crate::sanitize::BULLET)
        .unwrap_or(cleaned);
    cleaned.replace("**", "").trim().to_string()
}

/// `line` starts with `marker` as a whole word, e.g. `Month 1` but not `Monthly`.
fn starts_with_marker(line: &str, marker: &str) -> bool {
    match line.strip_prefix(marker) {
        Some(rest) => !rest.starts_with(|c: char| c.is_alphabetic()),
        None => false,
    }
}

fn is_preamble(line: &str) -> bool {
    PREAMBLE_PREFIXES.iter().any(|p| line.starts_with(p))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_units_on_month_headings() {
        let parsed = parse_outline(
            "Month 1: Basics\nWeek 1 content\nWeek 2 content\nMonth 2: Advanced\nmore text",
        );

        assert_eq!(parsed.units.len(), 2);
        assert_eq!(parsed.units[0].name, "Month 1: Basics");
        assert_eq!(parsed.units[1].name, "Month 2: Advanced");
        assert!(parsed.units[0].description.contains("Week 1 content"));
        assert!(parsed.units[0].description.contains("Week 2 content"));
        assert_eq!(parsed.units[1].description, "more text");
    }

    #[test]
    fn empty_input_falls_back_to_default_title() {
        for raw in ["", "   ", "\n\t\n  \n"] {
            let parsed = parse_outline(raw);
            assert_eq!(parsed.title, DEFAULT_TITLE);
            assert!(parsed.is_empty());
        }
    }

    #[test]
    fn title_prefers_first_month_line() {
        let parsed = parse_outline("Course: Rust\nMonth 1: Ownership\nWeek 1: Moves");
        assert_eq!(parsed.title, "Month 1: Ownership");
    }

    #[test]
    fn title_falls_back_to_label_line() {
        let parsed = parse_outline("Welcome!\nCourse Title: Intro to Rust\nsome text");
        assert_eq!(parsed.title, "Course Title: Intro to Rust");
        assert!(parsed.is_empty());
    }

    #[test]
    fn title_falls_back_to_first_non_blank_line() {
        let parsed = parse_outline("\n\nJust a sentence\nanother one");
        assert_eq!(parsed.title, "Just a sentence");
    }

    #[test]
    fn week_before_month_opens_default_unit() {
        let parsed = parse_outline("Week 1: Setup\nInstall tools\nMonth 1: Basics\nWeek 2: Syntax");
        assert_eq!(parsed.units.len(), 2);
        assert_eq!(parsed.units[0].name, DEFAULT_UNIT_NAME);
        assert_eq!(parsed.units[0].description, "Week 1: Setup\nInstall tools");
        assert_eq!(parsed.units[1].name, "Month 1: Basics");
    }

    #[test]
    fn skips_preamble_lines() {
        let parsed = parse_outline(
            "Here's a detailed outline for your course:\nMonth 1: Basics\nThe course will cover a lot.\nWeek 1: Intro",
        );
        assert_eq!(parsed.units.len(), 1);
        assert_eq!(parsed.units[0].description, "Week 1: Intro");
    }

    #[test]
    fn drops_trailing_unit_without_description() {
        let parsed = parse_outline("Month 1: Basics\nWeek 1: Intro\nMonth 2: Review");
        assert_eq!(parsed.units.len(), 1);
        assert_eq!(parsed.units[0].name, "Month 1: Basics");
    }

    #[test]
    fn keeps_intermediate_unit_without_description() {
        let parsed = parse_outline("Month 1: Basics\nMonth 2: Review\nWeek 5: Recap");
        assert_eq!(parsed.units.len(), 2);
        assert_eq!(parsed.units[0].description, "");
        assert_eq!(parsed.units[1].description, "Week 5: Recap");
    }

    #[test]
    fn recognizes_decorated_headings() {
        let parsed = parse_outline(
            "### **Month 1: Foundations**\n- **Week 1:** Variables\n- Week 2: Loops\n---\n## Month 2: Functions\n* Week 3: Closures",
        );
        assert_eq!(parsed.units.len(), 2);
        assert_eq!(parsed.units[0].name, "Month 1: Foundations");
        assert_eq!(
            parsed.units[0].description,
            "Week 1: Variables\nWeek 2: Loops"
        );
        assert_eq!(parsed.units[1].name, "Month 2: Functions");
        assert_eq!(parsed.units[1].description, "Week 3: Closures");
    }

    #[test]
    fn monthly_is_not_a_unit_marker() {
        let parsed = parse_outline("Month 1: Basics\nMonthly quiz every Friday");
        assert_eq!(parsed.units.len(), 1);
        assert_eq!(parsed.units[0].description, "Monthly quiz every Friday");
    }

    #[test]
    fn body_text_before_first_unit_is_ignored() {
        let parsed = parse_outline("Overview of topics\nMonth 1: Basics\nWeek 1: Intro");
        assert_eq!(parsed.units.len(), 1);
        assert!(!parsed.units[0].description.contains("Overview"));
    }
}
