//! Cleanup of raw model text before it is shown or stored.
//!
//! [`sanitize`] is total and idempotent: `sanitize(sanitize(s)) == sanitize(s)`.

use std::sync::LazyLock;

use regex::Regex;

/// Glyph that replaces `-` and `*` list markers.
pub const BULLET: char = '•';

static HEADING_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*(?:#+\s*)+").expect("valid heading regex"));

static RULE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*-{3,}\s*$").expect("valid rule regex"));

static ORDERED_SPACED_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\s*)(\d+)\.[ \t]+").expect("valid ordered regex"));

// A digit right after the dot is a decimal, not a list marker.
static ORDERED_TIGHT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\s*)(\d+)\.([^\d\s.])").expect("valid ordered regex"));

static BULLET_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\s*)[-*][ \t]+").expect("valid bullet regex"));

/// Clean raw model output.
///
/// Line by line, in order:
/// 1. strip leading markdown heading markers
/// 2. drop horizontal rules (a line of three or more `-`)
/// 3. normalize ordered-list markers to `N. `
/// 4. turn `-`/`*` list markers into [`BULLET`]
///
/// and finally trim the whole text.
pub fn sanitize(raw: &str) -> String {
    let lines: Vec<String> = raw.lines().filter_map(sanitize_line).collect();
    lines.join("\n").trim().to_string()
}

/// Apply the line rules to a single line. `None` means the line is dropped.
pub fn sanitize_line(line: &str) -> Option<String> {
    let line = HEADING_RE.replace(line, "");

    if RULE_RE.is_match(&line) {
        return None;
    }

    let line = ORDERED_SPACED_RE.replace(&line, "${1}${2}. ");
    let line = ORDERED_TIGHT_RE.replace(&line, "${1}${2}. ${3}");
    let bullet = format!("${{1}}{} ", BULLET);
    let line = BULLET_RE.replace(&line, bullet.as_str());

    Some(line.into_owned())
}
