/// Heading-sequence validation.
///
/// A single linear pass over the document's lines. Lines carrying a dotted
/// numeral prefix ("1.", "1.2", "1.2.1 Scope") parse into a level vector;
/// only the immediately preceding vector is kept as state. Two transitions
/// are flagged:
///
/// - depth increasing by more than one ("1.1" followed by "1.1.1.1"),
///   since a skipped level is never valid;
/// - a sibling whose last component is not consecutive ("1.1" followed by
///   "1.3"), flagged with the expected heading as the suggestion.
///
/// Everything else (returning to a shallower level, starting a new branch)
/// resets context implicitly and is accepted.
use regex::Regex;
use std::sync::OnceLock;

use crate::models::{Issue, Severity};

fn heading_prefix_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(?:\d+\.)+\d*").expect("valid regex"))
}

/// Parse a line's dotted-numeral prefix into its level vector, or `None`
/// when the line is not a numbered heading. Components are kept as strings;
/// trailing empty components are discarded ("1." parses to ["1"]).
pub fn parse_heading_prefix(line: &str) -> Option<Vec<String>> {
    let m = heading_prefix_re().find(line.trim_start())?;
    let components: Vec<String> = m
        .as_str()
        .split('.')
        .filter(|c| !c.is_empty())
        .map(str::to_string)
        .collect();
    if components.is_empty() {
        None
    } else {
        Some(components)
    }
}

/// Validate the heading sequence of an ordered set of lines, returning one
/// issue per violation. Line numbers in the issues are 1-based.
pub fn validate_heading_sequence<'a, I>(lines: I) -> Vec<Issue>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut issues = Vec::new();
    let mut prev: Option<Vec<String>> = None;

    for (idx, line) in lines.into_iter().enumerate() {
        let text = line.trim();
        if text.is_empty() {
            continue;
        }
        let Some(current) = parse_heading_prefix(text) else {
            continue;
        };

        if let Some(prev) = &prev {
            if current.len() > prev.len() + 1 {
                issues.push(
                    Issue::new(
                        format!("Invalid heading sequence: skipped level {}", prev.len() + 1),
                        Severity::Warning,
                    )
                    .with_line_number(idx + 1)
                    .with_suggestion("Ensure heading levels are sequential")
                    .with_category("headings"),
                );
            } else if current.len() == prev.len()
                && current[..current.len() - 1] == prev[..prev.len() - 1]
            {
                // Sibling transition: last components must be consecutive.
                // Components that fail integer parsing are tolerated here.
                let last_pair = prev
                    .last()
                    .and_then(|p| p.parse::<u64>().ok())
                    .zip(current.last().and_then(|c| c.parse::<u64>().ok()));
                if let Some((prev_last, curr_last)) = last_pair {
                    if curr_last != prev_last + 1 {
                        let mut expected: Vec<String> =
                            current[..current.len() - 1].to_vec();
                        expected.push((prev_last + 1).to_string());
                        issues.push(
                            Issue::new(
                                format!(
                                    "Invalid heading sequence: expected {}",
                                    prev_last + 1
                                ),
                                Severity::Warning,
                            )
                            .with_line_number(idx + 1)
                            .with_suggestion(format!("Use {}", expected.join(".")))
                            .with_category("headings"),
                        );
                    }
                }
            }
            // Level decreases and new branches reset context implicitly.
        }

        prev = Some(current);
    }

    issues
}
