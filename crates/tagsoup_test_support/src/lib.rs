//! Helpers shared by the tagsoup integration tests.

pub mod canonical_fixtures;

use std::fmt::Write;

/// Escapes a line for assertion output.
///
/// Uses the canonical writer's escapes for `\\`, `\n`, `\t` and `\r`;
/// any other control character prints as `\u{XXXX}`.
pub fn escape_text(text: &str) -> String {
    text.chars().fold(String::with_capacity(text.len()), |mut out, ch| {
        match ch {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            ch if ch.is_control() => {
                let _ = write!(out, "\\u{{{:04X}}}", u32::from(ch));
            }
            ch => out.push(ch),
        }
        out
    })
}

/// Describes the first mismatch between two line sequences, with context.
pub fn diff_lines(expected: &[String], actual: &[String]) -> String {
    fn line(lines: &[String], i: usize) -> &str {
        lines.get(i).map_or("<missing>", String::as_str)
    }

    let max = expected.len().max(actual.len());
    let mismatch = (0..max).find(|&i| line(expected, i) != line(actual, i));

    let mut out = String::new();
    if let Some(i) = mismatch {
        let start = i.saturating_sub(2);
        let end = (i + 3).min(max);
        let _ = writeln!(
            &mut out,
            "first mismatch at line {} (showing {}..={}):",
            i + 1,
            start + 1,
            end
        );
        for line_idx in start..end {
            let marker = if line_idx == i { ">" } else { " " };
            let _ = writeln!(
                &mut out,
                "{marker} {:>4}  expected: {}",
                line_idx + 1,
                escape_text(line(expected, line_idx))
            );
            let _ = writeln!(
                &mut out,
                "{marker} {:>4}    actual: {}",
                line_idx + 1,
                escape_text(line(actual, line_idx))
            );
        }
    }
    let _ = writeln!(
        &mut out,
        "expected {} lines, actual {} lines",
        expected.len(),
        actual.len()
    );
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(text: &str) -> Vec<String> {
        text.lines().map(str::to_string).collect()
    }

    #[test]
    fn escape_text_matches_canonical_escapes() {
        assert_eq!(escape_text("\"a\\b\n\u{1}\u{7F}"), "\"a\\\\b\\n\\u{0001}\\u{007F}");
    }

    #[test]
    fn diff_points_at_first_mismatch() {
        let diff = diff_lines(&lines("(p\n\"a\n)p"), &lines("(p\n\"b\n)p"));
        assert!(diff.starts_with("first mismatch at line 2"));
        assert!(diff.contains(">    2  expected: \"a"));
    }

    #[test]
    fn diff_reports_length_only_differences() {
        let diff = diff_lines(&lines("a"), &lines("a\nb"));
        assert!(diff.contains("first mismatch at line 2"));
        assert!(diff.contains("<missing>"));
        assert!(diff.ends_with("expected 1 lines, actual 2 lines\n"));
    }
}
