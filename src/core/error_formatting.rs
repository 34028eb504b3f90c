//! Source excerpt rendering for AWF errors
//!
//! Parsing and validation errors point at a line and column in the original
//! document. This module renders the few lines around that position with a
//! line-number gutter and a caret under the offending column.

/// Number of lines shown before and after the error line.
const CONTEXT_RADIUS: usize = 1;

/// Render up to three lines of `source` around `line` with a caret at `column`.
///
/// `line` and `column` are 1-based. Out-of-range positions are clamped so the
/// function never panics; an empty source renders an empty string.
///
/// # Examples
///
/// ```rust
/// use awf_cli::core::render_source_excerpt;
///
/// let excerpt = render_source_excerpt("a: 1\nb: [\nc: 3\n", 2, 4);
/// assert!(excerpt.contains("2 | b: ["));
/// assert!(excerpt.contains("  |    ^"));
/// ```
pub fn render_source_excerpt(source: &str, line: usize, column: usize) -> String {
    let lines: Vec<&str> = source.lines().collect();
    if lines.is_empty() {
        return String::new();
    }

    let target = line.clamp(1, lines.len());
    let first = target.saturating_sub(CONTEXT_RADIUS).max(1);
    let last = (target + CONTEXT_RADIUS).min(lines.len());
    let gutter = last.to_string().len();

    let mut out = String::new();
    for number in first..=last {
        let text = lines[number - 1];
        out.push_str(&format!("{number:>gutter$} | {text}\n"));
        if number == target {
            let caret_offset = column.saturating_sub(1).min(text.chars().count());
            out.push_str(&format!("{:>gutter$} | {}^\n", "", " ".repeat(caret_offset)));
        }
    }

    // Drop the final newline so callers can embed the excerpt freely
    out.pop();
    out
}
