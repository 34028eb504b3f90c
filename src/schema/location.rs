//! Mapping JSON instance paths back onto frontmatter source lines.
//!
//! The walk is indentation based: each key segment is looked up among the
//! lines nested deeper than the previous match, and numeric segments select
//! the n-th list item of the current block. When a segment cannot be found
//! (flow-style YAML, anchors) the deepest match so far is used.

/// A matched line: index into the raw lines and the column of its key.
#[derive(Debug, Clone, Copy)]
struct Anchor {
    index: usize,
    indent: usize,
}

fn indent_of(line: &str) -> usize {
    line.len() - line.trim_start().len()
}

fn is_content(line: &str) -> bool {
    let trimmed = line.trim_start();
    !trimmed.is_empty() && !trimmed.starts_with('#')
}

/// End (exclusive) of the block owned by the line at `anchor`.
fn block_end(lines: &[&str], anchor: Anchor) -> usize {
    lines
        .iter()
        .enumerate()
        .skip(anchor.index + 1)
        .find(|(_, line)| is_content(line) && indent_of(line) <= anchor.indent)
        .map_or(lines.len(), |(i, _)| i)
}

fn key_matches(text: &str, key: &str) -> bool {
    [format!("{key}:"), format!("\"{key}\":"), format!("'{key}':")]
        .iter()
        .any(|prefix| text.starts_with(prefix.as_str()))
}

/// Find `key` in `lines[start..end]` at an indentation deeper than `parent`.
fn find_key(
    lines: &[&str],
    start: usize,
    end: usize,
    parent: Option<usize>,
    key: &str,
) -> Option<Anchor> {
    for (index, line) in lines.iter().enumerate().take(end).skip(start) {
        if !is_content(line) {
            continue;
        }
        let mut text = line.trim_start();
        let mut column = indent_of(line);
        // Keys of a mapping that is itself a list item: `- key: value`
        if let Some(rest) = text.strip_prefix("- ") {
            column += 2 + (rest.len() - rest.trim_start().len());
            text = rest.trim_start();
        }
        if parent.is_some_and(|p| column <= p) {
            continue;
        }
        if key_matches(text, key) {
            return Some(Anchor {
                index,
                indent: column,
            });
        }
    }
    None
}

/// Find the `n`-th list item in `lines[start..end]`.
fn find_item(lines: &[&str], start: usize, end: usize, n: usize) -> Option<Anchor> {
    let items: Vec<(usize, usize)> = lines
        .iter()
        .enumerate()
        .take(end)
        .skip(start)
        .filter(|(_, line)| {
            let trimmed = line.trim_start();
            trimmed == "-" || trimmed.starts_with("- ")
        })
        .map(|(i, line)| (i, indent_of(line)))
        .collect();
    let item_indent = items.iter().map(|(_, indent)| *indent).min()?;
    let (index, indent) = items.into_iter().filter(|(_, i)| *i == item_indent).nth(n)?;
    // Keys inside the item sit after the dash, deeper than the dash column
    Some(Anchor {
        index,
        indent,
    })
}

/// Locate the instance path `segments` inside raw frontmatter text.
///
/// Returns 1-based `(line, column)` in the original document given the
/// 1-based `line_offset` of the first frontmatter line.
pub fn locate(raw: &str, line_offset: usize, segments: &[String]) -> (usize, usize) {
    let lines: Vec<&str> = raw.lines().collect();
    let line_offset = line_offset.max(1);
    let mut start = 0;
    let mut end = lines.len();
    let mut parent: Option<usize> = None;
    let mut found: Option<Anchor> = None;

    for segment in segments {
        let anchor = match segment.parse::<usize>() {
            Ok(n) if found.is_some() => find_item(&lines, start, end, n),
            _ => find_key(&lines, start, end, parent, segment),
        };
        let Some(anchor) = anchor else {
            break;
        };
        found = Some(anchor);
        start = anchor.index;
        end = block_end(&lines, anchor);
        parent = Some(anchor.indent);
        // A list item line may itself carry the first key of the item
        if segment.parse::<usize>().is_err() {
            start = anchor.index + 1;
        }
    }

    match found {
        Some(anchor) => (line_offset + anchor.index, anchor.indent + 1),
        None => (line_offset, 1),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn segs(path: &[&str]) -> Vec<String> {
        path.iter().map(|s| s.to_string()).collect()
    }

    const RAW: &str = "on:\n  issues:\n    types: [opened]\n# comment\ntools:\n  github:\n    toolsets: [issues]\nsteps:\n  - name: first\n    run: echo 1\n  - name: second\n    uses: actions/checkout@v4\n";

    #[test]
    fn test_locates_nested_keys() {
        assert_eq!(locate(RAW, 2, &segs(&["tools"])), (6, 1));
        assert_eq!(locate(RAW, 2, &segs(&["tools", "github", "toolsets"])), (8, 5));
        assert_eq!(locate(RAW, 2, &segs(&["on", "issues", "types"])), (4, 5));
    }

    #[test]
    fn test_locates_list_items() {
        assert_eq!(locate(RAW, 2, &segs(&["steps", "1"])), (12, 3));
        assert_eq!(locate(RAW, 2, &segs(&["steps", "1", "uses"])), (13, 5));
        assert_eq!(locate(RAW, 2, &segs(&["steps", "0", "name"])), (10, 5));
    }

    #[test]
    fn test_falls_back_to_deepest_match() {
        assert_eq!(locate(RAW, 2, &segs(&["tools", "missing"])), (6, 1));
        assert_eq!(locate(RAW, 2, &segs(&[])), (2, 1));
        assert_eq!(locate("", 2, &segs(&["x"])), (2, 1));
    }

    #[test]
    fn test_does_not_match_sibling_blocks() {
        // `issues` under `tools.github.toolsets` must not be confused with `on.issues`
        assert_eq!(locate(RAW, 2, &segs(&["tools", "issues"])), (6, 1));
    }
}
