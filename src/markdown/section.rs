//! Markdown section extraction for `file.md#Section` imports.
//!
//! A section starts at the first ATX heading whose trimmed text equals the
//! requested name and runs up to (not including) the next heading of the same
//! or a higher level. Headings inside fenced code blocks are ignored.

/// An ATX heading found on a single line.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Heading<'a> {
    level: usize,
    text: &'a str,
}

fn parse_heading(line: &str) -> Option<Heading<'_>> {
    let trimmed = line.trim_end_matches(['\r', '\n']);
    // Up to three leading spaces are allowed before the hashes
    let indent = trimmed.len() - trimmed.trim_start_matches(' ').len();
    if indent > 3 {
        return None;
    }
    let rest = &trimmed[indent..];
    let level = rest.chars().take_while(|c| *c == '#').count();
    if level == 0 || level > 6 {
        return None;
    }
    let after = &rest[level..];
    if !after.is_empty() && !after.starts_with([' ', '\t']) {
        return None;
    }
    // Optional closing sequence of hashes
    let text = after.trim().trim_end_matches('#').trim_end();
    Some(Heading {
        level,
        text,
    })
}

fn is_fence(line: &str) -> bool {
    let t = line.trim_start();
    t.starts_with("```") || t.starts_with("~~~")
}

/// Extract the named section (heading line included) from a markdown body.
///
/// Returns `None` when no heading matches.
///
/// # Examples
///
/// ```rust
/// use awf_cli::markdown::section::extract_section;
///
/// let body = "# Intro\nhello\n## Setup\nsteps\n### Detail\nmore\n## Next\nbye\n";
/// let section = extract_section(body, "Setup").unwrap();
/// assert_eq!(section, "## Setup\nsteps\n### Detail\nmore\n");
/// ```
pub fn extract_section(body: &str, name: &str) -> Option<String> {
    let wanted = name.trim();
    let mut in_fence = false;
    let mut level: Option<usize> = None;
    let mut out = String::new();

    for line in body.split_inclusive('\n') {
        if is_fence(line) {
            in_fence = !in_fence;
            if level.is_some() {
                out.push_str(line);
            }
            continue;
        }

        let heading = if in_fence {
            None
        } else {
            parse_heading(line)
        };

        match (level, heading) {
            (None, Some(h)) if h.text == wanted => {
                level = Some(h.level);
                out.push_str(line);
            }
            (Some(current), Some(h)) if h.level <= current => break,
            (Some(_), _) => out.push_str(line),
            (None, _) => {}
        }
    }

    level.map(|_| out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_section_stops_at_sibling() {
        let body = "## A\none\n## B\ntwo\n";
        assert_eq!(extract_section(body, "A").unwrap(), "## A\none\n");
        assert_eq!(extract_section(body, "B").unwrap(), "## B\ntwo\n");
    }

    #[test]
    fn test_section_stops_at_higher_level() {
        let body = "# Top\n## A\none\n# Other\nx\n";
        assert_eq!(extract_section(body, "A").unwrap(), "## A\none\n");
    }

    #[test]
    fn test_section_matches_trimmed_text_and_closing_hashes() {
        let body = "##   Tools   ##\nlist\n";
        assert_eq!(extract_section(body, " Tools ").unwrap(), "##   Tools   ##\nlist\n");
    }

    #[test]
    fn test_headings_in_code_fences_ignored() {
        let body = "## A\n```md\n## B\n```\nafter\n## B\nreal\n";
        assert_eq!(extract_section(body, "A").unwrap(), "## A\n```md\n## B\n```\nafter\n");
        assert_eq!(extract_section(body, "B").unwrap(), "## B\nreal\n");
    }

    #[test]
    fn test_missing_section_is_none() {
        assert!(extract_section("## A\n", "Missing").is_none());
        assert!(extract_section("#hashtag\n", "hashtag").is_none());
    }

    #[test]
    fn test_first_match_wins() {
        let body = "## Dup\nfirst\n## Dup\nsecond\n";
        assert_eq!(extract_section(body, "Dup").unwrap(), "## Dup\nfirst\n");
    }
}
