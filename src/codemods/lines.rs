//! Line-level access to a document's frontmatter block.
//!
//! Line-based codemods edit the raw YAML text instead of re-serializing the
//! parsed tree, so comments, quoting and key order survive. Everything
//! outside the block (delimiters and body) is carried through untouched.

use crate::markdown::FrontmatterParser;

/// The frontmatter block of a document split into editable lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrontmatterLines<'a> {
    head: &'a str,
    tail: &'a str,
    newline: &'static str,
    /// Frontmatter lines without line terminators
    pub lines: Vec<String>,
}

impl<'a> FrontmatterLines<'a> {
    /// Split `content`; `None` when the document has no frontmatter block.
    pub fn split(content: &'a str) -> Option<Self> {
        let bounds = FrontmatterParser::boundaries(content)?;
        let raw = &content[bounds.content_start..bounds.content_end];
        let newline = if raw.contains("\r\n") {
            "\r\n"
        } else {
            "\n"
        };
        Some(Self {
            head: &content[..bounds.content_start],
            tail: &content[bounds.content_end..],
            newline,
            lines: raw.lines().map(str::to_string).collect(),
        })
    }

    /// Reassemble the full document.
    pub fn render(&self) -> String {
        let mut out = String::from(self.head);
        for line in &self.lines {
            out.push_str(line);
            out.push_str(self.newline);
        }
        out.push_str(self.tail);
        out
    }
}

/// A `key: value  # comment` line taken apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyLine<'l> {
    /// Leading whitespace, including a `- ` list marker if present
    pub prefix: &'l str,
    /// Key name, quotes removed
    pub key: &'l str,
    /// Key as written, quotes included
    pub raw_key: &'l str,
    /// Value text after the colon, trimmed (empty for block headers)
    pub value: &'l str,
    /// Trailing comment with its leading whitespace, or empty
    pub comment: &'l str,
}

impl KeyLine<'_> {
    /// The line with its value replaced, key and comment kept.
    pub fn with_value(&self, value: &str) -> String {
        format!("{}{}: {value}{}", self.prefix, self.raw_key, self.comment)
    }

    /// The line with its key renamed, value and comment kept.
    ///
    /// A quoted key stays quoted with the same quote character.
    pub fn with_key(&self, key: &str) -> String {
        let key = if key == self.key {
            self.raw_key.to_string()
        } else {
            match self.raw_key.chars().next() {
                Some(q @ ('"' | '\'')) if self.raw_key.len() > self.key.len() => {
                    format!("{q}{key}{q}")
                }
                _ => key.to_string(),
            }
        };
        if self.value.is_empty() {
            format!("{}{key}:{}", self.prefix, self.comment)
        } else {
            format!("{}{key}: {}{}", self.prefix, self.value, self.comment)
        }
    }
}

/// Number of leading whitespace bytes.
pub fn indent_of(line: &str) -> usize {
    line.len() - line.trim_start().len()
}

/// Whether `line` carries YAML content (not blank, not a comment).
pub fn is_content(line: &str) -> bool {
    let trimmed = line.trim_start();
    !trimmed.is_empty() && !trimmed.starts_with('#')
}

/// Split a line into code and trailing comment.
///
/// The comment keeps the whitespace that separated it from the code so the
/// line can be rebuilt byte-for-byte. A `#` only starts a comment outside
/// quotes and after whitespace.
pub fn split_comment(line: &str) -> (&str, &str) {
    let mut quote: Option<char> = None;
    let mut previous = ' ';
    for (i, c) in line.char_indices() {
        match quote {
            Some(q) if c == q => quote = None,
            Some(_) => {}
            None if (c == '"' || c == '\'') && opens_scalar(previous) => quote = Some(c),
            None if c == '#' && previous.is_whitespace() => {
                let code = line[..i].trim_end();
                return (code, &line[code.len()..]);
            }
            None => {}
        }
        previous = c;
    }
    (line, "")
}

fn opens_scalar(previous: char) -> bool {
    previous.is_whitespace() || matches!(previous, ':' | '[' | '{' | ',' | '-')
}

/// Parse a `key:` line. Flow mappings and multi-line keys are not handled.
pub fn parse_key_line(line: &str) -> Option<KeyLine<'_>> {
    let (code, comment) = split_comment(line);
    let mut rest = code.trim_start();
    if let Some(item) = rest.strip_prefix("- ") {
        rest = item.trim_start();
    }
    let prefix_len = code.len() - rest.len();
    let colon = key_colon(rest)?;
    let key = rest[..colon].trim_end();
    if key.is_empty() {
        return None;
    }
    Some(KeyLine {
        prefix: &code[..prefix_len],
        key: unquote(key),
        raw_key: key,
        value: rest[colon + 1..].trim(),
        comment,
    })
}

/// Position of the colon terminating a mapping key, if any.
fn key_colon(text: &str) -> Option<usize> {
    if text.starts_with(['{', '[']) {
        return None;
    }
    let bytes = text.as_bytes();
    let mut quote: Option<u8> = None;
    for (i, &b) in bytes.iter().enumerate() {
        match quote {
            Some(q) if b == q => quote = None,
            Some(_) => {}
            None if (b == b'"' || b == b'\'') && i == 0 => quote = Some(b),
            None if b == b':' => {
                let next = bytes.get(i + 1);
                if next.is_none_or(|n| n.is_ascii_whitespace()) {
                    return Some(i);
                }
            }
            None => {}
        }
    }
    None
}

fn unquote(key: &str) -> &str {
    for q in ['"', '\''] {
        if let Some(inner) = key.strip_prefix(q).and_then(|k| k.strip_suffix(q)) {
            return inner;
        }
    }
    key
}

/// Unquoted text of a scalar value.
pub fn scalar_text(value: &str) -> &str {
    unquote(value.trim())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_and_render_is_lossless() {
        let doc = "---\non: push  # trigger\n\ntools:\n  bash:\n---\n# Body\n\ntext\n";
        let lines = FrontmatterLines::split(doc).unwrap();
        assert_eq!(lines.lines, vec!["on: push  # trigger", "", "tools:", "  bash:"]);
        assert_eq!(lines.render(), doc);

        let crlf = "---\r\non: push\r\n---\r\nbody\r\n";
        assert_eq!(FrontmatterLines::split(crlf).unwrap().render(), crlf);
        assert!(FrontmatterLines::split("no frontmatter").is_none());
    }

    #[test]
    fn test_split_comment() {
        assert_eq!(split_comment("    expires: 7  # one week"), ("    expires: 7", "  # one week"));
        assert_eq!(split_comment("name: \"a # b\""), ("name: \"a # b\"", ""));
        assert_eq!(split_comment("url: http://x#frag"), ("url: http://x#frag", ""));
        assert_eq!(split_comment("note: don't # x"), ("note: don't", " # x"));
    }

    #[test]
    fn test_parse_key_line() {
        let line = parse_key_line("  bash:   # enable").unwrap();
        assert_eq!(line.key, "bash");
        assert_eq!(line.value, "");
        assert_eq!(line.with_value("true"), "  bash: true   # enable");

        let item = parse_key_line("  - uses: actions/checkout@v4").unwrap();
        assert_eq!(item.prefix, "  - ");
        assert_eq!(item.key, "uses");
        assert_eq!(item.value, "actions/checkout@v4");

        let renamed = parse_key_line("timeout_minutes: 10 # max").unwrap().with_key("timeout-minutes");
        assert_eq!(renamed, "timeout-minutes: 10 # max");

        assert!(parse_key_line("- plain item").is_none());
        assert!(parse_key_line("{a: 1}").is_none());
        assert_eq!(parse_key_line("'mode': local").unwrap().key, "mode");
    }

    #[test]
    fn test_quoted_keys_keep_their_quotes() {
        let line = parse_key_line("  'mode': local  # old").unwrap();
        assert_eq!(line.raw_key, "'mode'");
        assert_eq!(line.with_value("docker"), "  'mode': docker  # old");
        assert_eq!(line.with_key("mode"), "  'mode': local  # old");

        let renamed = parse_key_line("\"timeout_minutes\": 10").unwrap().with_key("timeout-minutes");
        assert_eq!(renamed, "\"timeout-minutes\": 10");

        let header = parse_key_line("  \"command\":").unwrap().with_key("slash_command");
        assert_eq!(header, "  \"slash_command\":");
    }
}
