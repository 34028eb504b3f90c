//! Indentation-based block tracking for line-oriented codemods.
//!
//! A [`BlockScope`] follows a key path such as `tools.serena` through the
//! frontmatter lines one at a time. It records the indentation of the line
//! that opens the block and treats the block as closed at the next content
//! line indented at or above that level. List items written at the same
//! indentation as their parent key (`steps:\n- run: x`) stay inside.

use super::lines::{indent_of, is_content, parse_key_line};

/// Where an observed line sits relative to the tracked block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Position {
    /// Not part of the block
    Outside,
    /// The `key:` line opening the block
    Header,
    /// Nested under the header
    Inside,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Outside,
    Entered {
        indent: usize,
    },
}

/// State machine tracking one nested block.
#[derive(Debug, Clone)]
pub struct BlockScope {
    path: Vec<String>,
    /// Open keys with their column
    stack: Vec<(String, usize)>,
    state: State,
}

impl BlockScope {
    /// Track the block at `path`, e.g. `["safe-outputs"]` or `["tools", "bash"]`.
    pub fn new(path: &[&str]) -> Self {
        Self {
            path: path.iter().map(|s| (*s).to_string()).collect(),
            stack: Vec::new(),
            state: State::Outside,
        }
    }

    /// Feed the next line and report where it sits.
    pub fn observe(&mut self, line: &str) -> Position {
        if !is_content(line) {
            return self.passive(line);
        }

        let indent = indent_of(line);
        let list_item = line.trim_start().starts_with("- ") || line.trim() == "-";

        if let State::Entered {
            indent: entry,
        } = self.state
        {
            let closes = if list_item {
                indent < entry
            } else {
                indent <= entry
            };
            if closes {
                self.state = State::Outside;
            }
        }

        // List items keep a parent at their own column open
        self.stack.retain(|(_, column)| {
            if list_item {
                *column <= indent
            } else {
                *column < indent
            }
        });

        if let Some(key) = parse_key_line(line) {
            let column = key.prefix.len();
            self.stack.push((key.key.to_string(), column));
            if self.matches_path() {
                self.state = State::Entered {
                    indent: column,
                };
                return Position::Header;
            }
        }

        match self.state {
            State::Entered {
                ..
            } => Position::Inside,
            State::Outside => Position::Outside,
        }
    }

    /// Blank lines and comments do not move the scope. They count as inside
    /// when indented deeper than the header.
    fn passive(&self, line: &str) -> Position {
        match self.state {
            State::Entered {
                indent,
            } if line.trim().is_empty() || indent_of(line) > indent => Position::Inside,
            _ => Position::Outside,
        }
    }

    fn matches_path(&self) -> bool {
        self.stack.len() == self.path.len()
            && self.stack.iter().zip(&self.path).all(|((key, _), expected)| key == expected)
    }
}
