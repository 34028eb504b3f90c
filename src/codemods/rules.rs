//! The built-in codemods, in the order the engine applies them.
//!
//! Every rule follows the same shape: a guard on the parsed frontmatter
//! decides whether the deprecated form is present, then a line-based rewrite
//! of the raw block performs the migration. A guard that fires without a
//! matching line (flow-style YAML, for instance) leaves the document alone.

use serde_json::Value;
use std::sync::LazyLock;

use super::block_scope::{BlockScope, Position};
use super::lines::{FrontmatterLines, parse_key_line, scalar_text};
use super::{Codemod, CodemodOutcome};
use crate::core::AwfError;
use crate::markdown::Frontmatter;

pub(super) static REGISTRY: LazyLock<Vec<Codemod>> = LazyLock::new(|| {
    vec![
        Codemod {
            id: "timeout-minutes-migration",
            name: "Rename timeout_minutes",
            description: "Renames the deprecated 'timeout_minutes' field to 'timeout-minutes'",
            introduced_in: "0.2.0",
            apply: timeout_minutes_migration,
        },
        Codemod {
            id: "command-to-slash-command",
            name: "Rename on.command",
            description: "Renames the 'command' trigger to 'slash_command'",
            introduced_in: "0.3.0",
            apply: command_to_slash_command,
        },
        Codemod {
            id: "bash-anonymous-to-true",
            name: "Explicit bash tool",
            description: "Replaces an empty 'tools.bash:' entry with 'bash: true'",
            introduced_in: "0.4.0",
            apply: bash_anonymous_to_true,
        },
        Codemod {
            id: "expires-integer-to-string",
            name: "Safe-output expiry units",
            description: "Converts integer safe-output 'expires' values to day strings",
            introduced_in: "0.5.0",
            apply: expires_integer_to_string,
        },
        Codemod {
            id: "serena-local-to-docker",
            name: "Serena docker mode",
            description: "Switches 'tools.serena.mode: local' to 'docker'",
            introduced_in: "0.6.0",
            apply: serena_local_to_docker,
        },
        Codemod {
            id: "network-firewall-removal",
            name: "Drop network.firewall",
            description: "Removes the obsolete 'network.firewall' setting and its nested lines",
            introduced_in: "0.7.0",
            apply: network_firewall_removal,
        },
    ]
});

fn get_path<'a>(frontmatter: &'a Frontmatter, path: &[&str]) -> Option<&'a Value> {
    let (first, rest) = path.split_first()?;
    rest.iter().try_fold(frontmatter.get(*first)?, |value, key| value.get(key))
}

/// Run `edit` over the frontmatter lines; the document is re-rendered only
/// when `edit` reports a change.
fn rewrite(content: &str, edit: impl FnOnce(&mut Vec<String>) -> bool) -> CodemodOutcome {
    let Some(mut block) = FrontmatterLines::split(content) else {
        return CodemodOutcome::unchanged(content);
    };
    if edit(&mut block.lines) {
        CodemodOutcome::changed(block.render())
    } else {
        CodemodOutcome::unchanged(content)
    }
}

/// Rewrite the header line of the block at `path` with `change`.
fn rewrite_header(
    content: &str,
    path: &[&str],
    change: impl Fn(&str) -> Option<String>,
) -> CodemodOutcome {
    rewrite(content, |lines| {
        let mut scope = BlockScope::new(path);
        let mut changed = false;
        for line in lines.iter_mut() {
            if scope.observe(line.as_str()) == Position::Header
                && let Some(updated) = change(line.as_str())
                && updated != *line
            {
                *line = updated;
                changed = true;
            }
        }
        changed
    })
}

fn timeout_minutes_migration(
    content: &str,
    frontmatter: &Frontmatter,
) -> Result<CodemodOutcome, AwfError> {
    if !frontmatter.contains_key("timeout_minutes") {
        return Ok(CodemodOutcome::unchanged(content));
    }
    // The current spelling wins when both are present
    let keep_current = frontmatter.contains_key("timeout-minutes");
    Ok(rewrite(content, |lines| {
        let mut scope = BlockScope::new(&["timeout_minutes"]);
        let mut changed = false;
        let mut kept = Vec::with_capacity(lines.len());
        for line in lines.drain(..) {
            match scope.observe(&line) {
                Position::Header if keep_current => changed = true,
                Position::Header => {
                    let renamed = parse_key_line(&line).map(|key| key.with_key("timeout-minutes"));
                    changed |= renamed.is_some();
                    kept.push(renamed.unwrap_or(line));
                }
                Position::Inside if keep_current => changed = true,
                _ => kept.push(line),
            }
        }
        *lines = kept;
        changed
    }))
}

fn command_to_slash_command(
    content: &str,
    frontmatter: &Frontmatter,
) -> Result<CodemodOutcome, AwfError> {
    let Some(Value::Object(on)) = frontmatter.get("on") else {
        return Ok(CodemodOutcome::unchanged(content));
    };
    if !on.contains_key("command") {
        return Ok(CodemodOutcome::unchanged(content));
    }
    if on.contains_key("slash_command") {
        return Err(AwfError::Config {
            message: "both 'on.command' and 'on.slash_command' are set; remove 'on.command'"
                .to_string(),
        });
    }
    Ok(rewrite_header(content, &["on", "command"], |line| {
        parse_key_line(line).map(|key| key.with_key("slash_command"))
    }))
}

fn bash_anonymous_to_true(
    content: &str,
    frontmatter: &Frontmatter,
) -> Result<CodemodOutcome, AwfError> {
    if !matches!(get_path(frontmatter, &["tools", "bash"]), Some(Value::Null)) {
        return Ok(CodemodOutcome::unchanged(content));
    }
    Ok(rewrite_header(content, &["tools", "bash"], |line| {
        let key = parse_key_line(line)?;
        matches!(key.value, "" | "null" | "~").then(|| key.with_value("true"))
    }))
}

fn has_integer_expires(value: &Value) -> bool {
    match value {
        Value::Object(map) => map.iter().any(|(key, child)| {
            (key == "expires" && (child.is_i64() || child.is_u64())) || has_integer_expires(child)
        }),
        Value::Array(items) => items.iter().any(has_integer_expires),
        _ => false,
    }
}

fn expires_integer_to_string(
    content: &str,
    frontmatter: &Frontmatter,
) -> Result<CodemodOutcome, AwfError> {
    if !frontmatter.get("safe-outputs").is_some_and(has_integer_expires) {
        return Ok(CodemodOutcome::unchanged(content));
    }
    Ok(rewrite(content, |lines| {
        let mut scope = BlockScope::new(&["safe-outputs"]);
        let mut changed = false;
        for line in lines.iter_mut() {
            if scope.observe(line.as_str()) != Position::Inside {
                continue;
            }
            let Some(key) = parse_key_line(line.as_str()) else {
                continue;
            };
            if key.key == "expires" && key.value.parse::<u64>().is_ok() {
                let updated = key.with_value(&format!("{}d", key.value));
                *line = updated;
                changed = true;
            }
        }
        changed
    }))
}

fn serena_local_to_docker(
    content: &str,
    frontmatter: &Frontmatter,
) -> Result<CodemodOutcome, AwfError> {
    let mode = get_path(frontmatter, &["tools", "serena", "mode"]);
    if mode.and_then(Value::as_str) != Some("local") {
        return Ok(CodemodOutcome::unchanged(content));
    }
    Ok(rewrite_header(content, &["tools", "serena", "mode"], |line| {
        let key = parse_key_line(line)?;
        (scalar_text(key.value) == "local").then(|| key.with_value("docker"))
    }))
}

fn network_firewall_removal(
    content: &str,
    frontmatter: &Frontmatter,
) -> Result<CodemodOutcome, AwfError> {
    let Some(Value::Object(network)) = frontmatter.get("network") else {
        return Ok(CodemodOutcome::unchanged(content));
    };
    if !network.contains_key("firewall") {
        return Ok(CodemodOutcome::unchanged(content));
    }
    let emptied = network.len() == 1;
    Ok(rewrite(content, |lines| {
        let mut firewall = BlockScope::new(&["network", "firewall"]);
        let mut network_header = BlockScope::new(&["network"]);
        let mut header_index = None;
        let mut changed = false;
        let mut kept = Vec::with_capacity(lines.len());
        for line in lines.drain(..) {
            if network_header.observe(&line) == Position::Header {
                header_index = Some(kept.len());
            }
            match firewall.observe(&line) {
                Position::Header | Position::Inside => changed = true,
                Position::Outside => kept.push(line),
            }
        }
        // `network:` with nothing left under it would turn into null
        if changed
            && emptied
            && let Some(index) = header_index
            && let Some(key) = parse_key_line(&kept[index])
            && key.value.is_empty()
        {
            let updated = key.with_value("{}");
            kept[index] = updated;
        }
        *lines = kept;
        changed
    }))
}
