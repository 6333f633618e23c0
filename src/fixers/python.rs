//! Ruff rule fixers.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use std::path::Path;

use super::text::{
    has_top_level, leading_indent, map_unquoted, split_code_comment, split_top_level, with_comment,
};
use super::{is_init_file, FixApplication, FixContext, SourceBuffer};

static BACKTICK_NAME: Lazy<Regex> = Lazy::new(|| Regex::new(r"`([^`]+)`").unwrap());
static FROM_IMPORT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^from\s+(\S+)\s+import\s+(.+)$").unwrap());
static PLAIN_IMPORT: Lazy<Regex> = Lazy::new(|| Regex::new(r"^import\s+(.+)$").unwrap());
static NONE_RIGHT: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s*(==|!=)\s*None\b").unwrap());
static NONE_LEFT: Lazy<Regex> = Lazy::new(|| Regex::new(r"\bNone\s*(==|!=)\s*").unwrap());
static BOOL_RIGHT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s*(==|!=)\s*(True|False)\b").unwrap());
static BOOL_LEFT: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b(True|False)\s*(==|!=)\s*").unwrap());

const COMPOUND_KEYWORDS: &[&str] = &[
    "if", "elif", "else", "for", "while", "with", "def", "class", "try", "except", "finally",
    "async", "match", "case",
];

fn out_of_range(line: usize) -> FixApplication {
    FixApplication::not_applicable(format!("line {line} is out of range"))
}

struct ImportItem<'a> {
    original: &'a str,
    alias: Option<&'a str>,
    text: &'a str,
}

fn parse_items(list: &str) -> Vec<ImportItem<'_>> {
    list.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|text| {
            let mut parts = text.splitn(2, " as ");
            let original = parts.next().unwrap_or(text).trim();
            let alias = parts.next().map(str::trim);
            ImportItem {
                original,
                alias,
                text,
            }
        })
        .collect()
}

/// F401. Handles single-line `import a, b` and `from m import a, b` forms;
/// anything spanning lines is left for review.
pub(super) fn remove_unused_import(
    buffer: &mut SourceBuffer,
    line: usize,
    message: &str,
    path: &Path,
    ctx: &FixContext,
) -> FixApplication {
    if ctx.skip_init_files && is_init_file(path) {
        return FixApplication::not_applicable("imports in __init__.py are kept as public API");
    }
    let Some(text) = buffer.line(line) else {
        return out_of_range(line);
    };
    let Some(target) = BACKTICK_NAME
        .captures(message)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
    else {
        return FixApplication::not_applicable("message does not name the unused import");
    };

    let indent = leading_indent(text).to_string();
    let (code, comment) = split_code_comment(text, "#");
    let code = code.trim();
    if code.ends_with('\\') || code.contains('(') || code.contains(';') {
        return FixApplication::not_applicable("import spans several lines or statements");
    }

    let target_base = target.split(" as ").next().unwrap_or(&target).trim();
    let target_last = target_base.rsplit('.').next().unwrap_or(target_base);

    let (prefix, items, module) = if let Some(caps) = FROM_IMPORT.captures(code) {
        let module = caps.get(1).map_or("", |m| m.as_str());
        let list = caps.get(2).map_or("", |m| m.as_str());
        (format!("from {module} import "), parse_items(list), Some(module))
    } else if let Some(caps) = PLAIN_IMPORT.captures(code) {
        let list = caps.get(1).map_or("", |m| m.as_str());
        ("import ".to_string(), parse_items(list), None)
    } else {
        return FixApplication::not_applicable("line is not an import statement");
    };

    let position = items.iter().position(|item| {
        item.original == target_base
            || item.alias == Some(target_base)
            || item.alias == Some(target_last)
            || match module {
                Some(module) => {
                    format!("{module}.{}", item.original) == target_base
                        || item.original == target_last
                }
                None => false,
            }
    });
    let Some(position) = position else {
        return FixApplication::not_applicable(format!("`{target}` not found on line {line}"));
    };

    let remaining: Vec<&str> = items
        .iter()
        .enumerate()
        .filter(|(i, _)| *i != position)
        .map(|(_, item)| item.text)
        .collect();

    if remaining.is_empty() {
        if is_sole_statement_of_block(buffer, line, &indent) {
            buffer.set_line(line, format!("{indent}pass"));
        } else {
            buffer.remove_line(line);
        }
    } else {
        let rewritten = with_comment(
            &format!("{indent}{prefix}{}", remaining.join(", ")),
            comment,
        );
        buffer.set_line(line, rewritten);
    }
    FixApplication::Applied
}

/// True when `line` is the only statement of an indented block, so deleting
/// it would leave the block empty.
fn is_sole_statement_of_block(buffer: &SourceBuffer, line: usize, indent: &str) -> bool {
    if indent.is_empty() {
        return false;
    }
    let significant = |n: usize| {
        buffer
            .line(n)
            .filter(|t| !t.trim().is_empty() && !t.trim_start().starts_with('#'))
    };

    let opens_block = (1..line)
        .rev()
        .find_map(significant)
        .is_some_and(|prev| split_code_comment(prev, "#").0.trim_end().ends_with(':'));

    let block_continues = (line + 1..=buffer.line_count())
        .find_map(significant)
        .is_some_and(|next| leading_indent(next).len() >= indent.len());

    opens_block && !block_continues
}

fn rewrite_code<F>(buffer: &mut SourceBuffer, line: usize, rewrite: F, nothing: &str) -> FixApplication
where
    F: Fn(&str) -> String,
{
    let Some(text) = buffer.line(line) else {
        return out_of_range(line);
    };
    let (code, comment) = split_code_comment(text, "#");
    let new_code = rewrite(code);
    if new_code == code {
        return FixApplication::not_applicable(nothing.to_string());
    }
    let rewritten = format!("{new_code}{comment}");
    buffer.set_line(line, rewritten);
    FixApplication::Applied
}

fn identity_operator(op: &str) -> &'static str {
    if op == "!=" {
        "is not"
    } else {
        "is"
    }
}

/// E711.
pub(super) fn none_identity(buffer: &mut SourceBuffer, line: usize) -> FixApplication {
    rewrite_code(
        buffer,
        line,
        |code| {
            map_unquoted(code, |part| {
                let part = NONE_RIGHT.replace_all(part, |caps: &Captures| {
                    format!(" {} None", identity_operator(&caps[1]))
                });
                NONE_LEFT
                    .replace_all(&part, |caps: &Captures| {
                        format!("None {} ", identity_operator(&caps[1]))
                    })
                    .into_owned()
            })
        },
        "no comparison to None on this line",
    )
}

/// E712.
pub(super) fn bool_identity(buffer: &mut SourceBuffer, line: usize) -> FixApplication {
    rewrite_code(
        buffer,
        line,
        |code| {
            map_unquoted(code, |part| {
                let part = BOOL_RIGHT.replace_all(part, |caps: &Captures| {
                    format!(" {} {}", identity_operator(&caps[1]), &caps[2])
                });
                BOOL_LEFT
                    .replace_all(&part, |caps: &Captures| {
                        format!("{} {} ", &caps[1], identity_operator(&caps[2]))
                    })
                    .into_owned()
            })
        },
        "no comparison to True/False on this line",
    )
}

/// F541. Only complete single-quoted literals whose whole prefix is `f`
/// and whose body has no braces lose the prefix. Triple-quoted literals
/// are skipped, and an unterminated literal ends the scan.
pub(super) fn plain_string_literal(buffer: &mut SourceBuffer, line: usize) -> FixApplication {
    rewrite_code(
        buffer,
        line,
        strip_plain_fstring_prefixes,
        "no placeholder-free f-string on this line",
    )
}

fn strip_plain_fstring_prefixes(code: &str) -> String {
    let bytes = code.as_bytes();
    let mut out = String::with_capacity(code.len());
    let mut copied = 0;
    let mut i = 0;

    while i < bytes.len() {
        let quote = bytes[i];
        if quote != b'"' && quote != b'\'' {
            i += 1;
            continue;
        }
        let triple = [quote; 3];
        if bytes[i..].starts_with(&triple) {
            match find_subslice(&bytes[i + 3..], &triple) {
                Some(end) => {
                    i += 3 + end + 3;
                    continue;
                }
                None => break,
            }
        }
        let Some(close) = closing_quote(bytes, i + 1, quote) else {
            break;
        };

        let prefix_start = literal_prefix_start(bytes, i);
        let prefix = &code[prefix_start..i];
        let body = &code[i + 1..close];
        if prefix.eq_ignore_ascii_case("f") && !body.contains(['{', '}']) {
            out.push_str(&code[copied..prefix_start]);
            copied = i;
        }
        i = close + 1;
    }

    out.push_str(&code[copied..]);
    out
}

/// Index of the quote closing a literal whose body starts at `from`.
fn closing_quote(bytes: &[u8], from: usize, quote: u8) -> Option<usize> {
    let mut i = from;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 2,
            b if b == quote => return Some(i),
            _ => i += 1,
        }
    }
    None
}

/// Start of the identifier-like run directly before a quote, which holds
/// the string prefix (`f`, `rb`, ...) when there is one.
fn literal_prefix_start(bytes: &[u8], quote_at: usize) -> usize {
    let mut start = quote_at;
    while start > 0 && (bytes[start - 1].is_ascii_alphanumeric() || bytes[start - 1] == b'_') {
        start -= 1;
    }
    start
}

fn find_subslice(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|window| window == needle)
}

/// E702. Compound headers (`if x: a; b`) are left alone: splitting them
/// would move statements out of the block.
pub(super) fn split_statements(buffer: &mut SourceBuffer, line: usize) -> FixApplication {
    let Some(text) = buffer.line(line) else {
        return out_of_range(line);
    };
    let indent = leading_indent(text).to_string();
    let (code, comment) = split_code_comment(text, "#");

    let first_word = code
        .trim_start()
        .split(|c: char| !c.is_alphanumeric() && c != '_')
        .next()
        .unwrap_or("");
    if COMPOUND_KEYWORDS.contains(&first_word) && has_top_level(code, ':', "#") {
        return FixApplication::not_applicable("statements share a compound header");
    }

    let pieces: Vec<String> = split_top_level(code, ';', "#")
        .into_iter()
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(|p| format!("{indent}{p}"))
        .collect();
    if pieces.len() < 2 {
        return FixApplication::not_applicable("nothing to split");
    }

    let mut lines = pieces;
    if let Some(last) = lines.last_mut() {
        *last = with_comment(last, comment);
    }
    buffer.splice_line(line, lines);
    FixApplication::Applied
}

/// E703.
pub(super) fn remove_useless_semicolon(buffer: &mut SourceBuffer, line: usize) -> FixApplication {
    let Some(text) = buffer.line(line) else {
        return out_of_range(line);
    };
    let (code, comment) = split_code_comment(text, "#");
    let trimmed = code.trim_end();
    if !trimmed.ends_with(';') {
        return FixApplication::not_applicable("line does not end with a semicolon");
    }
    let stripped = trimmed.trim_end_matches(';').trim_end();
    let rewritten = if comment.is_empty() {
        stripped.to_string()
    } else {
        with_comment(stripped, comment)
    };
    buffer.set_line(line, rewritten);
    FixApplication::Applied
}
