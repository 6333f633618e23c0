//! ESLint rule fixers. Shared by JavaScript and TypeScript.

use once_cell::sync::Lazy;
use regex::Regex;

use super::text::{has_top_level, split_code_comment};
use super::{FixApplication, SourceBuffer};

static LET_DECLARATION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\s*)let(\s+[A-Za-z_$][\w$]*\s*=)").unwrap());

/// prefer-const. Only single-binding `let x = ...` lines are rewritten;
/// destructuring and multi-declarator forms go to review.
pub(super) fn prefer_const(buffer: &mut SourceBuffer, line: usize) -> FixApplication {
    let Some(text) = buffer.line(line) else {
        return FixApplication::not_applicable(format!("line {line} is out of range"));
    };
    let (code, _) = split_code_comment(text, "//");
    if !LET_DECLARATION.is_match(code) || has_top_level(code, ',', "//") {
        return FixApplication::not_applicable("not a single `let` declaration");
    }
    let rewritten = LET_DECLARATION.replace(text, "${1}const$2").into_owned();
    buffer.set_line(line, rewritten);
    FixApplication::Applied
}

/// no-extra-semi.
pub(super) fn remove_extra_semicolon(buffer: &mut SourceBuffer, line: usize) -> FixApplication {
    let Some(text) = buffer.line(line) else {
        return FixApplication::not_applicable(format!("line {line} is out of range"));
    };
    let (code, comment) = split_code_comment(text, "//");

    if code.trim() == ";" && comment.is_empty() {
        buffer.remove_line(line);
        return FixApplication::Applied;
    }

    let trimmed = code.trim_end();
    let collapsed = if trimmed.ends_with(";;") {
        format!("{};", trimmed.trim_end_matches(';'))
    } else if trimmed.ends_with("};") {
        trimmed[..trimmed.len() - 1].to_string()
    } else {
        return FixApplication::not_applicable("no redundant semicolon at end of line");
    };
    let trailing = &code[trimmed.len()..];
    let rewritten = format!("{collapsed}{trailing}{comment}");
    buffer.set_line(line, rewritten);
    FixApplication::Applied
}
