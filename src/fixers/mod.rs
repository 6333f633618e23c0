//! Deterministic, line-addressed fixers.
//!
//! Each rule code resolves once, at planning time, to a [`FixStrategy`]:
//! either one of the enumerated [`MechanicalFix`] variants or
//! [`FixStrategy::Assisted`] for codes that need an AI suggestion or a human.
//! Fixers edit a [`SourceBuffer`] in memory; nothing here touches the disk.

mod javascript;
mod python;
mod source;
mod text;
mod whitespace;

use serde::Serialize;
use std::path::Path;

use crate::core::{Issue, Language};
pub use source::SourceBuffer;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum MechanicalFix {
    /// F401: drop the unused name from its import statement.
    RemoveUnusedImport,
    /// F541: drop the `f` prefix from placeholder-free f-strings.
    PlainStringLiteral,
    /// W291, W293, no-trailing-spaces.
    StripTrailingWhitespace,
    /// W292, eol-last.
    EnsureFinalNewline,
    /// W391.
    TrimTrailingBlankLines,
    /// E702: one statement per line.
    SplitStatements,
    /// E703.
    RemoveUselessSemicolon,
    /// E711: `== None` becomes `is None`.
    NoneIdentityComparison,
    /// E712: `== True` becomes `is True`.
    BoolIdentityComparison,
    /// prefer-const.
    PreferConst,
    /// no-extra-semi.
    RemoveExtraSemicolon,
}

impl MechanicalFix {
    /// Fixes that may only remove whitespace or blank content. The safety
    /// checker rejects a pass made solely of these if the file grew lines.
    pub fn is_whitespace_only(&self) -> bool {
        matches!(
            self,
            MechanicalFix::StripTrailingWhitespace
                | MechanicalFix::EnsureFinalNewline
                | MechanicalFix::TrimTrailingBlankLines
        )
    }

    pub fn apply(&self, buffer: &mut SourceBuffer, issue: &Issue, ctx: &FixContext) -> FixApplication {
        let line = issue.line_number();
        match self {
            MechanicalFix::RemoveUnusedImport => {
                python::remove_unused_import(buffer, line, issue.message(), issue.file_path(), ctx)
            }
            MechanicalFix::PlainStringLiteral => python::plain_string_literal(buffer, line),
            MechanicalFix::StripTrailingWhitespace => whitespace::strip_trailing(buffer, line),
            MechanicalFix::EnsureFinalNewline => whitespace::ensure_final_newline(buffer),
            MechanicalFix::TrimTrailingBlankLines => whitespace::trim_trailing_blank_lines(buffer),
            MechanicalFix::SplitStatements => python::split_statements(buffer, line),
            MechanicalFix::RemoveUselessSemicolon => python::remove_useless_semicolon(buffer, line),
            MechanicalFix::NoneIdentityComparison => python::none_identity(buffer, line),
            MechanicalFix::BoolIdentityComparison => python::bool_identity(buffer, line),
            MechanicalFix::PreferConst => javascript::prefer_const(buffer, line),
            MechanicalFix::RemoveExtraSemicolon => javascript::remove_extra_semicolon(buffer, line),
        }
    }
}

/// How an issue will be fixed, decided once during planning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum FixStrategy {
    Mechanical(MechanicalFix),
    /// No deterministic fixer: needs an AI suggestion or a human.
    Assisted,
}

impl FixStrategy {
    pub fn for_rule(rule_code: &str, language: Language) -> Self {
        use MechanicalFix::*;
        let fix = match language {
            Language::Python => match rule_code {
                "F401" => Some(RemoveUnusedImport),
                "F541" => Some(PlainStringLiteral),
                "W291" | "W293" => Some(StripTrailingWhitespace),
                "W292" => Some(EnsureFinalNewline),
                "W391" => Some(TrimTrailingBlankLines),
                "E702" => Some(SplitStatements),
                "E703" => Some(RemoveUselessSemicolon),
                "E711" => Some(NoneIdentityComparison),
                "E712" => Some(BoolIdentityComparison),
                _ => None,
            },
            Language::JavaScript | Language::TypeScript => match rule_code {
                "no-trailing-spaces" => Some(StripTrailingWhitespace),
                "eol-last" => Some(EnsureFinalNewline),
                "no-extra-semi" => Some(RemoveExtraSemicolon),
                "prefer-const" => Some(PreferConst),
                _ => None,
            },
        };
        fix.map(FixStrategy::Mechanical).unwrap_or(FixStrategy::Assisted)
    }

    pub fn mechanical(&self) -> Option<MechanicalFix> {
        match self {
            FixStrategy::Mechanical(fix) => Some(*fix),
            FixStrategy::Assisted => None,
        }
    }
}

/// Per-run knobs the fixers consult.
#[derive(Debug, Clone)]
pub struct FixContext {
    pub skip_init_files: bool,
}

impl Default for FixContext {
    fn default() -> Self {
        Self {
            skip_init_files: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FixApplication {
    Applied,
    /// The fixer found nothing it could safely change on that line.
    NotApplicable(String),
}

impl FixApplication {
    pub(crate) fn not_applicable(reason: impl Into<String>) -> Self {
        FixApplication::NotApplicable(reason.into())
    }
}

pub(crate) fn is_init_file(path: &Path) -> bool {
    path.file_name().is_some_and(|name| name == "__init__.py")
}

/// Replace one line with an assistant's suggestion. An empty suggestion
/// deletes the line; a multi-line one is spliced in.
pub fn apply_suggestion(buffer: &mut SourceBuffer, line: usize, suggestion: &str) -> FixApplication {
    let Some(current) = buffer.line(line) else {
        return FixApplication::not_applicable(format!("line {line} is out of range"));
    };
    let replacement: Vec<String> = if suggestion.trim().is_empty() {
        Vec::new()
    } else {
        suggestion.lines().map(str::to_string).collect()
    };
    if replacement.len() == 1 && replacement[0] == current {
        return FixApplication::not_applicable("suggestion does not change the line");
    }
    buffer.splice_line(line, replacement);
    FixApplication::Applied
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strategy_resolution_is_language_aware() {
        assert_eq!(
            FixStrategy::for_rule("F401", Language::Python),
            FixStrategy::Mechanical(MechanicalFix::RemoveUnusedImport)
        );
        assert_eq!(
            FixStrategy::for_rule("F401", Language::JavaScript),
            FixStrategy::Assisted
        );
        assert_eq!(
            FixStrategy::for_rule("eol-last", Language::TypeScript),
            FixStrategy::Mechanical(MechanicalFix::EnsureFinalNewline)
        );
        assert_eq!(FixStrategy::for_rule("E701", Language::Python), FixStrategy::Assisted);
    }

    #[test]
    fn whitespace_only_variants() {
        assert!(MechanicalFix::StripTrailingWhitespace.is_whitespace_only());
        assert!(!MechanicalFix::RemoveUnusedImport.is_whitespace_only());
    }

    #[test]
    fn suggestion_splices_or_deletes() {
        let mut buffer = SourceBuffer::new("a\nb\nc\n");
        assert_eq!(apply_suggestion(&mut buffer, 2, "b1\nb2"), FixApplication::Applied);
        assert_eq!(buffer.render(), "a\nb1\nb2\nc\n");
        assert_eq!(apply_suggestion(&mut buffer, 1, ""), FixApplication::Applied);
        assert_eq!(buffer.render(), "b1\nb2\nc\n");
        assert!(matches!(
            apply_suggestion(&mut buffer, 9, "x"),
            FixApplication::NotApplicable(_)
        ));
    }
}
