//! Quote- and bracket-aware line scanning shared by the fixers.

pub(crate) fn leading_indent(line: &str) -> &str {
    let end = line.len() - line.trim_start().len();
    &line[..end]
}

/// Byte offsets of every `target` char outside string literals and
/// brackets. Scanning stops at `comment` when it appears outside a string.
fn top_level_positions(code: &str, target: char, comment: &str) -> Vec<usize> {
    let mut positions = Vec::new();
    let mut quote: Option<char> = None;
    let mut escaped = false;
    let mut depth: usize = 0;

    for (i, c) in code.char_indices() {
        if let Some(q) = quote {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == q {
                quote = None;
            }
            continue;
        }
        if code[i..].starts_with(comment) {
            break;
        }
        match c {
            '"' | '\'' | '`' => quote = Some(c),
            '(' | '[' | '{' => depth += 1,
            ')' | ']' | '}' => depth = depth.saturating_sub(1),
            _ if c == target && depth == 0 => positions.push(i),
            _ => {}
        }
    }
    positions
}

/// Split a line into its code part and trailing comment (comment includes
/// the marker). Markers inside string literals are ignored.
pub(crate) fn split_code_comment<'a>(line: &'a str, marker: &str) -> (&'a str, &'a str) {
    let mut quote: Option<char> = None;
    let mut escaped = false;
    for (i, c) in line.char_indices() {
        if let Some(q) = quote {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == q {
                quote = None;
            }
            continue;
        }
        if line[i..].starts_with(marker) {
            return (&line[..i], &line[i..]);
        }
        if matches!(c, '"' | '\'' | '`') {
            quote = Some(c);
        }
    }
    (line, "")
}

/// Rewrite the parts of `code` that lie outside string literals, copying
/// the literals through verbatim. An unterminated literal runs to the end.
pub(crate) fn map_unquoted<F>(code: &str, mut rewrite: F) -> String
where
    F: FnMut(&str) -> String,
{
    let mut out = String::with_capacity(code.len());
    let mut quote: Option<char> = None;
    let mut escaped = false;
    let mut start = 0;

    for (i, c) in code.char_indices() {
        if let Some(q) = quote {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == q {
                quote = None;
                let end = i + c.len_utf8();
                out.push_str(&code[start..end]);
                start = end;
            }
            continue;
        }
        if matches!(c, '"' | '\'' | '`') {
            out.push_str(&rewrite(&code[start..i]));
            start = i;
            quote = Some(c);
        }
    }

    let tail = &code[start..];
    if quote.is_some() {
        out.push_str(tail);
    } else {
        out.push_str(&rewrite(tail));
    }
    out
}

/// Split code on `sep` where it appears outside strings and brackets.
pub(crate) fn split_top_level<'a>(code: &'a str, sep: char, comment: &str) -> Vec<&'a str> {
    let mut pieces = Vec::new();
    let mut start = 0;
    for pos in top_level_positions(code, sep, comment) {
        pieces.push(&code[start..pos]);
        start = pos + sep.len_utf8();
    }
    pieces.push(&code[start..]);
    pieces
}

pub(crate) fn has_top_level(code: &str, target: char, comment: &str) -> bool {
    !top_level_positions(code, target, comment).is_empty()
}

/// Re-attach a comment to rewritten code, keeping at least two spaces
/// before a Python-style comment.
pub(crate) fn with_comment(code: &str, comment: &str) -> String {
    if comment.is_empty() {
        code.to_string()
    } else if code.trim().is_empty() {
        format!("{code}{comment}")
    } else {
        format!("{}  {}", code.trim_end(), comment)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn comment_split_ignores_markers_in_strings() {
        assert_eq!(
            split_code_comment("x = '#'  # real", "#"),
            ("x = '#'  ", "# real")
        );
        assert_eq!(split_code_comment("url = \"a//b\"", "//"), ("url = \"a//b\"", ""));
    }

    #[test]
    fn top_level_split_respects_brackets_and_quotes() {
        assert_eq!(
            split_top_level("a = f(1; 2); b = ';'; c", ';', "#"),
            vec!["a = f(1; 2)", " b = ';'", " c"]
        );
        assert!(!has_top_level("d = {1: 2}", ':', "#"));
        assert!(has_top_level("if x: y", ':', "#"));
    }

    #[test]
    fn unquoted_mapping_skips_literals() {
        let upper = |part: &str| part.to_uppercase();
        assert_eq!(
            map_unquoted(r#"a == "b == c" + 'd\'e' + f"#, upper),
            r#"A == "b == c" + 'd\'e' + F"#
        );
        assert_eq!(map_unquoted("x = 'open", upper), "X = 'open");
        assert_eq!(map_unquoted("", upper), "");
    }
}
