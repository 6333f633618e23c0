use super::{FixApplication, SourceBuffer};

pub(super) fn strip_trailing(buffer: &mut SourceBuffer, line: usize) -> FixApplication {
    let Some(text) = buffer.line(line) else {
        return FixApplication::not_applicable(format!("line {line} is out of range"));
    };
    let trimmed = text.trim_end();
    if trimmed.len() == text.len() {
        return FixApplication::not_applicable("no trailing whitespace");
    }
    let trimmed = trimmed.to_string();
    buffer.set_line(line, trimmed);
    FixApplication::Applied
}

pub(super) fn ensure_final_newline(buffer: &mut SourceBuffer) -> FixApplication {
    if buffer.line_count() == 0 || buffer.has_final_newline() {
        return FixApplication::not_applicable("file already ends with a newline");
    }
    buffer.set_final_newline(true);
    FixApplication::Applied
}

pub(super) fn trim_trailing_blank_lines(buffer: &mut SourceBuffer) -> FixApplication {
    if buffer.trim_trailing_blank_lines() == 0 {
        return FixApplication::not_applicable("no blank lines at end of file");
    }
    buffer.set_final_newline(true);
    FixApplication::Applied
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_only_the_reported_line() {
        let mut buffer = SourceBuffer::new("a  \nb \t\n");
        assert_eq!(strip_trailing(&mut buffer, 2), FixApplication::Applied);
        assert_eq!(buffer.render(), "a  \nb\n");
        assert!(matches!(
            strip_trailing(&mut buffer, 2),
            FixApplication::NotApplicable(_)
        ));
    }

    #[test]
    fn final_newline_added_once() {
        let mut buffer = SourceBuffer::new("print(1)");
        assert_eq!(ensure_final_newline(&mut buffer), FixApplication::Applied);
        assert_eq!(buffer.render(), "print(1)\n");
        assert!(matches!(
            ensure_final_newline(&mut buffer),
            FixApplication::NotApplicable(_)
        ));
    }

    #[test]
    fn trailing_blank_lines_removed() {
        let mut buffer = SourceBuffer::new("x = 1\n\n\n");
        assert_eq!(trim_trailing_blank_lines(&mut buffer), FixApplication::Applied);
        assert_eq!(buffer.render(), "x = 1\n");
    }
}
