/// A file's content split into lines for line-addressed edits.
///
/// Each line keeps its own terminator and the presence of a final newline
/// is remembered, so rendering an unedited buffer reproduces the original
/// bytes even when line endings are mixed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceBuffer {
    lines: Vec<Line>,
    final_newline: bool,
    /// Terminator for lines that never had one.
    default_ending: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Line {
    text: String,
    /// Empty only for an unterminated last line.
    ending: &'static str,
}

impl SourceBuffer {
    pub fn new(content: &str) -> Self {
        let lines: Vec<Line> = content
            .split_inclusive('\n')
            .map(|raw| {
                if let Some(text) = raw.strip_suffix("\r\n") {
                    Line {
                        text: text.to_string(),
                        ending: "\r\n",
                    }
                } else if let Some(text) = raw.strip_suffix('\n') {
                    Line {
                        text: text.to_string(),
                        ending: "\n",
                    }
                } else {
                    Line {
                        text: raw.to_string(),
                        ending: "",
                    }
                }
            })
            .collect();
        let default_ending = lines
            .first()
            .map(|line| line.ending)
            .filter(|ending| !ending.is_empty())
            .unwrap_or("\n");

        Self {
            lines,
            final_newline: content.ends_with('\n'),
            default_ending,
        }
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        let count = self.lines.len();
        for (i, line) in self.lines.iter().enumerate() {
            out.push_str(&line.text);
            if i + 1 < count || self.final_newline {
                out.push_str(self.ending_of(line));
            }
        }
        out
    }

    fn ending_of(&self, line: &Line) -> &'static str {
        if line.ending.is_empty() {
            self.default_ending
        } else {
            line.ending
        }
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// 1-based line access.
    pub fn line(&self, number: usize) -> Option<&str> {
        number
            .checked_sub(1)
            .and_then(|i| self.lines.get(i))
            .map(|line| line.text.as_str())
    }

    pub fn set_line(&mut self, number: usize, text: impl Into<String>) -> bool {
        match number.checked_sub(1).and_then(|i| self.lines.get_mut(i)) {
            Some(line) => {
                line.text = text.into();
                true
            }
            None => false,
        }
    }

    pub fn remove_line(&mut self, number: usize) -> bool {
        match number.checked_sub(1) {
            Some(i) if i < self.lines.len() => {
                self.lines.remove(i);
                true
            }
            _ => false,
        }
    }

    /// Replace one line with zero or more lines, all ending the way the
    /// replaced line did.
    pub fn splice_line(&mut self, number: usize, replacement: Vec<String>) -> bool {
        match number.checked_sub(1) {
            Some(i) if i < self.lines.len() => {
                let ending = self.lines[i].ending;
                let replacement = replacement.into_iter().map(|text| Line { text, ending });
                self.lines.splice(i..=i, replacement);
                true
            }
            _ => false,
        }
    }

    pub fn has_final_newline(&self) -> bool {
        self.final_newline
    }

    pub fn set_final_newline(&mut self, value: bool) {
        self.final_newline = value;
    }

    /// Drop whitespace-only lines at the end of the file. Returns how many
    /// were removed.
    pub fn trim_trailing_blank_lines(&mut self) -> usize {
        let before = self.lines.len();
        while self.lines.last().is_some_and(|l| l.text.trim().is_empty()) {
            self.lines.pop();
        }
        before - self.lines.len()
    }

    /// Numbered excerpt of `radius` lines around `center`.
    pub fn excerpt(&self, center: usize, radius: usize) -> String {
        let start = center.saturating_sub(radius).max(1);
        let end = (center + radius).min(self.lines.len());
        (start..=end)
            .filter_map(|n| self.line(n).map(|text| format!("{n:>5} | {text}")))
            .collect::<Vec<_>>()
            .join("\n")
    }
}
