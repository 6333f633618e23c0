use super::{AssistError, AssistRequest, ReviewRequest};

/// Reply the model is told to give when it cannot fix the line.
pub const REFUSAL_MARKER: &str = "NO_FIX";

pub const SYSTEM_PROMPT: &str = "You fix single lint findings. Reply with the replacement \
text for the marked line only, keeping its indentation. Reply with an empty code block to \
delete the line, or with NO_FIX if the finding cannot be fixed safely on that line.";

pub fn build_prompt(request: &AssistRequest) -> String {
    let issue = &request.issue;
    format!(
        "Language: {language}\n\
         Rule: {code} ({name})\n\
         Message: {message}\n\
         File: {path}\n\
         Line {line}: {target}\n\n\
         Context:\n```\n{snippet}\n```\n\n\
         Provide ONLY the fixed line(s) without explanations.",
        language = issue.language(),
        code = issue.rule_code(),
        name = request.rule_name,
        message = issue.message(),
        path = issue.file_path().display(),
        line = issue.line_number(),
        target = request.target_line,
        snippet = request.snippet,
    )
}

pub const REVIEW_SYSTEM_PROMPT: &str = "You review source files for a developer. Suggest \
concrete improvements: poor names, missing docstrings, complexity, performance and best \
practices. Cite line numbers and keep each suggestion actionable.";

pub fn build_review_prompt(request: &ReviewRequest) -> String {
    let findings = if request.findings.is_empty() {
        "none".to_string()
    } else {
        request
            .findings
            .iter()
            .map(|finding| format!("- {finding}"))
            .collect::<Vec<_>>()
            .join("\n")
    };
    format!(
        "Analyze this {language} code and provide improvement suggestions.\n\
         File: {path}\n\n\
         Lint findings that need a human:\n{findings}\n\n\
         ```\n{code}\n```\n\n\
         Provide clear, numbered suggestions.",
        language = request.language,
        path = request.file_path.display(),
        code = request.code,
    )
}

pub fn clean_review(raw: &str) -> Result<String, AssistError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(AssistError::Malformed("empty review".to_string()));
    }
    Ok(trimmed.to_string())
}

/// Strip markdown fences and detect refusals.
pub fn clean_response(raw: &str) -> Result<String, AssistError> {
    let trimmed = raw.trim();
    if trimmed == REFUSAL_MARKER {
        return Err(AssistError::Refused);
    }

    let body = match trimmed.strip_prefix("```") {
        Some(rest) => {
            // Drop the language tag on the opening fence.
            let rest = rest.split_once('\n').map_or("", |(_, body)| body);
            rest.trim_end().strip_suffix("```").unwrap_or(rest).trim_end_matches('\n')
        }
        None => raw.trim_matches('\n').trim_end(),
    };

    if body.trim() == REFUSAL_MARKER {
        return Err(AssistError::Refused);
    }
    Ok(body.to_string())
}
