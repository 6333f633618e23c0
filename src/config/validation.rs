//! Load-time validation with error accumulation.
//!
//! Every problem in a configuration is collected before reporting, so one run
//! shows the user all of them at once.

use super::core::{LintpilotConfig, SkipMatcher};
use crate::core::Category;

/// Validate a parsed configuration, returning every problem found.
pub fn validate_config(config: &LintpilotConfig) -> Result<(), Vec<String>> {
    let errors: Vec<String> = [
        validate_rules(config),
        validate_fix(config),
        validate_ai(config),
        validate_usage(config),
        validate_paths(config),
    ]
    .into_iter()
    .flatten()
    .collect();

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn validate_rules(config: &LintpilotConfig) -> Vec<String> {
    let rules = &config.rules;
    let mut errors = Vec::new();

    for (field, codes) in [("rules.enabled", &rules.enabled), ("rules.disabled", &rules.disabled)] {
        if codes.iter().any(|c| c.trim().is_empty()) {
            errors.push(format!("{field}: rule codes must not be empty"));
        }
    }

    for (index, entry) in rules.overrides.iter().enumerate() {
        let field = format!("rules.overrides[{index}]");
        if entry.code.trim().is_empty() {
            errors.push(format!("{field}.code: must not be empty"));
        }
        if let Some(confidence) = entry.confidence {
            if !(0.0..=1.0).contains(&confidence) {
                errors.push(format!(
                    "{field}.confidence: out of range (expected: 0.0-1.0, got: {confidence})"
                ));
            }
            if entry.category == Category::Safe && confidence < 1.0 {
                errors.push(format!(
                    "{field}.confidence: SAFE rules are always fully trusted, remove the confidence or use \"risky\""
                ));
            }
        }
    }

    errors
}

fn validate_fix(config: &LintpilotConfig) -> Vec<String> {
    let ratio = config.fix.max_shrink_ratio;
    let mut errors = Vec::new();
    if !(ratio > 0.0 && ratio <= 1.0) {
        errors.push(format!(
            "fix.max_shrink_ratio: out of range (expected: (0.0, 1.0], got: {ratio})"
        ));
    }
    if config.fix.max_issues_per_run == 0 {
        errors.push("fix.max_issues_per_run: must be at least 1".to_string());
    }
    errors
}

fn validate_ai(config: &LintpilotConfig) -> Vec<String> {
    let mut errors = Vec::new();
    if config.ai.timeout_secs == 0 {
        errors.push("ai.timeout_secs: must be at least 1".to_string());
    }
    if matches!(&config.ai.model, Some(model) if model.trim().is_empty()) {
        errors.push("ai.model: must not be empty when set".to_string());
    }
    errors
}

fn validate_usage(config: &LintpilotConfig) -> Vec<String> {
    let mut errors = Vec::new();
    if config.usage.limit == 0 {
        errors.push("usage.limit: must be at least 1".to_string());
    }
    if config.usage.window_seconds == 0 {
        errors.push("usage.window_seconds: must be at least 1".to_string());
    }
    errors
}

fn validate_paths(config: &LintpilotConfig) -> Vec<String> {
    config
        .paths
        .skip
        .iter()
        .filter_map(|pattern| {
            SkipMatcher::new(std::slice::from_ref(pattern))
                .err()
                .map(|e| format!("paths.skip: invalid pattern {pattern:?}: {e}"))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::core::RuleOverride;

    #[test]
    fn default_config_is_valid() {
        assert!(validate_config(&LintpilotConfig::default()).is_ok());
    }

    #[test]
    fn accumulates_all_errors() {
        let mut config = LintpilotConfig::default();
        config.fix.max_shrink_ratio = 1.5;
        config.usage.limit = 0;
        config.paths.skip.push("[".to_string());
        config.rules.overrides.push(RuleOverride {
            code: "".into(),
            language: None,
            category: Category::Risky,
            confidence: Some(2.0),
            name: None,
        });

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 5, "{errors:#?}");
        assert!(errors.iter().any(|e| e.starts_with("fix.max_shrink_ratio")));
        assert!(errors.iter().any(|e| e.starts_with("usage.limit")));
        assert!(errors.iter().any(|e| e.starts_with("paths.skip")));
    }

    #[test]
    fn safe_override_with_partial_confidence_is_rejected() {
        let mut config = LintpilotConfig::default();
        config.rules.overrides.push(RuleOverride {
            code: "E501".into(),
            language: None,
            category: Category::Safe,
            confidence: Some(0.4),
            name: None,
        });
        assert!(validate_config(&config).is_err());
    }
}
