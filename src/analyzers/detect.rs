use ignore::WalkBuilder;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::config::SkipMatcher;
use crate::core::Language;
use crate::errors::{Error, Result};

/// Source files below `root`, honoring `.gitignore` and the skip patterns.
pub struct SourceWalker<'a> {
    root: PathBuf,
    skip: &'a SkipMatcher,
}

impl<'a> SourceWalker<'a> {
    pub fn new(root: impl Into<PathBuf>, skip: &'a SkipMatcher) -> Self {
        Self {
            root: root.into(),
            skip,
        }
    }

    pub fn walk(&self) -> Result<Vec<(PathBuf, Language)>> {
        let root = self.root.clone();
        let skip = self.skip.clone();
        let walker = WalkBuilder::new(&self.root)
            .hidden(false)
            .git_ignore(true)
            .require_git(false)
            .filter_entry(move |entry| {
                let relative = entry.path().strip_prefix(&root).unwrap_or(entry.path());
                relative.as_os_str().is_empty() || !skip.is_skipped(relative)
            })
            .build();

        let mut files = Vec::new();
        for entry in walker {
            let entry = entry.map_err(|e| Error::repository(&self.root, e.to_string()))?;
            let path = entry.path();
            if !entry.file_type().is_some_and(|t| t.is_file()) {
                continue;
            }
            if let Some(language) = Language::from_path(path) {
                files.push((path.to_path_buf(), language));
            }
        }
        files.sort();
        Ok(files)
    }
}

/// Count source files per language.
pub fn detect_languages(root: &Path, skip: &SkipMatcher) -> Result<BTreeMap<Language, usize>> {
    let mut counts = BTreeMap::new();
    for (_, language) in SourceWalker::new(root, skip).walk()? {
        *counts.entry(language).or_insert(0) += 1;
    }
    Ok(counts)
}
