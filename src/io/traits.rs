//! I/O trait definitions for the fix engine.
//!
//! The orchestrator only touches files through [`FileSystem`], so the same
//! fix cycle runs against the real disk in production and against
//! [`crate::io::MemoryFileSystem`] in tests.

use std::io;
use std::path::Path;

/// File system operations needed to stage and commit fixes.
///
/// # Implementation Notes
///
/// `write_atomic` must leave either the old or the new content on disk,
/// never a mixture: it is the one non-cancellable instant of a fix cycle.
pub trait FileSystem: Send + Sync {
    /// Read a file's contents as a UTF-8 string.
    fn read_to_string(&self, path: &Path) -> io::Result<String>;

    /// Replace a file's contents in one step.
    fn write_atomic(&self, path: &Path, content: &str) -> io::Result<()>;

    /// Check if a path exists (file or directory).
    fn exists(&self, path: &Path) -> bool;
}
