//! Test case discovery.
//!
//! A test case is a directory named `test.*` directly under the corpus root,
//! containing the source file under test. Discovery yields cases in
//! lexicographic name order so repeated runs produce identical statistics
//! and diagnostic ordering.

use std::io;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

/// File name of the source under test inside each case directory.
pub const SOURCE_FILE: &str = "test.go";

/// Prefix shared by all case directory names.
pub const CASE_PREFIX: &str = "test.";

/// One named test case, backed by exactly one source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestCase {
    /// Case name (the directory name).
    pub name: String,
    /// Path to the source file under test.
    pub source: PathBuf,
}

impl TestCase {
    fn at(root: &Path, name: &str) -> Self {
        TestCase {
            name: name.to_string(),
            source: root.join(name).join(SOURCE_FILE),
        }
    }
}

/// Discover all test cases under `root`, sorted by name.
///
/// Only immediate subdirectories whose name starts with `test.` count;
/// stray files and unrelated directories are ignored. Whether the case
/// directory actually contains a source file is not checked here — a
/// missing source surfaces as a SourceCheck failure for that case, which
/// keeps discovery cheap and the failure visible in the per-case report.
pub fn discover(root: &Path) -> io::Result<Vec<TestCase>> {
    let mut names = Vec::new();
    for entry in WalkDir::new(root).min_depth(1).max_depth(1) {
        let entry = entry.map_err(io::Error::other)?;
        if !entry.file_type().is_dir() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        if name.starts_with(CASE_PREFIX) {
            names.push(name);
        }
    }
    names.sort_unstable();
    Ok(names.iter().map(|n| TestCase::at(root, n)).collect())
}

/// Resolve a single explicitly named case under `root`.
///
/// The case directory must exist; an unknown name is a startup error, not a
/// per-case failure.
pub fn single(root: &Path, name: &str) -> io::Result<TestCase> {
    let dir = root.join(name);
    if !dir.is_dir() {
        return Err(io::Error::new(
            io::ErrorKind::NotFound,
            format!("no such test case: {name}"),
        ));
    }
    Ok(TestCase::at(root, name))
}
