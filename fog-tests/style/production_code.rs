//! Production Code Enforcement
//!
//! Production code in the library and binary crates must not silence dead
//! code warnings or unwrap fallible values. Test modules and test fixtures
//! are exempt.

use std::fs;
use std::path::{Path, PathBuf};

/// Source roots checked, relative to this crate.
const PRODUCTION_ROOTS: &[&str] = &["../fog-core/src", "../fog-web/src", "../fog-cli/src"];

/// Library roots whose public API must stay documented.
const DOCUMENTED_LIBRARIES: &[&str] = &["../fog-web/src/lib.rs"];

/// A banned pattern found in production code
#[derive(Debug)]
struct Violation {
    file_path: String,
    line_number: usize,
    rule: &'static str,
    context: String,
}

/// Checker for banned patterns in production code
struct ProductionCodeChecker {
    violations: Vec<Violation>,
    files_checked: usize,
}

impl ProductionCodeChecker {
    fn new() -> Self {
        Self {
            violations: Vec::new(),
            files_checked: 0,
        }
    }

    fn find_rust_files(dir: &Path, files: &mut Vec<PathBuf>) -> std::io::Result<()> {
        if !dir.is_dir() {
            return Ok(());
        }
        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            if path.is_dir() {
                Self::find_rust_files(&path, files)?;
            } else if path.extension().is_some_and(|ext| ext == "rs") {
                files.push(path);
            }
        }
        Ok(())
    }

    /// Test fixtures may panic on environment failures.
    fn is_fixture_file(path: &Path) -> bool {
        path.file_name()
            .is_some_and(|name| name.to_string_lossy().contains("test_fixtures"))
    }

    /// Scans source text up to its test module.
    fn check_source(&mut self, file_path: &str, content: &str) {
        self.files_checked += 1;

        for (index, line) in content.lines().enumerate() {
            let trimmed = line.trim();
            if trimmed == "#[cfg(test)]" {
                break;
            }
            if trimmed.starts_with("//") {
                continue;
            }

            let rule = if trimmed.contains("#[allow(") && trimmed.contains("dead_code") {
                Some("dead_code allowance")
            } else if trimmed.contains(".unwrap()") {
                Some("unwrap in production code")
            } else {
                None
            };

            if let Some(rule) = rule {
                self.violations.push(Violation {
                    file_path: file_path.to_string(),
                    line_number: index + 1,
                    rule,
                    context: trimmed.to_string(),
                });
            }
        }
    }

    fn check_workspace(&mut self) -> std::io::Result<()> {
        let mut files = Vec::new();
        for root in PRODUCTION_ROOTS {
            Self::find_rust_files(Path::new(root), &mut files)?;
        }

        for file in files.iter().filter(|file| !Self::is_fixture_file(file)) {
            let content = fs::read_to_string(file)?;
            self.check_source(&file.to_string_lossy(), &content);
        }
        Ok(())
    }

    fn report_violations(&self) -> bool {
        if self.violations.is_empty() {
            println!(
                "Production code enforcement: {} files checked, no violations found",
                self.files_checked
            );
            return true;
        }

        for violation in &self.violations {
            println!(
                "{}:{} [{}]\n  {}",
                violation.file_path, violation.line_number, violation.rule, violation.context
            );
        }
        println!(
            "Found {} violation(s) in {} file(s) checked",
            self.violations.len(),
            self.files_checked
        );
        false
    }
}

#[test]
fn test_detects_banned_patterns_before_test_module() {
    let mut checker = ProductionCodeChecker::new();
    let source = r#"
#[allow(dead_code)]
fn unused() {}

fn risky(value: Option<u8>) -> u8 {
    value.unwrap()
}

// value.unwrap() in a comment is fine
#[cfg(test)]
mod tests {
    fn helper(value: Option<u8>) -> u8 {
        value.unwrap()
    }
}
"#;

    checker.check_source("example.rs", source);

    assert_eq!(checker.violations.len(), 2);
    assert_eq!(checker.violations[0].line_number, 2);
    assert_eq!(checker.violations[1].line_number, 6);
}

#[test]
fn test_fixture_files_are_exempt() {
    assert!(ProductionCodeChecker::is_fixture_file(Path::new(
        "../fog-core/src/storage/test_fixtures.rs"
    )));
    assert!(!ProductionCodeChecker::is_fixture_file(Path::new(
        "../fog-core/src/storage/local.rs"
    )));
}

#[test]
fn production_code_enforcement() {
    let mut checker = ProductionCodeChecker::new();
    checker
        .check_workspace()
        .expect("Failed to check workspace");

    assert!(
        checker.report_violations(),
        "Banned patterns found in production code - see output above"
    );
}

#[test]
fn documented_libraries_warn_on_missing_docs() {
    for lib in DOCUMENTED_LIBRARIES {
        let content = fs::read_to_string(lib).expect("Failed to read library root");
        assert!(
            content.lines().any(|line| line.trim() == "#![warn(missing_docs)]"),
            "{lib} must keep #![warn(missing_docs)]"
        );
    }
}
