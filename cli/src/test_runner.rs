use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use flow::parser::ParseError;

const TEST_SUFFIX: &str = ".test.flow";

#[derive(Debug, Deserialize)]
pub struct ExpectedWarning {
    /// Substring that must appear in the warning message.
    pub contains: String,

    /// If set, the warning's span must start on this 1-based source line.
    #[serde(default)]
    pub line: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct TestConfig {
    /// Human-readable test description.
    #[serde(default)]
    pub description: Option<String>,

    /// Expected exact stdout output (trimmed comparison).
    #[serde(default)]
    pub expect_output: Option<String>,

    /// Expected runtime error: the error's Display string must contain this substring.
    #[serde(default)]
    pub expect_error: Option<String>,

    /// If true, the test expects parsing to fail.
    #[serde(default)]
    pub expect_parse_error: bool,

    /// Expected parse warnings. If present (even empty), count and content are checked.
    #[serde(default)]
    pub expect_warnings: Option<Vec<ExpectedWarning>>,
}

/// Split a `.test.flow` file into its TOML config and Flow source.
fn parse_test_file(content: &str) -> Result<(TestConfig, &str), String> {
    let content = content.trim_start_matches('\u{feff}');

    if !content.starts_with("---") {
        return Err("missing opening --- frontmatter delimiter".into());
    }

    let after_open = &content[3..];
    let after_open = after_open
        .strip_prefix('\n')
        .or_else(|| after_open.strip_prefix("\r\n"))
        .unwrap_or(after_open);

    let close_pos = after_open
        .find("\n---")
        .ok_or("missing closing --- frontmatter delimiter")?;

    let toml_str = after_open[..close_pos].trim_end_matches('\r');
    let rest = &after_open[close_pos + 4..];
    let source = rest
        .strip_prefix("\r\n")
        .or_else(|| rest.strip_prefix('\n'))
        .unwrap_or(rest);

    let config: TestConfig =
        toml::from_str(toml_str).map_err(|e| format!("TOML parse error: {}", e))?;

    Ok((config, source))
}

pub enum TestOutcome {
    Pass,
    Fail(String),
}

pub struct TestResult {
    pub path: PathBuf,
    pub description: Option<String>,
    pub outcome: TestOutcome,
}

impl TestResult {
    fn label(&self) -> &str {
        self.description.as_deref().unwrap_or_else(|| {
            self.path
                .file_name()
                .and_then(|s| s.to_str())
                .and_then(|s| s.strip_suffix(TEST_SUFFIX))
                .unwrap_or("?")
        })
    }
}

fn run_single_test(path: &Path) -> TestResult {
    let fail = |description: Option<String>, reason: String| TestResult {
        path: path.to_path_buf(),
        description,
        outcome: TestOutcome::Fail(reason),
    };

    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => return fail(None, format!("cannot read file: {}", e)),
    };

    let (config, source) = match parse_test_file(&content) {
        Ok(pair) => pair,
        Err(e) => return fail(None, format!("frontmatter error: {}", e)),
    };
    let description = config.description.clone();

    let parse_result = flow::parser::Parser::new(source.to_string(), 0).parse();

    if config.expect_parse_error {
        return match parse_result {
            Err(_) => TestResult {
                path: path.to_path_buf(),
                description,
                outcome: TestOutcome::Pass,
            },
            Ok(_) => fail(
                description,
                "expected parse error, but parsing succeeded".into(),
            ),
        };
    }

    let program = match parse_result {
        Ok(p) => p,
        Err(errs) => {
            let msgs: Vec<String> = errs.iter().map(|e| e.to_string()).collect();
            return fail(
                description,
                format!("unexpected parse error: {}", msgs.join("; ")),
            );
        }
    };

    if let Some(expected_warnings) = &config.expect_warnings {
        if let Some(reason) = check_warnings(source, &program.warnings, expected_warnings) {
            return fail(description, reason);
        }
    }

    let mut output_buf = Vec::new();
    let exec_result = interpreter::execute_program(&program, &mut output_buf);

    let failure = match (&config.expect_error, &config.expect_output, exec_result) {
        (Some(expected_err), _, Err(runtime_err)) => {
            let err_str = runtime_err.to_string();
            if err_str.contains(expected_err.as_str()) {
                None
            } else {
                Some(format!(
                    "expected error containing \"{}\", got: {}",
                    expected_err, err_str
                ))
            }
        }
        (Some(expected_err), _, Ok(_)) => Some(format!(
            "expected error containing \"{}\", but execution succeeded",
            expected_err
        )),
        (None, Some(expected_output), Ok(_)) => {
            let actual = String::from_utf8_lossy(&output_buf);
            let actual_trimmed = actual.trim();
            let expected_trimmed = expected_output.trim();
            if actual_trimmed == expected_trimmed {
                None
            } else {
                Some(format!(
                    "output mismatch\n  expected: {}\n  actual:   {}",
                    expected_trimmed, actual_trimmed
                ))
            }
        }
        (None, _, Err(runtime_err)) => Some(format!("unexpected runtime error: {}", runtime_err)),
        (None, None, Ok(_)) => None,
    };

    match failure {
        Some(reason) => fail(description, reason),
        None => TestResult {
            path: path.to_path_buf(),
            description,
            outcome: TestOutcome::Pass,
        },
    }
}

/// Convert a byte offset in `source` to a 1-based line number.
fn byte_offset_to_line(source: &str, offset: usize) -> usize {
    source[..offset.min(source.len())]
        .bytes()
        .filter(|&b| b == b'\n')
        .count()
        + 1
}

/// Check that actual warnings match expectations. Returns `Some(reason)` on mismatch.
fn check_warnings(
    source: &str,
    warnings: &[ParseError],
    expected: &[ExpectedWarning],
) -> Option<String> {
    if warnings.len() != expected.len() {
        let actual_msgs: Vec<String> = warnings.iter().map(|w| format!("  - {}", w)).collect();
        return Some(format!(
            "expected {} warning(s), got {}\n  actual warnings:\n{}",
            expected.len(),
            warnings.len(),
            if actual_msgs.is_empty() {
                "    (none)".to_string()
            } else {
                actual_msgs.join("\n")
            }
        ));
    }

    for (i, (actual, expected)) in warnings.iter().zip(expected.iter()).enumerate() {
        let msg = actual.to_string();
        if !msg.contains(&expected.contains) {
            return Some(format!(
                "warning[{}]: expected message containing \"{}\", got: {}",
                i, expected.contains, msg
            ));
        }

        if let Some(expected_line) = expected.line {
            let actual_line = byte_offset_to_line(source, actual.span.start);
            if actual_line != expected_line {
                return Some(format!(
                    "warning[{}]: expected on line {}, but span is on line {}",
                    i, expected_line, actual_line
                ));
            }
        }
    }

    None
}

/// Discover `.test.flow` files grouped by category (subfolder relative to root).
/// Files directly in `root` get category "" (uncategorized).
fn discover_categorized(root: &Path) -> BTreeMap<String, Vec<PathBuf>> {
    let mut categories: BTreeMap<String, Vec<PathBuf>> = BTreeMap::new();
    collect_tests(root, root, &mut categories);
    for files in categories.values_mut() {
        files.sort();
    }
    categories
}

fn collect_tests(dir: &Path, root: &Path, out: &mut BTreeMap<String, Vec<PathBuf>>) {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            collect_tests(&path, root, out);
        } else if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
            if name.ends_with(TEST_SUFFIX) {
                let category = path
                    .parent()
                    .and_then(|p| p.strip_prefix(root).ok())
                    .map(|p| p.to_string_lossy().replace('\\', "/"))
                    .unwrap_or_default();
                out.entry(category).or_default().push(path);
            }
        }
    }
}

/// List available categories for the given test path.
pub fn list_categories(path: &Path) {
    if path.is_file() {
        eprintln!("(single file, no categories)");
        return;
    }

    let categories = discover_categorized(path);
    if categories.is_empty() {
        eprintln!("no {} files found in {}", TEST_SUFFIX, path.display());
        return;
    }

    eprintln!("available categories:");
    for (cat, files) in &categories {
        let label = if cat.is_empty() { "(root)" } else { cat.as_str() };
        eprintln!("  {} ({} tests)", label, files.len());
    }
}

fn paint(text: &str, code: &str, no_color: bool) -> String {
    if no_color {
        text.to_string()
    } else {
        format!("\x1b[{}m{}\x1b[0m", code, text)
    }
}

fn print_failures(failures: &[TestResult]) {
    if failures.is_empty() {
        return;
    }
    eprintln!();
    eprintln!("failures:");
    for f in failures {
        eprintln!();
        eprintln!("  --- {} ---", f.path.display());
        if let TestOutcome::Fail(reason) = &f.outcome {
            for line in reason.lines() {
                eprintln!("  {}", line);
            }
        }
    }
}

/// Select the categories to run. Unknown names are reported and skipped.
fn filter_categories<'a>(
    all: &'a BTreeMap<String, Vec<PathBuf>>,
    requested: &[String],
) -> BTreeMap<&'a str, &'a Vec<PathBuf>> {
    if requested.is_empty() {
        return all.iter().map(|(k, v)| (k.as_str(), v)).collect();
    }

    let mut filtered = BTreeMap::new();
    for requested in requested {
        let req = requested.trim_matches('/');
        let mut found = false;
        for (cat, files) in all {
            if cat == req || cat.starts_with(&format!("{}/", req)) {
                filtered.insert(cat.as_str(), files);
                found = true;
            }
        }
        if !found {
            eprintln!(
                "warning: category '{}' not found (available: {})",
                req,
                all.keys()
                    .map(|k| if k.is_empty() { "(root)" } else { k.as_str() })
                    .collect::<Vec<_>>()
                    .join(", ")
            );
        }
    }
    filtered
}

/// Run all `.test.flow` files under `path` (or a single file).
/// If `categories` is non-empty, only run tests in those categories.
/// Returns exit code: 0 = all pass, 1 = any failure.
pub fn run_tests(path: &Path, no_color: bool, categories: &[String]) -> i32 {
    let run_categories: BTreeMap<String, Vec<PathBuf>> = if path.is_file() {
        BTreeMap::from([(String::new(), vec![path.to_path_buf()])])
    } else {
        let all = discover_categorized(path);
        if all.is_empty() {
            eprintln!("no {} files found in {}", TEST_SUFFIX, path.display());
            return 1;
        }
        filter_categories(&all, categories)
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    };

    if run_categories.is_empty() {
        eprintln!("no matching categories found");
        return 1;
    }

    let mut passed = 0usize;
    let mut failures: Vec<TestResult> = Vec::new();

    for (cat, files) in &run_categories {
        let header = if cat.is_empty() { "(root)" } else { cat.as_str() };
        eprintln!();
        eprintln!("{}", paint(header, "1", no_color));

        for file in files {
            let result = run_single_test(file);
            match &result.outcome {
                TestOutcome::Pass => {
                    passed += 1;
                    eprintln!("  {}  {}", paint("PASS", "32", no_color), result.label());
                }
                TestOutcome::Fail(_) => {
                    eprintln!("  {}  {}", paint("FAIL", "31", no_color), result.label());
                    failures.push(result);
                }
            }
        }
    }

    print_failures(&failures);

    eprintln!();
    let failed = failures.len();
    if failed == 0 {
        eprintln!(
            "test result: {}. {} passed, 0 failed",
            paint("ok", "32", no_color),
            passed
        );
        0
    } else {
        eprintln!(
            "test result: {}. {} passed, {} failed (of {})",
            paint("FAILED", "31", no_color),
            passed,
            failed,
            passed + failed
        );
        1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(dir: &Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("failed to create dir");
        }
        std::fs::write(&path, content).expect("failed to write test file");
        path
    }

    #[test]
    fn conformance_suite_passes() {
        let root = Path::new(env!("CARGO_MANIFEST_DIR")).join("../tests/flow");
        assert_eq!(run_tests(&root, true, &[]), 0);
    }

    #[test]
    fn frontmatter_is_split_from_source() {
        let (config, source) = parse_test_file(
            "---\ndescription = \"greeting\"\nexpect_output = \"hi\"\n---\nprint hi\n",
        )
        .expect("valid test file");
        assert_eq!(config.description.as_deref(), Some("greeting"));
        assert_eq!(config.expect_output.as_deref(), Some("hi"));
        assert_eq!(source, "print hi\n");
    }

    #[test]
    fn missing_frontmatter_is_rejected() {
        assert!(parse_test_file("print hi\n").is_err());
        assert!(parse_test_file("---\nexpect_output = \"hi\"\nprint hi\n").is_err());
    }

    #[test]
    fn output_mismatch_fails() {
        let dir = tempfile::tempdir().expect("failed to create temp dir");
        let path = write(
            dir.path(),
            "wrong.test.flow",
            "---\nexpect_output = \"bye\"\n---\nprint hi\n",
        );
        let result = run_single_test(&path);
        assert!(matches!(
            result.outcome,
            TestOutcome::Fail(ref r) if r.contains("output mismatch")
        ));
    }

    #[test]
    fn expected_parse_error_passes() {
        let dir = tempfile::tempdir().expect("failed to create temp dir");
        let path = write(
            dir.path(),
            "dangling.test.flow",
            "---\nexpect_parse_error = true\n---\nelse\nend\n",
        );
        assert!(matches!(run_single_test(&path).outcome, TestOutcome::Pass));
    }

    #[test]
    fn categories_follow_subfolders() {
        let dir = tempfile::tempdir().expect("failed to create temp dir");
        write(dir.path(), "top.test.flow", "---\n---\n");
        write(dir.path(), "loops/a.test.flow", "---\n---\n");
        write(dir.path(), "loops/b.test.flow", "---\n---\n");
        write(dir.path(), "loops/notes.txt", "ignored");

        let categories = discover_categorized(dir.path());
        let keys: Vec<&str> = categories.keys().map(|k| k.as_str()).collect();
        assert_eq!(keys, vec!["", "loops"]);
        assert_eq!(categories["loops"].len(), 2);

        let filtered = filter_categories(&categories, &["loops".to_string()]);
        assert_eq!(filtered.len(), 1);
    }
}
