use std::fs;
use std::path::PathBuf;
use std::process::Command;
use std::time::{SystemTime, UNIX_EPOCH};

struct TestCatalog {
    path: PathBuf,
}

impl TestCatalog {
    fn new(prefix: &str, document: &str) -> Self {
        let path = unique_temp_file(prefix);
        fs::write(&path, document).expect("write catalog document");
        Self { path }
    }

    fn run(&self, args: &[&str]) -> String {
        let output = Command::new(env!("CARGO_BIN_EXE_depgraph"))
            .arg("--input")
            .arg(&self.path)
            .arg("--quiet")
            .args(args)
            .output()
            .expect("run depgraph");
        let stdout = String::from_utf8_lossy(&output.stdout).to_string();
        let stderr = String::from_utf8_lossy(&output.stderr).to_string();
        assert!(
            output.status.success(),
            "depgraph {args:?} failed\nstdout:\n{stdout}\nstderr:\n{stderr}"
        );
        stdout
    }

    fn run_expecting_failure(&self, args: &[&str]) -> String {
        let output = Command::new(env!("CARGO_BIN_EXE_depgraph"))
            .arg("--input")
            .arg(&self.path)
            .arg("--quiet")
            .args(args)
            .output()
            .expect("run depgraph");
        assert!(!output.status.success(), "depgraph {args:?} should fail");
        String::from_utf8_lossy(&output.stderr).to_string()
    }
}

impl Drop for TestCatalog {
    fn drop(&mut self) {
        let _ = fs::remove_file(&self.path);
    }
}

fn unique_temp_file(prefix: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system clock before unix epoch")
        .as_nanos();
    let pid = std::process::id();
    std::env::temp_dir().join(format!("depgraph-{prefix}-{pid}-{nanos}.json"))
}

const CHAIN_CATALOG: &str = r#"{
    "pkgs": [
        {
            "name": "a",
            "versions": {
                "1.0.0": {
                    "timestamp": "2020-01-01T00:00:00Z",
                    "dependencies": {"b": "*"}
                }
            }
        },
        {
            "name": "b",
            "versions": {
                "1.0.0": {
                    "timestamp": "2020-07-01T00:00:00Z",
                    "dependencies": {"c": "*"}
                }
            }
        },
        {
            "name": "c",
            "versions": {
                "1.0.0": {"timestamp": "2021-01-01T00:00:00Z"}
            }
        }
    ]
}"#;

#[test]
fn window_filter_keeps_only_releases_inside_the_window() {
    let catalog = TestCatalog::new("window", CHAIN_CATALOG);
    let stdout = catalog.run(&[
        "stats",
        "--begin",
        "2020-06-01",
        "--end",
        "2020-12-31",
    ]);
    assert_eq!(stdout.trim(), "1 nodes, 0 edges");
}

#[test]
fn window_filter_requires_both_bounds() {
    let catalog = TestCatalog::new("half-window", CHAIN_CATALOG);
    let stderr = catalog.run_expecting_failure(&["stats", "--begin", "2020-06-01"]);
    assert!(stderr.contains("--begin and --end"));
}

#[test]
fn malformed_timestamps_abort_the_projection() {
    let document = CHAIN_CATALOG.replace("2020-07-01T00:00:00Z", "yesterday");
    let catalog = TestCatalog::new("bad-timestamp", &document);
    let stderr = catalog.run_expecting_failure(&[
        "stats",
        "--begin",
        "2020-01-01",
        "--end",
        "2021-12-31",
    ]);
    assert!(stderr.contains("malformed timestamp"));
    assert!(stderr.contains("b-1.0.0"));
}

#[test]
fn latest_filter_keeps_the_newest_release_per_package() {
    let catalog = TestCatalog::new(
        "latest",
        r#"{
            "pkgs": [
                {
                    "name": "a",
                    "versions": {
                        "1.0.0": {"timestamp": "2020-01-01T00:00:00Z"},
                        "1.1.0": {"timestamp": "2020-06-01T00:00:00Z"},
                        "2.0.0": {"timestamp": "2020-03-01T00:00:00Z"}
                    }
                }
            ]
        }"#,
    );
    let stdout = catalog.run(&["stats", "--latest-only"]);
    assert_eq!(stdout.trim(), "1 nodes, 0 edges");

    let stdout = catalog.run(&["deps", "a", "1.1.0", "--latest-only"]);
    assert!(stdout.contains("a 1.1.0"));
}

#[test]
fn latest_deps_filter_composes_window_and_latest() {
    let catalog = TestCatalog::new(
        "latest-deps",
        r#"{
            "pkgs": [
                {
                    "name": "app",
                    "versions": {
                        "1.0.0": {
                            "timestamp": "2020-09-01T00:00:00Z",
                            "dependencies": {"lib": "*"}
                        }
                    }
                },
                {
                    "name": "lib",
                    "versions": {
                        "1.0.0": {"timestamp": "2020-02-01T00:00:00Z"},
                        "1.1.0": {"timestamp": "2020-08-01T00:00:00Z"},
                        "2.0.0": {"timestamp": "2021-03-01T00:00:00Z"}
                    }
                }
            ]
        }"#,
    );
    let stdout = catalog.run(&[
        "stats",
        "--latest-deps",
        "--begin",
        "2020-01-01",
        "--end",
        "2020-12-31",
    ]);
    assert_eq!(stdout.trim(), "2 nodes, 1 edges");
}

#[test]
fn latest_deps_projection_of_a_walk_keeps_newest_per_package() {
    let catalog = TestCatalog::new(
        "deps-latest",
        r#"{
            "pkgs": [
                {
                    "name": "app",
                    "versions": {
                        "1.0.0": {
                            "timestamp": "2021-01-01T00:00:00Z",
                            "dependencies": {"lib": "*"}
                        }
                    }
                },
                {
                    "name": "lib",
                    "versions": {
                        "1.0.0": {"timestamp": "2020-01-01T00:00:00Z"},
                        "1.1.0": {"timestamp": "2020-06-01T00:00:00Z"}
                    }
                }
            ]
        }"#,
    );
    let stdout = catalog.run(&["deps", "app", "1.0.0", "--latest"]);
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].starts_with("app 1.0.0"));
    assert!(lines[1].starts_with("lib 1.1.0"));
}
