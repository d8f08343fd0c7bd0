use std::path::Path;
use std::process::{Command, Output};

fn run(config: &Path, args: &[&str]) -> Output {
    let output = Command::new(env!("CARGO_BIN_EXE_service-base"))
        .arg("--config")
        .arg(config)
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .unwrap();
    assert!(
        output.status.success(),
        "{:?} failed: {}",
        args,
        String::from_utf8_lossy(&output.stderr)
    );
    output
}

fn write_config(dir: &Path) -> std::path::PathBuf {
    let path = dir.join("config.toml");
    let database = dir.join("catalog.db");
    std::fs::write(
        &path,
        format!(
            concat!(
                "[service]\nname = \"catalog\"\nlog_level = \"debug\"\n\n",
                "[database]\nurl = \"sqlite://{}\"\n",
            ),
            database.display()
        ),
    )
    .unwrap();
    path
}

#[test]
fn test_json_output_is_the_only_stdout() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(dir.path());

    run(&config, &["init"]);
    run(&config, &["seed", "--navigations", "1", "--per-navigation", "2"]);
    let output = run(&config, &["--json", "count"]);

    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["count"], 2);
    assert!(!output.stderr.is_empty());
}

#[test]
fn test_json_page_parses() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(dir.path());

    run(&config, &["init"]);
    run(&config, &["seed", "--navigations", "1", "--per-navigation", "12"]);
    let output = run(
        &config,
        &["--json", "page", "--navigation-id", "1", "--page", "2", "--size", "5"],
    );

    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["total_rows"], 12);
    assert_eq!(value["rows"].as_array().map(Vec::len), Some(5));
}

#[test]
fn test_json_navigations_and_count_by_name() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(dir.path());

    run(&config, &["init"]);
    run(&config, &["seed", "--navigations", "2", "--per-navigation", "3"]);

    let output = run(&config, &["--json", "navigations"]);
    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let navigations = value.as_array().unwrap();
    assert_eq!(navigations.len(), 2);
    assert!(navigations
        .iter()
        .all(|n| n["example_classes"].as_array().map(Vec::len) == Some(3)));

    let name = navigations[1]["name"].as_str().unwrap();
    let output = run(&config, &["--json", "count", "--navigation-name", name]);
    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["count"], 3);
}
