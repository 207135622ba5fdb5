// tests/config_loading.rs

mod common;
use crate::common::builders::{ConfigFileBuilder, ExecutableBuilder};
use crate::common::init_tracing;

use std::error::Error;
use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;

use tempfile::NamedTempFile;
use voyeur::cli::CliArgs;
use voyeur::config::{config_root_dir, load_and_validate, ConfigFile, ExecutableSpec};
use voyeur::errors::VoyeurError;

type TestResult = Result<(), Box<dyn Error>>;

fn write_config(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "{contents}").unwrap();
    file
}

#[test]
fn full_config_loads_in_order() -> TestResult {
    let file = write_config(
        r#"
[config]
interval = 2
kill_timeout = 3

[watch]
targets = ["./src", "./assets/config.json"]

[[executable]]
build_cmd = ["go", "build", "-o", "./server.bin", "./cmd/server"]
binary_path = "./server.bin"
args = ["--port", "8080"]

[[executable]]
name = "worker"
run_cmd = ["python3", "./tools/worker.py"]
script_path = "./tools/worker.py"
"#,
    );

    let cfg = load_and_validate(file.path())?;
    assert_eq!(cfg.config.poll_interval(), Duration::from_secs(2));
    assert_eq!(cfg.config.teardown().grace, Duration::from_secs(3));
    assert_eq!(cfg.config.delete_attempts, 10);
    assert_eq!(cfg.targets.len(), 2);

    let names: Vec<_> = cfg.executables.iter().map(|e| e.name()).collect();
    assert_eq!(names, vec!["server.bin", "worker"]);

    match &cfg.executables[0] {
        ExecutableSpec::CompiledBinary { args, binary_path, .. } => {
            assert_eq!(args, &vec!["--port".to_string(), "8080".to_string()]);
            assert_eq!(binary_path, &PathBuf::from("./server.bin"));
        }
        other => panic!("expected a compiled binary, got {other:?}"),
    }
    Ok(())
}

#[test]
fn defaults_apply_when_config_section_is_absent() -> TestResult {
    let file = write_config(
        r#"
[watch]
targets = ["src"]

[[executable]]
run_cmd = ["sh", "run.sh"]
script_path = "run.sh"
"#,
    );

    let cfg = load_and_validate(file.path())?;
    assert_eq!(cfg.config.interval, 1);
    assert_eq!(cfg.config.kill_timeout, 5);
    assert_eq!(cfg.config.teardown().delete.backoff, Duration::from_millis(300));
    Ok(())
}

#[test]
fn unknown_field_is_a_toml_error() {
    let file = write_config(
        r#"
[watch]
targets = ["src"]

[[executable]]
run_cmd = ["sh", "run.sh"]
script_path = "run.sh"
restart = "always"
"#,
    );

    match load_and_validate(file.path()) {
        Err(VoyeurError::TomlError(_)) => {}
        other => panic!("expected TomlError, got {other:?}"),
    }
}

#[test]
fn mixed_descriptor_is_a_config_error() {
    let file = write_config(
        r#"
[watch]
targets = ["src"]

[[executable]]
build_cmd = ["make"]
binary_path = "app"
run_cmd = ["sh", "run.sh"]
script_path = "run.sh"
"#,
    );

    match load_and_validate(file.path()) {
        Err(VoyeurError::ConfigError(msg)) => assert!(msg.contains("mixes binary fields")),
        other => panic!("expected ConfigError, got {other:?}"),
    }
}

#[test]
fn missing_file_is_an_io_error() {
    match load_and_validate("/definitely/not/here/Voyeur.toml") {
        Err(VoyeurError::IoError(e)) => assert_eq!(e.kind(), std::io::ErrorKind::NotFound),
        other => panic!("expected IoError, got {other:?}"),
    }
}

#[test]
fn builder_round_trips_through_validation() {
    let cfg: ConfigFile = ConfigFileBuilder::new()
        .with_interval(4)
        .with_target("src")
        .with_executable(ExecutableBuilder::binary(&["make"], "build/app").name("app").build())
        .with_executable(ExecutableBuilder::script(&["sh", "w.sh"], "w.sh").build())
        .build();

    assert_eq!(cfg.config.interval, 4);
    assert_eq!(cfg.executables[0].name(), "app");
    assert_eq!(cfg.executables[1].name(), "w.sh");
}

#[test]
fn duplicate_explicit_names_are_rejected() {
    let raw = ConfigFileBuilder::new()
        .with_target("src")
        .with_executable(ExecutableBuilder::binary(&["make"], "a/app").name("app").build())
        .with_executable(ExecutableBuilder::binary(&["make"], "b/app").name("app").build())
        .raw();

    match ConfigFile::try_from(raw) {
        Err(VoyeurError::ConfigError(msg)) => assert!(msg.contains("duplicate name 'app'")),
        other => panic!("expected ConfigError, got {other:?}"),
    }
}

#[test]
fn same_script_file_name_in_two_directories_loads() -> TestResult {
    let file = write_config(
        r#"
[watch]
targets = ["src"]

[[executable]]
run_cmd = ["python3", "a/main.py"]
script_path = "a/main.py"

[[executable]]
run_cmd = ["python3", "b/main.py"]
script_path = "b/main.py"
"#,
    );

    let cfg = load_and_validate(file.path())?;
    let names: Vec<_> = cfg.executables.iter().map(|e| e.name()).collect();
    assert_eq!(names, vec!["main.py", "b/main.py"]);
    Ok(())
}

#[test]
fn root_dir_is_the_config_directory() -> TestResult {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("Voyeur.toml");
    assert_eq!(config_root_dir(&path), dir.path().canonicalize()?);
    Ok(())
}

#[tokio::test]
async fn dry_run_validates_without_running() -> TestResult {
    init_tracing();

    let dir = tempfile::tempdir()?;
    let path = dir.path().join("Voyeur.toml");
    std::fs::write(
        &path,
        r#"
[watch]
targets = ["does-not-need-to-exist"]

[[executable]]
build_cmd = ["sh", "-c", "touch built.marker && touch never.bin"]
binary_path = "never.bin"
"#,
    )?;

    let args = CliArgs {
        config: path.display().to_string(),
        interval: Some(3),
        log_level: None,
        dry_run: true,
    };
    // A real run would fail on the missing target; a dry run only validates.
    voyeur::run(args).await?;
    assert!(!dir.path().join("built.marker").exists());
    assert!(!dir.path().join("never.bin").exists());
    Ok(())
}
