use std::{
    fs,
    net::TcpListener,
    path::{Path, PathBuf},
    process::{Child, Command, Output, Stdio},
    time::Duration,
};

fn write_config(dir: &Path, file_name: &str, env: &str, port: u16, extra: &str) -> PathBuf {
    let config_path = dir.join(file_name);
    fs::write(
        &config_path,
        format!(
            r#"
name = "recordgate-cli-test"
env = "{env}"
data_dir = "{data}"

[bind]
ip = "127.0.0.1"
port = {port}

[observability]
filter_level = "info"

[observability.log]
output = "console"
{extra}
"#,
            data = dir.join("data").display(),
        ),
    )
    .expect("write config");

    config_path
}

fn write_valid_config(dir: &Path, file_name: &str) -> PathBuf {
    write_config(dir, file_name, "dev", 39999, "")
}

fn run_recordgate(args: &[&str], current_dir: Option<&Path>) -> Output {
    let mut cmd = Command::new(PathBuf::from(env!("CARGO_BIN_EXE_recordgate")));
    cmd.args(args);
    if let Some(dir) = current_dir {
        cmd.current_dir(dir);
    }
    cmd.output().expect("run recordgate command")
}

struct ChildGuard(Child);

impl Drop for ChildGuard {
    fn drop(&mut self) {
        let _ = self.0.kill();
        let _ = self.0.wait();
    }
}

fn free_port() -> u16 {
    TcpListener::bind("127.0.0.1:0")
        .expect("bind ephemeral port")
        .local_addr()
        .expect("local addr")
        .port()
}

#[test]
fn test_command_accepts_explicit_valid_config() {
    let temp = tempfile::tempdir().expect("temp dir");
    let config_path = write_valid_config(temp.path(), "valid.toml");
    let output = run_recordgate(&["test", config_path.to_str().expect("utf8 path")], None);

    assert!(
        output.status.success(),
        "command should succeed, stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
}

#[test]
fn test_command_finds_default_config_in_current_directory() {
    let temp = tempfile::tempdir().expect("temp dir");
    write_valid_config(temp.path(), "config.toml");
    let output = run_recordgate(&["test"], Some(temp.path()));

    assert!(
        output.status.success(),
        "command should succeed, stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
}

#[test]
fn test_command_fails_for_missing_custom_config_path() {
    let temp = tempfile::tempdir().expect("temp dir");
    let missing_path = temp.path().join("missing.toml");
    let output = run_recordgate(&["test", missing_path.to_str().expect("utf8 path")], None);
    let stderr = String::from_utf8_lossy(&output.stderr);

    assert!(!output.status.success(), "command should fail");
    assert!(
        stderr.contains("Config file not found"),
        "unexpected stderr: {stderr}"
    );
}

#[test]
fn run_mode_fails_when_no_default_config_exists() {
    let temp = tempfile::tempdir().expect("temp dir");
    let output = run_recordgate(&[], Some(temp.path()));
    let stderr = String::from_utf8_lossy(&output.stderr);

    assert!(!output.status.success(), "run mode should fail");
    assert!(
        stderr.contains("No configuration file found"),
        "unexpected stderr: {stderr}"
    );
}

#[test]
fn test_command_fails_for_invalid_config_content() {
    let temp = tempfile::tempdir().expect("temp dir");
    let bad_path = temp.path().join("bad.toml");
    fs::write(&bad_path, "name = \"broken\"\n[gateway\n").expect("write invalid toml");

    let output = run_recordgate(&["test", bad_path.to_str().expect("utf8 path")], None);
    let stderr = String::from_utf8_lossy(&output.stderr);

    assert!(!output.status.success(), "command should fail");
    assert!(
        stderr.contains("配置解析失败") || stderr.contains("parse") || stderr.contains("invalid"),
        "unexpected stderr: {stderr}"
    );
}

#[test]
fn test_command_fails_for_validation_errors() {
    let temp = tempfile::tempdir().expect("temp dir");
    let config_path = write_config(
        temp.path(),
        "validation-error.toml",
        "dev",
        39997,
        "\n[gateway]\nroute = \"records\"\n",
    );
    let output = run_recordgate(&["test", config_path.to_str().expect("utf8 path")], None);
    let stderr = String::from_utf8_lossy(&output.stderr);

    assert!(!output.status.success(), "command should fail");
    assert!(
        stderr.contains("配置验证失败") || stderr.contains("validation"),
        "unexpected stderr: {stderr}"
    );
}

#[test]
fn test_command_succeeds_with_warning_only_config() {
    let temp = tempfile::tempdir().expect("temp dir");
    // prod + memory + console 日志只产生告警
    let config_path = write_config(
        temp.path(),
        "warning.toml",
        "prod",
        39998,
        "\n[gateway.storage]\nbackend = \"memory\"\n",
    );
    let output = run_recordgate(&["test", config_path.to_str().expect("utf8 path")], None);
    let stderr = String::from_utf8_lossy(&output.stderr);

    assert!(
        output.status.success(),
        "warning-only config should succeed, stderr: {stderr}"
    );
}

#[test]
fn run_mode_fails_for_validation_errors() {
    let temp = tempfile::tempdir().expect("temp dir");
    let config_path = write_config(
        temp.path(),
        "run-validation-error.toml",
        "dev",
        0,
        "",
    );
    let output = run_recordgate(
        &["--config", config_path.to_str().expect("utf8 path")],
        None,
    );
    let stderr = String::from_utf8_lossy(&output.stderr);

    assert!(!output.status.success(), "run mode should fail");
    assert!(
        stderr.contains("bind.port cannot be 0"),
        "unexpected stderr: {stderr}"
    );
}

#[tokio::test]
async fn run_mode_serves_records_until_killed() {
    let temp = tempfile::tempdir().expect("temp dir");
    let port = free_port();
    let config_path = write_config(temp.path(), "serve.toml", "test", port, "");

    let child = Command::new(PathBuf::from(env!("CARGO_BIN_EXE_recordgate")))
        .args(["--config", config_path.to_str().expect("utf8 path")])
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .expect("spawn recordgate");
    let _guard = ChildGuard(child);

    let client = reqwest::Client::new();
    let url = format!("http://127.0.0.1:{port}/");

    let mut ready = false;
    for _ in 0..50 {
        if client.get(&url).send().await.is_ok() {
            ready = true;
            break;
        }
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
    assert!(ready, "recordgate did not start listening on {url}");

    let resp = client
        .post(&url)
        .json(&serde_json::json!({ "timestamp": "2024-03-01T08:00:00Z", "phone": "1" }))
        .send()
        .await
        .expect("append request");
    assert_eq!(resp.status(), reqwest::StatusCode::OK);

    let records: Vec<serde_json::Value> = client
        .get(&url)
        .send()
        .await
        .expect("list request")
        .json()
        .await
        .expect("list body");
    assert_eq!(records.len(), 1);
    assert_eq!(records[0]["phone"], "1");

    assert!(
        temp.path().join("data").join("records.db").exists(),
        "sqlite database should live under data_dir"
    );
}
