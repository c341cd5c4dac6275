#![cfg(unix)]

use std::io::Read;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use plugin_exec::cancel::CancelFlag;
use plugin_exec::env::StaticInstanceInfo;
use plugin_exec::errors::AgentError;
use plugin_exec::exec::{ProcessRunner, STOPPED_PREEMPTIVELY_EXIT_CODE};
use plugin_exec::fs::{FileSystem, RealFileSystem};
use plugin_exec::shell::{
    create_script_file, ShellCommandRunner, ShellRequest, ShellSettings, STDERR_FILE_NAME,
    STDOUT_FILE_NAME,
};
use plugin_exec_test_utils::{init_tracing, with_timeout};

fn shell_runner(instance: StaticInstanceInfo) -> ShellCommandRunner {
    ShellCommandRunner::new(
        Arc::new(RealFileSystem),
        ProcessRunner::new(),
        Arc::new(instance),
        ShellSettings::default(),
    )
}

fn request(commands: &[&str], orch: &Path, timeout_seconds: i64) -> ShellRequest {
    ShellRequest {
        commands: commands.iter().map(|c| c.to_string()).collect(),
        working_dir: orch.to_path_buf(),
        orchestration_dir: orch.to_path_buf(),
        timeout_seconds,
    }
}

fn read_all(mut reader: Box<dyn Read + Send>) -> String {
    let mut s = String::new();
    reader.read_to_string(&mut s).unwrap();
    s
}

#[tokio::test]
async fn output_is_captured_to_files_and_readers() {
    init_tracing();
    let orch = tempfile::tempdir().unwrap();
    let runner = shell_runner(StaticInstanceInfo::default());

    let output = with_timeout(runner.run(
        &request(&["echo hello", "echo oops >&2"], orch.path(), 30),
        Arc::new(CancelFlag::new()),
    ))
    .await
    .unwrap();

    assert_eq!(output.result.exit_code, 0);
    assert!(output.result.errors.is_empty());
    assert_eq!(output.stdout_path, orch.path().join(STDOUT_FILE_NAME));
    assert_eq!(output.stderr_path, orch.path().join(STDERR_FILE_NAME));
    assert_eq!(
        std::fs::read_to_string(&output.stdout_path).unwrap(),
        "hello\n"
    );
    assert_eq!(read_all(output.stdout), "hello\n");
    assert_eq!(read_all(output.stderr), "oops\n");

    let script = std::fs::read_to_string(runner.script_path(orch.path())).unwrap();
    assert_eq!(script, "echo hello\necho oops >&2");
}

#[tokio::test]
async fn repeated_runs_append_to_the_same_files() {
    init_tracing();
    let orch = tempfile::tempdir().unwrap();
    let runner = shell_runner(StaticInstanceInfo::default());

    for word in ["first", "second"] {
        let cmd = format!("echo {word}");
        let output = with_timeout(runner.run(
            &request(&[cmd.as_str()], orch.path(), 30),
            Arc::new(CancelFlag::new()),
        ))
        .await
        .unwrap();
        assert_eq!(output.result.exit_code, 0);
    }

    let captured = std::fs::read_to_string(orch.path().join(STDOUT_FILE_NAME)).unwrap();
    assert_eq!(captured, "first\nsecond\n");
}

#[tokio::test]
async fn instance_identity_reaches_the_child_environment() {
    init_tracing();
    let orch = tempfile::tempdir().unwrap();
    let runner = shell_runner(StaticInstanceInfo::new(
        Some("i-0123456789abcdef0".into()),
        Some("eu-central-1".into()),
    ));

    let output = with_timeout(runner.run(
        &request(
            &["echo \"$AWS_SSM_INSTANCE_ID $AWS_SSM_REGION_NAME\""],
            orch.path(),
            30,
        ),
        Arc::new(CancelFlag::new()),
    ))
    .await
    .unwrap();

    assert_eq!(read_all(output.stdout), "i-0123456789abcdef0 eu-central-1\n");
}

#[tokio::test]
async fn nonzero_exit_is_returned_not_raised() {
    init_tracing();
    let orch = tempfile::tempdir().unwrap();
    let runner = shell_runner(StaticInstanceInfo::default());

    let output = with_timeout(runner.run(
        &request(&["echo partial", "exit 7"], orch.path(), 30),
        Arc::new(CancelFlag::new()),
    ))
    .await
    .unwrap();

    assert_eq!(output.result.exit_code, 7);
    assert!(output.result.errors.is_empty());
    assert_eq!(read_all(output.stdout), "partial\n");
}

#[tokio::test]
async fn cancel_stops_a_running_script() {
    init_tracing();
    let orch = tempfile::tempdir().unwrap();
    let runner = shell_runner(StaticInstanceInfo::default());
    let flag = Arc::new(CancelFlag::new());

    let canceller = {
        let flag = Arc::clone(&flag);
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(200)).await;
            flag.cancel();
        })
    };

    let output = with_timeout(runner.run(
        &request(&["echo before", "sleep 10", "echo after"], orch.path(), 30),
        flag.clone(),
    ))
    .await
    .unwrap();
    canceller.await.unwrap();

    assert_eq!(output.result.exit_code, STOPPED_PREEMPTIVELY_EXIT_CODE);
    assert_eq!(read_all(output.stdout), "before\n");
}

#[tokio::test]
async fn missing_orchestration_dir_is_an_error() {
    init_tracing();
    let parent = tempfile::tempdir().unwrap();
    let orch = parent.path().join("not-created");
    let runner = shell_runner(StaticInstanceInfo::default());

    let err = runner
        .run(&request(&["echo hi"], &orch, 30), Arc::new(CancelFlag::new()))
        .await
        .unwrap_err();

    assert!(matches!(err, AgentError::MissingOrchestrationDir(_)));
    assert!(!orch.exists());
}

/// Regression: a failed script write used to be silently ignored.
#[test]
fn script_file_write_failure_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let fs = RealFileSystem;

    let missing_parent = dir.path().join("missing").join("_script.sh");
    let err = create_script_file(&fs, &missing_parent, &["echo hi".to_string()]).unwrap_err();
    assert!(matches!(err, AgentError::ScriptFile { .. }));
    assert!(!fs.exists(&missing_parent));

    // A directory where the script should go is just as unwritable.
    let taken = dir.path().join("taken");
    std::fs::create_dir(&taken).unwrap();
    assert!(create_script_file(&fs, &taken, &["echo hi".to_string()]).is_err());
}
