use std::io::Write;
use std::process::{Command, Stdio};
use tempfile::TempDir;

fn run_interactive(dir: &TempDir, input: &str) -> std::process::Output {
    let mut child = Command::new(env!("CARGO_BIN_EXE_dayplan"))
        .env("DAYPLAN_STORE_PATH", dir.path().join("planner.json"))
        .env("DAYPLAN_CONFIG_PATH", dir.path().join("config.json"))
        .env("DAYPLAN_UTC_OFFSET", "+00:00")
        .env("DAYPLAN_DISABLE_NOTIFICATIONS", "1")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("failed to spawn interactive session");

    {
        let stdin = child.stdin.as_mut().expect("stdin");
        stdin
            .write_all(input.as_bytes())
            .expect("failed to write to stdin");
    }

    child
        .wait_with_output()
        .expect("failed to read interactive output")
}

#[test]
fn interactive_help_shows_usage() {
    let dir = tempfile::tempdir().unwrap();
    let output = run_interactive(&dir, "help\nexit\n");
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Usage") || stdout.contains("USAGE"));
}

#[test]
fn interactive_invalid_command_keeps_session_alive() {
    let dir = tempfile::tempdir().unwrap();
    let output = run_interactive(&dir, "nope\ntodo add \"Buy milk\"\nexit\n");

    assert!(output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("ERROR: invalid_input"));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Added todo: Buy milk (todo-1)"));
}

#[test]
fn interactive_session_shares_store() {
    let dir = tempfile::tempdir().unwrap();
    let script = "event add \"Standup\" --type routine --due \"2024-01-02 09:00\"\n\
                  event toggle event-1\n\
                  event list --date 2024-01-02\n\
                  quit\n";

    let output = run_interactive(&dir, script);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Added event: Standup (event-1) at 2024-01-02 09:00"));
    assert!(stdout.contains("Completed event: Standup (event-1)"));
    assert!(stdout.contains("0 remaining"));
}

#[test]
fn interactive_unterminated_quote_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let output = run_interactive(&dir, "todo add \"Buy milk\nexit\n");

    assert!(output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("unterminated quote"));
}
