use std::process::Command;
use tempfile::TempDir;

fn run(dir: &TempDir, args: &[&str]) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_dayplan"))
        .args(args)
        .env("DAYPLAN_STORE_PATH", dir.path().join("planner.json"))
        .env("DAYPLAN_CONFIG_PATH", dir.path().join("config.json"))
        .env("DAYPLAN_UTC_OFFSET", "+00:00")
        .env("DAYPLAN_DISABLE_NOTIFICATIONS", "1")
        .output()
        .expect("failed to run dayplan")
}

fn seed(dir: &TempDir) {
    let content = serde_json::json!({
        "schema_version": 1,
        "todos": [
            { "id": "todo-1", "title": "Buy milk", "completed": false, "due_date": "2024-01-02T18:00:00Z" }
        ],
        "events": [
            {
                "id": "event-1",
                "title": "Standup",
                "description": "Daily sync",
                "type": "routine",
                "due_date": "2024-01-02T09:00:00Z",
                "completed": false
            }
        ]
    });
    std::fs::write(
        dir.path().join("planner.json"),
        serde_json::to_string_pretty(&content).unwrap(),
    )
    .unwrap();
}

#[test]
fn show_event_plain_text() {
    let dir = tempfile::tempdir().unwrap();
    seed(&dir);

    let output = run(&dir, &["show", "event-1"]);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Standup (event-1)"));
    assert!(stdout.contains("routine"));
    assert!(stdout.contains("2024-01-02 09:00"));
    assert!(stdout.contains("Daily sync"));
}

#[test]
fn show_todo_json() {
    let dir = tempfile::tempdir().unwrap();
    seed(&dir);

    let output = run(&dir, &["show", "todo-1", "--json"]);

    assert!(output.status.success());
    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["kind"], "todo");
    assert_eq!(value["todo"]["title"], "Buy milk");
    assert_eq!(value["todo"]["due_date"], "2024-01-02T18:00:00Z");
}

#[test]
fn show_unknown_id_is_not_found() {
    let dir = tempfile::tempdir().unwrap();
    seed(&dir);

    let output = run(&dir, &["show", "event-7"]);

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("ERROR: not_found"));
}

#[test]
fn corrupt_store_is_invalid_data() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("planner.json"), "{ not json").unwrap();

    let output = run(&dir, &["todo", "list"]);

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("ERROR: invalid_data"));
}
