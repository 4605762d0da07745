#![allow(deprecated)]
use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn slashdash(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("slashdash").unwrap();
    cmd.current_dir(dir.path())
        .env("SLASHDASH_ROOT", dir.path())
        .env_remove("RUST_LOG");
    cmd
}

fn init_project(dir: &TempDir) {
    slashdash(dir).arg("init").assert().success();
}

// ---------------------------------------------------------------------------
// slashdash init
// ---------------------------------------------------------------------------

#[test]
fn init_writes_default_config() {
    let dir = TempDir::new().unwrap();
    slashdash(&dir)
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("created: .slashdash/config.yaml"));

    let content = std::fs::read_to_string(dir.path().join(".slashdash/config.yaml")).unwrap();
    assert!(content.contains("analyze-data"));
    assert!(content.contains("preset: recommended"));
}

#[test]
fn init_is_idempotent() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);
    slashdash(&dir)
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("exists:"));
}

// ---------------------------------------------------------------------------
// slashdash map
// ---------------------------------------------------------------------------

#[test]
fn map_direct_synonym() {
    let dir = TempDir::new().unwrap();
    slashdash(&dir)
        .args(["map", "inspect"])
        .assert()
        .success()
        .stdout(predicate::str::contains("inspect -> /analyze-data (95.0%, direct)"));
}

#[test]
fn map_low_weight_needs_confirmation_json() {
    let dir = TempDir::new().unwrap();
    slashdash(&dir)
        .args(["map", "check", "--json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"target_command\": \"analyze-data\""))
        .stdout(predicate::str::contains("\"requires_confirmation\": true"));
}

#[test]
fn map_unknown_verb() {
    let dir = TempDir::new().unwrap();
    slashdash(&dir)
        .args(["map", "frobnicate"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No command matches 'frobnicate'."));
}

// ---------------------------------------------------------------------------
// slashdash check / triggers
// ---------------------------------------------------------------------------

#[test]
fn check_safe_command_needs_no_confirmation() {
    let dir = TempDir::new().unwrap();
    slashdash(&dir)
        .args(["check", "analyze-data", "--input", "file:sales.csv"])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "No confirmation needed: `/analyze-data @file:sales.csv`",
        ));
}

#[test]
fn check_high_risk_and_confirm_by_number() {
    let dir = TempDir::new().unwrap();
    slashdash(&dir)
        .args([
            "check",
            "/delete-file",
            "--input",
            "file:old.csv",
            "--reply",
            "1",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Mode: High-risk operation confirmation (D)",
        ))
        .stdout(predicate::str::contains("Status: confirmed"))
        .stdout(predicate::str::contains(
            "Final command: `/delete-file @file:old.csv`",
        ));
}

#[test]
fn check_mapped_verb_still_hits_high_risk() {
    let dir = TempDir::new().unwrap();
    slashdash(&dir)
        .args(["check", "erase-file", "--input", "file:old.csv"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Mapped 'erase' to /delete-file"))
        .stdout(predicate::str::contains("High-risk operation"));
}

#[test]
fn check_unknown_verb_is_ambiguous() {
    let dir = TempDir::new().unwrap();
    slashdash(&dir)
        .args(["check", "frobnicate-data", "--reply", "cancel"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Mode: Ambiguous command repair (A)"))
        .stdout(predicate::str::contains("Status: cancelled"));
}

#[test]
fn check_large_task_with_prompt_enhancement() {
    let dir = TempDir::new().unwrap();
    slashdash(&dir)
        .args([
            "check",
            "generate-site",
            "--tokens",
            "60000",
            "--prompt",
            "Build the landing page",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Large task: about 0 steps, ~60000 tokens"))
        .stdout(predicate::str::contains(
            "Applied hacks: clarify, web_backed, self_grade, devils_advocate",
        ))
        .stdout(predicate::str::contains("Build the landing page"));
}

#[test]
fn check_modified_reply_json() {
    let dir = TempDir::new().unwrap();
    slashdash(&dir)
        .args([
            "check",
            "deploy-site",
            "--reply",
            "/deploy-site --dry-run",
            "--json",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"status\": \"modified\""))
        .stdout(predicate::str::contains(
            "\"final_command\": \"/deploy-site --dry-run\"",
        ));
}

#[test]
fn check_rejects_bad_input_ref() {
    let dir = TempDir::new().unwrap();
    slashdash(&dir)
        .args(["check", "analyze-data", "--input", "nocolon"])
        .assert()
        .failure();
}

#[test]
fn triggers_lists_all_and_highest() {
    let dir = TempDir::new().unwrap();
    slashdash(&dir)
        .args(["triggers", "delete-file", "--previous-error", "disk full"])
        .assert()
        .success()
        .stdout(predicate::str::contains("high_risk"))
        .stdout(predicate::str::contains("previous_error"))
        .stdout(predicate::str::contains(
            "Highest priority: high_risk (severity 9)",
        ));
}

#[test]
fn triggers_none_fired() {
    let dir = TempDir::new().unwrap();
    slashdash(&dir)
        .args(["triggers", "summarize-doc"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No triggers fired"));
}

// ---------------------------------------------------------------------------
// slashdash synonym
// ---------------------------------------------------------------------------

#[test]
fn synonym_add_requires_init() {
    let dir = TempDir::new().unwrap();
    slashdash(&dir)
        .args(["synonym", "add", "analyze-data", "crunch"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not initialized"));
}

#[test]
fn synonym_add_then_map() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);

    slashdash(&dir)
        .args(["synonym", "add", "analyze-data", "Crunch", "--weight", "70"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Added synonym 'crunch' -> /analyze-data."));

    slashdash(&dir)
        .args(["map", "crunch"])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "crunch -> /analyze-data (70.0%, needs confirmation)",
        ));

    slashdash(&dir)
        .args(["synonym", "remove", "analyze-data", "crunch"])
        .assert()
        .success();
    slashdash(&dir)
        .args(["synonym", "remove", "analyze-data", "crunch"])
        .assert()
        .failure();
}

#[test]
fn synonym_add_rejects_bad_command_name() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);
    slashdash(&dir)
        .args(["synonym", "add", "Bad_Name", "x"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid command name"));
}

#[test]
fn synonym_list_and_find() {
    let dir = TempDir::new().unwrap();
    slashdash(&dir)
        .args(["synonym", "list", "delete-file"])
        .assert()
        .success()
        .stdout(predicate::str::contains("erase"))
        .stdout(predicate::str::contains("analyze-data").not());

    slashdash(&dir)
        .args(["synonym", "find", "publish"])
        .assert()
        .success()
        .stdout(predicate::str::contains("deploy-site"));

    slashdash(&dir)
        .args(["synonym", "list", "no-such"])
        .assert()
        .failure();
}

// ---------------------------------------------------------------------------
// slashdash hacks
// ---------------------------------------------------------------------------

#[test]
fn hacks_list_shows_defaults() {
    let dir = TempDir::new().unwrap();
    slashdash(&dir)
        .args(["hacks", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("devils_advocate"))
        .stdout(predicate::str::contains("expert_panel"));
}

#[test]
fn hacks_apply_preset_persists() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);

    slashdash(&dir)
        .args(["hacks", "apply-preset", "writing"])
        .assert()
        .success()
        .stdout(predicate::str::contains("enabled: self_grade, devils_advocate"));

    slashdash(&dir)
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("preset: writing"));

    slashdash(&dir)
        .args(["hacks", "apply-preset", "turbo"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown preset"));
}

#[test]
fn hacks_disable_overrides_preset() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);
    slashdash(&dir)
        .args(["hacks", "disable", "clarify"])
        .assert()
        .success();

    slashdash(&dir)
        .args(["check", "frobnicate-data", "--prompt", "Plan it"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Applied hacks").not());
}

#[test]
fn hacks_inject_minimal_append() {
    let dir = TempDir::new().unwrap();
    slashdash(&dir)
        .args([
            "hacks",
            "inject",
            "clarify",
            "--prompt",
            "Write a plan",
            "--style",
            "minimal",
        ])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("Write a plan\n\n"));
}

#[test]
fn hacks_inject_reads_stdin() {
    let dir = TempDir::new().unwrap();
    slashdash(&dir)
        .args(["hacks", "inject", "self_grade", "--position", "prepend"])
        .write_stdin("Draft the email\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Self-grade"))
        .stdout(predicate::str::ends_with("Draft the email\n"));
}

// ---------------------------------------------------------------------------
// slashdash config
// ---------------------------------------------------------------------------

#[test]
fn config_validate_clean() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);
    slashdash(&dir)
        .args(["config", "validate"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Config is valid"));
}

#[test]
fn config_validate_reports_errors() {
    let dir = TempDir::new().unwrap();
    std::fs::create_dir_all(dir.path().join(".slashdash")).unwrap();
    std::fs::write(
        dir.path().join(".slashdash/config.yaml"),
        "mapping:\n  direct_threshold: 50.0\n  reject_threshold: 60.0\n",
    )
    .unwrap();

    slashdash(&dir)
        .args(["config", "validate"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("[error] mapping:"));
}

#[test]
fn config_validate_requires_init() {
    let dir = TempDir::new().unwrap();
    slashdash(&dir)
        .args(["config", "validate"])
        .assert()
        .failure();
}

// ---------------------------------------------------------------------------
// slashdash session
// ---------------------------------------------------------------------------

#[test]
fn session_confirm_cancel_and_history() {
    let dir = TempDir::new().unwrap();
    slashdash(&dir)
        .arg("session")
        .write_stdin("/delete-file @file:x.csv\ncancel\n/inspect-data @file:a.csv\nhistory\nundo\nstatus\nquit\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Status: cancelled"))
        .stdout(predicate::str::contains("Mapped 'inspect' to /analyze-data"))
        .stdout(predicate::str::contains("Ready: `/analyze-data @file:a.csv`"))
        .stdout(predicate::str::contains("Undone: /analyze-data @file:a.csv"))
        .stdout(predicate::str::contains("1 undoable, 1 redoable"));
}

#[test]
fn session_pending_times_out_at_eof() {
    let dir = TempDir::new().unwrap();
    slashdash(&dir)
        .arg("session")
        .write_stdin("/deploy-site\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Confirmation timed out."));
}
