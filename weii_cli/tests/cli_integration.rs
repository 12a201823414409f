use assert_cmd::prelude::*;
use predicates::prelude::*;
use rstest::rstest;
use std::fs;
use std::path::PathBuf;
use std::process::Command;
use tempfile::tempdir;

// Fast polling so the simulated board is found and reported quickly
fn write_valid_config(dir: &tempfile::TempDir) -> PathBuf {
    let toml = r#"
[session]
adjust_kg = 0.0
min_weight_kg = 20.0
max_samples = 200

[device]
poll_ms = 10

[display]
status_poll_ms = 20
"#;
    let path = dir.path().join("weii.toml");
    fs::write(&path, toml).unwrap();
    path
}

fn weii(dir: &tempfile::TempDir) -> Command {
    let mut cmd = Command::cargo_bin("weii").unwrap();
    // Keep the user's real config out of the picture.
    cmd.env("XDG_CONFIG_HOME", dir.path())
        .env("HOME", dir.path())
        .env_remove("RUST_LOG");
    cmd
}

#[rstest]
#[case(&["--help"], 0, "Usage:", "stdout")]
#[case(&["measure", "--simulate"], 0, "Done, weight: 72.5 kg", "stdout")]
#[case(&["measure", "--simulate", "--adjust", "-2.5"], 0, "Done, weight: 70.0 kg", "stdout")]
#[case(&["measure", "--simulate", "--max-samples", "0"], 1, "max_samples", "stderr")]
#[case(&["measure", "--simulate", "--adjust", "30"], 1, "adjustment", "stderr")]
#[case(&["self-check", "--simulate"], 0, "OK", "stdout")]
fn cli_table_cases(
    #[case] args: &[&str],
    #[case] exit_code: i32,
    #[case] needle: &str,
    #[case] stream: &str,
) {
    let dir = tempdir().unwrap();
    let cfg = write_valid_config(&dir);

    let mut cmd = weii(&dir);
    cmd.arg("--config").arg(&cfg);
    for a in args {
        cmd.arg(a);
    }

    let out = cmd.output().unwrap();
    assert_eq!(
        out.status.code(),
        Some(exit_code),
        "stderr: {}",
        String::from_utf8_lossy(&out.stderr)
    );
    let text = if stream == "stdout" {
        String::from_utf8_lossy(&out.stdout).to_string()
    } else {
        String::from_utf8_lossy(&out.stderr).to_string()
    };
    assert!(text.contains(needle), "missing {needle:?} in {stream}: {text}");
}

#[test]
fn terse_prints_only_the_weight() {
    let dir = tempdir().unwrap();
    let cfg = write_valid_config(&dir);
    weii(&dir)
        .arg("--config")
        .arg(&cfg)
        .args(["measure", "--simulate", "--terse"])
        .env("WEII_SIM_WEIGHT_KG", "84.0")
        .assert()
        .success()
        .stdout(predicate::eq("84.0\n"));
}

#[test]
fn button_press_exits_with_abort_code() {
    let dir = tempdir().unwrap();
    let cfg = write_valid_config(&dir);
    weii(&dir)
        .arg("--config")
        .arg(&cfg)
        .args(["measure", "--simulate"])
        .env("WEII_SIM_BUTTON_AFTER", "20")
        .assert()
        .code(2)
        .stdout(predicate::str::contains("Aborted"))
        .stdout(predicate::str::contains("Done").not());
}

#[test]
fn stepping_off_early_still_completes() {
    let dir = tempdir().unwrap();
    let cfg = write_valid_config(&dir);
    weii(&dir)
        .arg("--config")
        .arg(&cfg)
        .args(["measure", "--simulate", "--terse"])
        .env("WEII_SIM_FRAMES", "30")
        .env("WEII_SIM_WEIGHT_KG", "60.0")
        .assert()
        .success()
        .stdout(predicate::eq("60.0\n"));
}

#[test]
fn json_report_has_weight_and_counts() {
    let dir = tempdir().unwrap();
    let cfg = write_valid_config(&dir);
    let out = weii(&dir)
        .arg("--config")
        .arg(&cfg)
        .args(["--json", "measure", "--simulate"])
        .env("WEII_SIM_WEIGHT_KG", "80.0")
        .output()
        .unwrap();
    assert!(out.status.success());

    let stdout = String::from_utf8_lossy(&out.stdout);
    let line = stdout.lines().last().expect("json line");
    let v: serde_json::Value = serde_json::from_str(line).expect("valid json");
    assert_eq!(v["outcome"], "completed");
    assert_eq!(v["weight_kg"], 80.0);
    assert_eq!(v["samples"], 200);
    assert_eq!(v["discarded_groups"], 0);
}

#[test]
fn invalid_disconnect_address_warns_and_measures() {
    let dir = tempdir().unwrap();
    let cfg = write_valid_config(&dir);
    weii(&dir)
        .arg("--config")
        .arg(&cfg)
        .args([
            "measure",
            "--simulate",
            "--terse",
            "--disconnect-address",
            "not-a-mac",
        ])
        .assert()
        .success()
        .stdout(predicate::eq("72.5\n"))
        .stderr(predicate::str::contains("not-a-mac"));
}

#[cfg(unix)]
#[test]
fn command_hook_receives_formatted_weight() {
    let dir = tempdir().unwrap();
    let cfg = write_valid_config(&dir);
    let marker = dir.path().join("hook.out");
    let command = format!("echo W={{weight}} > {}", marker.display());
    weii(&dir)
        .arg("--config")
        .arg(&cfg)
        .args(["measure", "--simulate", "--terse", "--command", &command])
        .env("WEII_SIM_WEIGHT_KG", "82.0")
        .assert()
        .success();
    assert_eq!(fs::read_to_string(&marker).unwrap(), "W=82.0\n");
}

#[test]
fn bmi_and_imperial_lines_follow_display_config() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("weii.toml");
    fs::write(
        &path,
        "[device]\npoll_ms = 10\n[display]\nstatus_poll_ms = 20\nuse_imperial = true\nheight_cm = 175.0\n",
    )
    .unwrap();
    weii(&dir)
        .arg("--config")
        .arg(&path)
        .args(["measure", "--simulate"])
        .env("WEII_SIM_WEIGHT_KG", "70.0")
        .assert()
        .success()
        .stdout(predicate::str::contains("Weight: 154.3 lb"))
        .stdout(predicate::str::contains("BMI: 22.9 (Normal weight)"));
}

#[test]
fn bmi_uses_feet_and_inches_in_imperial_mode() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("weii.toml");
    fs::write(
        &path,
        "[device]\npoll_ms = 10\n[display]\nstatus_poll_ms = 20\nuse_imperial = true\nheight_ft = 5\nheight_in = 9.0\n",
    )
    .unwrap();
    weii(&dir)
        .arg("--config")
        .arg(&path)
        .args(["measure", "--simulate"])
        .env("WEII_SIM_WEIGHT_KG", "70.0")
        .assert()
        .success()
        .stdout(predicate::str::contains("BMI: 22.8 (Normal weight)"));
}

#[test]
fn self_check_without_board_fails() {
    let dir = tempdir().unwrap();
    let cfg = write_valid_config(&dir);
    weii(&dir)
        .arg("--config")
        .arg(&cfg)
        .args(["self-check", "--simulate"])
        .env("WEII_SIM_ABSENT", "1")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("No balance board was found"));
}

#[test]
fn init_config_writes_once_and_loads_back() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("nested").join("weii.toml");

    weii(&dir)
        .arg("--config")
        .arg(&path)
        .arg("init-config")
        .assert()
        .success()
        .stdout(predicate::str::contains("Wrote"));
    let text = fs::read_to_string(&path).unwrap();
    assert!(text.contains("max_samples = 200"));

    weii(&dir)
        .arg("--config")
        .arg(&path)
        .arg("init-config")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("--force"));

    weii(&dir)
        .arg("--config")
        .arg(&path)
        .args(["self-check", "--simulate"])
        .assert()
        .success();
}

#[test]
fn init_config_defaults_to_xdg_location() {
    let dir = tempdir().unwrap();
    weii(&dir).arg("init-config").assert().success();
    assert!(dir.path().join("weii").join("weii.toml").exists());
}

#[test]
fn invalid_config_is_explained() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("bad.toml");
    fs::write(&path, "[session]\nmax_samples = 0\n").unwrap();
    weii(&dir)
        .arg("--config")
        .arg(&path)
        .args(["measure", "--simulate"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Configuration is invalid"))
        .stderr(predicate::str::contains("max_samples"));
}

#[test]
fn missing_explicit_config_is_an_error() {
    let dir = tempdir().unwrap();
    weii(&dir)
        .arg("--config")
        .arg(dir.path().join("nope.toml"))
        .args(["self-check", "--simulate"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("could not be read"));
}

#[test]
fn json_errors_are_structured() {
    let dir = tempdir().unwrap();
    let out = weii(&dir)
        .arg("--config")
        .arg(dir.path().join("nope.toml"))
        .args(["--json", "self-check", "--simulate"])
        .output()
        .unwrap();
    assert_eq!(out.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&out.stderr);
    let line = stderr.lines().last().expect("json line");
    let v: serde_json::Value = serde_json::from_str(line).expect("valid json");
    assert_eq!(v["reason"], "Error");
}
