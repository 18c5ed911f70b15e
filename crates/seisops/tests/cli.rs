// Exit codes and console output of the built binaries.

use std::fs;
use std::process::Command;

#[test]
fn dispatcher_without_event_id_prints_usage_and_exits_1() {
    let tmp = tempfile::tempdir().unwrap();
    let output = Command::new(env!("CARGO_BIN_EXE_shakemap-dispatch"))
        .args(["only-a-message", "1"])
        .env("SEISOPS_CONFIG", tmp.path().join("absent.toml"))
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(1));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.starts_with("Starting ShakeMap processing script..."));
    assert!(stdout.contains("Usage: shakemap-dispatch"));
}

#[test]
fn dispatcher_flag_errors_take_the_usage_path() {
    let output = Command::new(env!("CARGO_BIN_EXE_shakemap-dispatch"))
        .arg("--config")
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(1));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("--config"), "{stdout}");
    assert!(stdout.contains("Usage: shakemap-dispatch"), "{stdout}");
}

#[test]
fn invalid_config_reports_its_error_code() {
    let tmp = tempfile::tempdir().unwrap();
    let config = tmp.path().join("seisops.toml");
    fs::write(&config, "[dispatch]\nworkers = 0\n").unwrap();

    let output = Command::new(env!("CARGO_BIN_EXE_write-keyfiles"))
        .arg("--config")
        .arg(&config)
        .arg("--key-dir")
        .arg(tmp.path())
        .output()
        .unwrap();

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("INVALID_VALUE"), "{stderr}");
    assert!(stderr.contains("dispatch.workers"), "{stderr}");
}

#[test]
fn station_select_rejects_bad_active_at() {
    let tmp = tempfile::tempdir().unwrap();
    let output = Command::new(env!("CARGO_BIN_EXE_station-select"))
        .args(["--inventory", "unused.xml", "--lat", "41.0", "--lon", "-29.0"])
        .args(["--radius-km", "50", "--out"])
        .arg(tmp.path().join("out.txt"))
        .args(["--active-at", "last tuesday"])
        .output()
        .unwrap();

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Could not parse --active-at. Use ISO like 2025-08-20T12:34:56"));
    assert!(!tmp.path().join("out.txt").exists());
}

#[test]
fn write_keyfiles_reports_to_stdout() {
    let tmp = tempfile::tempdir().unwrap();
    let keys = tmp.path().join("key");
    fs::create_dir(&keys).unwrap();
    fs::write(keys.join("station_GE_OLD"), "global:bb\n").unwrap();
    let master = tmp.path().join("master.txt");
    fs::write(
        &master,
        "station_GE_APE GE APE NONE gfz bb bb_default\nstation_XX_BAD XX BAD\n",
    )
    .unwrap();

    let output = Command::new(env!("CARGO_BIN_EXE_write-keyfiles"))
        .arg("--master-list")
        .arg(&master)
        .arg("--key-dir")
        .arg(&keys)
        .env("SEISOPS_CONFIG", tmp.path().join("absent.toml"))
        .output()
        .unwrap();

    assert!(output.status.success(), "{output:?}");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Missing information: Skip line - station_XX_BAD XX BAD"));
    assert!(stdout.contains("Write  new      key file: station_GE_APE"));
    assert!(stdout.contains("WARNING: Old keyfile station_GE_OLD"));
    assert_eq!(
        fs::read_to_string(keys.join("station_GE_APE")).unwrap(),
        "access:gfz\nglobal:bb\nscautopick:bb_default\n"
    );
}
