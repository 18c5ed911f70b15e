// Full generator run against a scratch key directory.

use std::fs;

use chrono::NaiveDate;
use seisops_keyfiles::{generate, WriteKind};

const MASTER: &str = "\
# keyfile        net sta   arclink access global scautopick
station_GE_APE   GE  APE   NONE    gfz    bb     bb_default
station_GE_NEW   GE  NEW   NONE    NONE   sm     NONE       ADD2PIPELINE NLoB_apick lowband
station_GE_APE   GE  APE   NONE    none   bb2    bb_default
";

#[test]
fn regenerates_keyfiles_and_reports() {
    let tmp = tempfile::tempdir().unwrap();
    let keys = tmp.path().join("key");
    fs::create_dir(&keys).unwrap();
    fs::write(keys.join("station_GE_APE"), "global:old\n").unwrap();
    fs::write(keys.join("station_GE_GONE"), "global:old\n").unwrap();
    let master = tmp.path().join("SC3_MasterStationList.txt");
    fs::write(&master, MASTER).unwrap();

    let now = NaiveDate::from_ymd_opt(2025, 8, 20)
        .unwrap()
        .and_hms_opt(12, 3, 4)
        .unwrap();
    let report = generate(&master, &keys, now).unwrap();

    // backup holds the previous contents
    assert_eq!(report.backup_dir, keys.join("keyfile-backup-2025-08-20_12-3-4"));
    assert_eq!(
        fs::read_to_string(report.backup_dir.join("station_GE_APE")).unwrap(),
        "global:old\n"
    );
    assert!(report.backup_dir.join("station_GE_GONE").exists());

    // the later APE row wins
    assert_eq!(
        fs::read_to_string(keys.join("station_GE_APE")).unwrap(),
        "global:bb2\nscautopick:bb_default\n"
    );
    assert_eq!(
        fs::read_to_string(keys.join("station_GE_NEW")).unwrap(),
        "global:sm\nNLoB_apick:lowband\n"
    );

    let kinds: Vec<_> = report
        .written
        .iter()
        .map(|w| (w.keyfile.as_str(), w.kind))
        .collect();
    assert_eq!(
        kinds,
        vec![
            ("station_GE_APE", WriteKind::Updated),
            ("station_GE_NEW", WriteKind::New),
            ("station_GE_APE", WriteKind::Updated),
        ]
    );

    assert_eq!(report.missing, vec!["station_GE_GONE"]);
    assert_eq!(report.bindings.duplicates, vec!["station_GE_APE"]);
    assert_eq!(report.bindings.modules, vec!["NLoB_apick"]);
    // stale keyfiles are reported, not deleted
    assert!(keys.join("station_GE_GONE").exists());
}

#[test]
fn missing_master_list_is_an_error() {
    let tmp = tempfile::tempdir().unwrap();
    let now = NaiveDate::from_ymd_opt(2025, 1, 1)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap();
    let err = generate(&tmp.path().join("nope.txt"), tmp.path(), now).unwrap_err();
    assert!(err.to_string().contains("nope.txt"));
}
