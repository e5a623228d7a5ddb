use super::*;
use mirrord_core::{PackageId, PackageSettings, PackageStatus};
use serde_json::Map;
use tempfile::tempdir;

fn sample_config() -> Config {
    Config::load_from_value(
        &serde_json::json!({
            "mirrorname": "Example Mirror",
            "hostname": "h",
            "settings": {
                "statfile": "/tmp/stat.json",
                "statusfile": "/tmp/status.json",
                "logfolder": "/tmp/log",
                "webroot": "/tmp/web",
            },
            "packages": {},
        }),
        &["rsync"],
    )
    .expect("config should parse")
    .0
}

fn pkg() -> Package {
    Package {
        pkgid: PackageId::new("mirror"),
        name: "Mirror".to_string(),
        status: PackageStatus::Active,
        href: "/mirror/".to_string(),
        synctype: "rsync".to_string(),
        syncrate: 3600,
        link: vec![],
        settings: PackageSettings {
            hidden: false,
            src: "rsync://u/m".to_string(),
            dst: "/data/m".to_string(),
            options: Map::new(),
        },
        lastsync: 111.0,
        errorcount: 0,
        disabled: false,
        timestamp: 0,
    }
}

#[test]
fn build_lists_every_package_and_formats_syncrate() {
    let snapshot = build(&sample_config(), &[pkg()], 1_000);
    assert_eq!(snapshot.lists, vec!["mirror".to_string()]);
    assert_eq!(snapshot.packages["mirror"].syncrate, "PT1H");
    assert_eq!(snapshot.lastupdate, 1_000);
}

#[test]
fn write_then_load_round_trips() {
    let dir = tempdir().expect("tempdir failed");
    let path = dir.path().join("status.json");

    let snapshot = build(&sample_config(), &[pkg()], 42);
    write(&path, &snapshot).expect("write failed");

    let loaded = load(&path, "Example Mirror").expect("load failed");
    assert_eq!(loaded, snapshot);
}

#[test]
fn load_missing_file_returns_empty_snapshot() {
    let dir = tempdir().expect("tempdir failed");
    let path = dir.path().join("missing.json");

    let loaded = load(&path, "Example Mirror").expect("load failed");
    assert!(loaded.lists.is_empty());
    assert_eq!(loaded.mirrorname, "Example Mirror");
}
