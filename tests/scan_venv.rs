//! End-to-end scan of a fake virtual environment.
//!
//! The environment's `bin/python` is a shell script that answers
//! `-m pip freeze` and `-m pip show <name>` with canned output.

#![cfg(unix)]

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::Path;

use tempfile::TempDir;
use venvscope::config::Config;
use venvscope::export::ExportFormat;
use venvscope::scan::Session;
use venvscope::store::Store;
use venvscope::ErrorKind;

fn write_script(path: &Path, body: &str) {
    fs::write(path, format!("#!/bin/sh\n{}", body)).unwrap();
    fs::set_permissions(path, fs::Permissions::from_mode(0o755)).unwrap();
}

/// Builds `<tmp>/venv/bin/python` and a site-packages dir holding `flask/`.
fn fake_venv() -> TempDir {
    let tmp = tempfile::tempdir().unwrap();
    let site = tmp.path().join("site-packages");
    fs::create_dir_all(site.join("flask")).unwrap();
    fs::write(site.join("flask/__init__.py"), vec![b'x'; 512]).unwrap();
    fs::create_dir_all(site.join("typing_extensions")).unwrap();
    fs::write(site.join("typing_extensions/__init__.py"), vec![b'x'; 64]).unwrap();

    let bin = tmp.path().join("venv/bin");
    fs::create_dir_all(&bin).unwrap();
    let body = format!(
        r#"[ "$1" = "-m" ] && [ "$2" = "pip" ] || exit 3
case "$3" in
  freeze)
    printf 'flask==2.0.1\n# a comment\nwerkzeug==1.0.1\ntyping-extensions==4.5.0\n'
    ;;
  show)
    case "$4" in
      flask) printf 'Name: flask\nSummary: A web framework\nLocation: {site}\nRequires: werkzeug, typing-extensions\nRequired-by: \n' ;;
      typing-extensions) printf 'Name: typing-extensions\nLocation: {site}\nRequires: \n' ;;
      *) exit 1 ;;
    esac
    ;;
  *) exit 2 ;;
esac
"#,
        site = site.display()
    );
    write_script(&bin.join("python"), &body);
    tmp
}

fn config() -> Config {
    Config {
        workers: 2,
        timeout_secs: 5,
        ..Config::default()
    }
}

#[test]
fn test_scan_fake_venv() {
    let tmp = fake_venv();
    let mut session = Session::with_config(tmp.path().join("venv"), config());

    let report = session.scan().unwrap();
    assert_eq!(report.packages, 3);
    assert_eq!(report.skipped_lines, 1);
    assert_eq!(report.describe_failures, 1);

    let flask = session.package("flask").unwrap();
    assert_eq!(flask.version(), "2.0.1");
    assert_eq!(flask.description(), Some("A web framework"));
    assert_eq!(flask.size(), 512);
    assert!(flask.depends_on("werkzeug"));
    assert!(flask.depends_on("typing-extensions"));

    assert_eq!(session.package("typing-extensions").unwrap().size(), 64);

    let werkzeug = session.package("werkzeug").unwrap();
    assert!(werkzeug.dependencies().is_empty());
    assert!(!werkzeug.is_size_known());

    assert!(!session.detect_conflicts());
}

#[test]
fn test_scan_export_and_persist() {
    let tmp = fake_venv();
    let mut session = Session::with_config(tmp.path().join("venv"), config());
    session.scan().unwrap();

    let json_path = tmp.path().join("packages.json");
    session.export(ExportFormat::Json, &json_path).unwrap();
    let value: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&json_path).unwrap()).unwrap();
    assert_eq!(value["packages"].as_array().unwrap().len(), 3);

    let dot_path = tmp.path().join("graph.dot");
    session.export(ExportFormat::Dot, &dot_path).unwrap();
    assert!(fs::read_to_string(&dot_path).unwrap().contains("digraph"));

    let db = tmp.path().join("venv.db");
    let mut store = Store::init(&db).unwrap();
    session.save(&mut store).unwrap();
    drop(store);

    let store = Store::init(&db).unwrap();
    let mut restored = Session::new("");
    restored.load(&store).unwrap();
    assert_eq!(restored.env_root(), tmp.path().join("venv"));
    assert_eq!(restored.packages().len(), 3);
    assert_eq!(restored.package("flask").unwrap().size(), 512);
    assert_eq!(restored.package("flask").unwrap().dependencies().len(), 2);
}

#[test]
fn test_failing_freeze_is_scan_failure() {
    let tmp = tempfile::tempdir().unwrap();
    let bin = tmp.path().join("bin");
    fs::create_dir_all(&bin).unwrap();
    write_script(&bin.join("python"), "exit 1\n");

    let mut session = Session::with_config(tmp.path(), config());
    let err = session.scan().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ScanFailed);
    assert!(session.packages().is_empty());
    assert!(session.last_error().unwrap().contains("exit code 1"));
}

#[test]
fn test_hanging_tool_times_out() {
    let tmp = tempfile::tempdir().unwrap();
    let bin = tmp.path().join("bin");
    fs::create_dir_all(&bin).unwrap();
    write_script(&bin.join("python"), "exec sleep 30\n");

    let config = Config {
        timeout_secs: 1,
        ..config()
    };
    let mut session = Session::with_config(tmp.path(), config);
    let err = session.scan().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ScanFailed);
    assert!(session.last_error().unwrap().contains("did not finish"));
}
