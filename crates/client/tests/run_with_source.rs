//! Full runs against an in-memory remote.

use std::fs;
use std::path::PathBuf;

use client::{ClientError, ExitCode, PullConfig, RunOptions, run_with_source};
use engine::timestamp::RunTimestamp;
use test_support::{MemoryRemote, Workspace, entry_names, write_file};
use time::macros::datetime;
use transport::ConnectOptions;

fn timestamp() -> RunTimestamp {
    RunTimestamp::from_datetime(datetime!(2019-01-11 06:30:00 UTC)).expect("format")
}

fn config(destinations: Vec<PathBuf>) -> PullConfig {
    PullConfig::new(ConnectOptions::new("files.invalid", "tester", "unused"), destinations)
}

#[test]
fn every_destination_receives_files_and_its_own_archive() {
    let workspace = Workspace::new().expect("workspace");
    let first = workspace.subdir("first").unwrap();
    let second = workspace.subdir("second").unwrap();
    write_file(&second.join("report.csv"), b"OLD").unwrap();
    let mut remote = MemoryRemote::new("/files").with_file("report.csv", b"NEW");

    let summary = run_with_source(
        &mut remote,
        &config(vec![first.clone(), second.clone()]),
        &timestamp(),
        &RunOptions::new(),
    )
    .expect("run succeeds");

    assert_eq!(remote.list_calls(), 2);
    assert_eq!(summary.reports().len(), 2);
    assert_eq!(summary.reports()[0].base_dir(), first);
    assert_eq!(summary.files_fetched(), 2);
    assert_eq!(summary.files_archived(), 1);
    assert_eq!(summary.exit_code(), ExitCode::Ok);

    assert_eq!(fs::read(first.join("report.csv")).unwrap(), b"NEW");
    assert_eq!(fs::read(second.join("report.csv")).unwrap(), b"NEW");
    assert!(entry_names(&first.join("Archive")).unwrap().is_empty());
    assert_eq!(
        entry_names(&second.join("Archive")).unwrap(),
        vec!["20190111-063000_report.csv".to_owned()]
    );
}

#[test]
fn listing_failure_stops_before_any_destination_changes() {
    let workspace = Workspace::new().expect("workspace");
    let first = workspace.subdir("first").unwrap();
    write_file(&first.join("report.csv"), b"OLD").unwrap();
    let mut remote = MemoryRemote::new("/files")
        .with_file("report.csv", b"NEW")
        .failing_listing("permission denied");

    let error = run_with_source(&mut remote, &config(vec![first.clone()]), &timestamp(), &RunOptions::new())
        .expect_err("listing fails");

    assert_eq!(error.exit_code(), ExitCode::List);
    match &error {
        ClientError::List { destination, source } => {
            assert_eq!(destination, &first);
            assert_eq!(source.remote_dir(), "/files");
        }
        other => panic!("expected list error, got {other:?}"),
    }
    assert_eq!(fs::read(first.join("report.csv")).unwrap(), b"OLD");
    assert!(!first.join("Archive").exists());
}

#[test]
fn custom_remote_and_archive_directories_are_honoured() {
    let workspace = Workspace::new().expect("workspace");
    let share = workspace.subdir("share").unwrap();
    let archive = workspace.subdir("elsewhere").unwrap();
    write_file(&share.join("a.txt"), b"before").unwrap();
    let mut remote = MemoryRemote::new("/outbound/").with_file("a.txt", b"after");

    run_with_source(
        &mut remote,
        &config(vec![share.clone()])
            .with_remote_dir("/outbound/")
            .with_archive_dir(&archive),
        &timestamp(),
        &RunOptions::new(),
    )
    .expect("run succeeds");

    assert_eq!(remote.downloads(), ["/outbound/a.txt"]);
    assert_eq!(fs::read(archive.join("20190111-063000_a.txt")).unwrap(), b"before");
    assert!(!share.join("Archive").exists());
}

#[test]
fn transfer_failure_aborts_and_names_the_remote_path() {
    let workspace = Workspace::new().expect("workspace");
    let first = workspace.subdir("first").unwrap();
    let second = workspace.subdir("second").unwrap();
    let mut remote = MemoryRemote::new("/files")
        .with_file("gone.csv", b"x")
        .vanishing("gone.csv");

    let error = run_with_source(
        &mut remote,
        &config(vec![first, second.clone()]),
        &timestamp(),
        &RunOptions::new(),
    )
    .expect_err("vanished file");

    assert_eq!(error.exit_code(), ExitCode::Transfer);
    assert!(error.to_message().to_string().contains("/files/gone.csv"));
    // The second destination is never reached.
    assert_eq!(remote.list_calls(), 1);
    assert!(entry_names(&second).unwrap().is_empty());
}

#[test]
fn keep_going_reports_partial_transfer_with_summary() {
    let workspace = Workspace::new().expect("workspace");
    let share = workspace.subdir("share").unwrap();
    let mut remote = MemoryRemote::new("/files")
        .with_file("gone.csv", b"x")
        .with_file("fine.csv", b"ok")
        .vanishing("gone.csv");

    let error = run_with_source(
        &mut remote,
        &config(vec![share.clone()]),
        &timestamp(),
        &RunOptions::new().keep_going(true),
    )
    .expect_err("partial transfer");

    assert_eq!(error.exit_code(), ExitCode::PartialTransfer);
    assert!(matches!(error, ClientError::Partial { failed: 1, listed: 2, .. }));
    let summary = error.summary().expect("partial carries a summary");
    assert_eq!(summary.files_fetched(), 1);
    assert_eq!(summary.exit_code(), ExitCode::PartialTransfer);
    assert_eq!(fs::read(share.join("fine.csv")).unwrap(), b"ok");
}
