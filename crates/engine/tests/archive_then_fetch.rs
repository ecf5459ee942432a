//! Archive-then-fetch behaviour against an in-memory remote.

use std::fs;

use engine::FetchError;
use engine::fetch::{Destination, FetchOptions, fetch_into};
use engine::timestamp::RunTimestamp;
use test_support::{MemoryRemote, Workspace, entry_names, write_file};
use transport::TransferError;
use time::macros::datetime;

fn first_run() -> RunTimestamp {
    RunTimestamp::from_datetime(datetime!(2019-01-11 06:30:00 UTC)).expect("format")
}

fn second_run() -> RunTimestamp {
    RunTimestamp::from_datetime(datetime!(2019-01-12 06:30:00 UTC)).expect("format")
}

#[test]
fn first_fetch_lands_file_without_archiving() {
    let workspace = Workspace::new().expect("workspace");
    let destination = Destination::new(workspace.path(), "Archive");
    let mut remote = MemoryRemote::new("/files").with_file("report.csv", b"a,b\n1,2\n");

    let report = fetch_into(&mut remote, &destination, &first_run(), &FetchOptions::new("/files"))
        .expect("fetch succeeds");

    assert_eq!(fs::read(workspace.path().join("report.csv")).unwrap(), b"a,b\n1,2\n");
    assert!(entry_names(destination.archive_dir()).unwrap().is_empty());
    assert_eq!(report.files().len(), 1);
    assert_eq!(report.archived_count(), 0);
    assert_eq!(report.total_bytes(), 8);
    assert!(report.archive_warnings().is_empty());
}

#[test]
fn existing_file_is_archived_with_run_timestamp_before_overwrite() {
    let workspace = Workspace::new().expect("workspace");
    let destination = Destination::new(workspace.path(), "Archive");
    write_file(&workspace.path().join("report.csv"), b"OLD").unwrap();
    let mut remote = MemoryRemote::new("/files").with_file("report.csv", b"NEW");

    let report = fetch_into(&mut remote, &destination, &first_run(), &FetchOptions::new("/files"))
        .expect("fetch succeeds");

    assert_eq!(fs::read(workspace.path().join("report.csv")).unwrap(), b"NEW");
    assert_eq!(
        entry_names(destination.archive_dir()).unwrap(),
        vec!["20190111-063000_report.csv".to_owned()]
    );
    assert_eq!(
        fs::read(destination.archive_dir().join("20190111-063000_report.csv")).unwrap(),
        b"OLD"
    );
    assert_eq!(report.archived_count(), 1);
}

#[test]
fn failed_listing_touches_nothing() {
    let workspace = Workspace::new().expect("workspace");
    let destination = Destination::new(workspace.path(), "Archive");
    write_file(&workspace.path().join("report.csv"), b"OLD").unwrap();
    let mut remote = MemoryRemote::new("/files")
        .with_file("report.csv", b"NEW")
        .failing_listing("connection dropped");

    let error = fetch_into(&mut remote, &destination, &first_run(), &FetchOptions::new("/files"))
        .expect_err("listing fails");

    assert!(matches!(error, FetchError::List(_)));
    assert!(remote.downloads().is_empty());
    assert_eq!(fs::read(workspace.path().join("report.csv")).unwrap(), b"OLD");
    assert!(!destination.archive_dir().exists());
}

#[test]
fn rerunning_unchanged_remote_yields_one_archive_entry_per_run() {
    let workspace = Workspace::new().expect("workspace");
    let destination = Destination::new(workspace.path(), "Archive");
    write_file(&workspace.path().join("report.csv"), b"PRE-EXISTING").unwrap();
    let mut remote = MemoryRemote::new("/files").with_file("report.csv", b"REMOTE");
    let options = FetchOptions::new("/files");

    fetch_into(&mut remote, &destination, &first_run(), &options).expect("first run");
    fetch_into(&mut remote, &destination, &second_run(), &options).expect("second run");

    assert_eq!(fs::read(workspace.path().join("report.csv")).unwrap(), b"REMOTE");
    assert_eq!(
        entry_names(destination.archive_dir()).unwrap(),
        vec![
            "20190111-063000_report.csv".to_owned(),
            "20190112-063000_report.csv".to_owned(),
        ]
    );
    assert_eq!(
        fs::read(destination.archive_dir().join("20190112-063000_report.csv")).unwrap(),
        b"REMOTE"
    );
}

#[test]
fn files_are_fetched_in_listing_order() {
    let workspace = Workspace::new().expect("workspace");
    let destination = Destination::new(workspace.path(), "Archive");
    let mut remote = MemoryRemote::new("/files")
        .with_file("zeta.txt", b"z")
        .with_file("alpha.txt", b"a")
        .with_file("mid.txt", b"m");

    let report = fetch_into(&mut remote, &destination, &first_run(), &FetchOptions::new("/files"))
        .expect("fetch succeeds");

    assert_eq!(
        remote.downloads(),
        ["/files/zeta.txt", "/files/alpha.txt", "/files/mid.txt"]
    );
    let names: Vec<_> = report.files().iter().map(|f| f.name()).collect();
    assert_eq!(names, ["zeta.txt", "alpha.txt", "mid.txt"]);
}

#[test]
fn vanished_file_aborts_by_default_and_leaves_no_partial_file() {
    let workspace = Workspace::new().expect("workspace");
    let destination = Destination::new(workspace.path(), "Archive");
    let mut remote = MemoryRemote::new("/files")
        .with_file("first.csv", b"1")
        .with_file("gone.csv", b"2")
        .with_file("third.csv", b"3")
        .vanishing("gone.csv");

    let error = fetch_into(&mut remote, &destination, &first_run(), &FetchOptions::new("/files"))
        .expect_err("vanished file is fatal");

    match error {
        FetchError::Transfer(transfer) => {
            assert!(transfer.is_remote_missing());
            assert_eq!(transfer.remote_path(), "/files/gone.csv");
        }
        other => panic!("expected transfer error, got {other:?}"),
    }
    assert_eq!(entry_names(workspace.path()).unwrap(), vec!["first.csv".to_owned()]);
}

#[test]
fn keep_going_records_failures_and_fetches_the_rest() {
    let workspace = Workspace::new().expect("workspace");
    let destination = Destination::new(workspace.path(), "Archive");
    write_file(&workspace.path().join("broken.csv"), b"KEEP ME").unwrap();
    let mut remote = MemoryRemote::new("/files")
        .with_file("broken.csv", b"never arrives")
        .with_file("fine.csv", b"ok")
        .breaking("broken.csv");

    let report = fetch_into(
        &mut remote,
        &destination,
        &first_run(),
        &FetchOptions::new("/files").keep_going(true),
    )
    .expect("keep-going does not abort");

    assert!(!report.is_complete());
    assert_eq!(report.transfer_failures().len(), 1);
    assert_eq!(fs::read(workspace.path().join("fine.csv")).unwrap(), b"ok");
    // The previous copy was archived before the failed download started.
    assert_eq!(
        fs::read(destination.archive_dir().join("20190111-063000_broken.csv")).unwrap(),
        b"KEEP ME"
    );
    assert!(!workspace.path().join("broken.csv").exists());
    let leftovers: Vec<_> = entry_names(workspace.path())
        .unwrap()
        .into_iter()
        .filter(|name| name.starts_with('.'))
        .collect();
    assert!(leftovers.is_empty(), "temporary files left behind: {leftovers:?}");
}

#[test]
fn archive_failure_is_a_warning_and_fetch_still_happens() {
    let workspace = Workspace::new().expect("workspace");
    write_file(&workspace.path().join("report.csv"), b"OLD").unwrap();
    write_file(&workspace.path().join("Archive"), b"a file where the archive dir should be").unwrap();
    let destination = Destination::new(workspace.path(), "Archive");
    let mut remote = MemoryRemote::new("/files").with_file("report.csv", b"NEW");

    let report = fetch_into(&mut remote, &destination, &first_run(), &FetchOptions::new("/files"))
        .expect("archive failures are not fatal");

    assert_eq!(report.archive_warnings().len(), 1);
    assert_eq!(report.archived_count(), 0);
    assert_eq!(fs::read(workspace.path().join("report.csv")).unwrap(), b"NEW");
}

#[test]
fn unsafe_remote_names_are_refused() {
    let workspace = Workspace::new().expect("workspace");
    let destination = Destination::new(workspace.subdir("share").unwrap(), "Archive");
    let mut remote = MemoryRemote::new("/files").with_file("..", b"escape");

    let error = fetch_into(&mut remote, &destination, &first_run(), &FetchOptions::new("/files"))
        .expect_err("traversal refused");

    assert!(matches!(error, FetchError::Transfer(_)));
    assert!(remote.downloads().is_empty());
}

#[test]
fn entry_named_like_the_archive_directory_is_skipped_and_the_rest_fetched() {
    let workspace = Workspace::new().expect("workspace");
    let destination = Destination::new(workspace.path(), "Archive");
    write_file(&workspace.path().join("a.csv"), b"OLD").unwrap();
    let mut remote = MemoryRemote::new("/files")
        .with_file("a.csv", b"A")
        .with_file("Archive", b"clash")
        .with_file("z.csv", b"Z");

    let report = fetch_into(&mut remote, &destination, &first_run(), &FetchOptions::new("/files"))
        .expect("collision is recorded, not fatal");

    assert_eq!(report.files().len(), 2);
    assert_eq!(report.transfer_failures().len(), 1);
    assert!(matches!(
        &report.transfer_failures()[0],
        TransferError::ArchiveCollision { remote_path, .. } if remote_path == "/files/Archive"
    ));
    assert!(!report.is_complete());
    assert_eq!(fs::read(workspace.path().join("z.csv")).unwrap(), b"Z");
    assert!(destination.archive_dir().is_dir());
    assert_eq!(
        entry_names(destination.archive_dir()).unwrap(),
        vec!["20190111-063000_a.csv".to_owned()]
    );
    assert!(!remote.downloads().iter().any(|path| path == "/files/Archive"));
}

#[test]
fn overlong_name_keeps_its_previous_copy() {
    let workspace = Workspace::new().expect("workspace");
    let destination = Destination::new(workspace.path(), "Archive");
    let name = "x".repeat(250);
    write_file(&workspace.path().join(&name), b"OLD").unwrap();
    let mut remote = MemoryRemote::new("/files").with_file(&name, b"NEW");

    let report = fetch_into(&mut remote, &destination, &first_run(), &FetchOptions::new("/files"))
        .expect("fetch succeeds");

    assert!(report.archive_warnings().is_empty());
    assert_eq!(report.archived_count(), 1);
    assert_eq!(fs::read(workspace.path().join(&name)).unwrap(), b"NEW");
    let archived = report.files()[0].archived_to().expect("previous copy archived");
    assert_eq!(fs::read(archived).unwrap(), b"OLD");
}
