use super::support::{dated_file, leaf_names, repository, source_with, FIVE_DATES};
use chronofold::naming::validate_chain;
use chronofold::organize::{OrganizeOptions, Organizer};
use chronofold::tree::FileGraph;
use chronofold::{CheckReport, Checker, FileDateExtractor, Fixer, Repository, Violation};
use std::fs;
use tempfile::TempDir;

/// Repository holding the five-file scenario, organized with threshold 1
fn organized() -> (TempDir, Repository) {
    let (dir, repo) = repository(1);
    let source = source_with(&FIVE_DATES);
    let mut graph = FileGraph::open(repo.root()).unwrap();
    Organizer::new(&mut graph, &FileDateExtractor::new(), repo.threshold())
        .organize(source.path(), &OrganizeOptions::default(), &mut |_| {})
        .unwrap();
    (dir, repo)
}

fn check(repo: &Repository) -> (FileGraph, CheckReport) {
    let graph = FileGraph::scan(repo.root()).unwrap();
    let report = Checker::new(&graph, &FileDateExtractor::new(), repo.threshold())
        .check_all(&mut |_| {})
        .unwrap();
    (graph, report)
}

fn repair(repo: &Repository) -> chronofold::consistency::FixReport {
    let (mut graph, report) = check(repo);
    Fixer::new(&mut graph, &FileDateExtractor::new(), repo.threshold())
        .fix(&report, &mut |_| {})
        .unwrap()
}

#[test]
fn organized_repository_is_clean() {
    let (_dir, repo) = organized();
    let (graph, report) = check(&repo);
    assert!(report.is_clean(), "{:?}", report);
    // root plus every folder of 2010, 2021, 2023/{feb,märz/{17,21}}
    assert_eq!(report.folders_checked(), 8);
    assert_eq!(graph.total_files(), 5);
}

#[test]
fn locate_chains_are_valid() {
    let (_dir, repo) = organized();
    let graph = FileGraph::scan(repo.root()).unwrap();
    for leaf in graph.leaves() {
        let chain = graph.name_chain(leaf).unwrap();
        assert!(validate_chain(&chain), "{:?}", chain);
    }
    assert!(!validate_chain(&["", "2010", "2010_asdf"]));
    assert!(!validate_chain(&["2010", "2010_jul"]));
}

#[test]
fn injected_file_overflows_once_and_is_split() {
    let (dir, repo) = organized();
    dated_file(&dir.path().join("2010"), "2010-07-17-20-00-00");

    let (graph, report) = check(&repo);
    assert_eq!(report.total(), 1, "{:?}", report);
    let year = graph.find(&graph.root_path().join("2010")).unwrap();
    assert!(report.contains(Violation::FolderAboveThreshold, year));

    let fix = repair(&repo);
    assert_eq!(fix.found, 1);
    assert_eq!(fix.fixed, 1);
    assert_eq!(fix.reorganized, 1);

    let (graph, after) = check(&repo);
    assert!(after.is_clean(), "{:?}", after);
    assert_eq!(graph.total_files(), 6);
    let leaves = leaf_names(&graph);
    assert!(leaves.contains(&"2010_jul_17_19h".to_string()));
    assert!(leaves.contains(&"2010_jul_17_20h".to_string()));
}

#[test]
fn stray_empty_folder_is_removed() {
    let (dir, repo) = organized();
    let stray = dir.path().join("2023").join("el_wiwi");
    fs::create_dir(&stray).unwrap();

    let (graph, report) = check(&repo);
    let node = graph
        .find(&graph.root_path().join("2023").join("el_wiwi"))
        .unwrap();
    assert!(report.contains(Violation::InvalidFolderName, node));
    assert!(report.contains(Violation::CanBeReduced, node));

    let fix = repair(&repo);
    assert!(fix.restored.is_empty());
    assert!(!stray.exists());

    let (_, after) = check(&repo);
    assert!(after.is_clean(), "{:?}", after);
}

#[test]
fn misnamed_folder_is_renamed() {
    let (dir, repo) = organized();
    fs::rename(dir.path().join("2021"), dir.path().join("2021_x")).unwrap();

    let (_, report) = check(&repo);
    assert!(report.count(Violation::InvalidFolderName) >= 1);

    let fix = repair(&repo);
    assert_eq!(fix.restored.len(), 1);
    assert!(dir.path().join("2021").is_dir());
    assert!(!dir.path().join("2021_x").exists());

    let (_, after) = check(&repo);
    assert!(after.is_clean(), "{:?}", after);
}

#[test]
fn missing_error_folder_is_recreated() {
    let (_dir, repo) = organized();
    fs::remove_dir(repo.error_folder()).unwrap();

    let (graph, report) = check(&repo);
    assert!(report.contains(Violation::ErrorFolderMissing, graph.root()));
    assert_eq!(report.total(), 1);

    let fix = repair(&repo);
    assert!(fix.error_folder_created);
    assert!(repo.error_folder().is_dir());

    let (_, after) = check(&repo);
    assert!(after.is_clean());
}
