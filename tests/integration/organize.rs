use super::support::{
    dated_file, file_name, files_on_disk, leaf_names, repository, source_with, FIVE_DATES,
};
use chronofold::organize::{OrganizeOptions, Organizer, ReorganizePolicy};
use chronofold::tree::FileGraph;
use chronofold::{Checker, FileDateExtractor, TransferMode};
use proptest::prelude::*;
use std::collections::BTreeSet;

#[test]
fn five_files_with_threshold_one() {
    let (dir, repo) = repository(1);
    let source = source_with(&FIVE_DATES);
    let dates = FileDateExtractor::new();
    let mut graph = FileGraph::open(repo.root()).unwrap();

    let mut ticks = Vec::new();
    let report = Organizer::new(&mut graph, &dates, repo.threshold())
        .organize(source.path(), &OrganizeOptions::default(), &mut |n| ticks.push(n))
        .unwrap();

    assert_eq!(report.placed, 5);
    assert_eq!(ticks, vec![1, 2, 3, 4, 5]);
    assert_eq!(
        leaf_names(&graph),
        vec!["2010", "2021", "2023_feb", "2023_märz_17", "2023_märz_21"]
    );
    assert_eq!(graph.total_files(), 5);
    for id in graph.leaves() {
        assert_eq!(graph.node(id).unwrap().file_count, 1);
    }
    assert!(dir
        .path()
        .join("2023")
        .join("2023_märz")
        .join("2023_märz_17")
        .join(file_name("2023-03-17-22-13-03"))
        .is_file());
    // copies leave the source alone
    assert_eq!(files_on_disk(source.path()), 5);

    let check = Checker::new(&graph, &dates, repo.threshold())
        .check_all(&mut |_| {})
        .unwrap();
    assert!(check.is_clean(), "{:?}", check);
}

#[test]
fn move_mode_empties_the_source() {
    let (dir, repo) = repository(10);
    let source = source_with(&FIVE_DATES);
    let dates = FileDateExtractor::new();
    let mut graph = FileGraph::open(repo.root()).unwrap();
    let options = OrganizeOptions {
        mode: TransferMode::Move,
        ..OrganizeOptions::default()
    };

    Organizer::new(&mut graph, &dates, repo.threshold())
        .organize(source.path(), &options, &mut |_| {})
        .unwrap();

    assert_eq!(files_on_disk(source.path()), 0);
    assert_eq!(files_on_disk(dir.path()), 5);
    assert_eq!(leaf_names(&graph), vec!["2010", "2021", "2023"]);
}

#[test]
fn deferred_policy_reaches_the_same_leaves() {
    let (_dir, repo) = repository(1);
    let source = source_with(&FIVE_DATES);
    let dates = FileDateExtractor::new();
    let mut graph = FileGraph::open(repo.root()).unwrap();
    let options = OrganizeOptions {
        policy: ReorganizePolicy::Deferred,
        ..OrganizeOptions::default()
    };

    Organizer::new(&mut graph, &dates, repo.threshold())
        .organize(source.path(), &options, &mut |_| {})
        .unwrap();
    assert_eq!(
        leaf_names(&graph),
        vec!["2010", "2021", "2023_feb", "2023_märz_17", "2023_märz_21"]
    );
}

#[test]
fn extension_filter_skips_other_files() {
    let (dir, repo) = repository(10);
    let source = source_with(&FIVE_DATES[..2]);
    std::fs::write(source.path().join("notes_2020-01-01-00-00-00.txt"), "n").unwrap();
    let dates = FileDateExtractor::new();
    let mut graph = FileGraph::open(repo.root()).unwrap();
    let options = OrganizeOptions {
        extensions: vec!["JPG".to_string()],
        ..OrganizeOptions::default()
    };

    let report = Organizer::new(&mut graph, &dates, repo.threshold())
        .organize(source.path(), &options, &mut |_| {})
        .unwrap();
    assert_eq!(report.files, 2);
    assert_eq!(files_on_disk(dir.path()), 2);
}

#[test]
fn organizing_twice_skips_existing_copies() {
    let (dir, repo) = repository(10);
    let source = source_with(&FIVE_DATES);
    let dates = FileDateExtractor::new();
    let mut graph = FileGraph::open(repo.root()).unwrap();
    let mut organizer = Organizer::new(&mut graph, &dates, repo.threshold());

    organizer
        .organize(source.path(), &OrganizeOptions::default(), &mut |_| {})
        .unwrap();
    let again = organizer
        .organize(source.path(), &OrganizeOptions::default(), &mut |_| {})
        .unwrap();
    assert_eq!(again.placed, 0);
    assert_eq!(again.skipped, 5);
    assert_eq!(files_on_disk(dir.path()), 5);
    assert_eq!(organizer.graph().total_files(), 5);
}

#[test]
fn same_name_and_date_is_replaced_on_request() {
    let (dir, repo) = repository(10);
    let first = tempfile::TempDir::new().unwrap();
    let second = tempfile::TempDir::new().unwrap();
    dated_file(first.path(), "2020-05-05-10-00-00");
    dated_file(second.path(), "2020-05-05-10-00-00");
    let dates = FileDateExtractor::new();
    let mut graph = FileGraph::open(repo.root()).unwrap();
    let mut organizer = Organizer::new(&mut graph, &dates, repo.threshold());

    organizer
        .organize(first.path(), &OrganizeOptions::default(), &mut |_| {})
        .unwrap();
    // same name and same date: a true duplicate, replaced only on request
    let report = organizer
        .organize(
            second.path(),
            &OrganizeOptions {
                mode: TransferMode::CopyReplace,
                ..OrganizeOptions::default()
            },
            &mut |_| {},
        )
        .unwrap();
    assert_eq!(report.replaced, 1);
    assert_eq!(files_on_disk(dir.path()), 1);
}

fn timestamp_set(max: usize) -> impl Strategy<Value = BTreeSet<(u32, u32, u32, u32, u32)>> {
    prop::collection::btree_set((1u32..=12, 1u32..=28, 0u32..24, 0u32..60, 0u32..60), 1..=max)
}

fn date_string(year: i32, (mo, d, h, mi, s): (u32, u32, u32, u32, u32)) -> String {
    format!("{}-{:02}-{:02}-{:02}-{:02}-{:02}", year, mo, d, h, mi, s)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    #[test]
    fn no_split_while_files_fit(stamps in timestamp_set(8)) {
        let dates: Vec<String> = stamps.iter().map(|t| date_string(2015, *t)).collect();
        let refs: Vec<&str> = dates.iter().map(String::as_str).collect();
        let (_dir, repo) = repository(dates.len());
        let source = source_with(&refs);
        let extractor = FileDateExtractor::new();
        let mut graph = FileGraph::open(repo.root()).unwrap();

        Organizer::new(&mut graph, &extractor, repo.threshold())
            .organize(source.path(), &OrganizeOptions::default(), &mut |_| {})
            .unwrap();
        prop_assert_eq!(leaf_names(&graph), vec!["2015".to_string()]);
        prop_assert_eq!(graph.total_files(), dates.len());
    }

    #[test]
    fn split_conserves_files(stamps in timestamp_set(10), threshold in 1usize..4) {
        let dates: Vec<String> = stamps.iter().map(|t| date_string(2016, *t)).collect();
        let refs: Vec<&str> = dates.iter().map(String::as_str).collect();
        let (dir, repo) = repository(100);
        let source = source_with(&refs);
        let extractor = FileDateExtractor::new();
        let mut graph = FileGraph::open(repo.root()).unwrap();
        Organizer::new(&mut graph, &extractor, repo.threshold())
            .organize(source.path(), &OrganizeOptions::default(), &mut |_| {})
            .unwrap();
        let year = graph.find(&graph.root_path().join("2016")).unwrap();

        Organizer::new(&mut graph, &extractor, threshold).reorganize(year).unwrap();

        if dates.len() > threshold {
            prop_assert_eq!(graph.node(year).unwrap().file_count, 0);
        }
        prop_assert_eq!(graph.total_files(), dates.len());
        prop_assert_eq!(files_on_disk(dir.path()), dates.len());
        for id in graph.leaves() {
            prop_assert!(graph.node(id).unwrap().file_count <= threshold);
        }
    }

    #[test]
    fn split_then_reduce_restores_one_folder(stamps in timestamp_set(6)) {
        let dates: Vec<String> = stamps.iter().map(|t| date_string(2017, *t)).collect();
        let refs: Vec<&str> = dates.iter().map(String::as_str).collect();
        let (_dir, repo) = repository(100);
        let source = source_with(&refs);
        let extractor = FileDateExtractor::new();
        let mut graph = FileGraph::open(repo.root()).unwrap();
        Organizer::new(&mut graph, &extractor, repo.threshold())
            .organize(source.path(), &OrganizeOptions::default(), &mut |_| {})
            .unwrap();
        let year = graph.find(&graph.root_path().join("2017")).unwrap();

        Organizer::new(&mut graph, &extractor, 1).reorganize(year).unwrap();
        Organizer::new(&mut graph, &extractor, dates.len()).reduce().unwrap();

        prop_assert_eq!(leaf_names(&graph), vec!["2017".to_string()]);
        let node = graph.node(year).unwrap();
        prop_assert!(node.leaf);
        prop_assert_eq!(node.file_count, dates.len());
    }
}
