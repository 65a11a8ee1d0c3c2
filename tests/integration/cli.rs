use super::support::{context, source_with, FIVE_DATES};
use chronofold::report::{CheckOutput, RepairOutput, StatusOutput};
use chronofold::tooling::{Cli, Commands};
use chronofold::{ApiError, Repository};
use clap::Parser;
use std::path::PathBuf;
use tempfile::TempDir;

fn parse(args: &[&str]) -> Result<Cli, clap::Error> {
    Cli::try_parse_from(std::iter::once("chronofold").chain(args.iter().copied()))
}

#[test]
fn test_parse_accepts_valid_arguments() {
    let cases: &[&[&str]] = &[
        &["init"],
        &["init", "250"],
        &["organize", "/tmp/in"],
        &["organize", "/tmp/in", "--move", "--replace", "--ext", "jpg", "--ext", "png"],
        &["organize", "/tmp/in", "--ignore-mark", "--deferred"],
        &["status"],
        &["status", "--format", "json"],
        &["set", "folderSize=10"],
        &["delete", "-y"],
        &["check", "--format", "json"],
        &["repair"],
        &["mark"],
        &["--repository", "/srv/photos", "-v", "check"],
        &["--log-level", "trace", "--log-output", "file+stderr", "status"],
    ];
    for args in cases {
        assert!(parse(args).is_ok(), "rejected {:?}", args);
    }
}

#[test]
fn test_parse_rejects_invalid_arguments() {
    let cases: &[&[&str]] = &[
        &[],
        &["init", "0"],
        &["init", "-3"],
        &["init", "many"],
        &["organize"],
        &["status", "--format", "xml"],
        &["check", "--format", "yaml"],
        &["set"],
        &["frobnicate"],
    ];
    for args in cases {
        assert!(parse(args).is_err(), "accepted {:?}", args);
    }
}

#[test]
fn test_parse_fills_organize_flags() {
    let cli = parse(&["--repository", "/srv/photos", "organize", "in", "--move", "--ext", "jpg"])
        .unwrap();
    assert_eq!(cli.repository, PathBuf::from("/srv/photos"));
    match cli.command {
        Commands::Organize {
            source,
            move_files,
            replace,
            extensions,
            ignore_mark,
            deferred,
        } => {
            assert_eq!(source, PathBuf::from("in"));
            assert!(move_files);
            assert!(!replace);
            assert_eq!(extensions, vec!["jpg".to_string()]);
            assert!(!ignore_mark);
            assert!(!deferred);
        }
        _ => panic!("expected organize"),
    }
}

#[test]
fn test_verbose_overrides_logging() {
    let cli = parse(&["-v", "--log-format", "json", "status"]).unwrap();
    let logging = cli.logging_config(&Default::default());
    assert_eq!(logging.level, "debug");
    assert_eq!(logging.output, "stderr");
    assert_eq!(logging.format, "json");
}

#[test]
fn test_commands_require_a_repository() {
    let dir = TempDir::new().unwrap();
    let mut ctx = context(dir.path());

    let err = ctx
        .execute(&Commands::Check {
            format: "text".to_string(),
        })
        .unwrap_err();
    assert!(matches!(err, ApiError::NotARepository(_)));

    let status = ctx
        .execute(&Commands::Status {
            format: "json".to_string(),
        })
        .unwrap();
    let status: StatusOutput = serde_json::from_str(&status).unwrap();
    assert!(!status.initialized);
    assert!(status.stats.is_none());
}

#[test]
fn test_full_command_flow() {
    let dir = TempDir::new().unwrap();
    let source = source_with(&FIVE_DATES);
    let mut ctx = context(dir.path());

    ctx.execute(&Commands::Init {
        folder_size: Some(1),
    })
    .unwrap();
    let again = ctx.execute(&Commands::Init { folder_size: None }).unwrap_err();
    assert!(matches!(again, ApiError::AlreadyInitialized(_)));

    ctx.execute(&Commands::Organize {
        source: source.path().to_path_buf(),
        move_files: false,
        replace: false,
        extensions: Vec::new(),
        ignore_mark: false,
        deferred: false,
    })
    .unwrap();

    let status = ctx
        .execute(&Commands::Status {
            format: "json".to_string(),
        })
        .unwrap();
    let status: StatusOutput = serde_json::from_str(&status).unwrap();
    assert!(status.initialized);
    assert!(status.valid);
    assert_eq!(status.properties.unwrap().folder_size, 1);
    assert_eq!(status.stats.unwrap().files, 5);

    let check = ctx
        .execute(&Commands::Check {
            format: "json".to_string(),
        })
        .unwrap();
    let check: CheckOutput = serde_json::from_str(&check).unwrap();
    assert_eq!(check.total, 0);
    assert_eq!(check.folders_checked, 8);

    let repair = ctx
        .execute(&Commands::Repair {
            format: "text".to_string(),
        })
        .unwrap();
    assert!(repair.contains("Nothing to repair."));

    // a larger threshold leaves every split folder reducible
    let set = ctx
        .execute(&Commands::Set {
            properties: vec!["folderSize=10".to_string()],
        })
        .unwrap();
    assert!(set.contains("folderSize=10"));
    assert_eq!(Repository::open(dir.path()).unwrap().threshold(), 10);

    let repair = ctx
        .execute(&Commands::Repair {
            format: "json".to_string(),
        })
        .unwrap();
    let repair: RepairOutput = serde_json::from_str(&repair).unwrap();
    assert!(repair.found > 0);
    assert_eq!(repair.fixed, repair.found);
    assert_eq!(repair.remaining, 0);
    assert!(dir.path().join("2023").join("IMG_2023-02-03-02-31-30.jpg").is_file());

    let mark = ctx.execute(&Commands::Mark).unwrap();
    assert!(mark.starts_with("Marked 5 files"));

    ctx.execute(&Commands::Delete { yes: true }).unwrap();
    assert!(!Repository::is_valid(dir.path()));
    assert!(dir.path().join("2010").is_dir());
}

#[test]
fn test_set_rejects_unknown_property() {
    let dir = TempDir::new().unwrap();
    Repository::init(dir.path(), None).unwrap();
    let mut ctx = context(dir.path());

    let err = ctx
        .execute(&Commands::Set {
            properties: vec!["colour=blue".to_string()],
        })
        .unwrap_err();
    assert!(matches!(err, ApiError::InvalidProperty(_)));
    assert_eq!(Repository::open(dir.path()).unwrap().threshold(), 1000);
}
