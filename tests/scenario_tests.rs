mod common;

use common::StubFs;
use mirrorcheck::commands::run::execute_scenarios;
use mirrorcheck::{scenarios, MirrorcheckError};
use rstest::rstest;
use std::time::Duration;

#[rstest]
#[case("random-access")]
#[case("relative-path")]
#[case("rename-file")]
#[case("rename-swap-open")]
#[case("rename-swap-closed")]
#[case("rename-dir")]
#[case("rename-dir-swap")]
fn test_scenario_passes_against_faithful_passthrough(#[case] name: &str) {
    let stub = StubFs::new();
    let opts = stub.run_options(&stub.mounter, 0xC0FFEE);

    let scenario = scenarios::find(name).expect("scenario is registered");
    scenario.run(&opts).unwrap();
}

#[rstest]
#[case("random-access")]
#[case("rename-swap-open")]
#[case("rename-swap-closed")]
fn test_corrupted_read_path_is_flagged_as_divergence(#[case] name: &str) {
    let stub = StubFs::new();
    let opts = stub.run_options(&stub.corrupting_mounter, 0xC0FFEE);

    let scenario = scenarios::find(name).expect("scenario is registered");
    let err = scenario.run(&opts).unwrap_err();

    assert!(
        matches!(err, MirrorcheckError::Divergence { .. }),
        "expected divergence, got: {}",
        err
    );
    let message = err.to_string();
    assert!(message.contains(name));
    assert!(message.contains(&format!("seed {}", 0xC0FFEE)));
}

#[test]
fn test_rename_not_reaching_source_is_flagged() {
    // The shadow mounter serves byte-identical reads but applies renames to
    // its private copy, so the new name never appears on the source tree.
    let stub = StubFs::new();
    let opts = stub.run_options(&stub.shadow_mounter, 1);

    let scenario = scenarios::find("rename-file").unwrap();
    let err = scenario.run(&opts).unwrap_err();

    assert!(matches!(err, MirrorcheckError::Divergence { .. }));
    assert!(err.to_string().contains("file3"));
}

#[test]
fn test_filesystem_that_never_mounts_is_a_mount_error() {
    let stub = StubFs::new();
    let mut opts = stub.run_options(&stub.silent_mounter, 1);
    opts.ready_timeout = Duration::from_millis(300);

    let scenario = scenarios::find("random-access").unwrap();
    let err = scenario.run(&opts).unwrap_err();

    assert!(matches!(err, MirrorcheckError::Mount(_)));
    assert!(err.to_string().contains("not visible"));
}

#[test]
fn test_full_sweep_passes_and_reports_every_scenario() {
    let stub = StubFs::new();
    let opts = stub.run_options(&stub.mounter, 7);

    let report = execute_scenarios(&opts, &[]).unwrap();

    assert_eq!(report.scenarios.len(), scenarios::all().len());
    assert!(report.all_passed(), "failures: {:?}", report.scenarios);
    assert_eq!(report.seed, 7);
    assert!(report.scenarios.iter().all(|r| r.seed == 7));
}

#[test]
fn test_full_sweep_against_corrupting_filesystem_fails_everywhere() {
    let stub = StubFs::new();
    let opts = stub.run_options(&stub.corrupting_mounter, 7);

    let report = execute_scenarios(&opts, &[]).unwrap();

    // Every scenario observes the corruption one way or another; the read
    // scenarios must specifically report it as a divergence.
    assert_eq!(report.failed, report.scenarios.len());
    let random_access = report
        .scenarios
        .iter()
        .find(|r| r.scenario == "random-access")
        .unwrap();
    assert!(random_access
        .failure
        .as_deref()
        .unwrap()
        .contains("Divergence"));
}

#[test]
fn test_selected_subset_runs_in_requested_order() {
    let stub = StubFs::new();
    let opts = stub.run_options(&stub.mounter, 3);

    let report = execute_scenarios(
        &opts,
        &["rename-file".to_string(), "random-access".to_string()],
    )
    .unwrap();

    let names: Vec<_> = report.scenarios.iter().map(|r| r.scenario.as_str()).collect();
    assert_eq!(names, vec!["rename-file", "random-access"]);
    assert!(report.all_passed());
}

#[test]
fn test_same_seed_reproduces_the_same_divergence() {
    let stub = StubFs::new();
    let opts = stub.run_options(&stub.corrupting_mounter, 99);

    let scenario = scenarios::find("random-access").unwrap();
    let first = scenario.run(&opts).unwrap_err().to_string();
    let second = scenario.run(&opts).unwrap_err().to_string();

    assert_eq!(first, second);
}
