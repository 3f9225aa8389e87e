//! The run exits with `0` exactly when every executed case passed.

use gravitas::{bootstrap, Bootstrap};
use rstest::rstest;
use test_utils::{assert_all_present, registry_from, CaseSpec};

fn boot(args: &[&str]) -> Bootstrap {
    let args: Vec<String> = args.iter().map(ToString::to_string).collect();
    bootstrap(&args).expect("bootstrap")
}

#[rstest]
#[case::empty(&[], 0)]
#[case::single_pass(&[("A", "ok", true)], 0)]
#[case::all_pass(&[("A", "one", true), ("B", "two", true), ("B", "three", true)], 0)]
#[case::single_fail(&[("A", "bad", false)], 1)]
#[case::fail_first(&[("A", "bad", false), ("A", "ok", true)], 1)]
#[case::fail_last(&[("A", "ok", true), ("B", "bad", false)], 1)]
fn exit_status_reflects_every_case(#[case] cases: &[CaseSpec<'_>], #[case] expected: u8) {
    let registry = registry_from(cases).expect("registry");
    let mut out = Vec::new();
    let summary = boot(&["prog"]).run(&registry, &mut out).expect("run");

    assert_eq!(summary.cases.len(), cases.len());
    assert_eq!(summary.exit_status(), expected);
    assert_eq!(summary.all_passed(), expected == 0);
}

#[test]
fn a_failure_in_any_iteration_fails_the_run() {
    let registry = registry_from(&[("A", "ok", true), ("A", "bad", false)]).expect("registry");
    let mut out = Vec::new();
    let summary = boot(&["prog", "--test-repeat=3"])
        .run(&registry, &mut out)
        .expect("run");

    assert_eq!(summary.iterations, 3);
    assert_eq!(summary.cases.len(), 6);
    assert_eq!(summary.failures().count(), 3);
    assert_eq!(summary.exit_status(), 1);
    assert_all_present(
        &String::from_utf8_lossy(&out),
        &["Repeating all tests (iteration 3)", "A.bad was told to fail"],
    );
}

#[test]
fn filtered_out_failures_do_not_count() {
    let registry = registry_from(&[("A", "ok", true), ("A", "bad", false)]).expect("registry");
    let mut out = Vec::new();
    let summary = boot(&["prog", "--test-filter=*-A.bad"])
        .run(&registry, &mut out)
        .expect("run");

    assert_eq!(summary.cases.len(), 1);
    assert_eq!(summary.exit_status(), 0);
}
