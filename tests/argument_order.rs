//! Arguments that no parser claims keep their original relative order.

use gravitas::args::split_recognized;
use gravitas::{Engine, ProcessConfiguration};
use rstest::rstest;

fn strings(args: &[&str]) -> Vec<String> {
    args.iter().map(ToString::to_string).collect()
}

/// Argument groups, each tagged with whether one of the parsers claims it.
const POOL: &[(&[&str], bool)] = &[
    (&["--test-filter", "Model3d.*"], true),
    (&["--test-brief"], true),
    (&["--minloglevel=warning"], true),
    (&["--v", "2"], true),
    (&["--alsologtostderr=false"], true),
    (&["--gtest_color=no"], false),
    (&["Optimizer.*"], false),
    (&["--benchmark"], false),
    (&["plain"], false),
];

fn unknown_in_order(order: &[usize]) -> Vec<String> {
    order
        .iter()
        .filter_map(|&i| POOL.get(i))
        .filter(|(_, recognised)| !recognised)
        .flat_map(|(tokens, _)| tokens.iter().map(ToString::to_string))
        .collect()
}

fn command_line(order: &[usize]) -> Vec<String> {
    let mut args = vec!["prog".to_owned()];
    args.extend(
        order
            .iter()
            .filter_map(|&i| POOL.get(i))
            .flat_map(|(tokens, _)| tokens.iter().map(ToString::to_string)),
    );
    args
}

fn remaining_after_both_parsers(args: &[String]) -> Vec<String> {
    let (_, after_engine) = Engine::init(args).expect("engine flags parse");
    split_recognized::<ProcessConfiguration>(&after_engine)
        .leftovers()
        .to_vec()
}

#[rstest]
#[case::pool_order(&[0, 1, 2, 3, 4, 5, 6, 7, 8])]
#[case::reversed(&[8, 7, 6, 5, 4, 3, 2, 1, 0])]
#[case::interleaved(&[5, 0, 6, 2, 7, 3, 8, 1, 4])]
#[case::unknown_first(&[8, 7, 6, 5, 0, 1, 2, 3, 4])]
#[case::unknown_last(&[4, 3, 2, 1, 0, 5, 6, 7, 8])]
#[case::no_unknown(&[0, 2, 4])]
#[case::only_unknown(&[6, 8, 5])]
fn unknown_arguments_keep_relative_order(#[case] order: &[usize]) {
    let args = command_line(order);
    assert_eq!(remaining_after_both_parsers(&args), unknown_in_order(order));
}

#[test]
fn every_rotation_preserves_order() {
    let base: Vec<usize> = (0..POOL.len()).collect();
    for shift in 0..base.len() {
        let mut order = base.clone();
        order.rotate_left(shift);
        let args = command_line(&order);
        assert_eq!(
            remaining_after_both_parsers(&args),
            unknown_in_order(&order),
            "rotation {shift}"
        );
    }
}

#[test]
fn separator_and_following_tokens_are_left_untouched() {
    let args = strings(&["prog", "--v=1", "--", "--test-brief", "x"]);
    assert_eq!(
        remaining_after_both_parsers(&args),
        strings(&["--", "--test-brief", "x"])
    );
}

#[test]
fn recognised_values_are_not_mistaken_for_unknown_arguments() {
    let args = strings(&["prog", "--test-filter", "-odd", "--log-dir", "plain"]);
    assert!(remaining_after_both_parsers(&args).is_empty());
}
