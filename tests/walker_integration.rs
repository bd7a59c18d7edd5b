//! Walker dispatch: direct walkers, the generic walk and pretty printing

mod common;

use common::builders::*;
use common::{fixture_session, locator_session, rendered};
use sdb_rs::pipeline::PipelineError;

fn task_pids(session: &sdb_rs::Session, walk: &[&str]) -> Vec<String> {
    let mut stages = walk.to_vec();
    stages.extend(["cast struct task *", "member pid"]);
    rendered(&session.eval(Vec::new(), &stages).unwrap())
}

#[test]
fn test_generic_walk_matches_direct_walkers() {
    let (session, _) = fixture_session();
    for (root, walker) in [("foo_list", "list"), ("foo_tree", "avl")] {
        let addr = format!("addr {}", root);
        let direct = session.eval(Vec::new(), &[addr.as_str(), walker]).unwrap();
        let generic = session.eval(Vec::new(), &[addr.as_str(), "walk"]).unwrap();
        assert_eq!(rendered(&direct), rendered(&generic), "{}", walker);
        assert_eq!(rendered(&direct), void_pointers(&FOOS));
    }
}

#[test]
fn test_generic_walk_on_unregistered_type() {
    let (session, out) = fixture_session();
    let err = session
        .eval(Vec::new(), &["addr foo_list", "list", "walk"])
        .unwrap_err();
    assert!(matches!(err, PipelineError::NoWalker { ref actual } if actual == "void *"));

    // Only the walker listing is printed, no objects.
    let listing = out.lines();
    assert_eq!(listing[0], "The following types have walkers:");
    assert!(listing.iter().any(|l| l.contains("list_t *")));
    assert!(!listing.iter().any(|l| l.contains("0x2000")));
}

#[test]
fn test_walk_without_input_lists_walkers() {
    let (session, out) = fixture_session();
    session.run("walk").unwrap();
    let lines = out.lines();
    assert_eq!(lines[0], "The following types have walkers:");
    assert_eq!(lines.len(), 2 + 4);
    assert!(lines.contains(&format!("\t{:<20} {:<20}", "avl", "avl_tree_t *")));
}

#[test]
fn test_avl_walk_is_in_order() {
    let (session, _) = fixture_session();
    let ids = session
        .eval(
            Vec::new(),
            &["addr foo_tree", "avl", "cast struct foo *", "member id"],
        )
        .unwrap();
    assert_eq!(rendered(&ids), vec!["(int)1", "(int)2", "(int)3"]);
}

#[test]
fn test_linux_lists_with_offsets() {
    let (session, _) = fixture_session();
    assert_eq!(
        task_pids(&session, &["addr task_list", "linux_list 8"]),
        vec!["(int)10", "(int)20"]
    );
    assert_eq!(
        task_pids(&session, &["addr task_hash", "linux_hlist 0x18"]),
        vec!["(int)10", "(int)20"]
    );
}

#[test]
fn test_walker_stage_rejects_other_types() {
    let (session, _) = fixture_session();
    let tree = session.eval(Vec::new(), &["addr foo_tree"]).unwrap();
    let err = session.eval(tree, &["list"]).unwrap_err();
    assert_eq!(
        err.to_string(),
        "command \"list\" does not handle input of type avl_tree_t *"
    );
}

#[test]
fn test_pretty_print_dispatches_on_type() {
    let (session, out) = locator_session();
    session
        .run("addr foo_list | list | cast struct foo * | pp")
        .unwrap();
    assert_eq!(out.lines(), vec!["foo 1", "foo 2", "foo 3"]);

    out.clear();
    let err = session.run("addr foo_list | pp").unwrap_err();
    assert!(matches!(err, PipelineError::NoPrinter { ref actual } if actual == "list_t *"));
    assert!(out.contents().is_empty());
}

#[test]
fn test_pretty_print_without_input_lists_printers() {
    let (session, out) = locator_session();
    session.run("pretty_print").unwrap();
    assert_eq!(
        out.lines(),
        vec![
            "The following types have pretty-printers:".to_string(),
            format!("\t{:<20} {:<20}", "PRINTER", "TYPE"),
            format!("\t{:<20} {:<20}", "foo", "struct foo *"),
        ]
    );
}
