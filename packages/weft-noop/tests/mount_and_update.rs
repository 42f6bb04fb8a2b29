//! End-to-end mount and update scenarios driven through the no-op host.

use std::rc::Rc;

use weft::{host, seq, Node, Props};
use weft_noop::{init_diagnostics, HostOp, NoopHost, UnlimitedBudget};
use weft_reconciler::Reconciler;

fn widget(text: &str) -> Node {
    host("widget", Props::new().attr("text", text))
}

fn run(reconciler: &mut Reconciler) {
    reconciler.perform_low_pri_work(&UnlimitedBudget).unwrap();
}

#[test]
fn mounting_attaches_created_instances_in_order() {
    init_diagnostics();
    let noop = NoopHost::new();
    let container = noop.create_container();
    let mut reconciler = Reconciler::new(noop.clone());

    let root = reconciler.mount_container(
        seq(vec![widget("a"), widget("b")]),
        container.clone(),
    );
    // Mounting only schedules; the environment drives the loop.
    assert!(container.children.borrow().is_empty());
    run(&mut reconciler);

    assert_eq!(noop.created_count(), 2);
    assert!(!reconciler.has_pending_work(root));
    let children = container.children.borrow();
    assert_eq!(children.len(), 2);
    assert_eq!(children[0].type_name, "widget");
    assert_eq!(children[0].props.borrow().get("text"), Some(&"a".into()));
    assert_eq!(children[1].props.borrow().get("text"), Some(&"b".into()));
}

#[test]
fn updating_one_child_reuses_instances_and_touches_only_that_child() {
    let noop = NoopHost::new();
    let container = noop.create_container();
    let mut reconciler = Reconciler::new(noop.clone());

    let root = reconciler.mount_container(
        seq(vec![widget("a"), widget("b")]),
        container.clone(),
    );
    run(&mut reconciler);
    let (first_before, second_before) = {
        let children = container.children.borrow();
        (children[0].clone(), children[1].clone())
    };
    noop.take_journal();

    reconciler.update_container(seq(vec![widget("a"), widget("b!")]), root);
    run(&mut reconciler);

    // Same logical children, same host instances.
    assert_eq!(noop.created_count(), 0);
    let children = container.children.borrow();
    assert!(Rc::ptr_eq(&children[0], &first_before));
    assert!(Rc::ptr_eq(&children[1], &second_before));
    assert_eq!(children[1].props.borrow().get("text"), Some(&"b!".into()));

    // Exactly one prepare/commit pair fired, and for the changed child only.
    let journal = noop.journal();
    let prepares: Vec<_> = journal
        .iter()
        .filter_map(|op| match op {
            HostOp::PrepareUpdate { id, needs_commit } => Some((*id, *needs_commit)),
            _ => None,
        })
        .collect();
    assert_eq!(
        prepares,
        vec![(first_before.id, false), (second_before.id, true)]
    );
    let commits: Vec<_> = journal
        .iter()
        .filter_map(|op| match op {
            HostOp::CommitUpdate { id } => Some(*id),
            _ => None,
        })
        .collect();
    assert_eq!(commits, vec![second_before.id]);

    // The container reattach effect runs before the child update effect.
    let container_at = journal
        .iter()
        .position(|op| matches!(op, HostOp::UpdateContainer { .. }))
        .expect("container reattach committed");
    let update_at = journal
        .iter()
        .position(|op| matches!(op, HostOp::CommitUpdate { .. }))
        .expect("child update committed");
    assert!(container_at < update_at);
}

#[test]
fn replacing_a_child_type_creates_a_fresh_instance() {
    let noop = NoopHost::new();
    let container = noop.create_container();
    let mut reconciler = Reconciler::new(noop.clone());

    let root = reconciler.mount_container(
        seq(vec![widget("a"), widget("b")]),
        container.clone(),
    );
    run(&mut reconciler);
    let first_before = container.children.borrow()[0].clone();
    noop.take_journal();

    reconciler.update_container(
        seq(vec![host("gadget", Props::new().attr("text", "a")), widget("b")]),
        root,
    );
    run(&mut reconciler);

    assert_eq!(noop.created_count(), 1);
    let children = container.children.borrow();
    assert!(!Rc::ptr_eq(&children[0], &first_before));
    assert_eq!(children[0].type_name, "gadget");
}

#[test]
fn a_reference_identical_description_bails_out_without_effects() {
    let noop = NoopHost::new();
    let container = noop.create_container();
    let mut reconciler = Reconciler::new(noop.clone());

    let description = seq(vec![widget("a"), widget("b")]);
    let root = reconciler.mount_container(description.clone(), container.clone());
    run(&mut reconciler);
    noop.take_journal();

    // Identical by reference: the whole subtree short-circuits.
    reconciler.update_container(description, root);
    run(&mut reconciler);

    let journal = noop.journal();
    assert!(journal
        .iter()
        .all(|op| !matches!(op, HostOp::CreateInstance { .. })));
    assert!(journal
        .iter()
        .all(|op| !matches!(op, HostOp::PrepareUpdate { .. })));
    assert!(journal
        .iter()
        .all(|op| !matches!(op, HostOp::CommitUpdate { .. })));
    // Only the unconditional container reattach remains.
    assert_eq!(
        journal
            .iter()
            .filter(|op| matches!(op, HostOp::UpdateContainer { .. }))
            .count(),
        1
    );
    assert_eq!(container.children.borrow().len(), 2);
}

#[test]
fn unmounting_reconciles_every_child_away() {
    let noop = NoopHost::new();
    let container = noop.create_container();
    let mut reconciler = Reconciler::new(noop.clone());

    let root = reconciler.mount_container(
        seq(vec![widget("a"), widget("b")]),
        container.clone(),
    );
    run(&mut reconciler);
    assert_eq!(container.children.borrow().len(), 2);

    reconciler.unmount_container(root);
    run(&mut reconciler);
    assert!(container.children.borrow().is_empty());
    assert!(!reconciler.has_pending_work(root));
}

#[test]
fn nested_host_children_flatten_through_component_output() {
    let noop = NoopHost::new();
    let container = noop.create_container();
    let mut reconciler = Reconciler::new(noop.clone());

    let list = weft::ComponentDef::functional("List", |_| {
        Some(seq(vec![widget("x"), widget("y")]))
    });
    reconciler.mount_container(weft::component(&list, Props::new()), container.clone());
    run(&mut reconciler);

    let children = container.children.borrow();
    assert_eq!(children.len(), 2);
    assert_eq!(children[0].props.borrow().get("text"), Some(&"x".into()));
    assert_eq!(children[1].props.borrow().get("text"), Some(&"y".into()));
}
