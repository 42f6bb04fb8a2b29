//! Turns a parent's new children description into a linked sibling chain,
//! reusing the previous child aligned at the same position when its type and
//! key match. Matching is strictly positional: one previous sibling is
//! consumed per consumed new entry, so moves and insertions are not detected.

use tracing::warn;

use crate::arena::{Arena, UnitId};
use crate::element::{ElementType, Node};
use crate::priority::PriorityLevel;
use crate::work_unit::{
    clone_for_work, create_reified_continuation, create_unit_from_coroutine,
    create_unit_from_element, create_unit_from_yield, Output, PendingInput, UnitType, WorkUnit,
};

/// Produce the new first child of `parent` from a children description,
/// reusing matched previous children starting at `current_first_child`.
pub fn reconcile_child_chain(
    arena: &mut Arena,
    parent: UnitId,
    current_first_child: Option<UnitId>,
    new_children: Option<&Node>,
    priority: PriorityLevel,
) -> Option<UnitId> {
    match new_children {
        Some(node) => create_first_child(arena, parent, current_first_child, node, priority),
        None => None,
    }
}

fn unit_matches(unit: &WorkUnit, element_type: &ElementType, key: &Option<String>) -> bool {
    if unit.key != *key {
        return false;
    }
    match &unit.unit_type {
        Some(UnitType::Element(existing)) => existing.same(element_type),
        _ => false,
    }
}

fn create_first_child(
    arena: &mut Arena,
    parent: UnitId,
    existing_child: Option<UnitId>,
    new_children: &Node,
    priority: PriorityLevel,
) -> Option<UnitId> {
    match new_children {
        Node::Element(element) => {
            if let Some(existing) = existing_child {
                if unit_matches(&arena[existing], &element.element_type, &element.key) {
                    // Reuse the existing buffer pair for this position.
                    let clone = clone_for_work(arena, existing, priority);
                    arena[clone].pending_props = Some(PendingInput::Props(element.props.clone()));
                    arena[clone].child = arena[existing].child;
                    arena[clone].sibling = None;
                    arena[clone].parent = Some(parent);
                    return Some(clone);
                }
            }
            let child = create_unit_from_element(arena, element, priority);
            arena[child].parent = Some(parent);
            Some(child)
        }
        Node::Coroutine(coroutine) => {
            let child = create_unit_from_coroutine(arena, coroutine, priority);
            arena[child].parent = Some(parent);
            Some(child)
        }
        Node::Yield(yield_node) => {
            // A yield becomes a placeholder unit whose output already is the
            // reified continuation.
            let reified = create_reified_continuation(arena, yield_node);
            let child = create_unit_from_yield(arena, yield_node);
            arena[child].output = Output::Continuation(reified);
            arena[child].parent = Some(parent);
            Some(child)
        }
        Node::Seq(entries) => {
            let entries = entries.clone();
            let mut first = None;
            let mut prev: Option<UnitId> = None;
            let mut existing = existing_child;
            for entry in entries.iter() {
                let produced = match prev {
                    None => {
                        let produced =
                            create_first_child(arena, parent, existing, entry, priority);
                        first = produced;
                        produced
                    }
                    Some(previous_sibling) => Some(create_subsequent_child(
                        arena,
                        parent,
                        existing,
                        previous_sibling,
                        entry,
                        priority,
                    )),
                };
                // One previous sibling per consumed entry; this cannot track
                // entries that expand to more than one unit.
                if produced.is_some() {
                    if let Some(consumed) = existing {
                        existing = arena[consumed].sibling;
                    }
                }
                prev = produced;
            }
            first
        }
        Node::Text(text) => {
            warn!(child = %text, "unrecognized child description, skipping");
            None
        }
    }
}

fn create_subsequent_child(
    arena: &mut Arena,
    parent: UnitId,
    existing_child: Option<UnitId>,
    previous_sibling: UnitId,
    new_children: &Node,
    priority: PriorityLevel,
) -> UnitId {
    match new_children {
        Node::Element(element) => {
            if let Some(existing) = existing_child {
                if unit_matches(&arena[existing], &element.element_type, &element.key) {
                    let clone = clone_for_work(arena, existing, priority);
                    arena[clone].pending_props = Some(PendingInput::Props(element.props.clone()));
                    arena[clone].child = arena[existing].child;
                    arena[clone].sibling = None;
                    arena[clone].parent = Some(parent);
                    arena[previous_sibling].sibling = Some(clone);
                    return clone;
                }
            }
            let child = create_unit_from_element(arena, element, priority);
            arena[previous_sibling].sibling = Some(child);
            arena[child].parent = Some(parent);
            child
        }
        Node::Coroutine(coroutine) => {
            let child = create_unit_from_coroutine(arena, coroutine, priority);
            arena[previous_sibling].sibling = Some(child);
            arena[child].parent = Some(parent);
            child
        }
        Node::Yield(yield_node) => {
            let reified = create_reified_continuation(arena, yield_node);
            let child = create_unit_from_yield(arena, yield_node);
            arena[child].output = Output::Continuation(reified);
            arena[previous_sibling].sibling = Some(child);
            arena[child].parent = Some(parent);
            child
        }
        Node::Seq(entries) => {
            let entries = entries.clone();
            let mut prev = previous_sibling;
            let mut existing = existing_child;
            for entry in entries.iter() {
                prev = create_subsequent_child(arena, parent, existing, prev, entry, priority);
                if let Some(consumed) = existing {
                    existing = arena[consumed].sibling;
                }
            }
            prev
        }
        Node::Text(text) => {
            warn!(child = %text, "unrecognized child description, skipping");
            previous_sibling
        }
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use super::*;
    use crate::element::{Element, Props, YieldNode};
    use crate::work_tags::WorkTag;
    use crate::work_unit::{create_unit, Output};

    fn host(name: &str) -> Node {
        Node::Element(Element::new(ElementType::host(name), None, Props::new()))
    }

    fn keyed_host(name: &str, key: &str) -> Node {
        Node::Element(Element::new(
            ElementType::host(name),
            Some(key.to_string()),
            Props::new(),
        ))
    }

    fn seq(entries: Vec<Node>) -> Node {
        Node::Seq(Rc::from(entries))
    }

    fn parent_unit(arena: &mut Arena) -> UnitId {
        create_unit(arena, WorkTag::HostContainer, None)
    }

    fn chain(arena: &Arena, first: Option<UnitId>) -> Vec<UnitId> {
        let mut out = Vec::new();
        let mut item = first;
        while let Some(unit) = item {
            out.push(unit);
            item = arena[unit].sibling;
        }
        out
    }

    #[test]
    fn matching_type_and_key_reuses_the_previous_buffer() {
        let mut arena = Arena::new();
        let parent = parent_unit(&mut arena);
        let old = reconcile_child_chain(&mut arena, parent, None, Some(&host("div")), PriorityLevel::Low)
            .unwrap();

        let new = reconcile_child_chain(
            &mut arena,
            parent,
            Some(old),
            Some(&host("div")),
            PriorityLevel::Low,
        )
        .unwrap();
        assert_eq!(arena[new].alternate, Some(old));
        assert_eq!(arena[new].logical, arena[old].logical);
        assert_eq!(arena[new].parent, Some(parent));
    }

    #[test]
    fn type_mismatch_creates_a_fresh_unit() {
        let mut arena = Arena::new();
        let parent = parent_unit(&mut arena);
        let old = reconcile_child_chain(&mut arena, parent, None, Some(&host("div")), PriorityLevel::Low)
            .unwrap();

        let new = reconcile_child_chain(
            &mut arena,
            parent,
            Some(old),
            Some(&host("span")),
            PriorityLevel::Low,
        )
        .unwrap();
        assert!(arena[new].alternate.is_none());
        assert_ne!(arena[new].logical, arena[old].logical);
    }

    #[test]
    fn key_mismatch_creates_a_fresh_unit() {
        let mut arena = Arena::new();
        let parent = parent_unit(&mut arena);
        let old = reconcile_child_chain(
            &mut arena,
            parent,
            None,
            Some(&keyed_host("div", "a")),
            PriorityLevel::Low,
        )
        .unwrap();

        let new = reconcile_child_chain(
            &mut arena,
            parent,
            Some(old),
            Some(&keyed_host("div", "b")),
            PriorityLevel::Low,
        )
        .unwrap();
        assert!(arena[new].alternate.is_none());
    }

    #[test]
    fn alignment_is_positional_so_swapped_children_are_both_replaced() {
        let mut arena = Arena::new();
        let parent = parent_unit(&mut arena);
        let old_first = reconcile_child_chain(
            &mut arena,
            parent,
            None,
            Some(&seq(vec![host("div"), host("span")])),
            PriorityLevel::Low,
        )
        .unwrap();
        let old = chain(&arena, Some(old_first));

        let new_first = reconcile_child_chain(
            &mut arena,
            parent,
            Some(old_first),
            Some(&seq(vec![host("span"), host("div")])),
            PriorityLevel::Low,
        )
        .unwrap();
        let new = chain(&arena, Some(new_first));
        assert_eq!(new.len(), 2);
        // Neither position matches, so neither buffer is reused.
        assert!(arena[new[0]].alternate.is_none());
        assert!(arena[new[1]].alternate.is_none());
        assert_ne!(arena[new[0]].logical, arena[old[0]].logical);
        assert_ne!(arena[new[1]].logical, arena[old[1]].logical);
    }

    #[test]
    fn unrecognized_entries_are_skipped_without_producing_units() {
        let mut arena = Arena::new();
        let parent = parent_unit(&mut arena);
        let first = reconcile_child_chain(
            &mut arena,
            parent,
            None,
            Some(&seq(vec![Node::Text(Rc::from("plain")), host("div")])),
            PriorityLevel::Low,
        )
        .unwrap();
        let produced = chain(&arena, Some(first));
        assert_eq!(produced.len(), 1);
        assert_eq!(arena[produced[0]].tag, WorkTag::HostComponent);
    }

    #[test]
    fn nested_sequences_flatten_into_one_sibling_chain() {
        let mut arena = Arena::new();
        let parent = parent_unit(&mut arena);
        let first = reconcile_child_chain(
            &mut arena,
            parent,
            None,
            Some(&seq(vec![
                host("a"),
                seq(vec![host("b"), host("c")]),
                host("d"),
            ])),
            PriorityLevel::Low,
        )
        .unwrap();
        assert_eq!(chain(&arena, Some(first)).len(), 4);
    }

    #[test]
    fn yields_reify_their_continuation_into_the_output() {
        let mut arena = Arena::new();
        let parent = parent_unit(&mut arena);
        let yield_node = Node::Yield(Rc::new(YieldNode {
            key: None,
            props: Rc::new(Props::new()),
            continuation: ElementType::host("leaf"),
        }));
        let unit =
            reconcile_child_chain(&mut arena, parent, None, Some(&yield_node), PriorityLevel::Low)
                .unwrap();
        assert_eq!(arena[unit].tag, WorkTag::YieldComponent);
        match &arena[unit].output {
            Output::Continuation(reified) => {
                assert_eq!(arena[reified.continuation].tag, WorkTag::HostComponent);
            }
            other => panic!("expected a reified continuation, got {other:?}"),
        }
    }
}
