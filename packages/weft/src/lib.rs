//! Constructors for description values: hosts, components, sequences,
//! coroutines and yields. The reconciler consumes these as plain data; this
//! crate only makes them pleasant to write.

use std::rc::Rc;

pub use weft_reconciler::element::{
    ComponentDef, CoroutineHandler, CoroutineNode, Element, ElementType, Node, Props,
    ReifiedContinuation, Rendered, Stateful, YieldNode,
};

/// A host primitive description, e.g. `host("div", Props::new())`.
pub fn host(type_name: &str, props: Props) -> Node {
    Node::Element(Element::new(ElementType::host(type_name), None, props))
}

/// A keyed host primitive description.
pub fn keyed_host(type_name: &str, key: &str, props: Props) -> Node {
    Node::Element(Element::new(
        ElementType::host(type_name),
        Some(key.to_string()),
        props,
    ))
}

/// An element for a previously defined component.
pub fn component(def: &Rc<ComponentDef>, props: Props) -> Node {
    Node::Element(Element::new(
        ElementType::Component(def.clone()),
        None,
        props,
    ))
}

/// A keyed element for a previously defined component.
pub fn keyed_component(def: &Rc<ComponentDef>, key: &str, props: Props) -> Node {
    Node::Element(Element::new(
        ElementType::Component(def.clone()),
        Some(key.to_string()),
        props,
    ))
}

/// An ordered sequence of descriptions.
pub fn seq(children: Vec<Node>) -> Node {
    Node::Seq(Rc::from(children))
}

/// Plain text. The shipped reconciler does not understand text children; it
/// reports them as unrecognized and skips them.
pub fn text(content: &str) -> Node {
    Node::Text(Rc::from(content))
}

/// A coroutine description: `children` are reconciled first, then `handler`
/// is invoked with the yields they produced.
pub fn coroutine(handler: &Rc<CoroutineHandler>, props: Props, children: Vec<Node>) -> Node {
    Node::Coroutine(Rc::new(CoroutineNode {
        key: None,
        handler: handler.clone(),
        props: Rc::new(props),
        children: Some(seq(children)),
    }))
}

/// A yield inside a coroutine: hands `props` and the continuation to the
/// enclosing coroutine's handler.
pub fn yield_to(continuation: ElementType, props: Props) -> Node {
    Node::Yield(Rc::new(YieldNode {
        key: None,
        props: Rc::new(props),
        continuation,
    }))
}

/// An element mounting a reified continuation received by a handler; the
/// realized unit is reconciled in place of a fresh one.
pub fn continuation(reified: &Rc<ReifiedContinuation>, props: Props) -> Node {
    Node::Element(Element::new(
        ElementType::Continuation(reified.clone()),
        None,
        props,
    ))
}
