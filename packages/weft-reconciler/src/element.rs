//! Description values fed to the reconciler: what the tree *should* look
//! like, as plain data. Identity is deliberately pointer identity on the
//! shared allocations; handing the reconciler the same `Rc` twice is the
//! "nothing changed here" signal that enables bail-outs.

use std::fmt;
use std::rc::Rc;

use serde_json::{Map, Value};

use crate::arena::UnitId;

/// A single description value. A sequence is itself a value, so arbitrarily
/// nested sequences flatten naturally during reconciliation.
///
/// `Text` exists for authoring convenience but the reconciler does not
/// understand it; it is reported as an unrecognized child and skipped.
#[derive(Debug, Clone)]
pub enum Node {
    Element(Rc<Element>),
    Coroutine(Rc<CoroutineNode>),
    Yield(Rc<YieldNode>),
    Seq(Rc<[Node]>),
    Text(Rc<str>),
}

impl Node {
    /// Identity, not structural equality.
    pub fn same(&self, other: &Node) -> bool {
        match (self, other) {
            (Node::Element(a), Node::Element(b)) => Rc::ptr_eq(a, b),
            (Node::Coroutine(a), Node::Coroutine(b)) => Rc::ptr_eq(a, b),
            (Node::Yield(a), Node::Yield(b)) => Rc::ptr_eq(a, b),
            (Node::Seq(a), Node::Seq(b)) => Rc::ptr_eq(a, b),
            (Node::Text(a), Node::Text(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

/// A primitive description: a component or host primitive plus its input.
#[derive(Debug)]
pub struct Element {
    pub element_type: ElementType,
    pub key: Option<String>,
    pub props: Rc<Props>,
}

impl Element {
    pub fn new(element_type: ElementType, key: Option<String>, props: Props) -> Rc<Self> {
        Rc::new(Self {
            element_type,
            key,
            props: Rc::new(props),
        })
    }
}

/// What an element resolves to. Host names compare by value (two `"div"`s are
/// the same primitive); component definitions and realized continuations
/// compare by identity.
#[derive(Clone)]
pub enum ElementType {
    Host(Rc<str>),
    Component(Rc<ComponentDef>),
    /// An already-realized continuation unit, produced by reifying a yield.
    Continuation(Rc<ReifiedContinuation>),
}

impl ElementType {
    pub fn host(name: &str) -> Self {
        ElementType::Host(Rc::from(name))
    }

    pub fn same(&self, other: &ElementType) -> bool {
        match (self, other) {
            (ElementType::Host(a), ElementType::Host(b)) => a == b,
            (ElementType::Component(a), ElementType::Component(b)) => Rc::ptr_eq(a, b),
            (ElementType::Continuation(a), ElementType::Continuation(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Debug for ElementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ElementType::Host(name) => write!(f, "Host({name:?})"),
            ElementType::Component(def) => write!(f, "Component({:?})", def.name()),
            ElementType::Continuation(_) => write!(f, "Continuation(..)"),
        }
    }
}

/// Input to a component or host primitive. `attrs` is an opaque payload the
/// engine never interprets; adapters diff it however they see fit. `hidden`
/// defers the subtree to the offscreen priority level.
#[derive(Debug, Clone, Default)]
pub struct Props {
    pub hidden: bool,
    pub attrs: Map<String, Value>,
    pub children: Option<Node>,
}

impl Props {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attr(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attrs.insert(name.into(), value.into());
        self
    }

    pub fn hide(mut self) -> Self {
        self.hidden = true;
        self
    }

    pub fn with_children(mut self, children: Node) -> Self {
        self.children = Some(children);
        self
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.attrs.get(name)
    }
}

/// What invoking a component produced: either a children description, or a
/// render-capable instance (the unit is then treated as a class component).
pub enum Rendered {
    Children(Option<Node>),
    Instance(Rc<dyn Stateful>),
}

/// The render-capable shape an indeterminate component may resolve to.
/// Lifecycle semantics are a collaborator concern; only the shape matters
/// here.
pub trait Stateful {
    fn render(&self, props: &Props) -> Option<Node>;
}

/// A function or class component reference. `constructs` is the marker that
/// tells unit creation to skip the indeterminate stage.
pub struct ComponentDef {
    name: String,
    render: Box<dyn Fn(&Props) -> Rendered>,
    constructs: bool,
}

impl ComponentDef {
    pub fn new(name: impl Into<String>, render: impl Fn(&Props) -> Rendered + 'static) -> Rc<Self> {
        Rc::new(Self {
            name: name.into(),
            render: Box::new(render),
            constructs: false,
        })
    }

    /// A plain function of props; always resolves to a functional unit.
    pub fn functional(
        name: impl Into<String>,
        render: impl Fn(&Props) -> Option<Node> + 'static,
    ) -> Rc<Self> {
        Self::new(name, move |props| Rendered::Children(render(props)))
    }

    /// A definition carrying the component marker: unit creation goes
    /// straight to a class-component unit.
    pub fn stateful(
        name: impl Into<String>,
        render: impl Fn(&Props) -> Rendered + 'static,
    ) -> Rc<Self> {
        Rc::new(Self {
            name: name.into(),
            render: Box::new(render),
            constructs: true,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn constructs(&self) -> bool {
        self.constructs
    }

    pub fn invoke(&self, props: &Props) -> Rendered {
        (self.render)(props)
    }
}

impl fmt::Debug for ComponentDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentDef")
            .field("name", &self.name)
            .field("constructs", &self.constructs)
            .finish()
    }
}

/// A two-phase control construct: `children` are processed first, and the
/// handler is then re-invoked with the flattened yields they produced.
#[derive(Debug)]
pub struct CoroutineNode {
    pub key: Option<String>,
    pub handler: Rc<CoroutineHandler>,
    pub props: Rc<Props>,
    pub children: Option<Node>,
}

pub struct CoroutineHandler {
    name: String,
    call: Box<dyn Fn(&Props, &[Rc<ReifiedContinuation>]) -> Option<Node>>,
}

impl CoroutineHandler {
    pub fn new(
        name: impl Into<String>,
        call: impl Fn(&Props, &[Rc<ReifiedContinuation>]) -> Option<Node> + 'static,
    ) -> Rc<Self> {
        Rc::new(Self {
            name: name.into(),
            call: Box::new(call),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn invoke(&self, props: &Props, yields: &[Rc<ReifiedContinuation>]) -> Option<Node> {
        (self.call)(props, yields)
    }
}

impl fmt::Debug for CoroutineHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CoroutineHandler({:?})", self.name)
    }
}

/// A yield inside a coroutine's children: a value handed to the handler,
/// wrapping the continuation to render in the second phase.
#[derive(Debug)]
pub struct YieldNode {
    pub key: Option<String>,
    pub props: Rc<Props>,
    pub continuation: ElementType,
}

/// A yield whose continuation has been realized into a work unit. Handlers
/// receive these and may return them as element types to mount the realized
/// unit in the second-phase children.
#[derive(Debug)]
pub struct ReifiedContinuation {
    pub continuation: UnitId,
    pub props: Rc<Props>,
}
