//! The work-unit model: one buffer's record of pending or completed work for
//! a logical tree node, plus the double-buffering allocator and the unit
//! constructors for each description kind.

use std::any::Any;
use std::fmt;
use std::rc::Rc;

use crate::arena::{Arena, LogicalId, UnitId};
use crate::element::{
    CoroutineNode, Element, ElementType, Node, Props, ReifiedContinuation, YieldNode,
};
use crate::priority::PriorityLevel;
use crate::root::RootId;
use crate::work_tags::WorkTag;

/// Component identity carried by a unit: the element type it was created
/// from, or the handler of a coroutine (kept for diagnostics).
#[derive(Clone)]
pub enum UnitType {
    Element(ElementType),
    Handler(Rc<crate::element::CoroutineHandler>),
}

impl fmt::Debug for UnitType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnitType::Element(ty) => write!(f, "Element({ty:?})"),
            UnitType::Handler(handler) => write!(f, "Handler({:?})", handler.name()),
        }
    }
}

/// Opaque host-environment handle attached to a unit.
#[derive(Clone)]
pub enum StateNode {
    /// A host instance created by the adapter.
    Instance(Rc<dyn Any>),
    /// The root record owning a container unit.
    Root(RootId),
    /// A coroutine's resolved second-phase child chain.
    Chain(UnitId),
}

impl fmt::Debug for StateNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StateNode::Instance(_) => write!(f, "Instance(..)"),
            StateNode::Root(root) => write!(f, "Root({root:?})"),
            StateNode::Chain(first) => write!(f, "Chain({first:?})"),
        }
    }
}

/// Staged or memoized input of a unit. Variants correspond to what each tag
/// consumes: element props, a coroutine descriptor, or (for containers) the
/// whole children description. Equality is identity, variant-wise.
#[derive(Clone)]
pub enum PendingInput {
    Props(Rc<Props>),
    Coroutine(Rc<CoroutineNode>),
    Children(Node),
}

impl PendingInput {
    /// Identity comparison; two absent inputs count as identical, which is
    /// what the idempotent-completion check relies on.
    pub fn same(a: Option<&PendingInput>, b: Option<&PendingInput>) -> bool {
        match (a, b) {
            (None, None) => true,
            (Some(PendingInput::Props(x)), Some(PendingInput::Props(y))) => Rc::ptr_eq(x, y),
            (Some(PendingInput::Coroutine(x)), Some(PendingInput::Coroutine(y))) => {
                Rc::ptr_eq(x, y)
            }
            (Some(PendingInput::Children(x)), Some(PendingInput::Children(y))) => x.same(y),
            _ => false,
        }
    }

    pub fn as_props(&self) -> Option<&Rc<Props>> {
        match self {
            PendingInput::Props(props) => Some(props),
            _ => None,
        }
    }

    pub fn as_coroutine(&self) -> Option<&Rc<CoroutineNode>> {
        match self {
            PendingInput::Coroutine(coroutine) => Some(coroutine),
            _ => None,
        }
    }

    pub fn as_children(&self) -> Option<&Node> {
        match self {
            PendingInput::Children(children) => Some(children),
            _ => None,
        }
    }
}

impl fmt::Debug for PendingInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PendingInput::Props(_) => write!(f, "Props(..)"),
            PendingInput::Coroutine(coroutine) => {
                write!(f, "Coroutine({:?})", coroutine.handler.name())
            }
            PendingInput::Children(_) => write!(f, "Children(..)"),
        }
    }
}

/// Computed render result of a unit, as an explicit sum: a leaf host
/// instance, a reified continuation (yields), or a nested chain of units when
/// a unit produced several children.
#[derive(Clone, Default)]
pub enum Output {
    #[default]
    None,
    Instance(Rc<dyn Any>),
    Continuation(Rc<ReifiedContinuation>),
    Chain(UnitId),
}

impl fmt::Debug for Output {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Output::None => write!(f, "None"),
            Output::Instance(_) => write!(f, "Instance(..)"),
            Output::Continuation(_) => write!(f, "Continuation(..)"),
            Output::Chain(first) => write!(f, "Chain({first:?})"),
        }
    }
}

#[derive(Debug)]
pub struct WorkUnit {
    pub tag: WorkTag,
    pub key: Option<String>,
    pub unit_type: Option<UnitType>,
    pub state_node: Option<StateNode>,

    /// Upward link, set while this unit is part of a traversal.
    pub parent: Option<UnitId>,
    pub child: Option<UnitId>,
    pub sibling: Option<UnitId>,

    pub pending_props: Option<PendingInput>,
    pub memoized_props: Option<PendingInput>,
    pub output: Output,

    pub next_effect: Option<UnitId>,
    pub first_effect: Option<UnitId>,
    pub last_effect: Option<UnitId>,

    /// Most urgent level with outstanding work in this unit or its subtree.
    pub pending_work_priority: PriorityLevel,
    pub has_work_in_progress: bool,

    /// The paired buffer for the same logical node.
    pub alternate: Option<UnitId>,
    pub logical: LogicalId,
}

impl WorkUnit {
    pub fn new(tag: WorkTag, key: Option<String>, logical: LogicalId) -> Self {
        Self {
            tag,
            key,
            unit_type: None,
            state_node: None,
            parent: None,
            child: None,
            sibling: None,
            pending_props: None,
            memoized_props: None,
            output: Output::None,
            next_effect: None,
            first_effect: None,
            last_effect: None,
            pending_work_priority: PriorityLevel::NoWork,
            has_work_in_progress: false,
            alternate: None,
            logical,
        }
    }
}

pub fn create_unit(arena: &mut Arena, tag: WorkTag, key: Option<String>) -> UnitId {
    let logical = arena.next_logical_id();
    arena.alloc(WorkUnit::new(tag, key, logical))
}

/// Fetch or create the work-in-progress buffer for `unit`. Only two buffers
/// ever exist per logical node: the paired one is refreshed and reused when
/// present, and lazily allocated on first divergence otherwise. Both paths
/// leave the pair mutually linked through `alternate`.
pub fn clone_for_work(arena: &mut Arena, unit: UnitId, priority: PriorityLevel) -> UnitId {
    if let Some(alt) = arena[unit].alternate {
        let (state_node, child, sibling, pending_props) = {
            let source = &arena[unit];
            (
                source.state_node.clone(),
                source.child,
                source.sibling,
                source.pending_props.clone(),
            )
        };
        let buffer = &mut arena[alt];
        buffer.state_node = state_node;
        buffer.child = child;
        buffer.sibling = sibling;
        buffer.pending_props = pending_props;
        buffer.pending_work_priority = priority;
        // A clone always starts a new pass over this subtree, so the effect
        // list from the previous pass must not leak into it.
        buffer.next_effect = None;
        buffer.first_effect = None;
        buffer.last_effect = None;
        return alt;
    }

    let (tag, key, logical, unit_type, state_node, child, sibling) = {
        let source = &arena[unit];
        (
            source.tag,
            source.key.clone(),
            source.logical,
            source.unit_type.clone(),
            source.state_node.clone(),
            source.child,
            source.sibling,
        )
    };
    let mut buffer = WorkUnit::new(tag, key, logical);
    buffer.unit_type = unit_type;
    buffer.state_node = state_node;
    buffer.child = child;
    buffer.sibling = sibling;
    buffer.pending_work_priority = priority;
    buffer.alternate = Some(unit);
    let alt = arena.alloc(buffer);
    arena[unit].alternate = Some(alt);
    alt
}

pub fn create_host_container_unit(arena: &mut Arena) -> UnitId {
    create_unit(arena, WorkTag::HostContainer, None)
}

pub fn create_unit_from_element(
    arena: &mut Arena,
    element: &Rc<Element>,
    priority: PriorityLevel,
) -> UnitId {
    let unit = create_unit_from_element_type(arena, &element.element_type, element.key.clone());
    arena[unit].pending_props = Some(PendingInput::Props(element.props.clone()));
    arena[unit].pending_work_priority = priority;
    unit
}

pub fn create_unit_from_element_type(
    arena: &mut Arena,
    element_type: &ElementType,
    key: Option<String>,
) -> UnitId {
    match element_type {
        ElementType::Component(def) => {
            let tag = if def.constructs() {
                WorkTag::ClassComponent
            } else {
                WorkTag::IndeterminateComponent
            };
            let unit = create_unit(arena, tag, key);
            arena[unit].unit_type = Some(UnitType::Element(element_type.clone()));
            unit
        }
        ElementType::Host(_) => {
            let unit = create_unit(arena, WorkTag::HostComponent, key);
            arena[unit].unit_type = Some(UnitType::Element(element_type.clone()));
            unit
        }
        // A continuation is a realized unit already.
        ElementType::Continuation(reified) => reified.continuation,
    }
}

pub fn create_unit_from_coroutine(
    arena: &mut Arena,
    coroutine: &Rc<CoroutineNode>,
    priority: PriorityLevel,
) -> UnitId {
    let unit = create_unit(arena, WorkTag::CoroutineComponent, coroutine.key.clone());
    arena[unit].unit_type = Some(UnitType::Handler(coroutine.handler.clone()));
    arena[unit].pending_props = Some(PendingInput::Coroutine(coroutine.clone()));
    arena[unit].pending_work_priority = priority;
    unit
}

pub fn create_unit_from_yield(arena: &mut Arena, yield_node: &YieldNode) -> UnitId {
    let unit = create_unit(arena, WorkTag::YieldComponent, yield_node.key.clone());
    // The placeholder stages empty props so a later visit sees staged input.
    arena[unit].pending_props = Some(PendingInput::Props(Rc::new(Props::default())));
    unit
}

/// Realize a yield's continuation into a work unit and wrap it together with
/// the yield's props for the handler to consume.
pub fn create_reified_continuation(
    arena: &mut Arena,
    yield_node: &YieldNode,
) -> Rc<ReifiedContinuation> {
    let continuation =
        create_unit_from_element_type(arena, &yield_node.continuation, yield_node.key.clone());
    Rc::new(ReifiedContinuation {
        continuation,
        props: yield_node.props.clone(),
    })
}

/// The output a parent takes from its reconciled children: a single child
/// passes its own output through, several children pass the chain itself.
pub fn child_output(arena: &Arena, child: Option<UnitId>) -> Output {
    match child {
        None => Output::None,
        Some(child) if arena[child].sibling.is_none() => arena[child].output.clone(),
        Some(child) => Output::Chain(child),
    }
}

/// Flatten an output into the host instance handles it contains, in tree
/// order, for handing across the host adapter boundary.
pub fn collect_host_children(arena: &Arena, output: &Output, out: &mut Vec<Rc<dyn Any>>) {
    match output {
        Output::None => {}
        Output::Instance(instance) => out.push(instance.clone()),
        Output::Continuation(_) => {
            tracing::trace!("continuation output has no host representation");
        }
        Output::Chain(first) => {
            let mut item = Some(*first);
            while let Some(unit) = item {
                collect_host_children(arena, &arena[unit].output, out);
                item = arena[unit].sibling;
            }
        }
    }
}
