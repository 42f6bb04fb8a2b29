//! A host adapter that renders into plain data structures and journals every
//! host call in order, so tests can assert exactly which effects a
//! reconciliation pass produced. Also ships deterministic [`Deadline`] fakes
//! for driving the work loop to precise preemption points.

use std::any::Any;
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::Duration;

use weft_reconciler::element::Props;
use weft_reconciler::host_config::{Deadline, HostConfig};

/// One recorded host call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostOp {
    CreateInstance { id: u32, type_name: String },
    PrepareUpdate { id: u32, needs_commit: bool },
    CommitUpdate { id: u32 },
    UpdateContainer { root_id: u32, children: Vec<u32> },
    LowPriCallbackRequested,
}

/// An instance "rendered" by the no-op host.
pub struct NoopInstance {
    pub id: u32,
    pub type_name: String,
    pub props: RefCell<Props>,
    pub children: RefCell<Vec<u32>>,
}

/// A mount target for the no-op host.
pub struct NoopContainer {
    pub root_id: u32,
    pub children: RefCell<Vec<Rc<NoopInstance>>>,
}

#[derive(Default)]
pub struct NoopHost {
    journal: RefCell<Vec<HostOp>>,
    counter: Cell<u32>,
}

impl NoopHost {
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    pub fn create_container(&self) -> Rc<NoopContainer> {
        Rc::new(NoopContainer {
            root_id: self.next_id(),
            children: RefCell::new(Vec::new()),
        })
    }

    fn next_id(&self) -> u32 {
        let id = self.counter.get();
        self.counter.set(id + 1);
        id
    }

    /// Everything recorded so far, in call order.
    pub fn journal(&self) -> Vec<HostOp> {
        self.journal.borrow().clone()
    }

    /// Drain the journal, returning what was recorded since the last drain.
    pub fn take_journal(&self) -> Vec<HostOp> {
        self.journal.borrow_mut().drain(..).collect()
    }

    pub fn created_count(&self) -> usize {
        self.journal
            .borrow()
            .iter()
            .filter(|op| matches!(op, HostOp::CreateInstance { .. }))
            .count()
    }

    pub fn committed_update_count(&self) -> usize {
        self.journal
            .borrow()
            .iter()
            .filter(|op| matches!(op, HostOp::CommitUpdate { .. }))
            .count()
    }

    pub fn low_pri_requests(&self) -> usize {
        self.journal
            .borrow()
            .iter()
            .filter(|op| matches!(op, HostOp::LowPriCallbackRequested))
            .count()
    }

    fn record(&self, op: HostOp) {
        self.journal.borrow_mut().push(op);
    }
}

fn as_instance(handle: &Rc<dyn Any>) -> Rc<NoopInstance> {
    handle
        .clone()
        .downcast::<NoopInstance>()
        .expect("host handle is not a NoopInstance")
}

fn child_ids(children: &[Rc<dyn Any>]) -> Vec<u32> {
    children.iter().map(|child| as_instance(child).id).collect()
}

impl HostConfig for NoopHost {
    fn create_instance(
        &self,
        type_name: &str,
        props: &Props,
        children: &[Rc<dyn Any>],
    ) -> Rc<dyn Any> {
        let instance = Rc::new(NoopInstance {
            id: self.next_id(),
            type_name: type_name.to_string(),
            props: RefCell::new(props.clone()),
            children: RefCell::new(child_ids(children)),
        });
        self.record(HostOp::CreateInstance {
            id: instance.id,
            type_name: type_name.to_string(),
        });
        instance
    }

    fn prepare_update(
        &self,
        instance: &Rc<dyn Any>,
        old_props: &Props,
        new_props: &Props,
        children: &[Rc<dyn Any>],
    ) -> bool {
        let instance = as_instance(instance);
        let needs_commit = old_props.hidden != new_props.hidden
            || old_props.attrs != new_props.attrs
            || *instance.children.borrow() != child_ids(children);
        self.record(HostOp::PrepareUpdate {
            id: instance.id,
            needs_commit,
        });
        needs_commit
    }

    fn commit_update(
        &self,
        instance: &Rc<dyn Any>,
        _old_props: &Props,
        new_props: &Props,
        children: &[Rc<dyn Any>],
    ) {
        let instance = as_instance(instance);
        *instance.props.borrow_mut() = new_props.clone();
        *instance.children.borrow_mut() = child_ids(children);
        self.record(HostOp::CommitUpdate { id: instance.id });
    }

    fn update_container(&self, container_info: &Rc<dyn Any>, children: &[Rc<dyn Any>]) {
        let container = container_info
            .clone()
            .downcast::<NoopContainer>()
            .expect("container handle is not a NoopContainer");
        let attached: Vec<Rc<NoopInstance>> = children.iter().map(as_instance).collect();
        self.record(HostOp::UpdateContainer {
            root_id: container.root_id,
            children: attached.iter().map(|child| child.id).collect(),
        });
        *container.children.borrow_mut() = attached;
    }

    fn schedule_low_pri_callback(&self) {
        self.record(HostOp::LowPriCallbackRequested);
    }
}

/// A deadline that never runs out; one slice processes everything.
pub struct UnlimitedBudget;

impl Deadline for UnlimitedBudget {
    fn time_remaining(&self) -> Duration {
        Duration::from_secs(60)
    }
}

/// A deadline that is exhausted from the start; every slice re-arms at once.
pub struct ExhaustedBudget;

impl Deadline for ExhaustedBudget {
    fn time_remaining(&self) -> Duration {
        Duration::ZERO
    }
}

/// Grants budget for a fixed number of queries, then reports zero. The work
/// loop asks once per unit of work, so this preempts after roughly that many
/// units.
pub struct CountedBudget {
    remaining: Cell<usize>,
}

impl CountedBudget {
    pub fn new(units: usize) -> Self {
        Self {
            remaining: Cell::new(units),
        }
    }
}

impl Deadline for CountedBudget {
    fn time_remaining(&self) -> Duration {
        if self.remaining.get() == 0 {
            return Duration::ZERO;
        }
        self.remaining.set(self.remaining.get() - 1);
        Duration::from_millis(5)
    }
}

/// Route `tracing` diagnostics to the test output; safe to call repeatedly.
pub fn init_diagnostics() {
    use tracing_subscriber::EnvFilter;
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
