//! Commit phase: apply one collected effect against the host adapter. Runs
//! only after a root's entire subtree has completed.

use std::rc::Rc;

use crate::arena::{Arena, UnitId};
use crate::element::Props;
use crate::error::ReconcileError;
use crate::host_config::HostConfig;
use crate::root::RootRegistry;
use crate::work_tags::WorkTag;
use crate::work_unit::{child_output, collect_host_children, PendingInput, StateNode};

pub struct CommitWork {
    host: Rc<dyn HostConfig>,
}

impl CommitWork {
    pub fn new(host: Rc<dyn HostConfig>) -> Self {
        Self { host }
    }

    pub fn commit_work(
        &self,
        arena: &Arena,
        roots: &RootRegistry,
        finished_work: UnitId,
    ) -> Result<(), ReconcileError> {
        match arena[finished_work].tag {
            WorkTag::ClassComponent => {
                // Lifecycle callbacks are dispatched by a collaborator.
                Ok(())
            }
            WorkTag::HostContainer => {
                let root = match arena[finished_work].state_node {
                    Some(StateNode::Root(root)) => root,
                    _ => return Err(ReconcileError::DetachedContainer),
                };
                let mut children = Vec::new();
                collect_host_children(arena, &arena[finished_work].output, &mut children);
                let container_info = roots[root].container_info.clone();
                self.host.update_container(&container_info, &children);
                Ok(())
            }
            WorkTag::HostComponent => {
                // Update-only path: a first mount never produces a commit
                // effect, so both the instance and the previous buffer must
                // already exist.
                let instance = match &arena[finished_work].state_node {
                    Some(StateNode::Instance(instance)) => instance.clone(),
                    _ => return Err(ReconcileError::CommitWithoutAlternate),
                };
                let current = arena[finished_work]
                    .alternate
                    .ok_or(ReconcileError::CommitWithoutAlternate)?;
                let children_output = child_output(arena, arena[finished_work].child);
                let mut children = Vec::new();
                collect_host_children(arena, &children_output, &mut children);
                let new_props = memoized_props(arena, finished_work);
                let old_props = memoized_props(arena, current);
                self.host
                    .commit_update(&instance, &old_props, &new_props, &children);
                Ok(())
            }
            tag => Err(ReconcileError::UnexpectedEffectTag(tag)),
        }
    }
}

fn memoized_props(arena: &Arena, unit: UnitId) -> Rc<Props> {
    arena[unit]
        .memoized_props
        .as_ref()
        .and_then(PendingInput::as_props)
        .cloned()
        .unwrap_or_default()
}
