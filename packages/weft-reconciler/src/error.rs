use thiserror::Error;

use crate::work_tags::WorkTag;

/// Fatal invariant violations. Any of these aborts the in-progress scheduling
/// slice; effects are only applied after a root's whole subtree completes, so
/// an aborted pass commits nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ReconcileError {
    /// A coroutine unit was processed without its descriptor staged, which
    /// means the phases ran out of order.
    #[error("coroutine props should be resolved by now")]
    UnresolvedCoroutine,

    /// The pending-work locator expected a work-in-progress buffer that the
    /// allocator never produced.
    #[error("expected a work-in-progress buffer for this unit")]
    MissingWorkInProgress,

    /// An update effect reached commit for a host unit that was never cloned,
    /// i.e. a first mount; instance creation happens during completion and
    /// must not produce a commit effect.
    #[error("host update committed without a previous buffer")]
    CommitWithoutAlternate,

    #[error("an indeterminate component should have become determinate before completing")]
    IndeterminateCompletion,

    #[error("unit of work tag {0:?} should not have side-effects")]
    UnexpectedEffectTag(WorkTag),

    /// A container unit reached the root of a completion walk without a root
    /// record attached to it.
    #[error("container unit is not attached to a root record")]
    DetachedContainer,

    /// A component unit carries no invokable definition.
    #[error("unit of work has no component definition to invoke")]
    MissingComponent,
}
