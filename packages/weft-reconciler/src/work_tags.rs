/// Variant of work a unit represents. Every phase dispatches on this tag with
/// an exhaustive match, so an unhandled variant is a compile error rather than
/// a runtime default branch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WorkTag {
    /// A component whose kind is unknown until its first invocation.
    IndeterminateComponent,
    FunctionalComponent,
    ClassComponent,
    /// The root unit owned by a mounted container.
    HostContainer,
    HostComponent,
    /// First phase of a coroutine: its declared children are being processed.
    CoroutineComponent,
    /// Second phase of a coroutine: the handler's continuation children are
    /// being processed.
    CoroutineHandlerPhase,
    YieldComponent,
}
