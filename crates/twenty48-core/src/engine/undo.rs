/// Single-slot, single-use undo storage with a two-phase protocol.
///
/// `prepare` stages a snapshot before a move attempt, `commit` promotes it
/// once the move is known to have changed something, and `take` hands the
/// committed snapshot back exactly once. A staged snapshot that is never
/// committed is replaced by the next `prepare` or dropped by `discard`.
#[derive(Clone, Debug)]
pub struct UndoBuffer<T> {
    staged: Option<T>,
    committed: Option<T>,
}

impl<T> Default for UndoBuffer<T> {
    fn default() -> Self {
        Self {
            staged: None,
            committed: None,
        }
    }
}

impl<T> UndoBuffer<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn prepare(&mut self, snapshot: T) {
        self.staged = Some(snapshot);
    }

    /// Promote the staged snapshot. Returns false if nothing was staged.
    pub fn commit(&mut self) -> bool {
        match self.staged.take() {
            Some(snapshot) => {
                self.committed = Some(snapshot);
                true
            }
            None => false,
        }
    }

    pub fn discard(&mut self) {
        self.staged = None;
    }

    /// Consume the committed snapshot, if any.
    pub fn take(&mut self) -> Option<T> {
        self.committed.take()
    }

    pub fn is_available(&self) -> bool {
        self.committed.is_some()
    }
}
