//! State stack
//!
//! The root state sits below everything else and can never be popped: popping more
//! states than there are above the root leaves just the root. This makes `#pop` at the
//! outermost level harmless, which grammars rely on when they are fed unbalanced input.

use crate::grammar::{StackOp, StateId, Transition};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateStack {
    root: StateId,
    above: Vec<StateId>,
}

impl StateStack {
    pub fn new(root: StateId) -> Self {
        StateStack {
            root,
            above: Vec::new(),
        }
    }

    /// A stack with `initial` active on top of `root` (just `root` if they are the same).
    pub fn seeded(root: StateId, initial: StateId) -> Self {
        let mut stack = StateStack::new(root);
        if initial != root {
            stack.push(initial);
        }
        stack
    }

    pub fn root(&self) -> StateId {
        self.root
    }

    /// The active state.
    pub fn top(&self) -> StateId {
        self.above.last().copied().unwrap_or(self.root)
    }

    /// Number of states including the root; never zero.
    pub fn depth(&self) -> usize {
        self.above.len() + 1
    }

    pub fn push(&mut self, state: StateId) {
        self.above.push(state);
    }

    /// Pop `count` states, stopping at the root.
    pub fn pop(&mut self, count: usize) {
        let keep = self.above.len().saturating_sub(count);
        self.above.truncate(keep);
    }

    /// Push the active state again.
    pub fn duplicate(&mut self) {
        self.push(self.top());
    }

    /// Drop everything above the root.
    pub fn reset(&mut self) {
        self.above.clear();
    }

    pub fn apply(&mut self, transition: &Transition) {
        match transition {
            Transition::Stay => {}
            Transition::Push(states) => self.above.extend(states.iter().copied()),
            Transition::Pop(count) => self.pop(*count),
            Transition::Duplicate => self.duplicate(),
            Transition::Sequence(ops) => {
                for op in ops {
                    match op {
                        StackOp::Push(state) => self.push(*state),
                        StackOp::Pop(count) => self.pop(*count),
                        StackOp::Duplicate => self.duplicate(),
                    }
                }
            }
        }
    }

    /// States from bottom (root) to top.
    pub fn iter(&self) -> impl Iterator<Item = StateId> + '_ {
        std::iter::once(self.root).chain(self.above.iter().copied())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ROOT: StateId = StateId(0);
    const A: StateId = StateId(1);
    const B: StateId = StateId(2);

    #[test]
    fn test_pop_saturates_at_root() {
        let mut stack = StateStack::new(ROOT);
        stack.push(A);
        stack.push(B);
        stack.pop(10);
        assert_eq!(stack.depth(), 1);
        assert_eq!(stack.top(), ROOT);

        stack.pop(1);
        assert_eq!(stack.top(), ROOT);
    }

    #[test]
    fn test_push_list_makes_last_active() {
        let mut stack = StateStack::new(ROOT);
        stack.apply(&Transition::Push(vec![A, B]));
        assert_eq!(stack.iter().collect::<Vec<_>>(), vec![ROOT, A, B]);
        assert_eq!(stack.top(), B);
    }

    #[test]
    fn test_sequence_applies_in_order() {
        let mut stack = StateStack::seeded(ROOT, A);
        stack.apply(&Transition::Sequence(vec![
            StackOp::Pop(1),
            StackOp::Push(B),
            StackOp::Duplicate,
        ]));
        assert_eq!(stack.iter().collect::<Vec<_>>(), vec![ROOT, B, B]);
    }

    #[test]
    fn test_seeded_with_root_is_just_root() {
        let stack = StateStack::seeded(ROOT, ROOT);
        assert_eq!(stack.depth(), 1);
    }

    #[test]
    fn test_reset_keeps_root() {
        let mut stack = StateStack::seeded(ROOT, A);
        stack.duplicate();
        stack.reset();
        assert_eq!(stack, StateStack::new(ROOT));
    }
}
