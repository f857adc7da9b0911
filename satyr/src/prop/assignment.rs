//! Partial assignment and the decision stack.
use crate::lit::{Lit, Var};

/// Current partial assignment.
#[derive(Default)]
pub struct Assignment {
    assignment: Vec<Option<bool>>,
}

/// This compares two `Option<bool>` values as bytes. Workaround for bad code
/// generation.
pub fn fast_option_eq(a: Option<bool>, b: Option<bool>) -> bool {
    unsafe { std::mem::transmute::<_, u8>(a) == std::mem::transmute::<_, u8>(b) }
}

impl Assignment {
    /// Update structures for a new variable count.
    pub fn set_var_count(&mut self, count: usize) {
        self.assignment.resize(count, None);
    }

    /// Current partial assignment as slice.
    pub fn assignment(&self) -> &[Option<bool>] {
        &self.assignment
    }

    /// Value assigned to a variable.
    pub fn var_value(&self, var: Var) -> Option<bool> {
        self.assignment[var.index()]
    }

    /// Whether the variable was fixed by a decision or an implication.
    pub fn var_is_instantiated(&self, var: Var) -> bool {
        self.assignment[var.index()].is_some()
    }

    /// Value assigned to a literal.
    pub fn lit_value(&self, lit: Lit) -> Option<bool> {
        self.assignment[lit.index()].map(|b| b ^ lit.is_negative())
    }

    pub fn lit_is_true(&self, lit: Lit) -> bool {
        fast_option_eq(self.assignment[lit.index()], Some(lit.is_positive()))
    }

    pub fn lit_is_false(&self, lit: Lit) -> bool {
        fast_option_eq(self.assignment[lit.index()], Some(lit.is_negative()))
    }

    pub fn lit_is_unset(&self, lit: Lit) -> bool {
        fast_option_eq(self.assignment[lit.index()], None)
    }

    pub fn assign_lit(&mut self, lit: Lit) {
        debug_assert!(self.lit_is_unset(lit));
        self.assignment[lit.index()] = lit.is_positive().into()
    }

    pub fn clear_var(&mut self, var: Var) {
        debug_assert!(self.var_is_instantiated(var));
        self.assignment[var.index()] = None;
    }
}

/// One decision level of the stack.
///
/// `units` is the frame's implication list in the order the literals were
/// enqueued; `queue_head` separates the literals that have actually been set
/// (prefix) from enqueued ones a conflict cut off (suffix). The root frame at
/// level 1 has no decision literal.
pub struct DecisionFrame {
    pub decision: Option<Lit>,
    pub units: Vec<Lit>,
    pub queue_head: usize,
}

impl DecisionFrame {
    fn new(decision: Option<Lit>) -> DecisionFrame {
        DecisionFrame {
            decision,
            units: vec![],
            queue_head: 0,
        }
    }
}

/// Decision stack.
///
/// The frame at position 0 is the synthetic root frame, so the current
/// decision level equals the number of frames and level 1 means that no
/// decision is active.
pub struct Trail {
    frames: Vec<DecisionFrame>,
}

impl Default for Trail {
    fn default() -> Trail {
        Trail {
            frames: vec![DecisionFrame::new(None)],
        }
    }
}

impl Trail {
    /// Current decision level; 1 when no decision is active.
    pub fn current_level(&self) -> usize {
        self.frames.len()
    }

    /// The most recent decision frame.
    pub fn top(&self) -> &DecisionFrame {
        self.frames.last().expect("root frame missing")
    }

    fn top_mut(&mut self) -> &mut DecisionFrame {
        self.frames.last_mut().expect("root frame missing")
    }

    /// All frames, root first.
    pub fn frames(&self) -> &[DecisionFrame] {
        &self.frames
    }

    /// Open a new decision level for the given decision literal.
    pub fn push_frame(&mut self, decision: Lit) {
        self.frames.push(DecisionFrame::new(Some(decision)));
    }

    /// Close the most recent decision level. Must not be called at the root.
    pub fn pop_frame(&mut self) -> DecisionFrame {
        debug_assert!(self.frames.len() > 1);
        self.frames.pop().expect("root frame missing")
    }

    /// Dismantle the root frame's implication list, returning it.
    pub fn take_root_units(&mut self) -> Vec<Lit> {
        debug_assert_eq!(self.frames.len(), 1);
        let root = self.top_mut();
        root.queue_head = 0;
        std::mem::replace(&mut root.units, vec![])
    }

    /// Append a forced literal to the current frame's implication list.
    pub fn enqueue(&mut self, lit: Lit) {
        self.top_mut().units.push(lit);
    }

    /// Next enqueued literal that has not been set yet, advancing the queue.
    pub fn next_queued(&mut self) -> Option<Lit> {
        let frame = self.top_mut();
        let lit = frame.units.get(frame.queue_head).cloned();
        if lit.is_some() {
            frame.queue_head += 1;
        }
        lit
    }

    /// Whether the current frame's implication list is fully processed.
    pub fn fully_propagated(&self) -> bool {
        let frame = self.top();
        frame.queue_head == frame.units.len()
    }
}
