use schnapsen_core::rules::GameState;
use std::collections::BTreeMap;

/// Index of a node inside a [`GameTree`](super::GameTree) arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    pub const fn index(self) -> usize {
        self.0
    }
}

/// One search-tree node wrapping a fully observable state.
///
/// `q` and `value` are expressed from the perspective of the player whose move
/// led to this node (the acting player for the root). Children are owned by
/// the arena; `parent` is only a back-reference.
#[derive(Debug, Clone)]
pub struct Node<S: GameState> {
    pub(crate) state: S,
    pub(crate) parent: Option<NodeId>,
    pub(crate) action: Option<S::Action>,
    pub(crate) mover: Option<S::Player>,
    pub(crate) acting: S::Player,
    pub(crate) children: BTreeMap<S::Action, NodeId>,
    pub(crate) untried: Vec<S::Action>,
    pub(crate) n: u32,
    pub(crate) q: f64,
    pub(crate) value: f64,
    pub(crate) terminal: bool,
    pub(crate) fully_expanded: bool,
    pub(crate) fully_simulated: bool,
    pub(crate) samples: Vec<f64>,
}

impl<S: GameState> Node<S> {
    pub(crate) fn new(
        state: S,
        parent: Option<NodeId>,
        action: Option<S::Action>,
        mover: Option<S::Player>,
    ) -> Self {
        let acting = state.acting_player();
        let untried = if state.is_terminal() {
            Vec::new()
        } else {
            state.legal_actions()
        };
        // A non-terminal position without moves is treated as a leaf.
        let terminal = state.is_terminal() || untried.is_empty();
        let perspective = mover.unwrap_or(acting);
        let value = if terminal {
            state.terminal_value(perspective)
        } else {
            0.0
        };
        Self {
            state,
            parent,
            action,
            mover,
            acting,
            children: BTreeMap::new(),
            fully_expanded: untried.is_empty(),
            untried,
            n: 0,
            q: 0.0,
            value,
            terminal,
            fully_simulated: terminal,
            samples: Vec::new(),
        }
    }

    pub fn state(&self) -> &S {
        &self.state
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn action(&self) -> Option<S::Action> {
        self.action
    }

    /// Player whose point of view `q` and `value` are expressed in.
    pub fn perspective(&self) -> S::Player {
        self.mover.unwrap_or(self.acting)
    }

    pub fn acting_player(&self) -> S::Player {
        self.acting
    }

    pub fn children(&self) -> &BTreeMap<S::Action, NodeId> {
        &self.children
    }

    pub fn untried_actions(&self) -> &[S::Action] {
        &self.untried
    }

    pub fn visits(&self) -> u32 {
        self.n
    }

    pub fn total_value(&self) -> f64 {
        self.q
    }

    pub fn mean_value(&self) -> f64 {
        if self.n == 0 {
            0.0
        } else {
            self.q / f64::from(self.n)
        }
    }

    /// UCB score, or the exact backed-up value once `is_fully_simulated`.
    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn is_terminal(&self) -> bool {
        self.terminal
    }

    pub fn is_fully_expanded(&self) -> bool {
        self.fully_expanded
    }

    pub fn is_fully_simulated(&self) -> bool {
        self.fully_simulated
    }

    pub fn samples(&self) -> &[f64] {
        &self.samples
    }
}

/// `q/n + c * sqrt(2 ln(parent_n) / n)`.
pub fn ucb(q: f64, n: u32, parent_n: u32, exploration: f64) -> f64 {
    if n == 0 {
        return f64::INFINITY;
    }
    let n = f64::from(n);
    let parent_n = f64::from(parent_n.max(1));
    q / n + exploration * (2.0 * parent_n.ln() / n).sqrt()
}
