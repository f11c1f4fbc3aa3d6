#![allow(dead_code)]

use rand::Rng;
use schnapsen_core::rules::{GameState, ObservedState, Permutation};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

pub const A: u8 = 0;
pub const B: u8 = 1;

#[derive(Debug, Clone)]
pub enum NodeShape {
    Decision { player: u8, children: Vec<usize> },
    /// Payoff for player `A`; player `B` receives the negation.
    Leaf(f64),
    /// A decision node whose transitions panic.
    Poisoned { player: u8 },
}

/// A hand-built game tree addressed by node index.
#[derive(Debug, Clone)]
pub struct TreeShape {
    pub nodes: Vec<NodeShape>,
}

#[derive(Clone)]
pub struct TreeGame {
    shape: Arc<TreeShape>,
    at: usize,
}

impl TreeGame {
    pub fn root(shape: TreeShape) -> Self {
        Self {
            shape: Arc::new(shape),
            at: 0,
        }
    }

    pub fn at(&self) -> usize {
        self.at
    }

    pub fn node_count(&self) -> usize {
        self.shape.nodes.len()
    }
}

impl PartialEq for TreeGame {
    fn eq(&self, other: &Self) -> bool {
        self.at == other.at && Arc::ptr_eq(&self.shape, &other.shape)
    }
}

impl Eq for TreeGame {}

impl Hash for TreeGame {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.at.hash(state);
    }
}

impl fmt::Debug for TreeGame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TreeGame({})", self.at)
    }
}

impl GameState for TreeGame {
    type Action = usize;
    type Player = u8;

    fn legal_actions(&self) -> Vec<usize> {
        match &self.shape.nodes[self.at] {
            NodeShape::Decision { children, .. } => (0..children.len()).collect(),
            NodeShape::Leaf(_) => Vec::new(),
            NodeShape::Poisoned { .. } => vec![0],
        }
    }

    fn apply(&self, action: usize) -> Self {
        match &self.shape.nodes[self.at] {
            NodeShape::Decision { children, .. } => Self {
                shape: Arc::clone(&self.shape),
                at: children[action],
            },
            NodeShape::Leaf(_) => panic!("no moves from a leaf"),
            NodeShape::Poisoned { .. } => panic!("poisoned node {}", self.at),
        }
    }

    fn is_terminal(&self) -> bool {
        matches!(self.shape.nodes[self.at], NodeShape::Leaf(_))
    }

    fn terminal_value(&self, player: u8) -> f64 {
        match self.shape.nodes[self.at] {
            NodeShape::Leaf(payoff) if player == A => payoff,
            NodeShape::Leaf(payoff) => -payoff,
            _ => 0.0,
        }
    }

    fn acting_player(&self) -> u8 {
        match self.shape.nodes[self.at] {
            NodeShape::Decision { player, .. } | NodeShape::Poisoned { player } => player,
            NodeShape::Leaf(_) => A,
        }
    }
}

/// Full-information view over a [`TreeGame`].
#[derive(Debug, Clone)]
pub struct Transparent(pub TreeGame);

impl ObservedState for Transparent {
    type Card = u8;
    type World = TreeGame;

    fn perspective(&self) -> u8 {
        self.0.acting_player()
    }

    fn unseen_cards(&self) -> Vec<u8> {
        Vec::new()
    }

    fn opponent_unknown_count(&self) -> usize {
        0
    }

    fn determinize(&self, _permutation: &Permutation<u8>) -> TreeGame {
        self.0.clone()
    }
}

/// The 10-node regression tree.
///
/// ```text
/// 0 (A) -> 1 (B) -> 4: +3
///                -> 5 (A) -> 9: +4
///       -> 2 (B) -> 6: +2, 7: +1, 8: -2
///       -> 3: -1
/// ```
pub fn golden_tree() -> TreeGame {
    use NodeShape::*;
    TreeGame::root(TreeShape {
        nodes: vec![
            Decision { player: A, children: vec![1, 2, 3] },
            Decision { player: B, children: vec![4, 5] },
            Decision { player: B, children: vec![6, 7, 8] },
            Leaf(-1.0),
            Leaf(3.0),
            Decision { player: A, children: vec![9] },
            Leaf(2.0),
            Leaf(1.0),
            Leaf(-2.0),
            Leaf(4.0),
        ],
    })
}

/// Root with a single move straight into a terminal position.
pub fn single_move_tree() -> TreeGame {
    TreeGame::root(TreeShape {
        nodes: vec![
            NodeShape::Decision { player: A, children: vec![1] },
            NodeShape::Leaf(2.0),
        ],
    })
}

/// Root whose second move leads into a node that panics when expanded.
pub fn poisoned_tree() -> TreeGame {
    TreeGame::root(TreeShape {
        nodes: vec![
            NodeShape::Decision { player: A, children: vec![1, 2] },
            NodeShape::Leaf(1.0),
            NodeShape::Poisoned { player: B },
        ],
    })
}

/// Random tree with integer payoffs; players are drawn per node so the
/// same player may move twice in a row.
pub fn random_tree<R: Rng>(rng: &mut R, max_depth: usize, max_branching: usize) -> TreeGame {
    let mut nodes = Vec::new();
    grow(rng, &mut nodes, 0, max_depth, max_branching);
    TreeGame::root(TreeShape { nodes })
}

fn grow<R: Rng>(
    rng: &mut R,
    nodes: &mut Vec<NodeShape>,
    depth: usize,
    max_depth: usize,
    max_branching: usize,
) -> usize {
    let index = nodes.len();
    let leaf = depth == max_depth || (depth > 0 && rng.gen_bool(0.25));
    if leaf {
        nodes.push(NodeShape::Leaf(f64::from(rng.gen_range(-5i32..=5))));
        return index;
    }
    let player = if rng.gen_bool(0.5) { A } else { B };
    nodes.push(NodeShape::Decision {
        player,
        children: Vec::new(),
    });
    let branching = rng.gen_range(1..=max_branching);
    let children: Vec<usize> = (0..branching)
        .map(|_| grow(rng, nodes, depth + 1, max_depth, max_branching))
        .collect();
    nodes[index] = NodeShape::Decision { player, children };
    index
}

/// Plain negamax without pruning or caching, for the acting player.
pub fn brute_force<S: GameState>(state: &S) -> f64 {
    let me = state.acting_player();
    if state.is_terminal() {
        return state.terminal_value(me);
    }
    state
        .legal_actions()
        .into_iter()
        .map(|action| {
            let child = state.apply(action);
            let value = brute_force(&child);
            if child.acting_player() == me { value } else { -value }
        })
        .fold(f64::NEG_INFINITY, f64::max)
}
