use super::node::{Node, NodeId, ucb};
use super::scoring::{ScoringInfo, WorldScores};
use crate::budget::{BudgetTracker, SearchBudget};
use crate::error::SearchError;
use rand::Rng;
use rand::seq::SliceRandom;
use schnapsen_core::rules::GameState;
use std::time::Duration;
use tracing::{Level, event};

pub const DEFAULT_EXPLORATION: f64 = std::f64::consts::SQRT_2;

/// Incrementally grown search tree for one fully observable world.
///
/// Every iteration expands exactly one node and backpropagates through all
/// of its ancestors. There are no random playouts: an expanded node only
/// contributes a reward when it is terminal. Once every child of a fully
/// expanded node is solved, the node's value becomes the exact negamax
/// backup and it is never descended into again.
#[derive(Debug, Clone)]
pub struct GameTree<S: GameState> {
    nodes: Vec<Node<S>>,
    exploration: f64,
    record_samples: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchReport {
    pub iterations: usize,
    pub nodes: usize,
    pub exhausted: bool,
    pub elapsed: Duration,
    pub utilization: u8,
}

impl<S: GameState> GameTree<S> {
    pub fn new(state: S) -> Self {
        Self::with_exploration(state, DEFAULT_EXPLORATION)
    }

    pub fn with_exploration(state: S, exploration: f64) -> Self {
        Self {
            nodes: vec![Node::new(state, None, None, None)],
            exploration,
            record_samples: false,
        }
    }

    /// Keep the per-episode rewards seen by first-level children.
    pub fn recording_samples(mut self, enabled: bool) -> Self {
        self.record_samples = enabled;
        self
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    pub fn node(&self, id: NodeId) -> &Node<S> {
        &self.nodes[id.0]
    }

    pub fn root_node(&self) -> &Node<S> {
        &self.nodes[0]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn exploration(&self) -> f64 {
        self.exploration
    }

    pub fn child(&self, id: NodeId, action: S::Action) -> Option<NodeId> {
        self.node(id).children.get(&action).copied()
    }

    pub fn is_solved(&self) -> bool {
        self.root_node().fully_simulated
    }

    /// Runs iterations until the budget is spent or the root is solved.
    pub fn run<R: Rng + ?Sized>(
        &mut self,
        budget: &SearchBudget,
        rng: &mut R,
    ) -> SearchReport {
        let mut tracker = budget.start();
        while !tracker.should_stop() {
            if !self.run_one_iteration(rng) {
                break;
            }
            tracker.tick();
        }
        self.report(&tracker)
    }

    /// Runs exactly `iterations` iterations (fewer if the root gets solved).
    pub fn run_iterations<R: Rng + ?Sized>(
        &mut self,
        iterations: usize,
        rng: &mut R,
    ) -> Result<SearchReport, SearchError> {
        let budget = SearchBudget::iterations(iterations)?;
        Ok(self.run(&budget, rng))
    }

    fn report(&self, tracker: &BudgetTracker) -> SearchReport {
        let report = SearchReport {
            iterations: tracker.steps(),
            nodes: self.nodes.len(),
            exhausted: self.is_solved(),
            elapsed: tracker.elapsed(),
            utilization: tracker.utilization_percent(),
        };
        if tracing::enabled!(Level::DEBUG) {
            event!(
                target: "schnapsen_bot::search",
                Level::DEBUG,
                iterations = report.iterations,
                nodes = report.nodes,
                exhausted = report.exhausted,
                elapsed_us = report.elapsed.as_micros() as u64,
                utilization = report.utilization,
            );
        }
        report
    }

    /// Selection, expansion and backpropagation of a single new node.
    ///
    /// Returns `false` without touching the tree once the root is solved.
    pub fn run_one_iteration<R: Rng + ?Sized>(&mut self, rng: &mut R) -> bool {
        let mut current = self.root();
        loop {
            let node = &self.nodes[current.0];
            if node.fully_simulated {
                return false;
            }
            if !node.fully_expanded {
                let child = self.expand(current, rng);
                self.backpropagate(child);
                return true;
            }
            // Uniform descent over unsolved children, not UCB-greedy.
            let open: Vec<NodeId> = node
                .children
                .values()
                .copied()
                .filter(|id| !self.nodes[id.0].fully_simulated)
                .collect();
            match open.choose(rng) {
                Some(next) => current = *next,
                None => return false,
            }
        }
    }

    fn expand<R: Rng + ?Sized>(&mut self, id: NodeId, rng: &mut R) -> NodeId {
        let pick = rng.gen_range(0..self.nodes[id.0].untried.len());
        let action = self.nodes[id.0].untried.swap_remove(pick);
        let parent = &self.nodes[id.0];
        let state = parent.state.apply(action);
        let mover = parent.acting;

        let child = NodeId(self.nodes.len());
        self.nodes
            .push(Node::new(state, Some(id), Some(action), Some(mover)));

        let parent = &mut self.nodes[id.0];
        parent.children.insert(action, child);
        parent.fully_expanded = parent.untried.is_empty();
        child
    }

    fn backpropagate(&mut self, leaf: NodeId) {
        let root = self.root();
        let leaf_terminal = self.nodes[leaf.0].terminal;
        let mut cursor = Some(leaf);
        while let Some(id) = cursor {
            let reward = if leaf_terminal {
                let perspective = self.nodes[id.0].perspective();
                self.nodes[leaf.0].state.terminal_value(perspective)
            } else {
                0.0
            };
            let record = self.record_samples;
            let node = &mut self.nodes[id.0];
            node.n += 1;
            node.q += reward;
            if record && node.parent == Some(root) {
                node.samples.push(reward);
            }
            self.refresh(id);
            cursor = self.nodes[id.0].parent;
        }
    }

    /// Recomputes every child's value and promotes `id` to solved when
    /// all of its children are.
    fn refresh(&mut self, id: NodeId) {
        let parent_n = self.nodes[id.0].n;
        let exploration = self.exploration;
        let children: Vec<NodeId> = self.nodes[id.0].children.values().copied().collect();

        let mut all_solved = self.nodes[id.0].fully_expanded;
        let mut best = f64::NEG_INFINITY;
        for child in &children {
            let node = &mut self.nodes[child.0];
            if node.fully_simulated {
                best = best.max(node.value);
            } else {
                node.value = ucb(node.q, node.n, parent_n, exploration);
                all_solved = false;
            }
        }

        let node = &mut self.nodes[id.0];
        if node.fully_simulated {
            return;
        }
        if all_solved && !children.is_empty() {
            node.value = if node.mover.is_none_or(|mover| mover == node.acting) {
                best
            } else {
                -best
            };
            node.fully_simulated = true;
        } else if node.parent.is_none() {
            node.value = node.mean_value();
        }
    }

    /// Action whose child has the highest value, ties broken uniformly.
    pub fn best_action<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<S::Action> {
        let root = self.root_node();
        let best = root
            .children
            .values()
            .map(|id| self.nodes[id.0].value)
            .fold(f64::NEG_INFINITY, f64::max);
        let tied: Vec<S::Action> = root
            .children
            .iter()
            .filter(|(_, id)| self.nodes[id.0].value == best)
            .map(|(action, _)| *action)
            .collect();
        tied.choose(rng).copied()
    }

    /// First-level statistics, the only part shipped back in reduced mode.
    pub fn root_scoring(&self) -> WorldScores<S::Action> {
        self.root_node()
            .children
            .iter()
            .map(|(action, id)| {
                let node = &self.nodes[id.0];
                let samples = if self.record_samples {
                    Some(node.samples.clone())
                } else {
                    None
                };
                (
                    *action,
                    ScoringInfo::from_stats(
                        node.q,
                        node.n,
                        node.value,
                        node.fully_simulated,
                        node.terminal,
                        samples,
                    ),
                )
            })
            .collect()
    }

    /// Iterates nodes in allocation order (root first).
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &Node<S>)> {
        self.nodes
            .iter()
            .enumerate()
            .map(|(index, node)| (NodeId(index), node))
    }
}
