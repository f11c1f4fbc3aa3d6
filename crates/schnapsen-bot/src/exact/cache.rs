use schnapsen_core::rules::GameState;

/// What a cached score proves about the true value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bound {
    /// The stored score is the true value.
    Exact,
    /// The true value is at least the stored score (the search failed high).
    Lower,
    /// The true value is at most the stored score (the search failed low).
    Upper,
}

/// Cached result for one fully observable state.
#[derive(Debug, Clone)]
pub struct CacheEntry<S: GameState> {
    pub score: f64,
    pub bound: Bound,
    /// Expanded children in move order, kept so a re-search never calls
    /// `legal_actions`/`apply` for this state again.
    pub children: Vec<(S::Action, S)>,
    pub best_action: Option<S::Action>,
}

impl<S: GameState> CacheEntry<S> {
    /// Whether the stored score settles a search with window `(alpha, beta)`.
    pub fn cutoff(&self, alpha: f64, beta: f64) -> bool {
        match self.bound {
            Bound::Exact => true,
            Bound::Lower => self.score >= beta,
            Bound::Upper => self.score <= alpha,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SearchStats {
    pub nodes_visited: u64,
    pub cache_hits: u64,
    /// Child states produced by `apply`; never grows for a cached state.
    pub children_generated: u64,
}
