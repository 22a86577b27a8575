//! Breadth-first reachability search.
//!
//! The engine drives a level-synchronous fixpoint search over role-assignment
//! states: expand every frontier state by one rule application, deduplicate
//! candidates against the visited set by digest, and stop when a state
//! assigns the goal role to some user (`Reachable`), when a level produces no
//! new states (`Unreachable`), or when a configured state budget runs out
//! (`Unknown`).
//!
//! The search is pure computation over immutable values: no IO, no clocks.
//! Each level is an independent map (optionally a rayon parallel map)
//! followed by a single-threaded merge into the visited set, so membership
//! checks are never raced.

use std::collections::{HashMap, HashSet};

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use arbac_types::{RoleAssignment, StateDigest};

use crate::policy::Policy;
use crate::transitions::{RuleApplication, successors_with_applications};

// ============================================================================
// Configuration & Outcome
// ============================================================================

/// Tunables for a reachability search.
#[derive(Debug, Clone, Default)]
pub struct SearchConfig {
    /// Stop with [`Outcome::Unknown`] once the visited set reaches this many
    /// states. `None` means unbounded (the state space itself is finite, but
    /// exponential in the worst case).
    pub max_states: Option<usize>,
    /// Reject successor states in which every user holds zero roles.
    ///
    /// Not part of standard ARBAC reachability; this materially changes
    /// which instances are reachable and is therefore off by default.
    pub forbid_fully_revoked: bool,
    /// Record enough bookkeeping to return a witness rule sequence when the
    /// goal is reachable.
    pub record_witness: bool,
    /// Expand each BFS level with a rayon parallel map.
    pub parallel: bool,
}

/// Result of a reachability search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    /// Some sequence of rule applications gives the goal role to a user.
    ///
    /// `witness` is present when [`SearchConfig::record_witness`] was set;
    /// it lists the rule applications from the initial state to a
    /// goal-holding state (empty if the initial state already satisfies the
    /// goal).
    Reachable {
        witness: Option<Vec<RuleApplication>>,
    },
    /// The search reached a fixpoint: no reachable state assigns the goal.
    Unreachable,
    /// The state budget ran out before an answer was found.
    ///
    /// This is a distinct outcome, never conflated with `Unreachable`:
    /// absence of a timely answer is not a proven negative.
    Unknown {
        /// Number of states explored before giving up.
        explored: usize,
    },
}

impl Outcome {
    /// Returns true if the goal was proven reachable.
    pub fn is_reachable(&self) -> bool {
        matches!(self, Outcome::Reachable { .. })
    }
}

// ============================================================================
// Engine
// ============================================================================

/// Decides whether a policy's goal role is reachable.
///
/// Holds no mutable state between runs; every [`ReachabilityEngine::run`]
/// starts from the policy's initial assignment.
#[derive(Debug, Clone)]
pub struct ReachabilityEngine {
    policy: Policy,
    config: SearchConfig,
}

impl ReachabilityEngine {
    /// Creates an engine with the default configuration.
    pub fn new(policy: Policy) -> Self {
        Self::with_config(policy, SearchConfig::default())
    }

    /// Creates an engine with an explicit configuration.
    pub fn with_config(policy: Policy, config: SearchConfig) -> Self {
        Self { policy, config }
    }

    /// Returns the policy under analysis.
    pub fn policy(&self) -> &Policy {
        &self.policy
    }

    /// Runs the breadth-first search to a verdict.
    ///
    /// Terminates on every input: the visited set is bounded by the finite
    /// state space (see [`Policy::state_space_bound`]), and every level
    /// either admits a new state or ends the search.
    pub fn run(&self) -> Outcome {
        let goal = self.policy.goal();
        let initial = self.policy.initial().clone();
        let initial_digest = initial.digest();

        if initial.any_user_holds(goal) {
            info!(goal = %goal, "goal role held in initial assignment");
            return Outcome::Reachable {
                witness: self.config.record_witness.then(Vec::new),
            };
        }

        let mut visited: HashSet<StateDigest> = HashSet::from([initial_digest]);
        // digest -> (parent digest, rule application), for witness replay
        let mut parents: HashMap<StateDigest, (StateDigest, RuleApplication)> = HashMap::new();
        let mut frontier: Vec<(RoleAssignment, StateDigest)> = vec![(initial, initial_digest)];
        let mut level = 0usize;

        loop {
            level += 1;

            // Embarrassingly parallel map: successor generation per frontier
            // state is independent. The merge below is the only serialized
            // section, so workers never race on visited-set membership.
            let expanded: Vec<(StateDigest, Vec<(RoleAssignment, RuleApplication)>)> =
                if self.config.parallel {
                    frontier
                        .par_iter()
                        .map(|(state, digest)| {
                            (*digest, successors_with_applications(state, &self.policy))
                        })
                        .collect()
                } else {
                    frontier
                        .iter()
                        .map(|(state, digest)| {
                            (*digest, successors_with_applications(state, &self.policy))
                        })
                        .collect()
                };

            let mut next_frontier = Vec::new();
            for (parent_digest, candidates) in expanded {
                for (candidate, application) in candidates {
                    if self.config.forbid_fully_revoked && candidate.is_fully_revoked() {
                        continue;
                    }
                    let digest = candidate.digest();
                    if !visited.insert(digest) {
                        continue;
                    }
                    if self.config.record_witness {
                        parents.insert(digest, (parent_digest, application));
                    }
                    if candidate.any_user_holds(goal) {
                        info!(
                            goal = %goal,
                            level,
                            visited = visited.len(),
                            "goal role reachable"
                        );
                        let witness = self
                            .config
                            .record_witness
                            .then(|| reconstruct_witness(&parents, digest));
                        return Outcome::Reachable { witness };
                    }
                    next_frontier.push((candidate, digest));
                }
            }

            debug!(
                level,
                frontier = frontier.len(),
                admitted = next_frontier.len(),
                visited = visited.len(),
                "expanded search level"
            );

            if next_frontier.is_empty() {
                info!(goal = %goal, level, visited = visited.len(), "search exhausted");
                return Outcome::Unreachable;
            }

            if let Some(max_states) = self.config.max_states
                && visited.len() >= max_states
            {
                info!(
                    goal = %goal,
                    level,
                    visited = visited.len(),
                    max_states,
                    "state budget exceeded"
                );
                return Outcome::Unknown {
                    explored: visited.len(),
                };
            }

            frontier = next_frontier;
        }
    }
}

/// Walks the parent map back from the goal state to the initial state.
///
/// The initial state has no parent entry, which terminates the walk.
fn reconstruct_witness(
    parents: &HashMap<StateDigest, (StateDigest, RuleApplication)>,
    goal_state: StateDigest,
) -> Vec<RuleApplication> {
    let mut steps = Vec::new();
    let mut cursor = goal_state;
    while let Some((parent, application)) = parents.get(&cursor) {
        steps.push(application.clone());
        cursor = *parent;
    }
    steps.reverse();
    steps
}
