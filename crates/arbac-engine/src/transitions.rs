//! One-step successor generation.
//!
//! Given a state and a policy, produce every state reachable by applying
//! exactly one administrative rule. The generator is pure and deduplicates
//! its own output by digest, but the engine remains the single authority on
//! which successors are globally new.

use std::collections::HashSet;
use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};

use arbac_types::{RoleAssignment, StateDigest, User};

use crate::policy::Policy;

/// One application of an administrative rule: which rule fired and on whom.
///
/// Rule indexes refer to the policy's `assign_rules` / `revoke_rules` lists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RuleApplication {
    /// Assign rule `rule` granted its target role to `target`.
    Assign { rule: usize, target: User },
    /// Revoke rule `rule` removed its target role from `target`.
    Revoke { rule: usize, target: User },
}

impl Display for RuleApplication {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuleApplication::Assign { rule, target } => {
                write!(f, "assign rule {rule} -> {target}")
            }
            RuleApplication::Revoke { rule, target } => {
                write!(f, "revoke rule {rule} -> {target}")
            }
        }
    }
}

/// Produces all states reachable from `state` by one rule application.
pub fn successors(state: &RoleAssignment, policy: &Policy) -> Vec<RoleAssignment> {
    successors_with_applications(state, policy)
        .into_iter()
        .map(|(next, _)| next)
        .collect()
}

/// Like [`successors`], also reporting which rule application produced each
/// successor (used for witness recording).
///
/// Semantics per rule:
///
/// - An assign rule contributes nothing unless some user holds its admin
///   role. Otherwise every user is a candidate target, including the admin
///   itself (self-administration is permitted). A target is eligible if it
///   holds all positive conditions and none of the negative ones; granting a
///   role the target already holds emits no successor.
/// - A revoke rule contributes nothing unless some user holds its admin
///   role. Otherwise it emits one successor per user currently holding the
///   revoked role. Non-holders emit nothing.
///
/// No-op transitions are never materialized, and successors that coincide
/// with each other are deduplicated by digest before being returned.
pub fn successors_with_applications(
    state: &RoleAssignment,
    policy: &Policy,
) -> Vec<(RoleAssignment, RuleApplication)> {
    let mut seen: HashSet<StateDigest> = HashSet::new();
    let mut out = Vec::new();

    let mut emit = |next: RoleAssignment, application: RuleApplication| {
        if seen.insert(next.digest()) {
            out.push((next, application));
        }
    };

    for (rule_index, rule) in policy.assign_rules().iter().enumerate() {
        if !state.any_user_holds(&rule.admin_role) {
            continue;
        }
        for target in state.users() {
            if !rule.target_eligible(state, target) {
                continue;
            }
            if let Some(next) = state.with_role(target, &rule.target_role) {
                emit(
                    next,
                    RuleApplication::Assign {
                        rule: rule_index,
                        target: target.clone(),
                    },
                );
            }
        }
    }

    for (rule_index, rule) in policy.revoke_rules().iter().enumerate() {
        if !state.any_user_holds(&rule.admin_role) {
            continue;
        }
        for target in state.users_holding(&rule.target_role) {
            if let Some(next) = state.without_role(target, &rule.target_role) {
                emit(
                    next,
                    RuleApplication::Revoke {
                        rule: rule_index,
                        target: target.clone(),
                    },
                );
            }
        }
    }

    out
}
