//! Validated ARBAC policy model.
//!
//! A [`Policy`] is the immutable input to the reachability engine: the role
//! and user universes, the initial role assignment, the administrative rules,
//! and the goal role. Construction validates that every role and user
//! referenced anywhere actually belongs to the declared universes, so the
//! engine never begins exploring an inconsistent policy.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use arbac_types::{Role, RoleAssignment, User};

// ============================================================================
// Administrative Rules
// ============================================================================

/// Authorizes granting `target_role`, provided some user holds `admin_role`
/// and the target user satisfies the conditions.
///
/// The target user must hold every role in `positive` and none of the roles
/// in `negative`. The admin check and the target selection are independent:
/// an admin may target itself (self-administration).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssignRule {
    /// Role whose possession by any user authorizes this grant.
    pub admin_role: Role,
    /// Roles the target user must hold.
    pub positive: BTreeSet<Role>,
    /// Roles the target user must not hold.
    pub negative: BTreeSet<Role>,
    /// Role granted to the target user.
    pub target_role: Role,
}

impl AssignRule {
    /// Returns true if `target` satisfies this rule's conditions in `state`.
    pub fn target_eligible(&self, state: &RoleAssignment, target: &User) -> bool {
        let Some(held) = state.roles_of(target) else {
            return false;
        };
        self.positive.is_subset(held) && self.negative.is_disjoint(held)
    }

    /// Iterates over every role this rule references.
    fn referenced_roles(&self) -> impl Iterator<Item = &Role> {
        std::iter::once(&self.admin_role)
            .chain(&self.positive)
            .chain(&self.negative)
            .chain(std::iter::once(&self.target_role))
    }
}

/// Authorizes removing `target_role` from any user holding it, provided some
/// user holds `admin_role`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevokeRule {
    /// Role whose possession by any user authorizes this revocation.
    pub admin_role: Role,
    /// Role removed from the target user.
    pub target_role: Role,
}

// ============================================================================
// Policy
// ============================================================================

/// A validated, immutable ARBAC policy.
///
/// Invariant: every role and user referenced by the initial assignment or by
/// any rule belongs to the declared universes, and the goal role is declared.
/// [`Policy::new`] is the only way to construct one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Policy {
    roles: BTreeSet<Role>,
    users: BTreeSet<User>,
    initial: RoleAssignment,
    assign_rules: Vec<AssignRule>,
    revoke_rules: Vec<RevokeRule>,
    goal: Role,
}

impl Policy {
    /// Validates and constructs a policy.
    ///
    /// `initial` lists the `(user, role)` pairs of the initial assignment;
    /// users with no pair start with zero roles.
    pub fn new(
        roles: BTreeSet<Role>,
        users: BTreeSet<User>,
        initial: Vec<(User, Role)>,
        assign_rules: Vec<AssignRule>,
        revoke_rules: Vec<RevokeRule>,
        goal: Role,
    ) -> Result<Self, PolicyError> {
        for (user, role) in &initial {
            if !users.contains(user) {
                return Err(PolicyError::UndeclaredUser(user.clone()));
            }
            if !roles.contains(role) {
                return Err(PolicyError::UndeclaredInitialRole(role.clone()));
            }
        }

        for (index, rule) in assign_rules.iter().enumerate() {
            if let Some(role) = rule.referenced_roles().find(|r| !roles.contains(*r)) {
                return Err(PolicyError::UndeclaredAssignRuleRole {
                    index,
                    role: role.clone(),
                });
            }
        }

        for (index, rule) in revoke_rules.iter().enumerate() {
            for role in [&rule.admin_role, &rule.target_role] {
                if !roles.contains(role) {
                    return Err(PolicyError::UndeclaredRevokeRuleRole {
                        index,
                        role: role.clone(),
                    });
                }
            }
        }

        if !roles.contains(&goal) {
            return Err(PolicyError::UndeclaredGoal(goal));
        }

        let mut assignment = RoleAssignment::new(users.iter().cloned());
        for (user, role) in initial {
            assignment = assignment.granted(&user, role);
        }

        Ok(Self {
            roles,
            users,
            initial: assignment,
            assign_rules,
            revoke_rules,
            goal,
        })
    }

    /// Returns the declared role universe.
    pub fn roles(&self) -> &BTreeSet<Role> {
        &self.roles
    }

    /// Returns the declared user universe.
    pub fn users(&self) -> &BTreeSet<User> {
        &self.users
    }

    /// Returns the initial role assignment.
    pub fn initial(&self) -> &RoleAssignment {
        &self.initial
    }

    /// Returns the assignment rules, in declaration order.
    pub fn assign_rules(&self) -> &[AssignRule] {
        &self.assign_rules
    }

    /// Returns the revocation rules, in declaration order.
    pub fn revoke_rules(&self) -> &[RevokeRule] {
        &self.revoke_rules
    }

    /// Returns the goal role.
    pub fn goal(&self) -> &Role {
        &self.goal
    }

    /// Upper bound on the number of distinct reachable states.
    ///
    /// Each user's role set is a subset of the role universe, so the state
    /// space is bounded by `2^(|users| × |roles|)` assignments; this bound is
    /// why the search always terminates, and why a budget is advisable for
    /// large policies. Saturates at `u128::MAX`.
    pub fn state_space_bound(&self) -> u128 {
        let cells = (self.users.len() as u32).saturating_mul(self.roles.len() as u32);
        if cells >= 128 {
            u128::MAX
        } else {
            1u128 << cells
        }
    }
}

/// Errors raised at policy construction, before any search state exists.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PolicyError {
    #[error("initial assignment references undeclared user '{0}'")]
    UndeclaredUser(User),

    #[error("initial assignment references undeclared role '{0}'")]
    UndeclaredInitialRole(Role),

    #[error("assign rule {index} references undeclared role '{role}'")]
    UndeclaredAssignRuleRole { index: usize, role: Role },

    #[error("revoke rule {index} references undeclared role '{role}'")]
    UndeclaredRevokeRuleRole { index: usize, role: Role },

    #[error("goal role '{0}' is not declared")]
    UndeclaredGoal(Role),
}
