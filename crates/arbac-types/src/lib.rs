//! # arbac-types: Core types for ARBAC reachability analysis
//!
//! This crate contains the shared types used across the analyzer:
//! - Identifiers ([`Role`], [`User`])
//! - Role-assignment state ([`RoleAssignment`])
//! - Canonical state keys ([`StateDigest`])
//!
//! A [`RoleAssignment`] maps every user in a policy to the set of roles that
//! user currently holds. The user universe is fixed at construction: searches
//! only ever add or remove roles, never users. Because the state is stored in
//! `BTreeMap`/`BTreeSet` form, equality is canonical by construction — two
//! assignments compare equal iff every user holds exactly the same role set,
//! regardless of the order anything was inserted.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};

pub mod digest;

pub use digest::StateDigest;

// ============================================================================
// Identifiers - compared by value
// ============================================================================

/// A role name, compared by value.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Role(String);

impl Role {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Returns the role name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Role {
    fn from(name: &str) -> Self {
        Self(name.to_string())
    }
}

impl From<String> for Role {
    fn from(name: String) -> Self {
        Self(name)
    }
}

/// A user name, compared by value.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct User(String);

impl User {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Returns the user name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for User {
    fn from(name: &str) -> Self {
        Self(name.to_string())
    }
}

impl From<String> for User {
    fn from(name: String) -> Self {
        Self(name)
    }
}

// ============================================================================
// Role Assignment State
// ============================================================================

/// The role-assignment state of a policy: which roles each user holds.
///
/// Every user in the policy's user universe is present as a key, possibly
/// mapped to an empty role set. States are immutable once created; the
/// search produces successors functionally via [`RoleAssignment::with_role`]
/// and [`RoleAssignment::without_role`].
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RoleAssignment {
    assignments: BTreeMap<User, BTreeSet<Role>>,
}

impl RoleAssignment {
    /// Creates an assignment where every given user holds zero roles.
    pub fn new(users: impl IntoIterator<Item = User>) -> Self {
        Self {
            assignments: users
                .into_iter()
                .map(|user| (user, BTreeSet::new()))
                .collect(),
        }
    }

    /// Grants a role during initial construction and returns the updated
    /// assignment (builder pattern).
    ///
    /// Unknown users are ignored: the user universe is fixed at `new`.
    pub fn granted(mut self, user: &User, role: Role) -> Self {
        if let Some(roles) = self.assignments.get_mut(user) {
            roles.insert(role);
        }
        self
    }

    /// Returns the users in this assignment, in sorted order.
    pub fn users(&self) -> impl Iterator<Item = &User> {
        self.assignments.keys()
    }

    /// Returns the number of users in the universe.
    pub fn user_count(&self) -> usize {
        self.assignments.len()
    }

    /// Returns the role set held by a user, if the user exists.
    pub fn roles_of(&self, user: &User) -> Option<&BTreeSet<Role>> {
        self.assignments.get(user)
    }

    /// Returns true if the given user currently holds the given role.
    pub fn holds(&self, user: &User, role: &Role) -> bool {
        self.assignments
            .get(user)
            .is_some_and(|roles| roles.contains(role))
    }

    /// Returns true if at least one user holds the given role.
    pub fn any_user_holds(&self, role: &Role) -> bool {
        self.assignments.values().any(|roles| roles.contains(role))
    }

    /// Returns the users currently holding the given role, in sorted order.
    pub fn users_holding<'a>(&'a self, role: &'a Role) -> impl Iterator<Item = &'a User> {
        self.assignments
            .iter()
            .filter(move |(_, roles)| roles.contains(role))
            .map(|(user, _)| user)
    }

    /// Returns a successor state in which `user` additionally holds `role`.
    ///
    /// Returns `None` if the user already holds the role (or is unknown):
    /// no-op transitions are never materialized, they would be redundant
    /// with the parent state.
    pub fn with_role(&self, user: &User, role: &Role) -> Option<Self> {
        let roles = self.assignments.get(user)?;
        if roles.contains(role) {
            return None;
        }
        let mut next = self.clone();
        next.assignments
            .get_mut(user)
            .expect("user present in parent state")
            .insert(role.clone());
        Some(next)
    }

    /// Returns a successor state in which `user` no longer holds `role`.
    ///
    /// Returns `None` if the user does not hold the role (or is unknown).
    pub fn without_role(&self, user: &User, role: &Role) -> Option<Self> {
        let roles = self.assignments.get(user)?;
        if !roles.contains(role) {
            return None;
        }
        let mut next = self.clone();
        next.assignments
            .get_mut(user)
            .expect("user present in parent state")
            .remove(role);
        Some(next)
    }

    /// Returns true if every user holds zero roles.
    pub fn is_fully_revoked(&self) -> bool {
        self.assignments.values().all(BTreeSet::is_empty)
    }

    /// Iterates over `(user, role set)` pairs in sorted user order.
    pub fn iter(&self) -> impl Iterator<Item = (&User, &BTreeSet<Role>)> {
        self.assignments.iter()
    }
}

impl<'a> IntoIterator for &'a RoleAssignment {
    type Item = (&'a User, &'a BTreeSet<Role>);
    type IntoIter = std::collections::btree_map::Iter<'a, User, BTreeSet<Role>>;

    fn into_iter(self) -> Self::IntoIter {
        self.assignments.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn universe(names: &[&str]) -> RoleAssignment {
        RoleAssignment::new(names.iter().map(|n| User::from(*n)))
    }

    #[test]
    fn new_assignment_has_empty_role_sets() {
        let state = universe(&["u1", "u2"]);
        assert_eq!(state.user_count(), 2);
        assert!(state.is_fully_revoked());
        assert!(state.roles_of(&User::from("u1")).unwrap().is_empty());
    }

    #[test]
    fn granted_is_order_insensitive() {
        let u1 = User::from("u1");
        let u2 = User::from("u2");
        let a = universe(&["u1", "u2"])
            .granted(&u1, Role::from("r1"))
            .granted(&u2, Role::from("r2"))
            .granted(&u1, Role::from("r3"));
        let b = universe(&["u2", "u1"])
            .granted(&u1, Role::from("r3"))
            .granted(&u1, Role::from("r1"))
            .granted(&u2, Role::from("r2"));
        assert_eq!(a, b);
    }

    #[test]
    fn granted_ignores_unknown_user() {
        let state = universe(&["u1"]).granted(&User::from("ghost"), Role::from("r1"));
        assert_eq!(state.user_count(), 1);
        assert!(!state.any_user_holds(&Role::from("r1")));
    }

    #[test]
    fn with_role_adds_exactly_one_role() {
        let u1 = User::from("u1");
        let r1 = Role::from("r1");
        let state = universe(&["u1", "u2"]);

        let next = state.with_role(&u1, &r1).expect("grant should succeed");
        assert!(next.holds(&u1, &r1));
        assert!(!state.holds(&u1, &r1), "parent state is unchanged");
        assert_eq!(next.roles_of(&u1).unwrap().len(), 1);
    }

    #[test]
    fn with_role_on_held_role_is_none() {
        let u1 = User::from("u1");
        let r1 = Role::from("r1");
        let state = universe(&["u1"]).granted(&u1, r1.clone());
        assert!(state.with_role(&u1, &r1).is_none());
    }

    #[test]
    fn without_role_removes_exactly_one_role() {
        let u1 = User::from("u1");
        let r1 = Role::from("r1");
        let state = universe(&["u1"])
            .granted(&u1, r1.clone())
            .granted(&u1, Role::from("r2"));

        let next = state.without_role(&u1, &r1).expect("revoke should succeed");
        assert!(!next.holds(&u1, &r1));
        assert!(next.holds(&u1, &Role::from("r2")));
        assert!(state.holds(&u1, &r1), "parent state is unchanged");
    }

    #[test]
    fn without_role_on_missing_role_is_none() {
        let u1 = User::from("u1");
        let state = universe(&["u1"]);
        assert!(state.without_role(&u1, &Role::from("r1")).is_none());
    }

    #[test]
    fn users_holding_finds_all_holders() {
        let r1 = Role::from("r1");
        let state = universe(&["u1", "u2", "u3"])
            .granted(&User::from("u1"), r1.clone())
            .granted(&User::from("u3"), r1.clone());

        let holders: Vec<&str> = state.users_holding(&r1).map(User::as_str).collect();
        assert_eq!(holders, vec!["u1", "u3"]);
        assert!(state.any_user_holds(&r1));
        assert!(!state.any_user_holds(&Role::from("r2")));
    }
}
