//! Canonical state digests for role-assignment states.
//!
//! The reachability search deduplicates states against a visited set, and
//! membership checks against that set dominate the cost of the search. Rather
//! than key the set by whole states, each state is reduced to a fixed-size
//! BLAKE3 digest computed over a deterministic encoding.
//!
//! # Determinism
//!
//! The digest hashes users in sorted order and each user's roles in sorted
//! order (`BTreeMap`/`BTreeSet` iteration), with length prefixes so that
//! adjacent fields can never be confused. Same state → same digest, and two
//! states with equal digests assign the same role set to every user (modulo
//! cryptographic collision).

use std::fmt::{self, Debug, Display};

use blake3::Hasher;
use serde::{Deserialize, Serialize};

use crate::RoleAssignment;

/// Length of a state digest in bytes (BLAKE3).
pub const DIGEST_LENGTH: usize = 32;

/// A 32-byte canonical key for a role-assignment state.
///
/// Cheap to copy, hash, and compare; used as the key of the visited set.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct StateDigest([u8; DIGEST_LENGTH]);

impl StateDigest {
    /// Returns the digest as a byte array.
    pub fn as_bytes(&self) -> &[u8; DIGEST_LENGTH] {
        &self.0
    }
}

impl Debug for StateDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // First 8 bytes in hex are plenty for debugging output
        write!(
            f,
            "StateDigest({:02x}{:02x}{:02x}{:02x}{:02x}{:02x}{:02x}{:02x}...)",
            self.0[0], self.0[1], self.0[2], self.0[3], self.0[4], self.0[5], self.0[6], self.0[7]
        )
    }
}

impl Display for StateDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.0 {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

impl RoleAssignment {
    /// Computes the canonical digest of this state.
    ///
    /// Two states have equal digests iff they assign exactly the same role
    /// set to every user, independent of how either state was constructed.
    pub fn digest(&self) -> StateDigest {
        let mut hasher = Hasher::new();

        hasher.update(&(self.user_count() as u64).to_le_bytes());
        for (user, roles) in self {
            hasher.update(&(user.as_str().len() as u64).to_le_bytes());
            hasher.update(user.as_str().as_bytes());
            hasher.update(&(roles.len() as u64).to_le_bytes());
            for role in roles {
                hasher.update(&(role.as_str().len() as u64).to_le_bytes());
                hasher.update(role.as_str().as_bytes());
            }
        }

        StateDigest(*hasher.finalize().as_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Role, User};

    use proptest::prelude::*;

    fn universe(names: &[&str]) -> RoleAssignment {
        RoleAssignment::new(names.iter().map(|n| User::from(*n)))
    }

    #[test]
    fn equal_states_have_equal_digests() {
        let a = universe(&["u1", "u2"]).granted(&User::from("u1"), Role::from("r1"));
        let b = universe(&["u2", "u1"]).granted(&User::from("u1"), Role::from("r1"));
        assert_eq!(a.digest(), b.digest());
    }

    #[test]
    fn digest_is_idempotent() {
        let state = universe(&["u1"]).granted(&User::from("u1"), Role::from("r1"));
        assert_eq!(state.digest(), state.digest());
    }

    #[test]
    fn different_role_sets_have_different_digests() {
        let base = universe(&["u1", "u2"]);
        let with_r1 = base.clone().granted(&User::from("u1"), Role::from("r1"));
        assert_ne!(base.digest(), with_r1.digest());
    }

    #[test]
    fn role_ownership_is_not_ambiguous() {
        // Same multiset of roles held, but by different users
        let a = universe(&["u1", "u2"]).granted(&User::from("u1"), Role::from("r1"));
        let b = universe(&["u1", "u2"]).granted(&User::from("u2"), Role::from("r1"));
        assert_ne!(a.digest(), b.digest());
    }

    #[test]
    fn name_boundaries_are_not_ambiguous() {
        // "ab" + "c" must not collide with "a" + "bc" across field boundaries
        let a = universe(&["ab"]).granted(&User::from("ab"), Role::from("c"));
        let b = universe(&["a"]).granted(&User::from("a"), Role::from("bc"));
        assert_ne!(a.digest(), b.digest());
    }

    /// Strategy: a small universe with arbitrary grants, plus a shuffled
    /// insertion order for the equivalent state.
    fn arb_grants() -> impl Strategy<Value = Vec<(u8, u8)>> {
        prop::collection::vec((0u8..4, 0u8..4), 0..12)
    }

    fn build(grants: &[(u8, u8)]) -> RoleAssignment {
        let mut state = universe(&["u0", "u1", "u2", "u3"]);
        for (u, r) in grants {
            state = state.granted(&User::new(format!("u{u}")), Role::new(format!("r{r}")));
        }
        state
    }

    proptest! {
        /// Digest equality must coincide with semantic state equality.
        #[test]
        fn digest_tracks_semantic_equality(grants in arb_grants(), mut reordered in arb_grants()) {
            let a = build(&grants);

            // Same grants in reverse order always yield the same digest.
            let mut rev = grants.clone();
            rev.reverse();
            prop_assert_eq!(a.digest(), build(&rev).digest());

            // Arbitrary other grant sets agree with semantic equality.
            reordered.sort_unstable();
            let b = build(&reordered);
            prop_assert_eq!(a == b, a.digest() == b.digest());
        }
    }
}
