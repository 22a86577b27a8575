//! # arbac-engine: Explicit-state reachability for ARBAC policies
//!
//! Decides the canonical ARBAC reachability question: given an initial
//! assignment of roles to users and a set of administrator-governed rules for
//! granting and revoking roles, can some sequence of rule applications cause
//! a designated goal role to be held by any user? This is the audit question
//! for privilege-escalation paths in an administrative access-control
//! configuration.
//!
//! ## Key Principles
//!
//! - **No IO**: the engine computes over immutable in-memory values only
//! - **No clocks**: budgets are counted in states, not wall time
//! - **Deterministic**: same policy always produces the same verdict
//!
//! ## Architecture
//!
//! - [`policy`]: validated immutable policy model ([`Policy`], rules, errors)
//! - [`transitions`]: one-step successor generation from a state
//! - [`search`]: the level-synchronous BFS fixpoint ([`ReachabilityEngine`])
//!
//! ## Example
//!
//! ```
//! use std::collections::BTreeSet;
//! use arbac_engine::{AssignRule, Policy, ReachabilityEngine};
//! use arbac_types::{Role, User};
//!
//! let policy = Policy::new(
//!     BTreeSet::from([Role::from("r1"), Role::from("r2")]),
//!     BTreeSet::from([User::from("u1"), User::from("u2")]),
//!     vec![(User::from("u1"), Role::from("r1"))],
//!     vec![AssignRule {
//!         admin_role: Role::from("r1"),
//!         positive: BTreeSet::new(),
//!         negative: BTreeSet::new(),
//!         target_role: Role::from("r2"),
//!     }],
//!     vec![],
//!     Role::from("r2"),
//! )?;
//!
//! let outcome = ReachabilityEngine::new(policy).run();
//! assert!(outcome.is_reachable());
//! # Ok::<(), arbac_engine::PolicyError>(())
//! ```

pub mod policy;
pub mod search;
pub mod transitions;


// Re-export commonly used items
pub use policy::{AssignRule, Policy, PolicyError, RevokeRule};
pub use search::{Outcome, ReachabilityEngine, SearchConfig};
pub use transitions::{RuleApplication, successors, successors_with_applications};
