//! # arbac-parser: Textual ARBAC policy format
//!
//! Parses the line-oriented `.arbac` policy format into a validated
//! [`Policy`]. The format has one section per line:
//!
//! ```text
//! Roles r1 r2 ... rn end
//! Users u1 u2 ... um end
//! UA (u,r) (u,r) ... end
//! CR (rAdmin,rRevoked) ... end
//! CA (rAdmin,cond1&cond2&...,rAssigned) ... end
//! Goal r
//! ```
//!
//! Conditions in a `CA` tuple are `&`-separated role names; a `-` prefix
//! marks a negative condition (the target must not hold the role). The
//! special tokens `TRUE` (no constraint) and `FALSE` (never satisfiable) are
//! accepted; a rule with a `FALSE` condition can never fire and is omitted
//! from the resulting policy.
//!
//! The engine never sees this textual form: `parse_policy` hands over a
//! fully validated [`Policy`] or fails with a line-numbered [`ParseError`].

use std::collections::BTreeSet;

use arbac_engine::{AssignRule, Policy, PolicyError, RevokeRule};
use arbac_types::{Role, User};

pub type Result<T> = std::result::Result<T, ParseError>;

/// Errors raised while parsing the textual policy format.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("line {line}: unknown section keyword '{keyword}'")]
    UnknownKeyword { line: usize, keyword: String },

    #[error("line {line}: duplicate section '{section}'")]
    DuplicateSection { line: usize, section: String },

    #[error("line {line}: section '{section}' is not terminated by 'end'")]
    MissingTerminator { line: usize, section: String },

    #[error("line {line}: malformed tuple '{token}'")]
    MalformedTuple { line: usize, token: String },

    #[error("line {line}: malformed condition '{token}'")]
    MalformedCondition { line: usize, token: String },

    #[error("line {line}: 'Goal' expects exactly one role")]
    MalformedGoal { line: usize },

    #[error("missing required section '{0}'")]
    MissingSection(&'static str),

    #[error("policy validation failed: {0}")]
    Invalid(#[from] PolicyError),
}

/// Accumulates sections as they are encountered; each may appear once.
#[derive(Default)]
struct Sections {
    roles: Option<BTreeSet<Role>>,
    users: Option<BTreeSet<User>>,
    initial: Option<Vec<(User, Role)>>,
    assign_rules: Option<Vec<AssignRule>>,
    revoke_rules: Option<Vec<RevokeRule>>,
    goal: Option<Role>,
}

/// Parses a complete textual policy into a validated [`Policy`].
///
/// Blank lines are ignored. `Roles`, `Users`, and `Goal` are required;
/// `UA`, `CR`, and `CA` default to empty when absent.
pub fn parse_policy(input: &str) -> Result<Policy> {
    let mut sections = Sections::default();

    for (index, raw_line) in input.lines().enumerate() {
        let line = index + 1;
        let text = raw_line.trim();
        if text.is_empty() {
            continue;
        }

        let keyword = text.split_whitespace().next().unwrap_or_default();
        match keyword {
            "Roles" => {
                let tokens = body_tokens(text, line, "Roles", &sections.roles)?;
                sections.roles = Some(tokens.iter().map(|t| Role::from(*t)).collect());
            }
            "Users" => {
                let tokens = body_tokens(text, line, "Users", &sections.users)?;
                sections.users = Some(tokens.iter().map(|t| User::from(*t)).collect());
            }
            "UA" => {
                let tokens = body_tokens(text, line, "UA", &sections.initial)?;
                let pairs = tokens
                    .iter()
                    .map(|t| {
                        let [user, role] = tuple_fields::<2>(t, line)?;
                        Ok((User::from(user), Role::from(role)))
                    })
                    .collect::<Result<Vec<_>>>()?;
                sections.initial = Some(pairs);
            }
            "CR" => {
                let tokens = body_tokens(text, line, "CR", &sections.revoke_rules)?;
                let rules = tokens
                    .iter()
                    .map(|t| {
                        let [admin, target] = tuple_fields::<2>(t, line)?;
                        Ok(RevokeRule {
                            admin_role: Role::from(admin),
                            target_role: Role::from(target),
                        })
                    })
                    .collect::<Result<Vec<_>>>()?;
                sections.revoke_rules = Some(rules);
            }
            "CA" => {
                let tokens = body_tokens(text, line, "CA", &sections.assign_rules)?;
                let mut rules = Vec::new();
                for token in &tokens {
                    let [admin, conditions, target] = tuple_fields::<3>(token, line)?;
                    if let Some(rule) = parse_assign_rule(admin, conditions, target, line)? {
                        rules.push(rule);
                    }
                }
                sections.assign_rules = Some(rules);
            }
            "Goal" => {
                if sections.goal.is_some() {
                    return Err(ParseError::DuplicateSection {
                        line,
                        section: "Goal".to_string(),
                    });
                }
                let mut tokens = text.split_whitespace().skip(1);
                let (Some(goal), None) = (tokens.next(), tokens.next()) else {
                    return Err(ParseError::MalformedGoal { line });
                };
                sections.goal = Some(Role::from(goal));
            }
            other => {
                return Err(ParseError::UnknownKeyword {
                    line,
                    keyword: other.to_string(),
                });
            }
        }
    }

    let policy = Policy::new(
        sections.roles.ok_or(ParseError::MissingSection("Roles"))?,
        sections.users.ok_or(ParseError::MissingSection("Users"))?,
        sections.initial.unwrap_or_default(),
        sections.assign_rules.unwrap_or_default(),
        sections.revoke_rules.unwrap_or_default(),
        sections.goal.ok_or(ParseError::MissingSection("Goal"))?,
    )?;
    Ok(policy)
}

/// Splits a section line into its body tokens, checking the `end` terminator
/// and rejecting a second occurrence of the section.
fn body_tokens<'a, T>(
    text: &'a str,
    line: usize,
    section: &str,
    existing: &Option<T>,
) -> Result<Vec<&'a str>> {
    if existing.is_some() {
        return Err(ParseError::DuplicateSection {
            line,
            section: section.to_string(),
        });
    }
    let mut tokens: Vec<&str> = text.split_whitespace().skip(1).collect();
    if tokens.last() != Some(&"end") {
        return Err(ParseError::MissingTerminator {
            line,
            section: section.to_string(),
        });
    }
    tokens.pop();
    Ok(tokens)
}

/// Parses a `(a,b)` / `(a,b,c)` tuple into exactly `N` fields.
fn tuple_fields<'a, const N: usize>(token: &'a str, line: usize) -> Result<[&'a str; N]> {
    let malformed = || ParseError::MalformedTuple {
        line,
        token: token.to_string(),
    };

    let inner = token
        .strip_prefix('(')
        .and_then(|t| t.strip_suffix(')'))
        .ok_or_else(malformed)?;
    let fields: Vec<&str> = inner.split(',').collect();
    if fields.len() != N || fields.iter().any(|f| f.is_empty()) {
        return Err(malformed());
    }
    Ok(std::array::from_fn(|i| fields[i]))
}

/// Lowers one `CA` tuple into an [`AssignRule`].
///
/// Returns `Ok(None)` for rules carrying a `FALSE` condition: they can never
/// fire, so omitting them is behavior-preserving.
fn parse_assign_rule(
    admin: &str,
    conditions: &str,
    target: &str,
    line: usize,
) -> Result<Option<AssignRule>> {
    let mut positive = BTreeSet::new();
    let mut negative = BTreeSet::new();

    for token in conditions.split('&') {
        match token {
            "TRUE" => {}
            "FALSE" => return Ok(None),
            "" | "-" => {
                return Err(ParseError::MalformedCondition {
                    line,
                    token: token.to_string(),
                });
            }
            negated if negated.starts_with('-') => {
                negative.insert(Role::from(&negated[1..]));
            }
            name => {
                positive.insert(Role::from(name));
            }
        }
    }

    Ok(Some(AssignRule {
        admin_role: Role::from(admin),
        positive,
        negative,
        target_role: Role::from(target),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    const POLICY: &str = "\
Roles r1 r2 r3 end
Users u1 u2 end
UA (u1,r1) (u2,r2) end
CR (r1,r2) end
CA (r1,r2&-r3,r3) end
Goal r3
";

    #[test]
    fn parses_a_complete_policy() {
        let policy = parse_policy(POLICY).expect("policy should parse");

        assert_eq!(policy.roles().len(), 3);
        assert_eq!(policy.users().len(), 2);
        assert_eq!(policy.goal(), &Role::from("r3"));

        let u1 = User::from("u1");
        assert!(policy.initial().holds(&u1, &Role::from("r1")));
        assert!(!policy.initial().holds(&u1, &Role::from("r2")));

        assert_eq!(policy.revoke_rules().len(), 1);
        assert_eq!(policy.revoke_rules()[0].admin_role, Role::from("r1"));

        assert_eq!(policy.assign_rules().len(), 1);
        let rule = &policy.assign_rules()[0];
        assert_eq!(rule.admin_role, Role::from("r1"));
        assert!(rule.positive.contains(&Role::from("r2")));
        assert!(rule.negative.contains(&Role::from("r3")));
        assert_eq!(rule.target_role, Role::from("r3"));
    }

    #[test]
    fn true_condition_lowers_to_no_constraints() {
        let input = "\
Roles r1 r2 end
Users u1 end
CA (r1,TRUE,r2) end
Goal r2
";
        let policy = parse_policy(input).expect("policy should parse");
        let rule = &policy.assign_rules()[0];
        assert!(rule.positive.is_empty());
        assert!(rule.negative.is_empty());
    }

    #[test]
    fn false_condition_omits_the_rule() {
        let input = "\
Roles r1 r2 end
Users u1 end
CA (r1,FALSE,r2) (r1,TRUE,r2) end
Goal r2
";
        let policy = parse_policy(input).expect("policy should parse");
        assert_eq!(policy.assign_rules().len(), 1);
    }

    #[test]
    fn sections_may_be_empty() {
        let input = "\
Roles r1 end
Users u1 end
UA end
CR end
CA end
Goal r1
";
        let policy = parse_policy(input).expect("policy should parse");
        assert!(policy.assign_rules().is_empty());
        assert!(policy.revoke_rules().is_empty());
        assert!(policy.initial().is_fully_revoked());
    }

    #[test]
    fn blank_lines_are_ignored() {
        let input = "\

Roles r1 end

Users u1 end

Goal r1
";
        assert!(parse_policy(input).is_ok());
    }

    #[test]
    fn unknown_keyword_is_rejected_with_line_number() {
        let input = "\
Roles r1 end
Frobnicate x end
";
        assert_eq!(
            parse_policy(input),
            Err(ParseError::UnknownKeyword {
                line: 2,
                keyword: "Frobnicate".to_string()
            })
        );
    }

    #[test]
    fn missing_end_terminator_is_rejected() {
        let input = "Roles r1 r2\nUsers u1 end\nGoal r1\n";
        assert_eq!(
            parse_policy(input),
            Err(ParseError::MissingTerminator {
                line: 1,
                section: "Roles".to_string()
            })
        );
    }

    #[test]
    fn malformed_tuple_is_rejected() {
        let input = "\
Roles r1 end
Users u1 end
UA (u1;r1) end
Goal r1
";
        assert!(matches!(
            parse_policy(input),
            Err(ParseError::MalformedTuple { line: 3, .. })
        ));
    }

    #[test]
    fn ca_tuple_with_two_fields_is_rejected() {
        let input = "\
Roles r1 end
Users u1 end
CA (r1,r1) end
Goal r1
";
        assert!(matches!(
            parse_policy(input),
            Err(ParseError::MalformedTuple { line: 3, .. })
        ));
    }

    #[test]
    fn duplicate_section_is_rejected() {
        let input = "\
Roles r1 end
Roles r2 end
";
        assert!(matches!(
            parse_policy(input),
            Err(ParseError::DuplicateSection { line: 2, .. })
        ));
    }

    #[test]
    fn missing_goal_is_rejected() {
        let input = "Roles r1 end\nUsers u1 end\n";
        assert_eq!(parse_policy(input), Err(ParseError::MissingSection("Goal")));
    }

    #[test]
    fn undeclared_references_fail_validation() {
        let input = "\
Roles r1 end
Users u1 end
UA (u1,r9) end
Goal r1
";
        assert!(matches!(parse_policy(input), Err(ParseError::Invalid(_))));
    }
}
