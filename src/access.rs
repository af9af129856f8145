//! Per-request visibility policy over a shared index
//!
//! A chunk owned by `system` (or by nobody) is visible to everyone. A chunk
//! owned by tenant O is visible to:
//! - an `internal_test` principal whose target list contains O,
//! - an `internal_test` principal with no target list that holds an [`AuditGrant`],
//! - any principal whose own owner id is O.
//!
//! Filtering is a stable subsequence of the input: no reordering, no
//! re-scoring, no duplication.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::warn;

use crate::store::Candidate;

/// Class of the querying principal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    #[default]
    Student,
    Teacher,
    InternalTest,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Student => "student",
            Role::Teacher => "teacher",
            Role::InternalTest => "internal_test",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "student" => Ok(Role::Student),
            "teacher" => Ok(Role::Teacher),
            "internal_test" | "internal-test" => Ok(Role::InternalTest),
            other => Err(format!(
                "unknown role '{}' (expected student, teacher or internal_test)",
                other
            )),
        }
    }
}

/// Capability to see every tenant's chunks without a target list.
///
/// Authorization happens upstream; constructing a grant is the explicit
/// statement that it did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuditGrant {
    _private: (),
}

impl AuditGrant {
    pub fn authorized() -> Self {
        Self { _private: () }
    }
}

/// Who is asking, and what they may see
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Principal {
    pub role: Role,
    pub owner_id: Option<String>,
    /// Allow-list of owners; only meaningful for `internal_test`
    pub target_owner_ids: Option<Vec<String>>,
    audit: Option<AuditGrant>,
}

impl Principal {
    pub fn new(role: Role, owner_id: Option<String>) -> Self {
        Self {
            role,
            owner_id,
            target_owner_ids: None,
            audit: None,
        }
    }

    pub fn student(owner_id: impl Into<String>) -> Self {
        Self::new(Role::Student, Some(owner_id.into()))
    }

    pub fn teacher(owner_id: impl Into<String>) -> Self {
        Self::new(Role::Teacher, Some(owner_id.into()))
    }

    /// Internal-test principal scoped to `targets` (empty = no scoping)
    pub fn internal_test(targets: Vec<String>) -> Self {
        Self {
            role: Role::InternalTest,
            owner_id: None,
            target_owner_ids: Some(targets),
            audit: None,
        }
    }

    pub fn with_targets(mut self, targets: Option<Vec<String>>) -> Self {
        self.target_owner_ids = targets;
        self
    }

    pub fn with_audit_grant(mut self, grant: AuditGrant) -> Self {
        self.audit = Some(grant);
        self
    }

    pub fn has_audit_grant(&self) -> bool {
        self.audit.is_some()
    }

    /// Non-empty target list, if any
    fn targets(&self) -> Option<&[String]> {
        self.target_owner_ids
            .as_deref()
            .filter(|targets| !targets.is_empty())
    }

    /// Resolve the principal into a reusable visibility check
    pub fn visibility(&self) -> Visibility<'_> {
        let scope = match (self.role, self.targets()) {
            (Role::InternalTest, Some(targets)) => Scope::Targets(targets),
            (Role::InternalTest, None) if self.audit.is_some() => Scope::Unrestricted,
            (Role::InternalTest, None) => {
                warn!("internal_test query without targets or audit grant; restricting to own and public chunks");
                Scope::OwnOnly
            }
            _ => Scope::OwnOnly,
        };
        Visibility {
            scope,
            owner_id: self.owner_id.as_deref(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Scope<'a> {
    Unrestricted,
    Targets(&'a [String]),
    OwnOnly,
}

/// Visibility check resolved from a [`Principal`]
#[derive(Debug, Clone, Copy)]
pub struct Visibility<'a> {
    scope: Scope<'a>,
    owner_id: Option<&'a str>,
}

impl Visibility<'_> {
    /// Whether a chunk owned by `owner` (`None` = public) may be shown
    pub fn allows(&self, owner: Option<&str>) -> bool {
        let Some(owner) = owner else {
            return true;
        };

        let scoped = match self.scope {
            Scope::Unrestricted => true,
            Scope::Targets(targets) => targets.iter().any(|t| t == owner),
            Scope::OwnOnly => false,
        };

        scoped || self.owner_id == Some(owner)
    }
}

/// Keep only the candidates the principal may see, in input order
pub fn filter(candidates: Vec<Candidate>, principal: &Principal) -> Vec<Candidate> {
    let visibility = principal.visibility();
    candidates
        .into_iter()
        .filter(|c| visibility.allows(c.chunk.owner()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{Chunk, ChunkMetadata};

    fn candidate(id: &str, owner: Option<&str>) -> Candidate {
        Candidate {
            chunk: Chunk {
                id: id.to_string(),
                text: format!("text {}", id),
                metadata: ChunkMetadata::new("src", owner.map(String::from), 0),
            },
            score: 0.5,
        }
    }

    fn ids(candidates: &[Candidate]) -> Vec<&str> {
        candidates.iter().map(|c| c.chunk.id.as_str()).collect()
    }

    fn mixed() -> Vec<Candidate> {
        vec![
            candidate("pub", None),
            candidate("a", Some("A")),
            candidate("sys", Some("system")),
            candidate("b", Some("B")),
        ]
    }

    #[test]
    fn test_student_sees_own_and_public() {
        let kept = filter(mixed(), &Principal::student("A"));
        assert_eq!(ids(&kept), vec!["pub", "a", "sys"]);
    }

    #[test]
    fn test_anonymous_sees_public_only() {
        let kept = filter(mixed(), &Principal::new(Role::Teacher, None));
        assert_eq!(ids(&kept), vec!["pub", "sys"]);
    }

    #[test]
    fn test_internal_test_with_targets() {
        let kept = filter(mixed(), &Principal::internal_test(vec!["B".into()]));
        assert_eq!(ids(&kept), vec!["pub", "sys", "b"]);
    }

    #[test]
    fn test_internal_test_god_view_requires_grant() {
        let without = filter(mixed(), &Principal::internal_test(vec![]));
        assert_eq!(ids(&without), vec!["pub", "sys"]);

        let with = filter(
            mixed(),
            &Principal::internal_test(vec![]).with_audit_grant(AuditGrant::authorized()),
        );
        assert_eq!(ids(&with), vec!["pub", "a", "sys", "b"]);
    }

    #[test]
    fn test_targets_take_precedence_over_grant() {
        let principal = Principal::internal_test(vec!["A".into()])
            .with_audit_grant(AuditGrant::authorized());
        let kept = filter(mixed(), &principal);
        assert_eq!(ids(&kept), vec!["pub", "a", "sys"]);
    }

    #[test]
    fn test_own_owner_visible_even_outside_targets() {
        let principal = Principal::new(Role::InternalTest, Some("A".into()))
            .with_targets(Some(vec!["B".into()]));
        let kept = filter(mixed(), &principal);
        assert_eq!(ids(&kept), vec!["pub", "a", "sys", "b"]);
    }

    #[test]
    fn test_targets_ignored_for_regular_roles() {
        let principal = Principal::student("A").with_targets(Some(vec!["B".into()]));
        let kept = filter(mixed(), &principal);
        assert_eq!(ids(&kept), vec!["pub", "a", "sys"]);
    }

    #[test]
    fn test_role_parsing() {
        assert_eq!("teacher".parse::<Role>().unwrap(), Role::Teacher);
        assert_eq!("internal_test".parse::<Role>().unwrap(), Role::InternalTest);
        assert!("admin".parse::<Role>().is_err());
        assert_eq!(Role::InternalTest.to_string(), "internal_test");
    }
}
