//! Identity resolution
//!
//! Turns whatever a human typed (an ID, an email, a handle) into a user ID.
//! Resolution is exact: an unmatched token is an error, never a guess.

use once_cell::sync::Lazy;
use once_cell::unsync::OnceCell;
use regex::Regex;
use serde::Serialize;
use std::collections::HashMap;

use super::errors::CoreError;
use super::traits::Directory;
use super::types::{UserId, UserIdentity, UserRecord};
use super::Result;

static USER_ID_LITERAL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[UW][A-Z0-9]{2,}$").expect("valid regex"));

/// Whether `token` already has the shape of a user ID
pub fn is_user_id(token: &str) -> bool {
    USER_ID_LITERAL.is_match(token)
}

/// How a token was matched
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Resolution {
    /// Already an ID; no directory call made
    Literal,
    ByEmail,
    ByName,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedUser {
    pub id: UserId,
    pub via: Resolution,
}

/// Field a `lookup` searches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LookupField {
    /// Email when the query contains `@`, otherwise name
    #[default]
    Auto,
    Email,
    Name,
}

impl std::str::FromStr for LookupField {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "auto" => Ok(Self::Auto),
            "email" => Ok(Self::Email),
            "name" => Ok(Self::Name),
            other => Err(format!("unknown lookup field '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct UserListOptions {
    pub include_bots: bool,
    pub include_deleted: bool,
    pub limit: Option<usize>,
}

/// Resolves user tokens against a directory
///
/// The full user list is fetched at most once per resolver and only when a
/// token falls through to name matching.
pub struct IdentityResolver<'a, D: Directory + ?Sized> {
    directory: &'a D,
    roster: OnceCell<Vec<UserRecord>>,
}

impl<'a, D: Directory + ?Sized> IdentityResolver<'a, D> {
    pub fn new(directory: &'a D) -> Self {
        Self {
            directory,
            roster: OnceCell::new(),
        }
    }

    /// Resolve a single token to a user ID
    pub fn resolve_one(&self, token: &str) -> Result<UserId> {
        self.resolve_detailed(token).map(|resolved| resolved.id)
    }

    /// Resolve a single token, reporting which step matched
    pub fn resolve_detailed(&self, token: &str) -> Result<ResolvedUser> {
        let token = token.trim();
        if token.is_empty() {
            return Err(CoreError::not_found(token));
        }

        if is_user_id(token) {
            return Ok(ResolvedUser {
                id: token.to_string(),
                via: Resolution::Literal,
            });
        }

        // Any failure here falls through to name matching
        match self.directory.lookup_user_by_email(token) {
            Ok(Some(user)) => {
                return Ok(ResolvedUser {
                    id: user.id,
                    via: Resolution::ByEmail,
                })
            }
            Ok(None) => {}
            Err(err) => tracing::debug!("Email lookup for '{}' failed: {}", token, err),
        }

        self.roster()?
            .iter()
            .find(|user| user.answers_to(token))
            .map(|user| ResolvedUser {
                id: user.id.clone(),
                via: Resolution::ByName,
            })
            .ok_or_else(|| CoreError::not_found(token))
    }

    /// Resolve a comma-separated token list, in order, failing on the first
    /// token that does not resolve. Duplicates are kept.
    pub fn resolve_many(&self, tokens: &str) -> Result<Vec<UserId>> {
        let ids = tokens
            .split(',')
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .map(|token| self.resolve_one(token))
            .collect::<Result<Vec<_>>>()?;

        if ids.is_empty() {
            return Err(CoreError::NoParticipants);
        }
        Ok(ids)
    }

    /// Full identity for a query, searching the requested field
    pub fn lookup(&self, query: &str, field: LookupField) -> Result<UserIdentity> {
        let field = match field {
            LookupField::Auto if query.contains('@') => LookupField::Email,
            LookupField::Auto => LookupField::Name,
            other => other,
        };

        match field {
            LookupField::Email => self
                .directory
                .lookup_user_by_email(query)?
                .map(|user| UserIdentity::from(&user))
                .ok_or_else(|| CoreError::not_found(query)),
            _ => {
                if is_user_id(query) {
                    if let Some(user) = self.directory.get_user(query)? {
                        return Ok(UserIdentity::from(&user));
                    }
                }
                self.roster()?
                    .iter()
                    .find(|user| user.answers_to(query))
                    .map(UserIdentity::from)
                    .ok_or_else(|| CoreError::not_found(query))
            }
        }
    }

    /// Workspace members, most recently updated first
    pub fn list_users(&self, options: &UserListOptions) -> Result<Vec<UserIdentity>> {
        let mut users: Vec<&UserRecord> = self
            .roster()?
            .iter()
            .filter(|user| options.include_bots || !user.is_bot)
            .filter(|user| options.include_deleted || !user.deleted)
            .collect();

        users.sort_by(|a, b| b.updated.cmp(&a.updated));
        if let Some(limit) = options.limit.filter(|l| *l > 0) {
            users.truncate(limit);
        }
        Ok(users.into_iter().map(UserIdentity::from).collect())
    }

    fn roster(&self) -> Result<&Vec<UserRecord>> {
        self.roster
            .get_or_try_init(|| self.directory.list_all_users())
            .map_err(CoreError::from)
    }
}

/// Look up each distinct ID once, skipping IDs that fail or are unknown
///
/// Failures are soft: the caller gets whatever resolved.
pub fn resolve_names<'i, D, I>(directory: &D, ids: I) -> HashMap<UserId, UserIdentity>
where
    D: Directory + ?Sized,
    I: IntoIterator<Item = &'i UserId>,
{
    let mut resolved = HashMap::new();
    let mut attempted = std::collections::HashSet::new();
    for id in ids {
        if !attempted.insert(id.clone()) {
            continue;
        }
        match directory.get_user(id) {
            Ok(Some(user)) => {
                resolved.insert(id.clone(), UserIdentity::from(&user));
            }
            Ok(None) => tracing::debug!("User {} not found while resolving names", id),
            Err(err) => tracing::debug!("Name lookup for {} failed: {}", id, err),
        }
    }
    resolved
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::slack::sim::{DirectoryCall, SimDirectory};

    fn workspace() -> SimDirectory {
        SimDirectory::new()
            .with_user(UserRecord {
                id: "U100".into(),
                name: "alice".into(),
                real_name: "Alice Liddell".into(),
                email: Some("alice@example.com".into()),
                ..Default::default()
            })
            .with_user(UserRecord {
                id: "U200".into(),
                name: "bob".into(),
                display_name: "Bobby".into(),
                ..Default::default()
            })
    }

    #[test]
    fn test_literal_makes_no_calls() {
        let sim = workspace();
        let resolver = IdentityResolver::new(&sim);
        let resolved = resolver.resolve_detailed("U999").unwrap();
        assert_eq!(resolved.via, Resolution::Literal);
        assert_eq!(resolved.id, "U999");
        assert!(sim.events().is_empty());
    }

    #[test]
    fn test_email_then_name() {
        let sim = workspace();
        let resolver = IdentityResolver::new(&sim);

        let by_email = resolver.resolve_detailed("alice@example.com").unwrap();
        assert_eq!(by_email.via, Resolution::ByEmail);
        assert_eq!(by_email.id, "U100");
        assert_eq!(sim.calls(DirectoryCall::ListUsers), 0);

        let by_name = resolver.resolve_detailed("Bobby").unwrap();
        assert_eq!(by_name.via, Resolution::ByName);
        assert_eq!(by_name.id, "U200");
    }

    #[test]
    fn test_email_failure_falls_through() {
        let sim = workspace().failing(DirectoryCall::LookupByEmail, "users_not_found");
        let resolver = IdentityResolver::new(&sim);
        assert_eq!(resolver.resolve_one("alice").unwrap(), "U100");
    }

    #[test]
    fn test_no_partial_match() {
        let sim = workspace();
        let resolver = IdentityResolver::new(&sim);
        let err = resolver.resolve_one("ali").unwrap_err();
        assert!(matches!(err, CoreError::NotFound { ref query } if query == "ali"));
    }

    #[test]
    fn test_roster_fetched_once() {
        let sim = workspace();
        let resolver = IdentityResolver::new(&sim);
        resolver.resolve_many("alice,bob,alice").unwrap();
        assert_eq!(sim.calls(DirectoryCall::ListUsers), 1);
    }

    #[test]
    fn test_resolve_many_fail_fast() {
        let sim = workspace();
        let resolver = IdentityResolver::new(&sim);
        let err = resolver.resolve_many("alice,nobody,bob").unwrap_err();
        assert!(matches!(err, CoreError::NotFound { ref query } if query == "nobody"));
        // bob is never attempted
        assert_eq!(sim.arguments(DirectoryCall::LookupByEmail), vec!["alice", "nobody"]);
    }

    #[test]
    fn test_resolve_many_empty() {
        let sim = workspace();
        let resolver = IdentityResolver::new(&sim);
        assert!(matches!(
            resolver.resolve_many(" , ,"),
            Err(CoreError::NoParticipants)
        ));
    }

    #[test]
    fn test_lookup_auto() {
        let sim = workspace();
        let resolver = IdentityResolver::new(&sim);
        let alice = resolver.lookup("alice@example.com", LookupField::Auto).unwrap();
        assert_eq!(alice.display_name, "Alice Liddell");
        let alice = resolver.lookup("Alice Liddell", LookupField::Auto).unwrap();
        assert_eq!(alice.id, "U100");
        assert!(resolver.lookup("carol@example.com", LookupField::Email).is_err());
    }

    #[test]
    fn test_list_users_filters_and_orders() {
        let sim = SimDirectory::new()
            .with_user(UserRecord {
                id: "U1".into(),
                name: "old".into(),
                updated: 10,
                ..Default::default()
            })
            .with_user(UserRecord {
                id: "U2".into(),
                name: "new".into(),
                updated: 30,
                ..Default::default()
            })
            .with_user(UserRecord {
                id: "B1".into(),
                name: "bot".into(),
                is_bot: true,
                updated: 50,
                ..Default::default()
            })
            .with_user(UserRecord {
                id: "U3".into(),
                name: "gone".into(),
                deleted: true,
                updated: 40,
                ..Default::default()
            });
        let resolver = IdentityResolver::new(&sim);
        let users = resolver.list_users(&UserListOptions::default()).unwrap();
        let ids: Vec<&str> = users.iter().map(|u| u.id.as_str()).collect();
        assert_eq!(ids, vec!["U2", "U1"]);

        let users = resolver
            .list_users(&UserListOptions {
                include_bots: true,
                include_deleted: true,
                limit: Some(2),
            })
            .unwrap();
        let ids: Vec<&str> = users.iter().map(|u| u.id.as_str()).collect();
        assert_eq!(ids, vec!["B1", "U3"]);
    }

    #[test]
    fn test_resolve_names_once_per_id() {
        let sim = workspace().failing_for(DirectoryCall::GetUser, "U200", "user_not_visible");
        let ids: Vec<UserId> = vec!["U100".into(), "U200".into(), "U100".into()];
        let names = resolve_names(&sim, &ids);
        assert_eq!(names.len(), 1);
        assert_eq!(names["U100"].name, "alice");
        assert_eq!(sim.calls(DirectoryCall::GetUser), 2);
    }
}
