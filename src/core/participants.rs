//! Canonical participant sets
//!
//! Participant lists arrive from the directory in arbitrary order and
//! occasionally with duplicates. Everything that compares membership goes
//! through [`ParticipantSet`] so order never leaks into equality.

use serde::Serialize;
use std::collections::BTreeSet;

use super::types::UserId;

/// Sorted, de-duplicated set of user IDs
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct ParticipantSet(BTreeSet<UserId>);

impl ParticipantSet {
    pub fn from_ids<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<UserId>,
    {
        Self(
            ids.into_iter()
                .map(Into::into)
                .filter(|id: &UserId| !id.is_empty())
                .collect(),
        )
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.0.contains(id)
    }

    /// Copy of this set with `id` removed
    pub fn without(&self, id: &str) -> Self {
        let mut set = self.0.clone();
        set.remove(id);
        Self(set)
    }

    /// Same size and every member present in both
    pub fn same_members(&self, other: &Self) -> bool {
        self.0.len() == other.0.len() && self.0.iter().all(|id| other.0.contains(id))
    }

    pub fn iter(&self) -> impl Iterator<Item = &UserId> {
        self.0.iter()
    }

    pub fn to_vec(&self) -> Vec<UserId> {
        self.0.iter().cloned().collect()
    }

    /// Comma-joined canonical form, as the directory expects for `users=`
    pub fn joined(&self) -> String {
        self.to_vec().join(",")
    }
}

impl<S: Into<UserId>> FromIterator<S> for ParticipantSet {
    fn from_iter<T: IntoIterator<Item = S>>(iter: T) -> Self {
        Self::from_ids(iter)
    }
}

/// Order-insensitive comparison of two raw participant lists
pub fn same_participants<A, B>(a: &[A], b: &[B]) -> bool
where
    A: AsRef<str>,
    B: AsRef<str>,
{
    let left = ParticipantSet::from_ids(a.iter().map(|id| id.as_ref().to_string()));
    let right = ParticipantSet::from_ids(b.iter().map(|id| id.as_ref().to_string()));
    left.same_members(&right)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_does_not_matter() {
        assert!(same_participants(&["U2", "U1", "U3"], &["U3", "U2", "U1"]));
    }

    #[test]
    fn test_size_mismatch() {
        assert!(!same_participants(&["U1", "U2"], &["U1", "U2", "U3"]));
        assert!(!same_participants(&["U1", "U2", "U3"], &["U1", "U2"]));
    }

    #[test]
    fn test_duplicates_collapse() {
        let set = ParticipantSet::from_ids(["U1", "U1", "U2", ""]);
        assert_eq!(set.len(), 2);
        assert_eq!(set.joined(), "U1,U2");
    }

    #[test]
    fn test_without() {
        let set = ParticipantSet::from_ids(["U1", "U2", "U3"]);
        let trimmed = set.without("U2");
        assert_eq!(trimmed.to_vec(), vec!["U1".to_string(), "U3".to_string()]);
        assert_eq!(set.len(), 3);
        assert_eq!(set.without("U9"), set);
    }
}
