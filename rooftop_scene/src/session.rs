//! Connected-user roster.
//!
//! Owned by the app and passed to handlers instead of living in a global
//! map. Join order is preserved because the per-user button row is laid out
//! by arrival slot.

use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserEntry {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Default)]
pub struct SessionRoster {
    users: Vec<UserEntry>,
}

impl SessionRoster {
    pub fn new() -> Self {
        SessionRoster::default()
    }

    /// Record a user and return their roster size after joining (the slot
    /// multiplier for their button). Re-joining refreshes the name without
    /// duplicating the entry.
    pub fn join(&mut self, id: impl Into<String>, name: impl Into<String>) -> usize {
        let id = id.into();
        let name = name.into();
        match self.users.iter_mut().find(|user| user.id == id) {
            Some(existing) => existing.name = name,
            None => self.users.push(UserEntry { id, name }),
        }
        self.users.len()
    }

    pub fn leave(&mut self, id: &str) -> Option<UserEntry> {
        let index = self.users.iter().position(|user| user.id == id)?;
        Some(self.users.remove(index))
    }

    pub fn name(&self, id: &str) -> Option<&str> {
        self.users
            .iter()
            .find(|user| user.id == id)
            .map(|user| user.name.as_str())
    }

    pub fn count(&self) -> usize {
        self.users.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &UserEntry> {
        self.users.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roster_tracks_joins_and_leaves_in_order() {
        let mut roster = SessionRoster::new();
        assert_eq!(roster.join("u1", "Ben"), 1);
        assert_eq!(roster.join("u2", "Mara"), 2);
        assert_eq!(roster.name("u1"), Some("Ben"));

        let left = roster.leave("u1").expect("u1 present");
        assert_eq!(left.name, "Ben");
        assert_eq!(roster.count(), 1);
        assert!(roster.leave("u1").is_none());
    }

    #[test]
    fn rejoin_refreshes_the_name_without_duplicating() {
        let mut roster = SessionRoster::new();
        roster.join("u1", "Ben");
        assert_eq!(roster.join("u1", "Benjamin"), 1);
        assert_eq!(roster.name("u1"), Some("Benjamin"));
    }
}
