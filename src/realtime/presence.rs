use std::collections::{HashMap, HashSet};

/// Tracks which connections are currently viewing which file.
///
/// Process-local and transient: rebuilt from scratch on restart. The fanout
/// server owns the only instance, so no locking happens here. The inverted
/// index keeps disconnect cleanup proportional to the files the connection
/// actually joined instead of a scan over every file.
#[derive(Default)]
pub struct PresenceRegistry {
    /// file_id -> connections viewing it
    viewers: HashMap<String, HashSet<String>>,
    /// conn_id -> files it has joined
    joined: HashMap<String, HashSet<String>>,
}

impl PresenceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a connection as viewing a file. Idempotent.
    pub fn join(&mut self, file_id: &str, conn_id: &str) {
        self.viewers
            .entry(file_id.to_string())
            .or_default()
            .insert(conn_id.to_string());
        self.joined
            .entry(conn_id.to_string())
            .or_default()
            .insert(file_id.to_string());
    }

    /// Remove a connection from a file; prunes empty entries.
    /// Returns true if the connection was actually present.
    pub fn leave(&mut self, file_id: &str, conn_id: &str) -> bool {
        let mut removed = false;
        if let Some(conns) = self.viewers.get_mut(file_id) {
            removed = conns.remove(conn_id);
        }
        if self.viewers.get(file_id).is_some_and(|c| c.is_empty()) {
            self.viewers.remove(file_id);
        }
        if let Some(files) = self.joined.get_mut(conn_id) {
            files.remove(file_id);
        }
        if self.joined.get(conn_id).is_some_and(|f| f.is_empty()) {
            self.joined.remove(conn_id);
        }
        removed
    }

    /// Snapshot of the connections viewing a file.
    pub fn viewers(&self, file_id: &str) -> Vec<String> {
        self.viewers
            .get(file_id)
            .map(|conns| conns.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Remove a dropped connection from every file it joined.
    /// Returns the affected file ids so their viewer lists can be re-broadcast.
    pub fn drop_connection(&mut self, conn_id: &str) -> Vec<String> {
        let files: Vec<String> = self
            .joined
            .remove(conn_id)
            .map(|set| set.into_iter().collect())
            .unwrap_or_default();

        for file_id in &files {
            if let Some(conns) = self.viewers.get_mut(file_id) {
                conns.remove(conn_id);
            }
            if self.viewers.get(file_id).is_some_and(|c| c.is_empty()) {
                self.viewers.remove(file_id);
            }
        }
        files
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sorted(mut v: Vec<String>) -> Vec<String> {
        v.sort();
        v
    }

    #[test]
    fn join_is_idempotent() {
        let mut presence = PresenceRegistry::new();
        presence.join("file1", "a");
        presence.join("file1", "a");
        assert_eq!(presence.viewers("file1"), vec!["a".to_string()]);
    }

    #[test]
    fn two_viewers_then_one_leaves() {
        let mut presence = PresenceRegistry::new();
        presence.join("file1", "a");
        presence.join("file1", "b");
        assert_eq!(
            sorted(presence.viewers("file1")),
            vec!["a".to_string(), "b".to_string()]
        );

        assert!(presence.leave("file1", "a"));
        assert_eq!(presence.viewers("file1"), vec!["b".to_string()]);
    }

    #[test]
    fn leave_prunes_empty_entries() {
        let mut presence = PresenceRegistry::new();
        presence.join("file1", "a");
        presence.leave("file1", "a");
        assert!(presence.viewers.is_empty());
        assert!(presence.joined.is_empty());
    }

    #[test]
    fn leave_of_absent_connection_is_a_noop() {
        let mut presence = PresenceRegistry::new();
        presence.join("file1", "a");
        assert!(!presence.leave("file1", "b"));
        assert!(!presence.leave("file2", "a"));
        assert_eq!(presence.viewers("file1"), vec!["a".to_string()]);
    }

    #[test]
    fn drop_connection_cleans_every_joined_file() {
        let mut presence = PresenceRegistry::new();
        presence.join("file1", "a");
        presence.join("file2", "a");
        presence.join("file1", "b");

        let affected = sorted(presence.drop_connection("a"));
        assert_eq!(affected, vec!["file1".to_string(), "file2".to_string()]);
        assert_eq!(presence.viewers("file1"), vec!["b".to_string()]);
        assert!(presence.viewers("file2").is_empty());

        // A second drop finds nothing to clean
        assert!(presence.drop_connection("a").is_empty());
    }
}
