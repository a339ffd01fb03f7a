//! In-memory session store: session id -> ordered exchanges, alive for the process lifetime.
//!
//! There is no eviction and no size bound. Sessions accumulate until the process exits.

use crate::shared::Exchange;
use dashmap::DashMap;

#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: DashMap<String, Vec<Exchange>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Exchanges for `session_id` in append order; empty if the session is unknown.
    pub fn get(&self, session_id: &str) -> Vec<Exchange> {
        self.sessions
            .get(session_id)
            .map(|entry| entry.value().clone())
            .unwrap_or_default()
    }

    /// Appends to the exchange's own session, creating the session on first use.
    pub fn append(&self, exchange: Exchange) {
        self.sessions
            .entry(exchange.session_id.clone())
            .or_default()
            .push(exchange);
    }

    /// Number of distinct sessions held.
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn unknown_session_is_empty() {
        let store = SessionStore::new();
        assert!(store.get("never-seen").is_empty());
        assert!(store.is_empty());
    }

    #[test]
    fn append_keeps_insertion_order_per_session() {
        let store = SessionStore::new();
        store.append(Exchange::new("s1", "first", "a"));
        store.append(Exchange::new("s2", "other", "b"));
        store.append(Exchange::new("s1", "second", "c"));

        let s1: Vec<String> = store.get("s1").into_iter().map(|e| e.user_message).collect();
        assert_eq!(s1, vec!["first", "second"]);
        assert_eq!(store.get("s2").len(), 1);
        assert_eq!(store.len(), 2);
    }

    #[tokio::test]
    async fn concurrent_appends_are_all_kept() {
        let store = Arc::new(SessionStore::new());
        let mut handles = Vec::new();
        for i in 0..32 {
            let store = Arc::clone(&store);
            handles.push(tokio::spawn(async move {
                store.append(Exchange::new("shared", format!("msg {}", i), "ok"));
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }
        assert_eq!(store.get("shared").len(), 32);
        assert_eq!(store.len(), 1);
    }
}
