use std::collections::HashMap;

use tokio::sync::RwLock;

/// AI role suggestions keyed by lower-cased query. Per process, never evicted.
#[derive(Default)]
pub struct RoleSuggestionCache {
    entries: RwLock<HashMap<String, Vec<String>>>,
}

impl RoleSuggestionCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self, query: &str) -> Option<Vec<String>> {
        self.entries.read().await.get(&cache_key(query)).cloned()
    }

    pub async fn insert(&self, query: &str, suggestions: Vec<String>) {
        self.entries.write().await.insert(cache_key(query), suggestions);
    }
}

fn cache_key(query: &str) -> String {
    query.trim().to_lowercase()
}
