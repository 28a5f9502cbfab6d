use std::sync::Arc;

use uuid::Uuid;

use kaiwa_types::models::{Conversation, Participant};

use crate::store::{ConversationStore, StoreError};

/// Participant search for starting new conversations. The finder never
/// queries with a blank needle and hands selected targets to the Resolver.
pub struct ParticipantFinder<S> {
    store: Arc<S>,
    principal: Option<Uuid>,
    results: Vec<Participant>,
}

impl<S: ConversationStore> ParticipantFinder<S> {
    pub fn new(store: Arc<S>, principal: Option<Uuid>) -> Self {
        Self {
            store,
            principal,
            results: Vec::new(),
        }
    }

    pub fn results(&self) -> &[Participant] {
        &self.results
    }

    /// Run a search. A whitespace-only query (or a missing principal) clears
    /// the results without touching the store.
    pub async fn search(&mut self, query: &str) -> Result<&[Participant], StoreError> {
        let Some(principal) = self.principal else {
            self.results.clear();
            return Ok(&self.results);
        };

        let needle = query.trim();
        if needle.is_empty() {
            self.results.clear();
            return Ok(&self.results);
        }

        self.results = self.store.search_participants(principal, needle).await?;
        Ok(&self.results)
    }

    /// Start (or rejoin) the conversation with a picked participant.
    pub async fn start(&self, target: &Participant) -> Result<Conversation, StoreError> {
        let Some(principal) = self.principal else {
            return Err(StoreError::Unauthorized);
        };
        self.store.resolve_conversation(principal, target.id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MockStore, participant};

    #[tokio::test]
    async fn test_blank_query_clears_results_without_store_call() {
        let store = Arc::new(MockStore::default());
        store.seed_participants(vec![participant("rin"), participant("rina")]);
        let mut finder = ParticipantFinder::new(store.clone(), Some(Uuid::new_v4()));

        finder.search("rin").await.unwrap();
        assert_eq!(finder.results().len(), 2);
        assert_eq!(store.state.lock().unwrap().search_calls, 1);

        finder.search("   \t ").await.unwrap();
        assert!(finder.results().is_empty());
        assert_eq!(store.state.lock().unwrap().search_calls, 1);
    }

    #[tokio::test]
    async fn test_search_trims_needle_and_replaces_results() {
        let store = Arc::new(MockStore::default());
        store.seed_participants(vec![participant("rin"), participant("sakura")]);
        let mut finder = ParticipantFinder::new(store, Some(Uuid::new_v4()));

        let hits = finder.search("  rin  ").await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].username, "rin");

        let hits = finder.search("sak").await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].username, "sakura");
    }

    #[tokio::test]
    async fn test_search_excludes_principal() {
        let store = Arc::new(MockStore::default());
        let me = participant("rin_the_first");
        store.seed_participants(vec![me.clone(), participant("rin_the_second")]);
        let mut finder = ParticipantFinder::new(store, Some(me.id));

        let hits = finder.search("rin").await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].username, "rin_the_second");
    }

    #[tokio::test]
    async fn test_start_hands_off_to_resolver() {
        let store = Arc::new(MockStore::default());
        let principal = Uuid::new_v4();
        let target = participant("sakura");
        let finder = ParticipantFinder::new(store.clone(), Some(principal));

        let conversation = finder.start(&target).await.unwrap();
        assert!(conversation.involves(principal));
        assert!(conversation.involves(target.id));

        // Starting again rejoins the same conversation.
        let again = finder.start(&target).await.unwrap();
        assert_eq!(conversation.id, again.id);
    }

    #[tokio::test]
    async fn test_without_principal_degrades() {
        let store = Arc::new(MockStore::default());
        store.seed_participants(vec![participant("rin")]);
        let mut finder = ParticipantFinder::new(store.clone(), None);

        finder.search("rin").await.unwrap();
        assert!(finder.results().is_empty());
        assert_eq!(store.state.lock().unwrap().search_calls, 0);

        let err = finder.start(&participant("rin")).await.expect_err("no principal");
        assert!(matches!(err, StoreError::Unauthorized));
    }
}
