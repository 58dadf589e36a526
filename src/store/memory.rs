//! A document store that lives in memory.
//!
//! It follows the same query rules as Firestore (filters and orderings skip documents that lack
//! their field), and can be tweaked with a
//! [`MockBehaviour`] to simulate failures, so it is the store of choice for tests.

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use crate::document::{Direction, Document, DocumentId, Fields, Query};
use crate::error::{StoreError, StoreOperation};
use crate::mock_behaviour::MockBehaviour;
use crate::traits::DocumentStore;

type Collection = BTreeMap<DocumentId, Fields>;

#[derive(Debug, Default)]
pub struct MemoryStore {
    collections: Mutex<HashMap<String, Collection>>,

    mock_behaviour: Option<Arc<Mutex<MockBehaviour>>>,
    /// Delays applied to the next queries, in order
    query_delays: Mutex<VecDeque<Duration>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_mock_behaviour(mock_behaviour: Arc<Mutex<MockBehaviour>>) -> Self {
        Self {
            mock_behaviour: Some(mock_behaviour),
            ..Self::default()
        }
    }

    /// Make the next queries wait before they read the data, e.g. to simulate a slow network.
    /// `delays` are consumed one per query.
    pub fn delay_next_queries(&self, delays: Vec<Duration>) {
        self.query_delays.lock().unwrap().extend(delays);
    }

    /// Insert (or replace) a document with a chosen id, bypassing the mock behaviour
    pub fn insert(&self, collection: &str, id: DocumentId, fields: Fields) {
        self.collections.lock().unwrap()
            .entry(collection.to_string())
            .or_default()
            .insert(id, fields);
    }

    /// Returns a copy of a stored document
    pub fn get(&self, collection: &str, id: &DocumentId) -> Option<Document> {
        self.collections.lock().unwrap()
            .get(collection)
            .and_then(|c| c.get(id))
            .map(|fields| Document::new(id.clone(), fields.clone()))
    }

    /// Number of documents in a collection
    pub fn len(&self, collection: &str) -> usize {
        self.collections.lock().unwrap()
            .get(collection)
            .map(|c| c.len())
            .unwrap_or(0)
    }

    pub fn is_empty(&self, collection: &str) -> bool {
        self.len(collection) == 0
    }

    fn check(&self, can: fn(&mut MockBehaviour) -> Result<(), StoreError>) -> Result<(), StoreError> {
        match &self.mock_behaviour {
            None => Ok(()),
            Some(mb) => can(&mut mb.lock().unwrap()),
        }
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn create(&self, collection: &str, fields: Fields) -> Result<DocumentId, StoreError> {
        self.check(MockBehaviour::can_create)?;

        let id = DocumentId::random();
        self.insert(collection, id.clone(), fields);
        Ok(id)
    }

    async fn query(&self, collection: &str, query: &Query) -> Result<Vec<Document>, StoreError> {
        let delay = self.query_delays.lock().unwrap().pop_front();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        self.check(MockBehaviour::can_query)?;

        let collections = self.collections.lock().unwrap();
        // Documents are iterated by id, so that ties are always broken the same way
        let mut documents: Vec<Document> = match collections.get(collection) {
            None => Vec::new(),
            Some(c) => c.iter()
                .map(|(id, fields)| Document::new(id.clone(), fields.clone()))
                .filter(|doc| query.matches(doc))
                .collect(),
        };

        if let Some(order) = &query.order_by {
            documents.retain(|doc| doc.has(&order.field));
            documents.sort_by(|l, r| {
                let ordering = l.get(&order.field).sort_cmp(r.get(&order.field));
                match order.direction {
                    Direction::Ascending => ordering,
                    Direction::Descending => ordering.reverse(),
                }
            });
        }
        log::trace!("Memory store: {} documents match {:?}", documents.len(), query);
        Ok(documents)
    }

    async fn update(&self, collection: &str, id: &DocumentId, fields: Fields) -> Result<(), StoreError> {
        self.check(MockBehaviour::can_update)?;

        let mut collections = self.collections.lock().unwrap();
        match collections.get_mut(collection).and_then(|c| c.get_mut(id)) {
            None => Err(StoreError::new(StoreOperation::Update, format!("no document {} in {}", id, collection))),
            Some(existing) => {
                existing.extend(fields);
                Ok(())
            },
        }
    }

    async fn delete(&self, collection: &str, id: &DocumentId) -> Result<(), StoreError> {
        self.check(MockBehaviour::can_delete)?;

        let mut collections = self.collections.lock().unwrap();
        if let None = collections.get_mut(collection).and_then(|c| c.remove(id)) {
            return Err(StoreError::new(StoreOperation::Delete, format!("no document {} in {}", id, collection)));
        }
        Ok(())
    }
}
