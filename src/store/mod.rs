//! Implementations of [`DocumentStore`](crate::traits::DocumentStore)

pub mod firestore;
pub use firestore::FirestoreClient;
pub mod memory;
pub use memory::MemoryStore;
