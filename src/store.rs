//! The persistence contract the aggregator depends on.
//!
//! `Database` in `db.rs` is the SQLite implementation; tests plug in their own.

use crate::error::StoreError;
use crate::models::{Message, Thread};
use async_trait::async_trait;

#[async_trait]
pub trait ThreadStore: Send + Sync {
    /// All messages belonging to the thread, in no particular order.
    async fn list_messages(&self, thread_id: &str) -> Result<Vec<Message>, StoreError>;

    /// Identifiers of the labels applied to one message.
    async fn list_label_ids(&self, message_id: &str) -> Result<Vec<String>, StoreError>;

    /// Overwrite the thread's label membership.
    async fn replace_labels(&self, thread_id: &str, label_ids: &[String])
    -> Result<(), StoreError>;

    /// Overwrite the thread's folder membership.
    async fn replace_folders(
        &self,
        thread_id: &str,
        folder_ids: &[String],
    ) -> Result<(), StoreError>;

    /// Persist the attributes the aggregator changes on the thread row (its
    /// version). Columns owned by other writers, such as the unread and
    /// starred counts, are left as they are.
    async fn save(&self, thread: &Thread) -> Result<(), StoreError>;
}
