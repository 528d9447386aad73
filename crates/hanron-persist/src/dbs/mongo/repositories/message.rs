use futures::TryStreamExt;
use mongodb::bson::{doc, oid::ObjectId, Document};
use mongodb::options::IndexOptions;
use mongodb::{Client, Collection, IndexModel};

use crate::dbs::mongo::models::MongoMessage;
use crate::error::Result;

#[derive(Clone)]
pub struct MongoMessageRepository {
    collection: Collection<MongoMessage>,
}

impl MongoMessageRepository {
    pub fn new(client: &Client, db_name: &str) -> Self {
        let collection = client.database(db_name).collection("messages");
        Self { collection }
    }

    /// Unique (thread_id, sequence) index; a duplicate sequence is rejected
    /// by the server instead of silently reordering a thread.
    pub async fn ensure_indexes(&self) -> Result<()> {
        let index = IndexModel::builder()
            .keys(doc! { "thread_id": 1, "sequence": 1 })
            .options(IndexOptions::builder().unique(true).build())
            .build();
        self.collection.create_index(index).await?;
        Ok(())
    }

    /// Save a single message
    pub async fn save_message(&self, message: &MongoMessage) -> Result<ObjectId> {
        self.collection.insert_one(message).await?;
        Ok(message.id)
    }

    /// Get all messages for a thread ordered by sequence
    pub async fn get_messages(&self, thread_id: ObjectId) -> Result<Vec<MongoMessage>> {
        let filter = doc! { "thread_id": thread_id };
        let messages = self
            .collection
            .find(filter)
            .sort(doc! { "sequence": 1 })
            .await?
            .try_collect()
            .await?;
        Ok(messages)
    }

    /// Delete at most `limit` messages of a thread; returns the fetched count
    pub async fn delete_batch(&self, thread_id: ObjectId, limit: usize) -> Result<usize> {
        let ids: Vec<ObjectId> = self
            .collection
            .clone_with_type::<Document>()
            .find(doc! { "thread_id": thread_id })
            .projection(doc! { "_id": 1 })
            .limit(limit as i64)
            .await?
            .try_collect::<Vec<Document>>()
            .await?
            .into_iter()
            .filter_map(|d| d.get_object_id("_id").ok())
            .collect();

        if ids.is_empty() {
            return Ok(0);
        }

        let fetched = ids.len();
        self.collection
            .delete_many(doc! { "_id": { "$in": ids } })
            .await?;
        Ok(fetched)
    }
}
