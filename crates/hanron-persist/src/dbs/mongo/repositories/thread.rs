use chrono::Utc;
use futures::TryStreamExt;
use mongodb::bson::{doc, oid::ObjectId};
use mongodb::options::ReturnDocument;
use mongodb::{Client, Collection};

use crate::dbs::mongo::models::MongoThread;
use crate::error::Result;

#[derive(Clone)]
pub struct MongoThreadRepository {
    collection: Collection<MongoThread>,
}

impl MongoThreadRepository {
    pub fn new(client: &Client, db_name: &str) -> Self {
        let collection = client.database(db_name).collection("threads");
        Self { collection }
    }

    /// Create a new thread with its topic bound
    pub async fn create_thread(&self, owner_id: &str, title: &str, topic: &str) -> Result<MongoThread> {
        let now = Utc::now();
        let thread = MongoThread {
            id: ObjectId::new(),
            owner_id: owner_id.to_string(),
            title: title.to_string(),
            topic: Some(topic.to_string()),
            created_at: now,
            updated_at: now,
            next_sequence: 0,
        };

        self.collection.insert_one(&thread).await?;
        Ok(thread)
    }

    /// Get thread by ID regardless of owner
    pub async fn get_thread(&self, thread_id: ObjectId) -> Result<Option<MongoThread>> {
        let filter = doc! { "_id": thread_id };
        Ok(self.collection.find_one(filter).await?)
    }

    /// List threads for an owner in creation order
    pub async fn list_threads(&self, owner_id: &str) -> Result<Vec<MongoThread>> {
        let filter = doc! { "owner_id": owner_id };
        let threads = self
            .collection
            .find(filter)
            .sort(doc! { "_id": 1 })
            .await?
            .try_collect()
            .await?;
        Ok(threads)
    }

    /// Set the topic of an owned thread that has none
    ///
    /// Returns `false` when no topic-less thread matches.
    pub async fn bind_topic(&self, thread_id: ObjectId, owner_id: &str, topic: &str) -> Result<bool> {
        // `null` also matches documents without the field.
        let filter = doc! { "_id": thread_id, "owner_id": owner_id, "topic": null };
        let update = doc! {
            "$set": { "topic": topic, "updated_at": bson::to_bson(&Utc::now())? }
        };

        let result = self.collection.update_one(filter, update).await?;
        Ok(result.modified_count == 1)
    }

    /// Atomically allocate the next message sequence of an owned thread
    ///
    /// Returns `None` when no thread matches both id and owner.
    pub async fn allocate_sequence(&self, thread_id: ObjectId, owner_id: &str) -> Result<Option<i64>> {
        let filter = doc! { "_id": thread_id, "owner_id": owner_id };
        let update = doc! {
            "$inc": { "next_sequence": 1_i64 },
            "$set": { "updated_at": bson::to_bson(&Utc::now())? }
        };

        let updated = self
            .collection
            .find_one_and_update(filter, update)
            .return_document(ReturnDocument::After)
            .await?;
        Ok(updated.map(|t| t.next_sequence))
    }

    /// Delete thread document (messages are swept separately)
    pub async fn delete_thread(&self, thread_id: ObjectId, owner_id: &str) -> Result<u64> {
        let filter = doc! { "_id": thread_id, "owner_id": owner_id };
        let result = self.collection.delete_one(filter).await?;
        Ok(result.deleted_count)
    }
}
