//! Profile Repository

use mongodb::{Collection, Database, bson::{doc, Document}};
use futures::TryStreamExt;
use crate::profile::entity::Profile;
use crate::shared::error::Result;

pub struct ProfileRepository {
    collection: Collection<Profile>,
}

impl ProfileRepository {
    pub fn new(db: &Database) -> Self {
        Self {
            collection: db.collection("profiles"),
        }
    }

    pub async fn insert(&self, profile: &Profile) -> Result<()> {
        self.collection.insert_one(profile).await?;
        Ok(())
    }

    pub async fn find_by_id(&self, id: &str) -> Result<Option<Profile>> {
        if !crate::TsidGenerator::is_valid(id) {
            return Ok(None);
        }
        Ok(self.collection.find_one(doc! { "_id": id }).await?)
    }

    pub async fn exists_by_user_id(&self, user_id: &str) -> Result<bool> {
        Ok(self.collection.count_documents(doc! { "userId": user_id }).await? > 0)
    }

    /// Profiles by display order, newest first within the same order
    pub async fn find_all(&self, public_only: bool) -> Result<Vec<Profile>> {
        let filter: Document = if public_only { doc! { "isPublic": true } } else { doc! {} };
        let cursor = self.collection
            .find(filter)
            .sort(doc! { "displayOrder": 1, "createdAt": -1 })
            .await?;
        Ok(cursor.try_collect().await?)
    }

    pub async fn count(&self) -> Result<u64> {
        Ok(self.collection.count_documents(doc! {}).await?)
    }

    pub async fn count_public(&self) -> Result<u64> {
        Ok(self.collection.count_documents(doc! { "isPublic": true }).await?)
    }

    pub async fn update(&self, profile: &Profile) -> Result<()> {
        self.collection
            .replace_one(doc! { "_id": &profile.id }, profile)
            .await?;
        Ok(())
    }

    pub async fn delete(&self, id: &str) -> Result<bool> {
        let result = self.collection.delete_one(doc! { "_id": id }).await?;
        Ok(result.deleted_count > 0)
    }
}
