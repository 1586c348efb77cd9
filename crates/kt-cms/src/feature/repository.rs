//! Feature Repository

use mongodb::{Collection, Database, bson::{doc, Document}};
use futures::TryStreamExt;
use crate::feature::entity::Feature;
use crate::shared::error::Result;

pub struct FeatureRepository {
    collection: Collection<Feature>,
}

impl FeatureRepository {
    pub fn new(db: &Database) -> Self {
        Self {
            collection: db.collection("features"),
        }
    }

    pub async fn insert(&self, feature: &Feature) -> Result<()> {
        self.collection.insert_one(feature).await?;
        Ok(())
    }

    pub async fn find_by_id(&self, id: &str) -> Result<Option<Feature>> {
        if !crate::TsidGenerator::is_valid(id) {
            return Ok(None);
        }
        Ok(self.collection.find_one(doc! { "_id": id }).await?)
    }

    /// Features by display order, newest first within the same order
    pub async fn find_all(&self, active_only: bool) -> Result<Vec<Feature>> {
        let filter: Document = if active_only { doc! { "isActive": true } } else { doc! {} };
        let cursor = self.collection
            .find(filter)
            .sort(doc! { "displayOrder": 1, "createdAt": -1 })
            .await?;
        Ok(cursor.try_collect().await?)
    }

    pub async fn update(&self, feature: &Feature) -> Result<()> {
        self.collection
            .replace_one(doc! { "_id": &feature.id }, feature)
            .await?;
        Ok(())
    }

    pub async fn delete(&self, id: &str) -> Result<bool> {
        let result = self.collection.delete_one(doc! { "_id": id }).await?;
        Ok(result.deleted_count > 0)
    }
}
