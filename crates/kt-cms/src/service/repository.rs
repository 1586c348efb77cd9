//! Service Repository

use mongodb::{Collection, Database, bson::{doc, Document}};
use futures::TryStreamExt;
use crate::service::entity::Service;
use crate::shared::error::Result;

pub struct ServiceRepository {
    collection: Collection<Service>,
}

impl ServiceRepository {
    pub fn new(db: &Database) -> Self {
        Self {
            collection: db.collection("services"),
        }
    }

    pub async fn insert(&self, service: &Service) -> Result<()> {
        self.collection.insert_one(service).await?;
        Ok(())
    }

    pub async fn find_by_id(&self, id: &str) -> Result<Option<Service>> {
        if !crate::TsidGenerator::is_valid(id) {
            return Ok(None);
        }
        Ok(self.collection.find_one(doc! { "_id": id }).await?)
    }

    pub async fn find_by_slug(&self, slug: &str) -> Result<Option<Service>> {
        Ok(self.collection.find_one(doc! { "slug": slug }).await?)
    }

    pub async fn exists_by_slug(&self, slug: &str) -> Result<bool> {
        Ok(self.collection.count_documents(doc! { "slug": slug }).await? > 0)
    }

    /// Services by display order, newest first within the same order
    pub async fn find_all(&self, active_only: bool) -> Result<Vec<Service>> {
        let filter: Document = if active_only { doc! { "isActive": true } } else { doc! {} };
        let cursor = self.collection
            .find(filter)
            .sort(doc! { "displayOrder": 1, "createdAt": -1 })
            .await?;
        Ok(cursor.try_collect().await?)
    }

    pub async fn update(&self, service: &Service) -> Result<()> {
        self.collection
            .replace_one(doc! { "_id": &service.id }, service)
            .await?;
        Ok(())
    }

    pub async fn delete(&self, id: &str) -> Result<bool> {
        let result = self.collection.delete_one(doc! { "_id": id }).await?;
        Ok(result.deleted_count > 0)
    }
}
