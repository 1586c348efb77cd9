//! Project Repository

use mongodb::{Collection, Database, bson::{doc, Document}};
use futures::TryStreamExt;
use crate::project::entity::Project;
use crate::shared::error::Result;

pub struct ProjectRepository {
    collection: Collection<Project>,
}

impl ProjectRepository {
    pub fn new(db: &Database) -> Self {
        Self {
            collection: db.collection("projects"),
        }
    }

    pub async fn insert(&self, project: &Project) -> Result<()> {
        self.collection.insert_one(project).await?;
        Ok(())
    }

    pub async fn find_by_id(&self, id: &str) -> Result<Option<Project>> {
        if !crate::TsidGenerator::is_valid(id) {
            return Ok(None);
        }
        Ok(self.collection.find_one(doc! { "_id": id }).await?)
    }

    pub async fn find_all(&self, active_only: bool) -> Result<Vec<Project>> {
        let filter: Document = if active_only { doc! { "isActive": true } } else { doc! {} };
        let cursor = self.collection
            .find(filter)
            .sort(doc! { "displayOrder": 1, "createdAt": -1 })
            .await?;
        Ok(cursor.try_collect().await?)
    }

    pub async fn update(&self, project: &Project) -> Result<()> {
        self.collection
            .replace_one(doc! { "_id": &project.id }, project)
            .await?;
        Ok(())
    }

    pub async fn delete(&self, id: &str) -> Result<bool> {
        let result = self.collection.delete_one(doc! { "_id": id }).await?;
        Ok(result.deleted_count > 0)
    }
}
