//! Role Repository

use mongodb::{Collection, Database, bson::doc};
use futures::TryStreamExt;
use crate::role::entity::Role;
use crate::shared::error::Result;

pub struct RoleRepository {
    collection: Collection<Role>,
}

impl RoleRepository {
    pub fn new(db: &Database) -> Self {
        Self {
            collection: db.collection("roles"),
        }
    }

    pub async fn insert(&self, role: &Role) -> Result<()> {
        self.collection.insert_one(role).await?;
        Ok(())
    }

    pub async fn find_by_id(&self, id: &str) -> Result<Option<Role>> {
        if !crate::TsidGenerator::is_valid(id) {
            return Ok(None);
        }
        Ok(self.collection.find_one(doc! { "_id": id }).await?)
    }

    pub async fn find_by_name(&self, name: &str) -> Result<Option<Role>> {
        Ok(self.collection.find_one(doc! { "name": name }).await?)
    }

    pub async fn find_by_ids(&self, ids: &[String]) -> Result<Vec<Role>> {
        let cursor = self.collection
            .find(doc! { "_id": { "$in": ids } })
            .await?;
        Ok(cursor.try_collect().await?)
    }

    /// All roles sorted by name
    pub async fn find_all(&self) -> Result<Vec<Role>> {
        let cursor = self.collection
            .find(doc! {})
            .sort(doc! { "name": 1 })
            .await?;
        Ok(cursor.try_collect().await?)
    }

    pub async fn exists_by_name(&self, name: &str) -> Result<bool> {
        let count = self.collection
            .count_documents(doc! { "name": name })
            .await?;
        Ok(count > 0)
    }

    pub async fn count(&self) -> Result<u64> {
        Ok(self.collection.count_documents(doc! {}).await?)
    }

    pub async fn update(&self, role: &Role) -> Result<()> {
        self.collection
            .replace_one(doc! { "_id": &role.id }, role)
            .await?;
        Ok(())
    }

    pub async fn delete(&self, id: &str) -> Result<bool> {
        let result = self.collection.delete_one(doc! { "_id": id }).await?;
        Ok(result.deleted_count > 0)
    }
}
