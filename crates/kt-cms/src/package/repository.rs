//! Package Repository

use mongodb::{Collection, Database, bson::{doc, Document}};
use futures::TryStreamExt;
use crate::package::entity::Package;
use crate::shared::error::Result;

pub struct PackageRepository {
    collection: Collection<Package>,
}

impl PackageRepository {
    pub fn new(db: &Database) -> Self {
        Self {
            collection: db.collection("packages"),
        }
    }

    pub async fn insert(&self, package: &Package) -> Result<()> {
        self.collection.insert_one(package).await?;
        Ok(())
    }

    pub async fn find_by_id(&self, id: &str) -> Result<Option<Package>> {
        if !crate::TsidGenerator::is_valid(id) {
            return Ok(None);
        }
        Ok(self.collection.find_one(doc! { "_id": id }).await?)
    }

    /// Packages by display order
    pub async fn find_all(&self, active_only: bool) -> Result<Vec<Package>> {
        let filter: Document = if active_only { doc! { "isActive": true } } else { doc! {} };
        let cursor = self.collection
            .find(filter)
            .sort(doc! { "displayOrder": 1 })
            .await?;
        Ok(cursor.try_collect().await?)
    }

    /// Highest display order in use, if any package exists
    pub async fn max_display_order(&self) -> Result<Option<i32>> {
        let last = self.collection
            .find_one(doc! {})
            .sort(doc! { "displayOrder": -1 })
            .await?;
        Ok(last.map(|p| p.display_order))
    }

    pub async fn update(&self, package: &Package) -> Result<()> {
        self.collection
            .replace_one(doc! { "_id": &package.id }, package)
            .await?;
        Ok(())
    }

    pub async fn delete(&self, id: &str) -> Result<bool> {
        let result = self.collection.delete_one(doc! { "_id": id }).await?;
        Ok(result.deleted_count > 0)
    }
}
