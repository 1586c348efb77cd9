//! User Repository

use mongodb::{Collection, Database, bson::doc};
use futures::TryStreamExt;
use crate::user::entity::User;
use crate::shared::error::Result;

pub struct UserRepository {
    collection: Collection<User>,
}

impl UserRepository {
    pub fn new(db: &Database) -> Self {
        Self {
            collection: db.collection("users"),
        }
    }

    pub async fn insert(&self, user: &User) -> Result<()> {
        self.collection.insert_one(user).await?;
        Ok(())
    }

    pub async fn find_by_id(&self, id: &str) -> Result<Option<User>> {
        if !crate::TsidGenerator::is_valid(id) {
            return Ok(None);
        }
        Ok(self.collection.find_one(doc! { "_id": id }).await?)
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        Ok(self.collection.find_one(doc! { "email": email }).await?)
    }

    pub async fn find_by_ids(&self, ids: &[String]) -> Result<Vec<User>> {
        let cursor = self.collection
            .find(doc! { "_id": { "$in": ids } })
            .await?;
        Ok(cursor.try_collect().await?)
    }

    /// One page of users, newest first
    pub async fn find_page(&self, skip: u64, limit: i64) -> Result<Vec<User>> {
        let cursor = self.collection
            .find(doc! {})
            .sort(doc! { "createdAt": -1 })
            .skip(skip)
            .limit(limit)
            .await?;
        Ok(cursor.try_collect().await?)
    }

    pub async fn count(&self) -> Result<u64> {
        Ok(self.collection.count_documents(doc! {}).await?)
    }

    pub async fn count_by_role(&self, role_id: &str) -> Result<u64> {
        Ok(self.collection.count_documents(doc! { "role": role_id }).await?)
    }

    pub async fn exists_by_email(&self, email: &str) -> Result<bool> {
        Ok(self.collection.count_documents(doc! { "email": email }).await? > 0)
    }

    pub async fn update(&self, user: &User) -> Result<()> {
        self.collection
            .replace_one(doc! { "_id": &user.id }, user)
            .await?;
        Ok(())
    }

    pub async fn set_last_login(&self, id: &str, at: chrono::DateTime<chrono::Utc>) -> Result<()> {
        self.collection
            .update_one(
                doc! { "_id": id },
                doc! { "$set": { "lastLogin": bson::DateTime::from_chrono(at) } },
            )
            .await?;
        Ok(())
    }

    pub async fn delete(&self, id: &str) -> Result<bool> {
        let result = self.collection.delete_one(doc! { "_id": id }).await?;
        Ok(result.deleted_count > 0)
    }
}
