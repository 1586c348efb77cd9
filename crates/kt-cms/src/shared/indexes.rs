//! MongoDB Index Initialization
//!
//! Creates indexes for all collections on application startup.

use mongodb::{Database, IndexModel, bson::{doc, Document}, options::IndexOptions};
use tracing::info;

/// Initialize all MongoDB indexes
pub async fn initialize_indexes(db: &Database) -> Result<(), mongodb::error::Error> {
    info!("Initializing MongoDB indexes...");

    create_user_indexes(db).await?;
    create_role_indexes(db).await?;
    create_profile_indexes(db).await?;
    create_service_indexes(db).await?;

    for collection in ["projects", "features"] {
        create_display_order_index(db, collection).await?;
    }
    create_index(db, "packages", doc! { "displayOrder": 1 }, false).await?;

    info!("MongoDB indexes initialized successfully");
    Ok(())
}

fn index_model(keys: Document, unique: bool) -> IndexModel {
    let options = IndexOptions::builder().unique(unique).build();
    IndexModel::builder().keys(keys).options(options).build()
}

async fn create_index(
    db: &Database,
    collection: &str,
    keys: Document,
    unique: bool,
) -> Result<(), mongodb::error::Error> {
    db.collection::<Document>(collection)
        .create_index(index_model(keys, unique))
        .await?;
    Ok(())
}

/// Public list order: `displayOrder` ascending, newest first
async fn create_display_order_index(db: &Database, collection: &str) -> Result<(), mongodb::error::Error> {
    create_index(db, collection, doc! { "isActive": 1, "displayOrder": 1, "createdAt": -1 }, false).await?;
    info!("Created indexes on {}", collection);
    Ok(())
}

async fn create_user_indexes(db: &Database) -> Result<(), mongodb::error::Error> {
    create_index(db, "users", doc! { "email": 1 }, true).await?;
    // Role deletion guard counts by role
    create_index(db, "users", doc! { "role": 1 }, false).await?;
    // Admin list, newest first
    create_index(db, "users", doc! { "createdAt": -1 }, false).await?;
    info!("Created indexes on users");
    Ok(())
}

async fn create_role_indexes(db: &Database) -> Result<(), mongodb::error::Error> {
    create_index(db, "roles", doc! { "name": 1 }, true).await?;
    info!("Created indexes on roles");
    Ok(())
}

async fn create_profile_indexes(db: &Database) -> Result<(), mongodb::error::Error> {
    create_index(db, "profiles", doc! { "userId": 1 }, true).await?;
    create_index(db, "profiles", doc! { "isPublic": 1, "displayOrder": 1, "createdAt": -1 }, false).await?;
    info!("Created indexes on profiles");
    Ok(())
}

async fn create_service_indexes(db: &Database) -> Result<(), mongodb::error::Error> {
    create_index(db, "services", doc! { "slug": 1 }, true).await?;
    create_display_order_index(db, "services").await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_model_options() {
        let model = index_model(doc! { "email": 1 }, true);
        let options = model.options.unwrap();
        assert_eq!(options.unique, Some(true));

        let model = index_model(doc! { "createdAt": -1 }, false);
        assert_eq!(model.options.unwrap().unique, Some(false));
    }
}
