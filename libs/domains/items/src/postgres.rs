use async_trait::async_trait;
use chrono::Utc;
use domain_recommendations::models::encode_embedding;
use sea_orm::ActiveValue::{NotSet, Set};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, QuerySelect, TransactionTrait,
};
use uuid::Uuid;

use crate::{
    entity::{item_images, items, notifications},
    error::{ItemError, ItemResult},
    models::{
        CreateItem, CreateNotification, EmbeddingCandidate, Item, ItemStatus, Notification,
        UpdateItem,
    },
    repository::{ItemRepository, NotificationRepository},
};

fn to_item(model: items::Model, image_urls: Vec<String>) -> Item {
    Item {
        has_embedding: model.embedding.is_some(),
        id: model.id,
        user_id: model.user_id,
        buyer_id: model.buyer_id,
        name: model.name,
        price: model.price,
        description: model.description,
        status: model.status,
        image_urls,
        created_at: model.created_at.into(),
        updated_at: model.updated_at.into(),
        purchased_at: model.purchased_at.map(Into::into),
    }
}

async fn image_urls<C: ConnectionTrait>(conn: &C, item_id: &str) -> ItemResult<Vec<String>> {
    let urls: Vec<String> = item_images::Entity::find()
        .select_only()
        .column(item_images::Column::ImageUrl)
        .filter(item_images::Column::ItemId.eq(item_id))
        .order_by_asc(item_images::Column::Position)
        .order_by_asc(item_images::Column::Id)
        .into_tuple()
        .all(conn)
        .await?;

    Ok(urls)
}

pub struct PgItemRepository {
    db: DatabaseConnection,
}

impl PgItemRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ItemRepository for PgItemRepository {
    async fn insert(
        &self,
        seller_id: &str,
        input: CreateItem,
        embedding: Option<Vec<f32>>,
    ) -> ItemResult<Item> {
        let embedding = embedding
            .filter(|values| !values.is_empty())
            .map(|values| encode_embedding(&values))
            .transpose()?;

        let now = Utc::now();
        let item_id = Uuid::now_v7().to_string();

        let txn = self.db.begin().await?;

        let model = items::ActiveModel {
            id: Set(item_id.clone()),
            user_id: Set(seller_id.to_string()),
            buyer_id: Set(None),
            name: Set(input.name),
            price: Set(input.price),
            description: Set(input.description),
            status: Set(ItemStatus::OnSale),
            embedding: Set(embedding),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
            purchased_at: Set(None),
        }
        .insert(&txn)
        .await?;

        let images: Vec<item_images::ActiveModel> = input
            .image_urls
            .iter()
            .enumerate()
            .map(|(position, url)| item_images::ActiveModel {
                id: NotSet,
                item_id: Set(item_id.clone()),
                image_url: Set(url.clone()),
                position: Set(position as i32),
            })
            .collect();

        if !images.is_empty() {
            item_images::Entity::insert_many(images).exec(&txn).await?;
        }

        txn.commit().await?;

        tracing::info!(item_id = %model.id, seller_id = %seller_id, "Created item");
        Ok(to_item(model, input.image_urls))
    }

    async fn get(&self, id: &str) -> ItemResult<Option<Item>> {
        let Some(model) = items::Entity::find_by_id(id.to_string()).one(&self.db).await? else {
            return Ok(None);
        };

        let urls = image_urls(&self.db, id).await?;
        Ok(Some(to_item(model, urls)))
    }

    async fn update(&self, input: UpdateItem, embedding: Option<Vec<f32>>) -> ItemResult<Item> {
        let embedding = embedding
            .filter(|values| !values.is_empty())
            .map(|values| encode_embedding(&values))
            .transpose()?;

        let txn = self.db.begin().await?;

        // Row lock so a concurrent purchase cannot slip between check and write
        let model = items::Entity::find_by_id(input.item_id.clone())
            .lock_exclusive()
            .one(&txn)
            .await?
            .ok_or_else(|| ItemError::NotFound(input.item_id.clone()))?;

        if model.user_id != input.user_id {
            return Err(ItemError::Unauthorized(input.item_id));
        }
        if model.status == ItemStatus::Sold {
            return Err(ItemError::CannotUpdateSoldItem(input.item_id));
        }

        let mut active: items::ActiveModel = model.into();
        active.name = Set(input.name);
        active.price = Set(input.price);
        active.description = Set(input.description);
        active.updated_at = Set(Utc::now().into());
        if let Some(raw) = embedding {
            active.embedding = Set(Some(raw));
        }

        let updated = active.update(&txn).await?;
        let urls = image_urls(&txn, &updated.id).await?;

        txn.commit().await?;

        tracing::info!(item_id = %updated.id, "Updated item");
        Ok(to_item(updated, urls))
    }

    async fn purchase(&self, id: &str, buyer_id: &str) -> ItemResult<bool> {
        let now = Utc::now();

        let result = items::Entity::update_many()
            .set(items::ActiveModel {
                status: Set(ItemStatus::Sold),
                buyer_id: Set(Some(buyer_id.to_string())),
                purchased_at: Set(Some(now.into())),
                updated_at: Set(now.into()),
                ..Default::default()
            })
            .filter(items::Column::Id.eq(id))
            .filter(items::Column::Status.eq(ItemStatus::OnSale))
            .exec(&self.db)
            .await?;

        Ok(result.rows_affected > 0)
    }

    async fn items_missing_embeddings(&self) -> ItemResult<Vec<EmbeddingCandidate>> {
        let models = items::Entity::find()
            .filter(items::Column::Embedding.is_null())
            .order_by_asc(items::Column::CreatedAt)
            .all(&self.db)
            .await?;

        Ok(models
            .into_iter()
            .map(|m| EmbeddingCandidate {
                id: m.id,
                name: m.name,
                description: m.description,
                status: m.status,
            })
            .collect())
    }

    async fn set_embedding(&self, id: &str, embedding: &[f32]) -> ItemResult<()> {
        let raw = encode_embedding(embedding)?;

        let result = items::Entity::update_many()
            .set(items::ActiveModel {
                embedding: Set(Some(raw)),
                updated_at: Set(Utc::now().into()),
                ..Default::default()
            })
            .filter(items::Column::Id.eq(id))
            .exec(&self.db)
            .await?;

        if result.rows_affected == 0 {
            return Err(ItemError::NotFound(id.to_string()));
        }

        Ok(())
    }
}

pub struct PgNotificationRepository {
    db: DatabaseConnection,
}

impl PgNotificationRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl NotificationRepository for PgNotificationRepository {
    async fn create(&self, input: CreateNotification) -> ItemResult<Notification> {
        let active_model: notifications::ActiveModel = input.into();
        let model = active_model.insert(&self.db).await?;

        tracing::debug!(notification_id = %model.id, user_id = %model.user_id, "Created notification");
        Ok(model.into())
    }
}
