use sea_orm::{DeriveActiveEnum, EnumIter};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use strum::{Display, EnumString};

/// Item identifier as stored in the `items` table
pub type ItemId = String;

/// Semantic fingerprint of an item's name and description.
///
/// Shared immutably so that cache snapshots never copy vector data.
pub type Embedding = Arc<[f32]>;

/// Listing status of an item
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    DeriveActiveEnum,
    EnumIter,
)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "item_status")]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ItemStatus {
    #[default]
    #[sea_orm(string_value = "on_sale")]
    OnSale,
    #[sea_orm(string_value = "sold")]
    Sold,
}

/// Display record returned by recommendation queries
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemSummary {
    pub id: ItemId,
    pub name: String,
    pub price: i32,
    /// First listing image, empty when the item has none
    pub image_url: String,
    pub status: ItemStatus,
}

/// A stored embedding that could not be used during a bulk load
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedEmbedding {
    pub item_id: ItemId,
    pub reason: String,
}

/// Result of loading every on-sale embedding.
///
/// Rows that fail to decode are reported in `skipped` instead of failing the load.
#[derive(Debug, Clone, Default)]
pub struct EmbeddingLoad {
    pub embeddings: HashMap<ItemId, Embedding>,
    pub skipped: Vec<SkippedEmbedding>,
}

impl EmbeddingLoad {
    /// Decode raw `(item_id, embedding_json)` rows, keeping every usable vector
    pub fn from_rows<I>(rows: I) -> Self
    where
        I: IntoIterator<Item = (ItemId, Option<String>)>,
    {
        let mut load = EmbeddingLoad::default();

        for (item_id, raw) in rows {
            let Some(raw) = raw else {
                continue;
            };

            match decode_embedding(&raw) {
                Ok(values) if values.is_empty() => {
                    load.skipped.push(SkippedEmbedding {
                        item_id,
                        reason: "empty embedding".to_string(),
                    });
                }
                Ok(values) => {
                    load.embeddings.insert(item_id, Embedding::from(values));
                }
                Err(e) => {
                    tracing::warn!(item_id = %item_id, error = %e, "Skipping malformed embedding");
                    load.skipped.push(SkippedEmbedding {
                        item_id,
                        reason: e.to_string(),
                    });
                }
            }
        }

        load
    }
}

/// Parse the JSON array persisted in `items.embedding`
pub fn decode_embedding(raw: &str) -> Result<Vec<f32>, serde_json::Error> {
    serde_json::from_str(raw)
}

/// Serialize an embedding for `items.embedding`
pub fn encode_embedding(values: &[f32]) -> Result<String, serde_json::Error> {
    serde_json::to_string(values)
}
