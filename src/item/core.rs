use crate::{
    item::db::{item_drop, item_insert, item_select, item_select_all},
    util::unprocessable,
};
use poem::{error::InternalServerError, http::StatusCode};
use poem_openapi::Object;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Sqlite, Transaction};
use validator::Validate;

/// An item with its ID
#[derive(Debug, FromRow, Object)]
pub struct Item {
    /// The unique identifier of the item
    pub id: i64,
    /// The name of the item
    pub name: String,
    /// Optional description of the item
    pub description: Option<String>,
    /// The price of the item in USD
    pub price: f64,
}

/// How to create a new item
#[derive(Debug, Deserialize, Object, Serialize, Validate)]
pub struct ItemParam {
    /// The name of the item
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    /// Optional description of the item
    #[validate(length(max = 500))]
    pub description: Option<String>,
    /// The price of the item in USD, must be greater than 0
    #[validate(range(exclusive_min = 0.0))]
    pub price: f64,
}

/// Item IDs start at 1
fn item_id_check(item_id: i64) -> Result<(), poem::Error> {
    if item_id < 1 {
        return Err(poem::Error::from_string(
            "item_id must be greater than 0",
            StatusCode::UNPROCESSABLE_ENTITY,
        ));
    }

    Ok(())
}

/// Map a missing row onto the item 404
fn item_not_found(err: sqlx::Error) -> poem::Error {
    match err {
        sqlx::Error::RowNotFound => {
            poem::Error::from_string("Item not found", StatusCode::NOT_FOUND)
        }
        err => InternalServerError(err),
    }
}

/// Add an item
pub async fn item_add(
    tx: &mut Transaction<'_, Sqlite>,
    item_param: &ItemParam,
) -> Result<Item, poem::Error> {
    // Make sure the payload we got is good (check with Validate package).
    item_param.validate().map_err(unprocessable)?;

    // Add new item
    item_insert(tx, item_param)
        .await
        .map_err(InternalServerError)
}

/// Read details of an item
pub async fn item_read(
    tx: &mut Transaction<'_, Sqlite>,
    item_id: i64,
) -> Result<Item, poem::Error> {
    item_id_check(item_id)?;

    // Pull item
    item_select(tx, item_id).await.map_err(item_not_found)
}

/// Read every item
pub async fn item_read_all(tx: &mut Transaction<'_, Sqlite>) -> Result<Vec<Item>, poem::Error> {
    item_select_all(tx).await.map_err(InternalServerError)
}

/// Remove an item
pub async fn item_remove(
    tx: &mut Transaction<'_, Sqlite>,
    item_id: i64,
) -> Result<Item, poem::Error> {
    item_id_check(item_id)?;

    // Delete the item
    item_drop(tx, item_id).await.map_err(item_not_found)
}
