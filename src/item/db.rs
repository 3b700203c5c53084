use crate::item::core::{Item, ItemParam};
use sqlx::{query_as, Sqlite, Transaction};

/// Add an item to the item table
pub async fn item_insert(
    tx: &mut Transaction<'_, Sqlite>,
    item_param: &ItemParam,
) -> Result<Item, sqlx::Error> {
    let item = query_as::<_, Item>(
        "INSERT INTO item (
            name,
            description,
            price
        ) VALUES (
            ?,
            ?,
            ?
        ) RETURNING
            id,
            name,
            description,
            price",
    )
    .bind(&item_param.name)
    .bind(&item_param.description)
    .bind(item_param.price)
    .fetch_one(&mut **tx)
    .await?;

    Ok(item)
}

/// Pull one item
pub async fn item_select(
    tx: &mut Transaction<'_, Sqlite>,
    item_id: i64,
) -> Result<Item, sqlx::Error> {
    let item = query_as::<_, Item>(
        "SELECT
            id,
            name,
            description,
            price
        FROM
            item
        WHERE
            id = ?",
    )
    .bind(item_id)
    .fetch_one(&mut **tx)
    .await?;

    Ok(item)
}

/// Pull every item in insertion order
pub async fn item_select_all(tx: &mut Transaction<'_, Sqlite>) -> Result<Vec<Item>, sqlx::Error> {
    let items = query_as::<_, Item>(
        "SELECT
            id,
            name,
            description,
            price
        FROM
            item
        ORDER BY
            id",
    )
    .fetch_all(&mut **tx)
    .await?;

    Ok(items)
}

/// Delete an item
pub async fn item_drop(
    tx: &mut Transaction<'_, Sqlite>,
    item_id: i64,
) -> Result<Item, sqlx::Error> {
    let item = query_as::<_, Item>(
        "DELETE FROM
            item
        WHERE
            id = ?
        RETURNING
            id,
            name,
            description,
            price",
    )
    .bind(item_id)
    .fetch_one(&mut **tx)
    .await?;

    Ok(item)
}
