use crate::{
    api::Tag,
    item::core::{item_add, item_read, item_read_all, item_remove, Item, ItemParam},
};
use poem::{error::InternalServerError, web::Data};
use poem_openapi::{param::Path, payload::Json, ApiResponse, OpenApi};
use sqlx::SqlitePool;

/// Response when a new item has been stored
#[derive(ApiResponse)]
enum ItemCreated {
    /// Item created successfully
    #[oai(status = 201)]
    Created(Json<Item>),
}

/// Response when an item has been removed
#[derive(ApiResponse)]
enum ItemDeleted {
    /// Item deleted successfully
    #[oai(status = 204)]
    Deleted,
}

/// Struct we will build our REST API / Webserver
pub struct ItemApi;

#[OpenApi(prefix_path = "/api/v1")]
impl ItemApi {
    /// List all items
    ///
    /// Retrieve a list of all items in the system. Returns an empty list if no items exist.
    #[oai(path = "/items", method = "get", tag = Tag::Items)]
    async fn item_get_all(
        &self,
        Data(pool): Data<&SqlitePool>,
    ) -> Result<Json<Vec<Item>>, poem::Error> {
        // Start Transaction
        let mut tx = pool.begin().await.map_err(InternalServerError)?;

        // Pull items
        let items = item_read_all(&mut tx).await?;

        Ok(Json(items))
    }

    /// Get an item by ID
    ///
    /// Retrieve a specific item by its unique identifier.
    #[oai(path = "/items/:item_id", method = "get", tag = Tag::Items)]
    async fn item_get(
        &self,
        Data(pool): Data<&SqlitePool>,
        Path(item_id): Path<i64>,
    ) -> Result<Json<Item>, poem::Error> {
        // Start Transaction
        let mut tx = pool.begin().await.map_err(InternalServerError)?;

        // Pull item
        let item = item_read(&mut tx, item_id).await?;

        Ok(Json(item))
    }

    /// Create a new item
    ///
    /// Create a new item with the provided data. The item will be assigned a unique ID.
    #[oai(path = "/items", method = "post", tag = Tag::Items)]
    async fn item_post(
        &self,
        Data(pool): Data<&SqlitePool>,
        Json(item_param): Json<ItemParam>,
    ) -> Result<ItemCreated, poem::Error> {
        // Start Transaction
        let mut tx = pool.begin().await.map_err(InternalServerError)?;

        // Add the item
        let item = item_add(&mut tx, &item_param).await?;

        // Commit Transaction
        tx.commit().await.map_err(InternalServerError)?;

        Ok(ItemCreated::Created(Json(item)))
    }

    /// Delete an item
    ///
    /// Delete an item by its unique identifier. This action cannot be undone.
    #[oai(path = "/items/:item_id", method = "delete", tag = Tag::Items)]
    async fn item_delete(
        &self,
        Data(pool): Data<&SqlitePool>,
        Path(item_id): Path<i64>,
    ) -> Result<ItemDeleted, poem::Error> {
        // Start Transaction
        let mut tx = pool.begin().await.map_err(InternalServerError)?;

        // Drop item
        item_remove(&mut tx, item_id).await?;

        // Commit Transaction
        tx.commit().await.map_err(InternalServerError)?;

        Ok(ItemDeleted::Deleted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::test_utils::{gen_test_item_param, post_test_item};
    use poem::{http::StatusCode, test::TestClient};
    use poem_openapi::OpenApiService;
    use serde_json::json;

    /// Test create item
    #[sqlx::test]
    async fn test_item_post(pool: SqlitePool) {
        // Payload to send into the API
        let item_param = gen_test_item_param("widget");
        let body = serde_json::to_string(&item_param).unwrap();

        // Test Client
        let ep = OpenApiService::new(ItemApi, "test", "1.0");
        let cli = TestClient::new(ep);

        // Test Request
        let response = cli
            .post("/api/v1/items")
            .header("Content-Type", "application/json; charset=utf-8")
            .body(body)
            .data(pool)
            .send()
            .await;

        // Check status
        response.assert_status(StatusCode::CREATED);

        // Check Values
        let test_json = response.json().await;
        let json_value = test_json.value();

        json_value.object().get("id").assert_i64(1);
        json_value.object().get("name").assert_string("widget");
        json_value
            .object()
            .get("description")
            .assert_string("A widget for everyday use");
        json_value.object().get("price").assert_f64(29.99);
    }

    /// Test create item with a bad price
    #[sqlx::test]
    async fn test_item_post_invalid(pool: SqlitePool) {
        // Payload to send into the API
        let body = json!({
            "name": "widget",
            "price": -5.0,
        })
        .to_string();

        // Test Client
        let ep = OpenApiService::new(ItemApi, "test", "1.0");
        let cli = TestClient::new(ep);

        // Test Request
        let response = cli
            .post("/api/v1/items")
            .header("Content-Type", "application/json; charset=utf-8")
            .body(body)
            .data(pool)
            .send()
            .await;

        // Check status
        response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
    }

    /// Test list items
    #[sqlx::test]
    async fn test_item_get_all(pool: SqlitePool) {
        post_test_item(&pool, "widget").await;
        post_test_item(&pool, "gadget").await;

        // Test Client
        let ep = OpenApiService::new(ItemApi, "test", "1.0");
        let cli = TestClient::new(ep);

        // Test Request
        let response = cli.get("/api/v1/items").data(pool).send().await;

        // Check status
        response.assert_status_is_ok();

        // Check Values
        let test_json = response.json().await;
        let json_value = test_json.value();

        let items = json_value.array();
        items.assert_len(2);
        items.get(0).object().get("name").assert_string("widget");
        items.get(1).object().get("name").assert_string("gadget");
        items.get(1).object().get("id").assert_i64(2);
    }

    /// Test list items when there are none
    #[sqlx::test]
    async fn test_item_get_all_empty(pool: SqlitePool) {
        // Test Client
        let ep = OpenApiService::new(ItemApi, "test", "1.0");
        let cli = TestClient::new(ep);

        // Test Request
        let response = cli.get("/api/v1/items").data(pool).send().await;

        // Check status
        response.assert_status_is_ok();
        response.assert_json(json!([])).await;
    }

    /// Test item get
    #[sqlx::test]
    async fn test_item_get(pool: SqlitePool) {
        post_test_item(&pool, "widget").await;

        // Test Client
        let ep = OpenApiService::new(ItemApi, "test", "1.0");
        let cli = TestClient::new(ep);

        // Test Request
        let response = cli.get("/api/v1/items/1").data(pool).send().await;

        // Check status
        response.assert_status_is_ok();

        // Check Values
        let test_json = response.json().await;
        let json_value = test_json.value();

        json_value.object().get("id").assert_i64(1);
        json_value.object().get("name").assert_string("widget");
        json_value.object().get("price").assert_f64(29.99);
    }

    /// Test Reading an item that does not exists
    #[sqlx::test]
    async fn test_item_get_not_found(pool: SqlitePool) {
        // Test Client
        let ep = OpenApiService::new(ItemApi, "test", "1.0");
        let cli = TestClient::new(ep);

        // Test Request
        let response = cli.get("/api/v1/items/42").data(pool).send().await;

        // Check status
        response.assert_status(StatusCode::NOT_FOUND);
        response.assert_text("Item not found").await;
    }

    /// Test Reading an item with an id below one
    #[sqlx::test]
    async fn test_item_get_bad_id(pool: SqlitePool) {
        // Test Client
        let ep = OpenApiService::new(ItemApi, "test", "1.0");
        let cli = TestClient::new(ep);

        // Test Request
        let response = cli.get("/api/v1/items/0").data(pool).send().await;

        // Check status
        response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
    }

    /// Test item delete
    #[sqlx::test]
    async fn test_item_delete(pool: SqlitePool) {
        post_test_item(&pool, "widget").await;

        // Test Client
        let ep = OpenApiService::new(ItemApi, "test", "1.0");
        let cli = TestClient::new(ep);

        // Delete existing record
        let response = cli.delete("/api/v1/items/1").data(pool.clone()).send().await;

        // Check status
        response.assert_status(StatusCode::NO_CONTENT);

        // Record should be gone now
        let response = cli.get("/api/v1/items/1").data(pool).send().await;
        response.assert_status(StatusCode::NOT_FOUND);
    }

    /// Test item delete if not exists
    #[sqlx::test]
    async fn test_item_delete_not_found(pool: SqlitePool) {
        // Test Client
        let ep = OpenApiService::new(ItemApi, "test", "1.0");
        let cli = TestClient::new(ep);

        // Delete missing record
        let response = cli.delete("/api/v1/items/1").data(pool).send().await;

        // Check status
        response.assert_status(StatusCode::NOT_FOUND);
        response.assert_text("Item not found").await;
    }

    /// Test item delete with an id out of range
    #[sqlx::test]
    async fn test_item_delete_bad_id(pool: SqlitePool) {
        // Test Client
        let ep = OpenApiService::new(ItemApi, "test", "1.0");
        let cli = TestClient::new(ep);

        // Test Request
        let response = cli.delete("/api/v1/items/0").data(pool).send().await;

        // Check status
        response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
    }
}
