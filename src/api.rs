use crate::{
    auth::{AuthApi, TokenConfig},
    error::error_detail,
    health::HealthApi,
    item::ItemApi,
};
use jsonwebtoken::{DecodingKey, EncodingKey};
use poem::{middleware::Tracing, Endpoint, EndpointExt, Response, Route};
use poem_openapi::{ContactObject, LicenseObject, OpenApiService, Tags};
use sqlx::SqlitePool;

const TITLE: &str = "API Backend";
const VERSION: &str = "1.0.0";
const DESCRIPTION: &str = "\
A RESTful API backend with authentication and item management.

## Features

* **Authentication** - JWT-based auth with access and refresh tokens
* **User Management** - Register, login, and manage user accounts
* **Items** - CRUD operations for items

## Authentication

1. Register a new account via `/api/v1/auth/register`
2. Login via `/api/v1/auth/login` to get access and refresh tokens
3. Include the access token in the `Authorization` header: `Bearer <token>`
4. Use `/api/v1/auth/refresh` to get a new access token when it expires
";

#[derive(Tags)]
pub enum Tag {
    /// Health check endpoints for monitoring and load balancers.
    Health,
    /// Authentication operations including registration, login, and token management.
    Auth,
    /// CRUD operations for managing items.
    Items,
}

/// OpenAPI service with every API group mounted
fn api_service() -> OpenApiService<(HealthApi, AuthApi, ItemApi), ()> {
    OpenApiService::new((HealthApi, AuthApi, ItemApi), TITLE, VERSION)
        .description(DESCRIPTION)
        .contact(
            ContactObject::new()
                .name("API Support")
                .email("support@example.com"),
        )
        .license(LicenseObject::new("MIT").url("https://opensource.org/licenses/MIT"))
}

/// Route inbound traffic, with the shared state every endpoint needs
pub fn app(
    pool: SqlitePool,
    jwt_key: &[u8],
    token_config: TokenConfig,
) -> impl Endpoint<Output = Response> {
    // Setup OpenAPI docs
    let api_service = api_service();
    let spec = api_service.spec_endpoint();
    let swagger = api_service.swagger_ui();
    let redoc = api_service.redoc();

    Route::new()
        // Developer friendly locations
        .at("/openapi.json", spec)
        .nest("/docs", swagger)
        .nest("/redoc", redoc)
        // Everything else is the API itself
        .nest("/", api_service)
        // Global context to be shared
        .data(pool)
        .data(EncodingKey::from_secret(jwt_key))
        .data(DecodingKey::from_secret(jwt_key))
        .data(token_config)
        // Utilites being added to our services
        .with(Tracing)
        .catch_all_error(error_detail)
}
