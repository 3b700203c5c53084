use crate::{
    api::Tag,
    auth::core::{
        password_change, token_refresh, user_login, user_register, Auth, BearerAuth,
        PasswordChange, TokenConfig, TokenRefresh, TokenResponse, UserCreate, UserLogin,
        UserResponse,
    },
    util::MessageResponse,
};
use jsonwebtoken::{DecodingKey, EncodingKey};
use poem::{error::InternalServerError, web::Data};
use poem_openapi::{
    payload::{Form, Json},
    ApiResponse, OpenApi,
};
use sqlx::SqlitePool;

/// Response when a new account has been stored
#[derive(ApiResponse)]
enum UserCreated {
    /// User registered successfully
    #[oai(status = 201)]
    Created(Json<UserResponse>),
}

/// Struct we will build our REST API / Webserver
pub struct AuthApi;

#[OpenApi(prefix_path = "/api/v1/auth")]
impl AuthApi {
    /// Register a new user
    ///
    /// Create a new user account with email, username, and password. The username and email must be unique.
    #[oai(path = "/register", method = "post", tag = Tag::Auth)]
    async fn register(
        &self,
        Data(pool): Data<&SqlitePool>,
        Json(user_param): Json<UserCreate>,
    ) -> Result<UserCreated, poem::Error> {
        // Start Transaction
        let mut tx = pool.begin().await.map_err(InternalServerError)?;

        // Add the user
        let user = user_register(&mut tx, &user_param).await?;

        // Commit Transaction
        tx.commit().await.map_err(InternalServerError)?;

        Ok(UserCreated::Created(Json(user)))
    }

    /// Login and get tokens
    ///
    /// Authenticate with username and password, sent as form data, to receive access and refresh tokens.
    #[oai(path = "/login", method = "post", tag = Tag::Auth)]
    async fn login(
        &self,
        Data(pool): Data<&SqlitePool>,
        Data(encoding_key): Data<&EncodingKey>,
        Data(token_config): Data<&TokenConfig>,
        Form(user_login_param): Form<UserLogin>,
    ) -> Result<Json<TokenResponse>, poem::Error> {
        // Start Transaction
        let mut tx = pool.begin().await.map_err(InternalServerError)?;

        // Check credentials
        let tokens = user_login(&mut tx, &user_login_param, encoding_key, token_config).await?;

        Ok(Json(tokens))
    }

    /// Refresh access token
    ///
    /// Use a valid refresh token to obtain a new access token and refresh token pair. The old refresh token is invalidated.
    #[oai(path = "/refresh", method = "post", tag = Tag::Auth)]
    async fn refresh(
        &self,
        Data(pool): Data<&SqlitePool>,
        Data(encoding_key): Data<&EncodingKey>,
        Data(decoding_key): Data<&DecodingKey>,
        Data(token_config): Data<&TokenConfig>,
        Json(token_param): Json<TokenRefresh>,
    ) -> Result<Json<TokenResponse>, poem::Error> {
        // Start Transaction
        let mut tx = pool.begin().await.map_err(InternalServerError)?;

        // Spend the refresh token
        let tokens = token_refresh(
            &mut tx,
            &token_param,
            encoding_key,
            decoding_key,
            token_config,
        )
        .await?;

        // Commit Transaction
        tx.commit().await.map_err(InternalServerError)?;

        Ok(Json(tokens))
    }

    /// Get current user
    ///
    /// Retrieve the profile information of the currently authenticated user. Requires a valid access token.
    #[oai(path = "/me", method = "get", tag = Tag::Auth)]
    async fn me(&self, auth: BearerAuth) -> Json<UserResponse> {
        Json(UserResponse::from(auth.user()))
    }

    /// Change password
    ///
    /// Change the password for the currently authenticated user. Requires the current password for verification.
    #[oai(path = "/change-password", method = "post", tag = Tag::Auth)]
    async fn change_password(
        &self,
        auth: BearerAuth,
        Data(pool): Data<&SqlitePool>,
        Json(password_param): Json<PasswordChange>,
    ) -> Result<Json<MessageResponse>, poem::Error> {
        // Start Transaction
        let mut tx = pool.begin().await.map_err(InternalServerError)?;

        // Swap the password
        let message = password_change(&mut tx, auth.user(), &password_param).await?;

        // Commit Transaction
        tx.commit().await.map_err(InternalServerError)?;

        Ok(Json(message))
    }

    /// Logout
    ///
    /// Logout the current user. Tokens are stateless, so nothing is invalidated server-side.
    #[oai(path = "/logout", method = "post", tag = Tag::Auth)]
    async fn logout(&self) -> Json<MessageResponse> {
        Json(MessageResponse::new("Successfully logged out"))
    }
}
