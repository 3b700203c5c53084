use crate::auth::core::User;
use sqlx::{query, query_as, query_scalar, Sqlite, Transaction};

/// Add a user to the app_user table
pub async fn user_insert(
    tx: &mut Transaction<'_, Sqlite>,
    email: &str,
    username: &str,
    hashed_password: &str,
) -> Result<User, sqlx::Error> {
    let user = query_as::<_, User>(
        "INSERT INTO app_user (
            email,
            username,
            hashed_password
        ) VALUES (
            ?,
            ?,
            ?
        ) RETURNING
            id,
            email,
            username,
            hashed_password,
            is_active",
    )
    .bind(email)
    .bind(username)
    .bind(hashed_password)
    .fetch_one(&mut **tx)
    .await?;

    Ok(user)
}

/// Pull one user by username
pub async fn user_select(
    tx: &mut Transaction<'_, Sqlite>,
    username: &str,
) -> Result<User, sqlx::Error> {
    let user = query_as::<_, User>(
        "SELECT
            id,
            email,
            username,
            hashed_password,
            is_active
        FROM
            app_user
        WHERE
            username = ?",
    )
    .bind(username)
    .fetch_one(&mut **tx)
    .await?;

    Ok(user)
}

/// Pull one user by email
pub async fn user_select_by_email(
    tx: &mut Transaction<'_, Sqlite>,
    email: &str,
) -> Result<User, sqlx::Error> {
    let user = query_as::<_, User>(
        "SELECT
            id,
            email,
            username,
            hashed_password,
            is_active
        FROM
            app_user
        WHERE
            email = ?",
    )
    .bind(email)
    .fetch_one(&mut **tx)
    .await?;

    Ok(user)
}

/// Swap the password hash for a user
pub async fn user_update_password(
    tx: &mut Transaction<'_, Sqlite>,
    username: &str,
    hashed_password: &str,
) -> Result<User, sqlx::Error> {
    let user = query_as::<_, User>(
        "UPDATE
            app_user
        SET
            hashed_password = ?
        WHERE
            username = ?
        RETURNING
            id,
            email,
            username,
            hashed_password,
            is_active",
    )
    .bind(hashed_password)
    .bind(username)
    .fetch_one(&mut **tx)
    .await?;

    Ok(user)
}

/// Record a token id that may no longer be used
pub async fn revoked_token_insert(
    tx: &mut Transaction<'_, Sqlite>,
    jti: &str,
    expires_at: i64,
) -> Result<u64, sqlx::Error> {
    let rows_affected = query(
        "INSERT INTO revoked_token (
            jti,
            expires_at
        ) VALUES (
            ?,
            ?
        )",
    )
    .bind(jti)
    .bind(expires_at)
    .execute(&mut **tx)
    .await?
    .rows_affected();

    Ok(rows_affected)
}

/// Has this token id been revoked?
pub async fn revoked_token_exists(
    tx: &mut Transaction<'_, Sqlite>,
    jti: &str,
) -> Result<bool, sqlx::Error> {
    let count: i64 = query_scalar(
        "SELECT
            COUNT(*)
        FROM
            revoked_token
        WHERE
            jti = ?",
    )
    .bind(jti)
    .fetch_one(&mut **tx)
    .await?;

    Ok(count > 0)
}

/// Forget revocations for tokens that have expired on their own
pub async fn revoked_token_purge(
    tx: &mut Transaction<'_, Sqlite>,
    now: i64,
) -> Result<u64, sqlx::Error> {
    let rows_affected = query(
        "DELETE FROM
            revoked_token
        WHERE
            expires_at < ?",
    )
    .bind(now)
    .execute(&mut **tx)
    .await?
    .rows_affected();

    Ok(rows_affected)
}
