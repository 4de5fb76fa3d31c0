use deadpool_postgres::Pool;
use tokio_postgres::Row;
use uuid::Uuid;

use crate::{
    crypto::envelope::CipherBlob,
    error::Result,
    models::user::User,
};

/// A helper function to map a `tokio_postgres::Row` to a `User`.
fn row_to_user(row: &Row) -> Result<User> {
    Ok(User {
        user_id: row.try_get("user_id")?,
        email: row.try_get("email")?,
        password_hash: row.try_get("password_hash")?,
        lamp_ids: row.try_get("lamp_ids")?,
        tariffs_enc: CipherBlob {
            nonce: row.try_get("tariffs_nonce")?,
            ct: row.try_get("tariffs_ct")?,
        },
    })
}

/// Creates a new user. The tariff blob is already encrypted by the caller;
/// this layer never sees tariff plaintext.
pub async fn create_user(pool: &Pool, user: &User) -> Result<()> {
    let client = pool.get().await?;
    client
        .execute(
            r#"
            INSERT INTO users (user_id, email, password_hash, lamp_ids, tariffs_nonce, tariffs_ct)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
            &[
                &user.user_id,
                &user.email,
                &user.password_hash,
                &user.lamp_ids,
                &user.tariffs_enc.nonce,
                &user.tariffs_enc.ct,
            ],
        )
        .await?;
    Ok(())
}

/// Finds a user by their case-normalized email address.
pub async fn find_by_email(pool: &Pool, email: &str) -> Result<Option<User>> {
    let client = pool.get().await?;
    let row = client
        .query_opt(
            r#"
            SELECT user_id, email, password_hash, lamp_ids, tariffs_nonce, tariffs_ct
            FROM users
            WHERE email = $1
            "#,
            &[&email],
        )
        .await?;
    row.map(|r| row_to_user(&r)).transpose()
}

/// Finds a user by their ID.
pub async fn find_by_id(pool: &Pool, user_id: &Uuid) -> Result<Option<User>> {
    let client = pool.get().await?;
    let row = client
        .query_opt(
            r#"
            SELECT user_id, email, password_hash, lamp_ids, tariffs_nonce, tariffs_ct
            FROM users
            WHERE user_id = $1
            "#,
            &[user_id],
        )
        .await?;
    row.map(|r| row_to_user(&r)).transpose()
}

/// Appends a lamp id to the owner's lamp set. Set semantics: a second append
/// of the same id is a no-op.
pub async fn add_lamp(pool: &Pool, user_id: &Uuid, lamp_id: &str) -> Result<()> {
    let client = pool.get().await?;
    client
        .execute(
            r#"
            UPDATE users
            SET lamp_ids = array_append(lamp_ids, $2)
            WHERE user_id = $1 AND NOT ($2 = ANY(lamp_ids))
            "#,
            &[user_id, &lamp_id],
        )
        .await?;
    Ok(())
}

/// Removes a lamp id from the owner's lamp set.
pub async fn remove_lamp(pool: &Pool, user_id: &Uuid, lamp_id: &str) -> Result<()> {
    let client = pool.get().await?;
    client
        .execute(
            r#"
            UPDATE users
            SET lamp_ids = array_remove(lamp_ids, $2)
            WHERE user_id = $1
            "#,
            &[user_id, &lamp_id],
        )
        .await?;
    Ok(())
}

/// Replaces the user's encrypted tariff blob.
pub async fn set_tariffs(pool: &Pool, user_id: &Uuid, blob: &CipherBlob) -> Result<()> {
    let client = pool.get().await?;
    client
        .execute(
            r#"
            UPDATE users
            SET tariffs_nonce = $2, tariffs_ct = $3
            WHERE user_id = $1
            "#,
            &[user_id, &blob.nonce, &blob.ct],
        )
        .await?;
    Ok(())
}
