//! User queries.

use chrono::{DateTime, Utc};
use sqlx::PgConnection;

use stockroom_core::{UserId, Username};

use crate::db::RepositoryError;
use crate::models::{NewUser, ProfileUpdate, User, UserCredentials};

const USER_COLUMNS: &str = "id, username, name, is_admin, created_at";

#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: UserId,
    username: String,
    name: String,
    is_admin: bool,
    created_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = RepositoryError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let username = Username::parse(&row.username).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid username in database: {e}"))
        })?;

        Ok(Self {
            id: row.id,
            username,
            name: row.name,
            is_admin: row.is_admin,
            created_at: row.created_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct CredentialsRow {
    #[sqlx(flatten)]
    user: UserRow,
    password_hash: String,
}

impl TryFrom<CredentialsRow> for UserCredentials {
    type Error = RepositoryError;

    fn try_from(row: CredentialsRow) -> Result<Self, Self::Error> {
        Ok(Self {
            user: row.user.try_into()?,
            password_hash: row.password_hash,
        })
    }
}

fn map_unique_violation(e: sqlx::Error) -> RepositoryError {
    if let sqlx::Error::Database(ref db_err) = e
        && db_err.is_unique_violation()
    {
        return RepositoryError::Conflict("username already exists".to_owned());
    }
    RepositoryError::Database(e)
}

pub(super) async fn find_by_id(
    conn: &mut PgConnection,
    id: UserId,
) -> Result<Option<User>, RepositoryError> {
    let row = sqlx::query_as::<_, UserRow>(&format!(
        "SELECT {USER_COLUMNS} FROM stockroom.users WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?;

    row.map(User::try_from).transpose()
}

pub(super) async fn find_credentials(
    conn: &mut PgConnection,
    username: &Username,
) -> Result<Option<UserCredentials>, RepositoryError> {
    let row = sqlx::query_as::<_, CredentialsRow>(&format!(
        "SELECT {USER_COLUMNS}, password_hash FROM stockroom.users WHERE username = $1"
    ))
    .bind(username.as_str())
    .fetch_optional(&mut *conn)
    .await?;

    row.map(UserCredentials::try_from).transpose()
}

pub(super) async fn find_credentials_by_id(
    conn: &mut PgConnection,
    id: UserId,
) -> Result<Option<UserCredentials>, RepositoryError> {
    let row = sqlx::query_as::<_, CredentialsRow>(&format!(
        "SELECT {USER_COLUMNS}, password_hash FROM stockroom.users WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?;

    row.map(UserCredentials::try_from).transpose()
}

pub(super) async fn insert(
    conn: &mut PgConnection,
    user: NewUser<'_>,
) -> Result<User, RepositoryError> {
    let row = sqlx::query_as::<_, UserRow>(&format!(
        r"
        INSERT INTO stockroom.users (username, name, password_hash, is_admin)
        VALUES ($1, $2, $3, $4)
        RETURNING {USER_COLUMNS}
        "
    ))
    .bind(user.username.as_str())
    .bind(user.name)
    .bind(user.password_hash)
    .bind(user.is_admin)
    .fetch_one(&mut *conn)
    .await
    .map_err(map_unique_violation)?;

    row.try_into()
}

pub(super) async fn update_profile(
    conn: &mut PgConnection,
    id: UserId,
    update: ProfileUpdate<'_>,
) -> Result<User, RepositoryError> {
    let row = sqlx::query_as::<_, UserRow>(&format!(
        r"
        UPDATE stockroom.users
        SET username = $2,
            name = $3,
            password_hash = COALESCE($4, password_hash),
            updated_at = now()
        WHERE id = $1
        RETURNING {USER_COLUMNS}
        "
    ))
    .bind(id)
    .bind(update.username.as_str())
    .bind(update.name)
    .bind(update.password_hash)
    .fetch_optional(&mut *conn)
    .await
    .map_err(map_unique_violation)?
    .ok_or(RepositoryError::NotFound)?;

    row.try_into()
}

pub(super) async fn admin_exists(conn: &mut PgConnection) -> Result<bool, RepositoryError> {
    let exists = sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS (SELECT 1 FROM stockroom.users WHERE is_admin)",
    )
    .fetch_one(&mut *conn)
    .await?;

    Ok(exists)
}
