//! User store - the two statements `/api/mysql-test` runs against MySQL.
//!
//! Handlers talk to a [`UserStore`] trait object so the HTTP layer can be
//! exercised without a live database. [`MySqlUserStore`] is the only
//! production implementation.

use async_trait::async_trait;
use sqlx::{Arguments, mysql::MySqlArguments};

use crate::{
    db::DbPool,
    models::user::{NewUser, User},
};

pub const SELECT_USERS_SQL: &str = "SELECT id, name, age FROM users ORDER BY id";

pub const INSERT_USER_SQL: &str = "INSERT INTO users (name, age) VALUES (?, ?)";

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Run the fixed read query.
    async fn list_users(&self) -> Result<Vec<User>, sqlx::Error>;

    /// Insert one user, returning the generated id.
    async fn insert_user(&self, user: &NewUser) -> Result<u64, sqlx::Error>;

    /// Round-trip to the database.
    async fn ping(&self) -> Result<(), sqlx::Error>;
}

/// Statement text and bound arguments for inserting `user`.
///
/// `name` and `age` only ever travel as arguments; the SQL text is constant.
pub fn insert_user_statement(
    user: &NewUser,
) -> Result<(&'static str, MySqlArguments), sqlx::Error> {
    let mut args = MySqlArguments::default();
    args.add(user.name.clone()).map_err(sqlx::Error::Encode)?;
    args.add(user.age).map_err(sqlx::Error::Encode)?;

    Ok((INSERT_USER_SQL, args))
}

/// [`UserStore`] backed by the shared MySQL pool.
#[derive(Clone)]
pub struct MySqlUserStore {
    pool: DbPool,
}

impl MySqlUserStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for MySqlUserStore {
    async fn list_users(&self) -> Result<Vec<User>, sqlx::Error> {
        sqlx::query_as::<_, User>(SELECT_USERS_SQL)
            .fetch_all(&self.pool)
            .await
    }

    async fn insert_user(&self, user: &NewUser) -> Result<u64, sqlx::Error> {
        let (sql, args) = insert_user_statement(user)?;

        let result = sqlx::query_with(sql, args).execute(&self.pool).await?;

        Ok(result.last_insert_id())
    }

    async fn ping(&self) -> Result<(), sqlx::Error> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
