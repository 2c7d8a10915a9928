use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::UserRole;
use crate::ports::{RepositoryResult, UserDirectory};

/// Reads roles from the `users` table maintained by registration.
#[derive(Clone)]
pub struct PostgresUserDirectory {
    pool: PgPool,
}

impl PostgresUserDirectory {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserDirectory for PostgresUserDirectory {
    async fn role_of(&self, user_id: Uuid) -> RepositoryResult<Option<UserRole>> {
        let role = sqlx::query_scalar::<_, String>("SELECT role FROM users WHERE id = $1")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;

        role.map(|role| role.parse::<UserRole>()).transpose()
    }
}
