use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::UserRole;
use crate::ports::{RepositoryResult, UserDirectory};

#[derive(Default)]
pub struct InMemoryUserDirectory {
    roles: RwLock<HashMap<Uuid, UserRole>>,
}

impl InMemoryUserDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn register(&self, user_id: Uuid, role: UserRole) {
        self.roles.write().await.insert(user_id, role);
    }
}

#[async_trait]
impl UserDirectory for InMemoryUserDirectory {
    async fn role_of(&self, user_id: Uuid) -> RepositoryResult<Option<UserRole>> {
        Ok(self.roles.read().await.get(&user_id).copied())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_registered_roles_are_returned() {
        let directory = InMemoryUserDirectory::new();
        let doctor = Uuid::new_v4();
        directory.register(doctor, UserRole::Doctor).await;

        assert_eq!(directory.role_of(doctor).await.unwrap(), Some(UserRole::Doctor));
        assert_eq!(directory.role_of(Uuid::new_v4()).await.unwrap(), None);
    }
}
