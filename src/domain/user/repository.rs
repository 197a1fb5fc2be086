use async_trait::async_trait;

use super::User;
use crate::domain::DomainResult;

#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert a user whose password is already hashed
    async fn create_user(
        &self,
        name: &str,
        email: &str,
        password_hash: &str,
        role: super::UserRole,
    ) -> DomainResult<User>;

    async fn get_user_by_id(&self, id: i32) -> DomainResult<Option<User>>;
    async fn get_user_by_email(&self, email: &str) -> DomainResult<Option<User>>;

    /// All users, newest first
    async fn list_users(&self) -> DomainResult<Vec<User>>;

    async fn count_users(&self) -> DomainResult<u64>;
    async fn count_by_role(&self, role: super::UserRole) -> DomainResult<u64>;
}
