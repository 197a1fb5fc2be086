//! User management

use std::sync::Arc;

use log::{info, warn};

use super::finish;
use crate::domain::{
    CreateUserDto, DomainError, DomainResult, LedgerTransaction, RepositoryProvider, User, UserRole,
};
use crate::infrastructure::crypto::hash_password;

pub struct UserService {
    repos: Arc<dyn RepositoryProvider>,
}

impl UserService {
    pub fn new(repos: Arc<dyn RepositoryProvider>) -> Self {
        Self { repos }
    }

    /// Create a user, hashing the password with bcrypt
    pub async fn create_user(&self, dto: CreateUserDto) -> DomainResult<User> {
        let email = dto.email.trim().to_lowercase();
        if dto.name.trim().is_empty() || email.is_empty() {
            return Err(DomainError::InvalidRequest("Name and email are required".into()));
        }
        if self.repos.users().get_user_by_email(&email).await?.is_some() {
            return Err(DomainError::Conflict(format!("User with email {}", email)));
        }

        let password_hash = hash_password(&dto.password)
            .map_err(|e| DomainError::InvalidRequest(format!("Password hashing failed: {}", e)))?;

        let user = self
            .repos
            .users()
            .create_user(dto.name.trim(), &email, &password_hash, dto.role)
            .await?;
        info!("User {} created with role {}", user.email, user.role.as_str());
        Ok(user)
    }

    /// Create the configured administrator when the store has no users yet
    pub async fn ensure_admin(&self, admin: CreateUserDto) -> DomainResult<Option<User>> {
        if self.repos.users().count_users().await? > 0 {
            return Ok(None);
        }

        warn!(
            "No users found, creating default admin '{}'. Change its password!",
            admin.email
        );
        let user = self
            .create_user(CreateUserDto {
                role: UserRole::Admin,
                ..admin
            })
            .await?;
        Ok(Some(user))
    }

    pub async fn list_users(&self) -> DomainResult<Vec<User>> {
        self.repos.users().list_users().await
    }

    /// Delete a user and their booking history. Refused while any of their
    /// reservations still holds a spot.
    pub async fn delete_user(&self, user_id: i32) -> DomainResult<()> {
        let mut tx = self.repos.ledger().begin().await?;
        let result = delete_in(tx.as_mut(), user_id).await;
        let user = finish(tx, result).await?;

        info!("User {} ({}) deleted", user.id, user.email);
        Ok(())
    }
}

async fn delete_in(tx: &mut dyn LedgerTransaction, user_id: i32) -> DomainResult<User> {
    let user = tx
        .lock_user(user_id)
        .await?
        .ok_or_else(|| DomainError::not_found("User", "user_id", user_id))?;

    let active = tx.count_active_for_user(user_id).await?;
    if active > 0 {
        return Err(DomainError::Conflict(format!(
            "User {} has {} active reservations",
            user_id, active
        )));
    }
    tx.delete_user(user_id).await?;
    Ok(user)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::services::{LotAdminService, ReservationService};
    use crate::domain::{LotStatus, NewLot};
    use crate::infrastructure::database::testing::memory_database;
    use crate::infrastructure::SeaOrmRepositoryProvider;

    async fn service() -> UserService {
        let db = memory_database().await;
        UserService::new(Arc::new(SeaOrmRepositoryProvider::new(db)))
    }

    async fn services() -> (UserService, LotAdminService, ReservationService) {
        let db = memory_database().await;
        let repos: Arc<dyn RepositoryProvider> = Arc::new(SeaOrmRepositoryProvider::new(db));
        (
            UserService::new(repos.clone()),
            LotAdminService::new(repos.clone()),
            ReservationService::new(repos),
        )
    }

    fn dto(email: &str, role: UserRole) -> CreateUserDto {
        CreateUserDto {
            name: "Sam".into(),
            email: email.into(),
            password: "hunter22".into(),
            role,
        }
    }

    #[tokio::test]
    async fn password_is_stored_hashed() {
        let svc = service().await;

        let user = svc.create_user(dto("Sam@Example.com", UserRole::Driver)).await.unwrap();
        assert_eq!(user.email, "sam@example.com");
        assert_eq!(user.role, UserRole::Driver);
        assert_ne!(user.password_hash, "hunter22");
        assert!(bcrypt::verify("hunter22", &user.password_hash).unwrap());
    }

    #[tokio::test]
    async fn duplicate_email_is_a_conflict() {
        let svc = service().await;

        svc.create_user(dto("sam@example.com", UserRole::Driver)).await.unwrap();
        let err = svc
            .create_user(dto("SAM@example.com", UserRole::Admin))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
        assert_eq!(svc.list_users().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn admin_is_created_only_into_an_empty_store() {
        let svc = service().await;

        let admin = svc
            .ensure_admin(dto("admin@example.com", UserRole::Driver))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(admin.role, UserRole::Admin);

        let again = svc
            .ensure_admin(dto("other@example.com", UserRole::Admin))
            .await
            .unwrap();
        assert!(again.is_none());
        assert_eq!(svc.list_users().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn user_with_active_booking_cannot_be_deleted() {
        let (users, admin, engine) = services().await;
        let user = users.create_user(dto("sam@example.com", UserRole::Driver)).await.unwrap();
        let lot = admin
            .create_lot(NewLot {
                name: "Depot".into(),
                location: "1 Yard Rd".into(),
                total_spots: 3,
                hourly_rate: "2.00".parse().unwrap(),
                status: LotStatus::Open,
            })
            .await
            .unwrap();
        let booked = engine
            .book(user.id, lot.id, "2025-06-01T10:00", "2025-06-01T11:00")
            .await
            .unwrap();

        let err = users.delete_user(user.id).await.unwrap_err();
        assert_eq!(
            err.to_string(),
            format!("Conflict: User {} has 1 active reservations", user.id)
        );
        assert_eq!(users.list_users().await.unwrap().len(), 1);

        engine.cancel(booked.id).await.unwrap();
        users.delete_user(user.id).await.unwrap();

        assert!(users.list_users().await.unwrap().is_empty());
        assert!(matches!(
            engine.get(booked.id).await,
            Err(DomainError::NotFound { .. })
        ));
        assert_eq!(admin.get_lot(lot.id).await.unwrap().available_spots, 3);
    }

    #[tokio::test]
    async fn deleting_unknown_user_is_not_found() {
        let svc = service().await;

        assert!(matches!(
            svc.delete_user(404).await,
            Err(DomainError::NotFound { .. })
        ));
    }
}
