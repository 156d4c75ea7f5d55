//! User service.

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use careride_common::{AppError, AppResult, IdGenerator};
use careride_db::{
    entities::{Role, profile, user},
    repositories::{ProfileRepository, UserRepository},
};
use sea_orm::Set;
use serde::Deserialize;
use validator::Validate;

/// User service for business logic.
#[derive(Clone)]
pub struct UserService {
    user_repo: UserRepository,
    profile_repo: ProfileRepository,
    id_gen: IdGenerator,
}

/// Input for creating a new account.
#[derive(Debug, Deserialize, Validate)]
pub struct SignupInput {
    #[validate(length(min = 1, max = 128))]
    pub username: String,

    #[validate(length(min = 8, max = 128))]
    pub password: String,

    /// Role chosen at signup; immutable afterwards.
    pub role: Role,

    #[validate(length(max = 20))]
    pub phone: Option<String>,
}

impl UserService {
    /// Create a new user service.
    #[must_use]
    pub const fn new(user_repo: UserRepository, profile_repo: ProfileRepository) -> Self {
        Self {
            user_repo,
            profile_repo,
            id_gen: IdGenerator::new(),
        }
    }

    /// Create a new account with its role profile.
    pub async fn signup(&self, input: SignupInput) -> AppResult<(user::Model, profile::Model)> {
        input.validate()?;

        // Check if username is taken
        if self
            .user_repo
            .find_by_username(&input.username)
            .await?
            .is_some()
        {
            return Err(AppError::BadRequest("Username already taken".to_string()));
        }

        let password_hash = hash_password(&input.password)?;
        let user_id = self.id_gen.generate();
        let token = self.id_gen.generate_token();

        let user_model = user::ActiveModel {
            id: Set(user_id.clone()),
            username: Set(input.username.clone()),
            username_lower: Set(input.username.to_lowercase()),
            token: Set(token),
            created_at: Set(chrono::Utc::now().into()),
        };

        let user = self.user_repo.create(user_model).await?;

        let profile_model = profile::ActiveModel {
            user_id: Set(user_id),
            role: Set(input.role),
            phone: Set(input.phone.unwrap_or_default()),
            password_hash: Set(password_hash),
            created_at: Set(chrono::Utc::now().into()),
        };

        let profile = self.profile_repo.create(profile_model).await?;

        tracing::info!(user_id = %user.id, username = %user.username, "Created account");

        Ok((user, profile))
    }

    /// Authenticate a user by API token.
    pub async fn authenticate_by_token(&self, token: &str) -> AppResult<user::Model> {
        self.user_repo
            .find_by_token(token)
            .await?
            .ok_or(AppError::Unauthorized)
    }

    /// Authenticate a user by username and password.
    pub async fn authenticate(&self, username: &str, password: &str) -> AppResult<user::Model> {
        let user = self
            .user_repo
            .find_by_username(username)
            .await?
            .ok_or(AppError::Unauthorized)?;

        let profile = self
            .profile_repo
            .find_by_user_id(&user.id)
            .await?
            .ok_or(AppError::Unauthorized)?;

        if !verify_password(password, &profile.password_hash)? {
            return Err(AppError::Unauthorized);
        }

        Ok(user)
    }

    /// Get the profile for a user.
    pub async fn get_profile(&self, user_id: &str) -> AppResult<profile::Model> {
        self.profile_repo
            .find_by_user_id(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Profile for user {user_id}")))
    }
}

/// Hash a password with Argon2.
fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| AppError::Internal(format!("Failed to hash password: {e}")))
}

/// Verify a password against a hash.
fn verify_password(password: &str, hash: &str) -> AppResult<bool> {
    let parsed_hash =
        PasswordHash::new(hash).map_err(|e| AppError::Internal(format!("Invalid hash: {e}")))?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_password_roundtrip() {
        let hash = hash_password("correct horse battery").unwrap();
        assert!(verify_password("correct horse battery", &hash).unwrap());
        assert!(!verify_password("wrong password", &hash).unwrap());
    }

    #[test]
    fn test_signup_input_rejects_short_password() {
        let input = SignupInput {
            username: "alice".to_string(),
            password: "short".to_string(),
            role: Role::Patient,
            phone: None,
        };
        assert!(input.validate().is_err());
    }
}
