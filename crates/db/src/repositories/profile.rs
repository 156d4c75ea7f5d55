//! Profile repository.

use std::sync::Arc;

use crate::entities::{Profile, Role, profile};
use careride_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    sea_query::Expr,
};

/// Profile repository for database operations.
#[derive(Clone)]
pub struct ProfileRepository {
    db: Arc<DatabaseConnection>,
}

impl ProfileRepository {
    /// Create a new profile repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a profile by user ID.
    pub async fn find_by_user_id(&self, user_id: &str) -> AppResult<Option<profile::Model>> {
        Profile::find_by_id(user_id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create a new profile.
    pub async fn create(&self, model: profile::ActiveModel) -> AppResult<profile::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Update the contact phone for a user.
    pub async fn update_phone(&self, user_id: &str, phone: &str) -> AppResult<()> {
        Profile::update_many()
            .col_expr(profile::Column::Phone, Expr::value(phone))
            .filter(profile::Column::UserId.eq(user_id))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Count profiles with the given role.
    pub async fn count_by_role(&self, role: Role) -> AppResult<u64> {
        Profile::find()
            .filter(profile::Column::Role.eq(role))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase};

    fn create_test_profile(user_id: &str, role: Role) -> profile::Model {
        profile::Model {
            user_id: user_id.to_string(),
            role,
            phone: String::new(),
            password_hash: "hash".to_string(),
            created_at: Utc::now().into(),
        }
    }

    #[tokio::test]
    async fn test_find_by_user_id_found() {
        let profile = create_test_profile("u1", Role::Volunteer);

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[profile.clone()]])
                .into_connection(),
        );

        let repo = ProfileRepository::new(db);
        let result = repo.find_by_user_id("u1").await.unwrap();

        assert!(result.is_some());
        assert!(result.unwrap().role.is_volunteer());
    }
}
