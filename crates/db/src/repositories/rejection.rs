//! Rejection repository.

use std::sync::Arc;

use crate::entities::{Rejection, rejection};
use careride_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
};

/// Rejection repository for database operations.
#[derive(Clone)]
pub struct RejectionRepository {
    db: Arc<DatabaseConnection>,
}

impl RejectionRepository {
    /// Create a new rejection repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a rejection by (request, volunteer) pair.
    pub async fn find_by_pair(
        &self,
        request_id: &str,
        volunteer_id: &str,
    ) -> AppResult<Option<rejection::Model>> {
        Rejection::find()
            .filter(rejection::Column::RequestId.eq(request_id))
            .filter(rejection::Column::VolunteerId.eq(volunteer_id))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create a new rejection.
    pub async fn create(&self, model: rejection::ActiveModel) -> AppResult<rejection::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count rejections for a request. The unique (request, volunteer)
    /// constraint makes this the count of distinct rejecting volunteers.
    pub async fn count_for_request(&self, request_id: &str) -> AppResult<u64> {
        Rejection::find()
            .filter(rejection::Column::RequestId.eq(request_id))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Delete all rejections for a request. Called when the request is
    /// accepted.
    pub async fn delete_for_request(&self, request_id: &str) -> AppResult<u64> {
        let result = Rejection::delete_many()
            .filter(rejection::Column::RequestId.eq(request_id))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(result.rows_affected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    fn create_test_rejection(id: &str, request_id: &str, volunteer_id: &str) -> rejection::Model {
        rejection::Model {
            id: id.to_string(),
            request_id: request_id.to_string(),
            volunteer_id: volunteer_id.to_string(),
            reason: "too far".to_string(),
            created_at: Utc::now().into(),
        }
    }

    #[tokio::test]
    async fn test_find_by_pair_found() {
        let rejection = create_test_rejection("j1", "r1", "v1");

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[rejection]])
                .into_connection(),
        );

        let repo = RejectionRepository::new(db);
        let result = repo.find_by_pair("r1", "v1").await.unwrap();

        assert!(result.is_some());
        assert_eq!(result.unwrap().reason, "too far");
    }

    #[tokio::test]
    async fn test_delete_for_request() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 3,
                }])
                .into_connection(),
        );

        let repo = RejectionRepository::new(db);
        assert_eq!(repo.delete_for_request("r1").await.unwrap(), 3);
    }
}
