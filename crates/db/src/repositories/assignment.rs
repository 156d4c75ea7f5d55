//! Assignment repository.

use std::sync::Arc;

use crate::entities::{Assignment, assignment};
use careride_common::{AppError, AppResult};
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};

/// Assignment repository for database operations.
#[derive(Clone)]
pub struct AssignmentRepository {
    db: Arc<DatabaseConnection>,
}

impl AssignmentRepository {
    /// Create a new assignment repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find the assignment for a request, if any.
    pub async fn find_by_request(&self, request_id: &str) -> AppResult<Option<assignment::Model>> {
        Assignment::find_by_id(request_id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Check whether the given volunteer holds the assignment for a request.
    pub async fn is_assigned(&self, request_id: &str, volunteer_id: &str) -> AppResult<bool> {
        let found = Assignment::find()
            .filter(assignment::Column::RequestId.eq(request_id))
            .filter(assignment::Column::VolunteerId.eq(volunteer_id))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(found.is_some())
    }

    /// Create a new assignment.
    pub async fn create(&self, model: assignment::ActiveModel) -> AppResult<assignment::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}
