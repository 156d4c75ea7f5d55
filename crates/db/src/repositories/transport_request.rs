//! Transport request repository.
//!
//! Status transitions are applied as conditional updates guarded on the
//! current status, so concurrent actors race at the storage layer and
//! exactly one wins.

use std::sync::Arc;

use crate::entities::{
    Assignment, Rejection, RequestStatus, TransportRequest, assignment, rejection,
    transport_request,
};
use careride_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder,
    sea_query::{Expr, Query},
};

/// Transport request repository for database operations.
#[derive(Clone)]
pub struct TransportRequestRepository {
    db: Arc<DatabaseConnection>,
}

impl TransportRequestRepository {
    /// Create a new transport request repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a request by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<transport_request::Model>> {
        TransportRequest::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create a new request.
    pub async fn create(
        &self,
        model: transport_request::ActiveModel,
    ) -> AppResult<transport_request::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Open requests visible to a volunteer: not flagged as having no
    /// volunteers available, and not already rejected by this volunteer.
    pub async fn find_open_for_volunteer(
        &self,
        volunteer_id: &str,
    ) -> AppResult<Vec<transport_request::Model>> {
        let rejected_by_volunteer = Query::select()
            .column(rejection::Column::RequestId)
            .from(Rejection)
            .and_where(Expr::col(rejection::Column::VolunteerId).eq(volunteer_id))
            .to_owned();

        TransportRequest::find()
            .filter(transport_request::Column::Status.eq(RequestStatus::Open))
            .filter(transport_request::Column::NoVolunteersAvailable.eq(false))
            .filter(transport_request::Column::Id.not_in_subquery(rejected_by_volunteer))
            .order_by_desc(transport_request::Column::CreatedAt)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// A patient's own open requests.
    pub async fn find_open_by_patient(
        &self,
        patient_id: &str,
    ) -> AppResult<Vec<transport_request::Model>> {
        TransportRequest::find()
            .filter(transport_request::Column::PatientId.eq(patient_id))
            .filter(transport_request::Column::Status.eq(RequestStatus::Open))
            .order_by_desc(transport_request::Column::CreatedAt)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Requests accepted by the given volunteer.
    pub async fn find_accepted_by_volunteer(
        &self,
        volunteer_id: &str,
    ) -> AppResult<Vec<transport_request::Model>> {
        TransportRequest::find()
            .inner_join(Assignment)
            .filter(assignment::Column::VolunteerId.eq(volunteer_id))
            .filter(transport_request::Column::Status.eq(RequestStatus::Accepted))
            .order_by_desc(transport_request::Column::CreatedAt)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// A patient's closed requests: cancelled or done, or accepted with an
    /// existing assignment.
    pub async fn find_closed_by_patient(
        &self,
        patient_id: &str,
    ) -> AppResult<Vec<transport_request::Model>> {
        let assigned = Query::select()
            .column(assignment::Column::RequestId)
            .from(Assignment)
            .to_owned();

        TransportRequest::find()
            .filter(transport_request::Column::PatientId.eq(patient_id))
            .filter(
                Condition::any()
                    .add(
                        transport_request::Column::Status
                            .is_in([RequestStatus::Cancelled, RequestStatus::Done]),
                    )
                    .add(
                        Condition::all()
                            .add(transport_request::Column::Status.eq(RequestStatus::Accepted))
                            .add(transport_request::Column::Id.in_subquery(assigned)),
                    ),
            )
            .order_by_desc(transport_request::Column::CreatedAt)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Transition `open -> accepted`. Returns `true` when this caller won the
    /// update; a concurrent acceptor observes zero affected rows.
    pub async fn accept_if_open(&self, id: &str) -> AppResult<bool> {
        let result = TransportRequest::update_many()
            .col_expr(
                transport_request::Column::Status,
                Expr::value(RequestStatus::Accepted),
            )
            .filter(transport_request::Column::Id.eq(id))
            .filter(transport_request::Column::Status.eq(RequestStatus::Open))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(result.rows_affected == 1)
    }

    /// Transition `open -> cancelled` for the owning patient.
    pub async fn cancel_if_open(&self, id: &str, patient_id: &str) -> AppResult<bool> {
        let result = TransportRequest::update_many()
            .col_expr(
                transport_request::Column::Status,
                Expr::value(RequestStatus::Cancelled),
            )
            .filter(transport_request::Column::Id.eq(id))
            .filter(transport_request::Column::PatientId.eq(patient_id))
            .filter(transport_request::Column::Status.eq(RequestStatus::Open))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(result.rows_affected == 1)
    }

    /// Transition `open -> cancelled` with the no-volunteers flag set.
    /// Used by the rejection-exhaustion rule.
    pub async fn cancel_no_volunteers(&self, id: &str) -> AppResult<bool> {
        let result = TransportRequest::update_many()
            .col_expr(
                transport_request::Column::Status,
                Expr::value(RequestStatus::Cancelled),
            )
            .col_expr(
                transport_request::Column::NoVolunteersAvailable,
                Expr::value(true),
            )
            .filter(transport_request::Column::Id.eq(id))
            .filter(transport_request::Column::Status.eq(RequestStatus::Open))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(result.rows_affected == 1)
    }

    /// Delete a request. Assignment and rejection rows cascade.
    pub async fn delete(&self, id: &str) -> AppResult<()> {
        TransportRequest::delete_by_id(id)
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    fn create_test_request(id: &str, patient_id: &str, status: RequestStatus) -> transport_request::Model {
        transport_request::Model {
            id: id.to_string(),
            patient_id: patient_id.to_string(),
            pickup_address: "Home".to_string(),
            destination: "Clinic".to_string(),
            requested_time: Utc::now().into(),
            notes: String::new(),
            status,
            no_volunteers_available: false,
            created_at: Utc::now().into(),
        }
    }

    #[tokio::test]
    async fn test_find_by_id_found() {
        let request = create_test_request("r1", "p1", RequestStatus::Open);

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[request.clone()]])
                .into_connection(),
        );

        let repo = TransportRequestRepository::new(db);
        let result = repo.find_by_id("r1").await.unwrap();

        assert!(result.is_some());
        assert_eq!(result.unwrap().status, RequestStatus::Open);
    }

    #[tokio::test]
    async fn test_accept_if_open_wins() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                }])
                .into_connection(),
        );

        let repo = TransportRequestRepository::new(db);
        assert!(repo.accept_if_open("r1").await.unwrap());
    }

    #[tokio::test]
    async fn test_accept_if_open_loses_race() {
        // Another volunteer accepted first; the guarded update touches no rows.
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 0,
                }])
                .into_connection(),
        );

        let repo = TransportRequestRepository::new(db);
        assert!(!repo.accept_if_open("r1").await.unwrap());
    }

    #[tokio::test]
    async fn test_cancel_if_open_requires_ownership_in_filter() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 0,
                }])
                .into_connection(),
        );

        let repo = TransportRequestRepository::new(db);
        // Non-owner or non-open request: zero rows affected.
        assert!(!repo.cancel_if_open("r1", "someone_else").await.unwrap());
    }
}
