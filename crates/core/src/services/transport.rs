//! Transport request service.
//!
//! Implements the request lifecycle: `open -> accepted` when a volunteer
//! accepts, `open -> cancelled` when the owning patient cancels or when every
//! registered volunteer has rejected the request. `done` is terminal and
//! reserved for an administrative path.

use careride_common::{AppError, AppResult, IdGenerator};
use careride_db::{
    entities::{Role, assignment, profile, rejection, transport_request, user},
    repositories::{
        AssignmentRepository, ProfileRepository, RejectionRepository, TransportRequestRepository,
        UserRepository,
    },
};
use chrono::{DateTime, FixedOffset};
use sea_orm::Set;
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Transport service for business logic.
#[derive(Clone)]
pub struct TransportService {
    request_repo: TransportRequestRepository,
    assignment_repo: AssignmentRepository,
    rejection_repo: RejectionRepository,
    profile_repo: ProfileRepository,
    user_repo: UserRepository,
    id_gen: IdGenerator,
}

/// Input for creating a transport request.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateRequestInput {
    #[validate(length(min = 1, max = 255))]
    pub pickup: String,

    #[validate(length(min = 1, max = 255))]
    pub destination: String,

    pub requested_time: DateTime<FixedOffset>,

    #[validate(length(max = 2048))]
    pub notes: Option<String>,

    /// Optional contact phone; when given, updates the patient's profile.
    #[validate(length(max = 20))]
    pub phone: Option<String>,
}

/// Contact info for the assigned volunteer.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VolunteerInfo {
    pub id: String,
    pub username: String,
    pub phone: String,
}

/// Serialized view of a transport request, filtered by role on the read
/// paths that produce it.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestView {
    pub id: String,
    pub patient_id: String,
    pub patient_username: String,
    pub pickup: String,
    pub destination: String,
    pub requested_time: String,
    pub status: transport_request::RequestStatus,
    pub status_display: String,
    pub status_label: String,
    pub notes: String,
    pub phone: String,
    pub volunteer: Option<VolunteerInfo>,
    pub no_volunteers_available: bool,
}

impl TransportService {
    /// Create a new transport service.
    #[must_use]
    pub const fn new(
        request_repo: TransportRequestRepository,
        assignment_repo: AssignmentRepository,
        rejection_repo: RejectionRepository,
        profile_repo: ProfileRepository,
        user_repo: UserRepository,
    ) -> Self {
        Self {
            request_repo,
            assignment_repo,
            rejection_repo,
            profile_repo,
            user_repo,
            id_gen: IdGenerator::new(),
        }
    }

    /// Create a new request. Patients only.
    pub async fn create(
        &self,
        actor: &user::Model,
        actor_profile: &profile::Model,
        input: CreateRequestInput,
    ) -> AppResult<RequestView> {
        if !actor_profile.role.is_patient() {
            return Err(AppError::Forbidden(
                "Only patients can create requests".to_string(),
            ));
        }

        input.validate()?;

        if let Some(phone) = input.phone.as_deref()
            && !phone.is_empty()
        {
            self.profile_repo.update_phone(&actor.id, phone).await?;
        }

        let model = transport_request::ActiveModel {
            id: Set(self.id_gen.generate()),
            patient_id: Set(actor.id.clone()),
            pickup_address: Set(input.pickup),
            destination: Set(input.destination),
            requested_time: Set(input.requested_time),
            notes: Set(input.notes.unwrap_or_default()),
            status: Set(transport_request::RequestStatus::Open),
            no_volunteers_available: Set(false),
            created_at: Set(chrono::Utc::now().into()),
        };

        let request = self.request_repo.create(model).await?;

        tracing::info!(request_id = %request.id, patient_id = %actor.id, "Created transport request");

        self.to_view(request).await
    }

    /// List open requests, scoped by role: volunteers see open requests they
    /// have not rejected; patients see their own open requests.
    pub async fn list_open(
        &self,
        actor: &user::Model,
        actor_profile: &profile::Model,
    ) -> AppResult<Vec<RequestView>> {
        let requests = match actor_profile.role {
            Role::Volunteer => self.request_repo.find_open_for_volunteer(&actor.id).await?,
            Role::Patient => self.request_repo.find_open_by_patient(&actor.id).await?,
        };

        self.to_views(requests).await
    }

    /// Accept an open request. Volunteers only. Exactly one concurrent
    /// acceptor wins; losers get `NotFound`.
    pub async fn accept(
        &self,
        actor: &user::Model,
        actor_profile: &profile::Model,
        request_id: &str,
    ) -> AppResult<()> {
        if !actor_profile.role.is_volunteer() {
            return Err(AppError::Forbidden(
                "Only volunteers can accept requests".to_string(),
            ));
        }

        // Conditional update: succeeds only while the request is still open.
        if !self.request_repo.accept_if_open(request_id).await? {
            return Err(AppError::NotFound(format!(
                "Request {request_id} not found or not open"
            )));
        }

        let assignment = assignment::ActiveModel {
            request_id: Set(request_id.to_string()),
            volunteer_id: Set(actor.id.clone()),
            accepted_at: Set(chrono::Utc::now().into()),
            comment: Set(String::new()),
        };
        self.assignment_repo.create(assignment).await?;

        // Prior rejections no longer matter once someone takes the ride.
        let cleared = self.rejection_repo.delete_for_request(request_id).await?;

        tracing::info!(
            request_id = %request_id,
            volunteer_id = %actor.id,
            cleared_rejections = cleared,
            "Accepted transport request"
        );

        Ok(())
    }

    /// Record a volunteer's rejection of an open request. Idempotent per
    /// (request, volunteer). When every registered volunteer has rejected the
    /// request, it is cancelled with the no-volunteers flag set.
    pub async fn reject(
        &self,
        actor: &user::Model,
        actor_profile: &profile::Model,
        request_id: &str,
        reason: Option<String>,
    ) -> AppResult<()> {
        if !actor_profile.role.is_volunteer() {
            return Err(AppError::Forbidden(
                "Only volunteers can reject requests".to_string(),
            ));
        }

        let request = self
            .request_repo
            .find_by_id(request_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Request {request_id}")))?;

        if request.status != transport_request::RequestStatus::Open {
            return Err(AppError::NotFound(format!("Request {request_id} not open")));
        }

        // Idempotent: a repeat rejection by the same volunteer is a no-op.
        if self
            .rejection_repo
            .find_by_pair(request_id, &actor.id)
            .await?
            .is_none()
        {
            let model = rejection::ActiveModel {
                id: Set(self.id_gen.generate()),
                request_id: Set(request_id.to_string()),
                volunteer_id: Set(actor.id.clone()),
                reason: Set(reason.unwrap_or_default()),
                created_at: Set(chrono::Utc::now().into()),
            };
            self.rejection_repo.create(model).await?;
        }

        let rejected_count = self.rejection_repo.count_for_request(request_id).await?;
        let total_volunteers = self.profile_repo.count_by_role(Role::Volunteer).await?;

        if exhaustion_reached(rejected_count, total_volunteers) {
            // The guard on `open` tolerates a concurrent accept.
            let cancelled = self.request_repo.cancel_no_volunteers(request_id).await?;
            if cancelled {
                tracing::info!(
                    request_id = %request_id,
                    rejected_count,
                    total_volunteers,
                    "Cancelled request: no volunteers available"
                );
            }
        }

        Ok(())
    }

    /// Cancel an open request. Owning patient only.
    pub async fn cancel(
        &self,
        actor: &user::Model,
        actor_profile: &profile::Model,
        request_id: &str,
    ) -> AppResult<()> {
        if !actor_profile.role.is_patient() {
            return Err(AppError::Forbidden(
                "Only patients can cancel requests".to_string(),
            ));
        }

        if !self.request_repo.cancel_if_open(request_id, &actor.id).await? {
            return Err(AppError::NotFound(format!(
                "Request {request_id} not found or not open"
            )));
        }

        tracing::info!(request_id = %request_id, patient_id = %actor.id, "Cancelled transport request");

        Ok(())
    }

    /// List requests accepted by this volunteer. Other roles see an empty
    /// list.
    pub async fn list_accepted(
        &self,
        actor: &user::Model,
        actor_profile: &profile::Model,
    ) -> AppResult<Vec<RequestView>> {
        if !actor_profile.role.is_volunteer() {
            return Ok(Vec::new());
        }

        let requests = self
            .request_repo
            .find_accepted_by_volunteer(&actor.id)
            .await?;
        self.to_views(requests).await
    }

    /// List a patient's closed requests: cancelled/done, or accepted with an
    /// assignment. Other roles see an empty list.
    pub async fn list_closed(
        &self,
        actor: &user::Model,
        actor_profile: &profile::Model,
    ) -> AppResult<Vec<RequestView>> {
        if !actor_profile.role.is_patient() {
            return Ok(Vec::new());
        }

        let requests = self.request_repo.find_closed_by_patient(&actor.id).await?;
        self.to_views(requests).await
    }

    /// Delete a request. A volunteer may delete a request they hold the
    /// assignment for (any status); a patient may delete their own request
    /// only when it is cancelled.
    pub async fn delete(
        &self,
        actor: &user::Model,
        actor_profile: &profile::Model,
        request_id: &str,
    ) -> AppResult<()> {
        match actor_profile.role {
            Role::Volunteer => {
                if !self.assignment_repo.is_assigned(request_id, &actor.id).await? {
                    return Err(AppError::NotFound(format!(
                        "Request {request_id} not assigned to you"
                    )));
                }
            }
            Role::Patient => {
                let request = self
                    .request_repo
                    .find_by_id(request_id)
                    .await?
                    .ok_or_else(|| AppError::NotFound(format!("Request {request_id}")))?;

                if request.patient_id != actor.id {
                    return Err(AppError::Forbidden(
                        "Cannot delete another patient's request".to_string(),
                    ));
                }
                if request.status != transport_request::RequestStatus::Cancelled {
                    return Err(AppError::Forbidden(
                        "Only cancelled requests can be deleted".to_string(),
                    ));
                }
            }
        }

        self.request_repo.delete(request_id).await?;

        tracing::info!(request_id = %request_id, user_id = %actor.id, "Deleted transport request");

        Ok(())
    }

    async fn to_views(
        &self,
        requests: Vec<transport_request::Model>,
    ) -> AppResult<Vec<RequestView>> {
        let mut views = Vec::with_capacity(requests.len());
        for request in requests {
            views.push(self.to_view(request).await?);
        }
        Ok(views)
    }

    async fn to_view(&self, request: transport_request::Model) -> AppResult<RequestView> {
        let patient = self
            .user_repo
            .find_by_id(&request.patient_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User {}", request.patient_id)))?;
        let patient_phone = self
            .profile_repo
            .find_by_user_id(&patient.id)
            .await?
            .map(|p| p.phone)
            .unwrap_or_default();

        let volunteer = match self.assignment_repo.find_by_request(&request.id).await? {
            Some(assignment) => {
                let volunteer_user = self.user_repo.find_by_id(&assignment.volunteer_id).await?;
                let volunteer_phone = self
                    .profile_repo
                    .find_by_user_id(&assignment.volunteer_id)
                    .await?
                    .map(|p| p.phone)
                    .unwrap_or_default();

                volunteer_user.map(|u| VolunteerInfo {
                    id: u.id,
                    username: u.username,
                    phone: volunteer_phone,
                })
            }
            None => None,
        };

        Ok(build_view(request, &patient.username, patient_phone, volunteer))
    }
}

/// Whether the rejection-exhaustion rule fires: every registered volunteer
/// has rejected the request. Monotonic; there is no retraction path.
const fn exhaustion_reached(rejected_count: u64, total_volunteers: u64) -> bool {
    total_volunteers > 0 && rejected_count >= total_volunteers
}

fn build_view(
    request: transport_request::Model,
    patient_username: &str,
    patient_phone: String,
    volunteer: Option<VolunteerInfo>,
) -> RequestView {
    let status_label = if request.status == transport_request::RequestStatus::Cancelled
        && request.no_volunteers_available
    {
        "No volunteers available".to_string()
    } else {
        request.status.display().to_string()
    };

    RequestView {
        id: request.id,
        patient_id: request.patient_id,
        patient_username: patient_username.to_string(),
        pickup: request.pickup_address,
        destination: request.destination,
        requested_time: request.requested_time.format("%Y-%m-%d %H:%M").to_string(),
        status: request.status,
        status_display: request.status.display().to_string(),
        status_label,
        notes: request.notes,
        phone: patient_phone,
        volunteer,
        no_volunteers_available: request.no_volunteers_available,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use careride_db::entities::RequestStatus;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};
    use std::sync::Arc;

    fn test_user(id: &str, username: &str) -> user::Model {
        user::Model {
            id: id.to_string(),
            username: username.to_string(),
            username_lower: username.to_lowercase(),
            token: format!("token_{id}"),
            created_at: Utc::now().into(),
        }
    }

    fn test_profile(user_id: &str, role: Role) -> profile::Model {
        profile::Model {
            user_id: user_id.to_string(),
            role,
            phone: String::new(),
            password_hash: "hash".to_string(),
            created_at: Utc::now().into(),
        }
    }

    fn test_request(id: &str, patient_id: &str, status: RequestStatus) -> transport_request::Model {
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

    fn service_from(db: &Arc<sea_orm::DatabaseConnection>) -> TransportService {
        TransportService::new(
            TransportRequestRepository::new(Arc::clone(db)),
            AssignmentRepository::new(Arc::clone(db)),
            RejectionRepository::new(Arc::clone(db)),
            ProfileRepository::new(Arc::clone(db)),
            UserRepository::new(Arc::clone(db)),
        )
    }

    fn service_with(db: sea_orm::DatabaseConnection) -> TransportService {
        service_from(&Arc::new(db))
    }

    /// Reclaim the mock connection once the service is dropped, to inspect
    /// the statements it issued.
    fn transaction_log(db: Arc<sea_orm::DatabaseConnection>) -> Vec<sea_orm::Transaction> {
        let Ok(conn) = Arc::try_unwrap(db) else {
            panic!("connection still shared");
        };
        conn.into_transaction_log()
    }

    #[test]
    fn test_exhaustion_threshold() {
        assert!(!exhaustion_reached(0, 3));
        assert!(!exhaustion_reached(2, 3));
        assert!(exhaustion_reached(3, 3));
        assert!(exhaustion_reached(4, 3));
        // No registered volunteers: the rule never fires.
        assert!(!exhaustion_reached(0, 0));
    }

    #[tokio::test]
    async fn test_patient_cannot_accept() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
        let service = service_with(db);

        let actor = test_user("p1", "alice");
        let profile = test_profile("p1", Role::Patient);

        let err = service.accept(&actor, &profile, "r1").await.unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
    }

    #[tokio::test]
    async fn test_volunteer_cannot_create() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
        let service = service_with(db);

        let actor = test_user("v1", "bob");
        let profile = test_profile("v1", Role::Volunteer);

        let input = CreateRequestInput {
            pickup: "Home".to_string(),
            destination: "Clinic".to_string(),
            requested_time: Utc::now().into(),
            notes: None,
            phone: None,
        };

        let err = service.create(&actor, &profile, input).await.unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
    }

    #[tokio::test]
    async fn test_accept_not_open_fails_without_assignment() {
        // The guarded update affects zero rows; no assignment insert follows.
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 0,
            }])
            .into_connection();
        let service = service_with(db);

        let actor = test_user("v1", "bob");
        let profile = test_profile("v1", Role::Volunteer);

        let err = service.accept(&actor, &profile, "r1").await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_accept_clears_prior_rejections() {
        let assignment = assignment::Model {
            request_id: "r1".to_string(),
            volunteer_id: "v1".to_string(),
            accepted_at: Utc::now().into(),
            comment: String::new(),
        };

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[assignment]])
                .append_exec_results([
                    // guarded status update wins
                    MockExecResult {
                        last_insert_id: 0,
                        rows_affected: 1,
                    },
                    // two prior rejections removed
                    MockExecResult {
                        last_insert_id: 0,
                        rows_affected: 2,
                    },
                ])
                .into_connection(),
        );

        let service = service_from(&db);
        let actor = test_user("v1", "bob");
        let profile = test_profile("v1", Role::Volunteer);

        service.accept(&actor, &profile, "r1").await.unwrap();
        drop(service);

        let log = transaction_log(db);
        assert_eq!(log.len(), 3);

        // The last statement clears the rejection ledger for the request.
        let delete_stmt = format!("{:?}", log[2]);
        assert!(delete_stmt.contains("DELETE"));
        assert!(delete_stmt.contains("rejection"));
    }

    #[tokio::test]
    async fn test_reject_by_last_volunteer_cancels_request() {
        use sea_orm::Value;
        use std::collections::BTreeMap;

        let request = test_request("r1", "p1", RequestStatus::Open);
        let rejection = rejection::Model {
            id: "rej1".to_string(),
            request_id: "r1".to_string(),
            volunteer_id: "v1".to_string(),
            reason: "too far".to_string(),
            created_at: Utc::now().into(),
        };

        let count = |n: i64| [BTreeMap::from([("num_items", Value::BigInt(Some(n)))])];

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[request]])
                // no prior rejection by this volunteer
                .append_query_results([Vec::<rejection::Model>::new()])
                .append_query_results([[rejection]])
                // rejected count == volunteer total
                .append_query_results([count(1), count(1)])
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                }])
                .into_connection(),
        );

        let service = service_from(&db);
        let actor = test_user("v1", "bob");
        let profile = test_profile("v1", Role::Volunteer);

        service
            .reject(&actor, &profile, "r1", Some("too far".to_string()))
            .await
            .unwrap();
        drop(service);

        let log = transaction_log(db);
        assert_eq!(log.len(), 6);

        let cancel_stmt = format!("{:?}", log[5]);
        assert!(cancel_stmt.contains("UPDATE"));
        assert!(cancel_stmt.contains("no_volunteers_available"));
    }

    #[tokio::test]
    async fn test_reject_below_threshold_leaves_request_open() {
        use sea_orm::Value;
        use std::collections::BTreeMap;

        let request = test_request("r1", "p1", RequestStatus::Open);
        let rejection = rejection::Model {
            id: "rej1".to_string(),
            request_id: "r1".to_string(),
            volunteer_id: "v1".to_string(),
            reason: String::new(),
            created_at: Utc::now().into(),
        };

        let count = |n: i64| [BTreeMap::from([("num_items", Value::BigInt(Some(n)))])];

        // One of two volunteers has rejected; no status update may follow,
        // and none is queued. An attempted cancel would fail the test.
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[request]])
                .append_query_results([Vec::<rejection::Model>::new()])
                .append_query_results([[rejection]])
                .append_query_results([count(1), count(2)])
                .into_connection(),
        );

        let service = service_from(&db);
        let actor = test_user("v1", "bob");
        let profile = test_profile("v1", Role::Volunteer);

        service.reject(&actor, &profile, "r1", None).await.unwrap();
        drop(service);

        let log = transaction_log(db);
        assert_eq!(log.len(), 5);
    }

    #[tokio::test]
    async fn test_reject_non_open_request() {
        let request = test_request("r1", "p1", RequestStatus::Accepted);
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[request]])
            .into_connection();
        let service = service_with(db);

        let actor = test_user("v1", "bob");
        let profile = test_profile("v1", Role::Volunteer);

        let err = service
            .reject(&actor, &profile, "r1", None)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_patient_cannot_cancel_foreign_request() {
        // Conditional update filters on patient_id; zero rows means NotFound.
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 0,
            }])
            .into_connection();
        let service = service_with(db);

        let actor = test_user("p2", "mallory");
        let profile = test_profile("p2", Role::Patient);

        let err = service.cancel(&actor, &profile, "r1").await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_patient_delete_requires_cancelled_status() {
        let request = test_request("r1", "p1", RequestStatus::Open);
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[request]])
            .into_connection();
        let service = service_with(db);

        let actor = test_user("p1", "alice");
        let profile = test_profile("p1", Role::Patient);

        let err = service.delete(&actor, &profile, "r1").await.unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
    }

    #[tokio::test]
    async fn test_patient_delete_requires_ownership() {
        let request = test_request("r1", "p1", RequestStatus::Cancelled);
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[request]])
            .into_connection();
        let service = service_with(db);

        let actor = test_user("p2", "mallory");
        let profile = test_profile("p2", Role::Patient);

        let err = service.delete(&actor, &profile, "r1").await.unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
    }

    #[test]
    fn test_no_volunteers_label() {
        let mut request = test_request("r1", "p1", RequestStatus::Cancelled);
        request.no_volunteers_available = true;

        let view = build_view(request, "alice", String::new(), None);
        assert_eq!(view.status_label, "No volunteers available");
        assert_eq!(view.status_display, "Cancelled");
    }

    #[test]
    fn test_view_formats_requested_time() {
        let mut request = test_request("r1", "p1", RequestStatus::Open);
        request.requested_time = "2026-03-01T09:30:00+00:00".parse().unwrap();

        let view = build_view(request, "alice", "050-1234".to_string(), None);
        assert_eq!(view.requested_time, "2026-03-01 09:30");
        assert_eq!(view.phone, "050-1234");
        assert_eq!(view.status_label, "Open");
    }
}
