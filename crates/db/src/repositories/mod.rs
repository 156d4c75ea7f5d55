//! Database repositories.

#![allow(missing_docs)]

pub mod assignment;
pub mod profile;
pub mod rejection;
pub mod transport_request;
pub mod user;

pub use assignment::AssignmentRepository;
pub use profile::ProfileRepository;
pub use rejection::RejectionRepository;
pub use transport_request::TransportRequestRepository;
pub use user::UserRepository;
