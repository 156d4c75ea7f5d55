//! Database entities.

#![allow(missing_docs)]

pub mod assignment;
pub mod profile;
pub mod rejection;
pub mod transport_request;
pub mod user;

pub use assignment::Entity as Assignment;
pub use profile::Entity as Profile;
pub use profile::Role;
pub use rejection::Entity as Rejection;
pub use transport_request::Entity as TransportRequest;
pub use transport_request::RequestStatus;
pub use user::Entity as User;
