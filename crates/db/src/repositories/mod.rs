//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async query methods
//! that accept `&PgPool` as the first argument. [`TenantRepo`] runs against
//! the registry database; the others run against a tenant database.

pub mod bill_repo;
pub mod room_repo;
pub mod stay_repo;
pub mod tenant_repo;

pub use bill_repo::BillRepo;
pub use room_repo::RoomRepo;
pub use stay_repo::StayRepo;
pub use tenant_repo::TenantRepo;
