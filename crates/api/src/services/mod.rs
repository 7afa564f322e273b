//! Business logic between routes and stores.
//!
//! Services borrow the stores they need from [`crate::state::AppState`] for
//! the duration of a request.

pub mod auth;
pub mod catalog;
pub mod dashboard;
pub mod orders;
pub mod uploads;
pub mod users;

pub use auth::AuthService;
pub use catalog::CatalogService;
pub use dashboard::DashboardService;
pub use orders::OrderService;
pub use uploads::ImageStore;
pub use users::UserAdminService;
