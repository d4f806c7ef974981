pub mod app;
pub mod contact;
pub mod customer;
pub mod package;
pub mod payment;
pub mod plan;
pub mod registration;
pub mod subscription;

pub use app::AppCatalogEntry;
pub use contact::Contact;
pub use customer::Customer;
pub use package::Package;
pub use payment::Payment;
pub use plan::Plan;
pub use registration::AppRegistration;
pub use subscription::Subscription;

/// The status value the renewal rule forces and creates default to.
/// Statuses are otherwise free-form text maintained by the admin
/// screens; queries compare them lowercased and trimmed.
pub const STATUS_ACTIVE: &str = "active";
