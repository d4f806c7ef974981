pub mod error;
pub mod types;

pub use error::ServiceError;
pub use types::{ListResult, PageParams, add_months, new_id, now_rfc3339, today};
