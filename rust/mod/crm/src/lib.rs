//! CRM module — customers, subscriptions, app registrations, payments,
//! and the plan/package reference tables, with the renewal and alerting
//! business rules on top.

pub mod api;
pub mod model;
pub mod service;

pub use service::CrmService;
