pub mod access;
pub mod enums;
pub mod plans;
pub mod revenue_splits;
pub mod subscriptions;
pub mod webhooks;
