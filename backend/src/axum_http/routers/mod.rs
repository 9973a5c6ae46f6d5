pub mod access;
pub mod billing;
pub mod entitlements;
pub mod subscriptions;
