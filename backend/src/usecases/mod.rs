pub mod access_evaluator;
pub mod entitlements;
pub mod lifecycle;
pub mod settlements;
