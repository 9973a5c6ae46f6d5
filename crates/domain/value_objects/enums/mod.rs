pub mod feature_keys;
pub mod payment_statuses;
pub mod subscriber_roles;
pub mod subscription_statuses;
