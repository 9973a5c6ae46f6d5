pub mod sweep_subscriptions;
