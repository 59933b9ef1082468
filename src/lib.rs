pub mod config;
pub mod cooldown;
pub mod driver;
pub mod error;
pub mod football_data;
pub mod model;
pub mod onboarding;
pub mod scheduler;
pub mod store;
pub mod sync;
