pub mod fixture;
pub mod provider;
pub mod team;
pub mod window;

/// Identifier of a tracked team. Local ids equal the provider's team ids.
pub type TeamId = i64;
