//! Domain layer: entities and foundation types with no infrastructure
//! dependencies.

pub mod chat;
pub mod foundation;
