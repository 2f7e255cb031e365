//! Repository layer - data access.

pub mod base;
pub mod entities;
pub mod user_repository;

pub use base::{Filter, OneOrMany, Repository};
pub use user_repository::{UserRepository, UserStore};
