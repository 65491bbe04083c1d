//! feedrank domain crate
//!
//! This crate contains the core domain logic following hexagonal architecture:
//! - `model`: Domain entities and value objects
//! - `ports`: Trait definitions for the data store and clock
//! - `scoring`: Ranking weights and shared scoring helpers
//! - `hashtags`: Hashtag extraction from post content
//! - `usecases`: Rankers, aggregate maintenance and feed orchestration

pub mod hashtags;
pub mod model;
pub mod ports;
pub mod scoring;
pub mod usecases;

pub use model::*;
pub use ports::*;
pub use scoring::{FeedWeights, TrendWeights};
