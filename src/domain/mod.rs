//! Domain model: aggregates, value objects and query types.
pub mod aggregates;
pub mod query;
pub mod value_objects;

pub use aggregates::*;
pub use value_objects::{Quantity, QuantityError, Rating, RatingError};
