//! Aggregates module
pub mod cart;
pub mod category;
pub mod product;
pub mod review;
pub mod user;

pub use cart::{AddOutcome, Cart, CartError};
pub use category::{Category, CategoryChanges};
pub use product::{NewProduct, Product, ProductChanges, RatingDistribution, RatingSummary};
pub use review::{NewReview, Review, ReviewChanges, ReviewError, ReviewStatistics};
pub use user::{NewUser, User, UserChanges};
