//! Application services. Each one is the only writer of the records it owns.

pub mod cart_store;
pub mod catalog;
pub mod locks;
pub mod review_aggregator;
pub mod users;

pub use cart_store::{CartLine, CartStore, FullCart, ProductDetails};
pub use catalog::{Catalog, CategoryWithProducts};
pub use locks::KeyedLocks;
pub use review_aggregator::ReviewAggregator;
pub use users::UserDirectory;
