pub mod sqlite;

pub use sqlite::ListingStore;
