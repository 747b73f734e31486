// Catalog sources: where (brand, model) rows come from.

pub mod memory;
pub mod rest;
pub mod sqlite;
pub mod traits;

pub use memory::MemorySource;
pub use rest::RestSource;
pub use sqlite::SqliteSource;
pub use traits::CatalogSource;
