// Brand/model matching for used-car listing titles.

pub mod batch;
pub mod catalog;
pub mod config;
pub mod mapping;
pub mod model;
pub mod normalizer;
pub mod parser;
pub mod source;
pub mod storage;

pub use catalog::{load, Catalog, CatalogHandle, LoaderConfig};
pub use model::{CatalogError, CatalogRow, ParseMethod, ParsedTitle, SourceError};
pub use normalizer::normalize;
pub use parser::{parse, HeuristicRules, TitleParser};
pub use source::CatalogSource;
