pub mod title_parser;

pub use title_parser::{parse, HeuristicRules, TitleParser};
