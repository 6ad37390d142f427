mod symbols;
pub use symbols::*;

mod term;
pub use term::*;

mod formula;
pub use formula::*;

mod builder;
pub use builder::*;

mod parse;
pub use parse::{parse_query, Rule};
