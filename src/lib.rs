#[macro_use] extern crate log;

#[macro_use]
pub mod error;
pub mod ast;
pub mod compiler;
pub mod machine;
pub mod config;

pub use error::{ClauseError, ClauseErrorKind, QueryError, InternalError, BoxedErrorTrait};
pub use compiler::{compile, Compilation, Program};
pub use machine::{Engine, Flow, Answer};
pub use config::Config;
