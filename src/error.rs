use std::fmt;
use crate::ast::Context;

#[macro_export]
macro_rules! internal_error {
    () => {
        Err(Box::new(crate::error::InternalError{
            file: file!(),
            line: line!()
        }))
    };
}
#[derive(Debug)]
pub struct InternalError {
    pub file: &'static str,
    pub line: u32,
}
impl fmt::Display for InternalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "internal error originated at {}:{}", self.file, self.line)
    }
}
impl std::error::Error for InternalError {

}

pub type BoxedErrorTrait = Box<(dyn std::error::Error + 'static)>;

/// A problem with one clause of the compilation unit.
/// Only the offending clause is dropped, the rest of the unit still compiles
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClauseError {
    pub context: Context,
    pub kind: ClauseErrorKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClauseErrorKind {
    /// The formula tree has a shape the data model forbids
    Malformed(String),
    /// The construct is representable but the rewriter does not implement it
    Unsupported(&'static str),
    /// A clause disagrees with the first clause of its predicate about the head arity
    ArityMismatch {
        predicate: String,
        expected: usize,
        found: usize,
    },
}

impl ClauseError {
    pub fn malformed(context: &Context, message: String) -> ClauseError {
        ClauseError { context: context.clone(), kind: ClauseErrorKind::Malformed(message) }
    }
    pub fn unsupported(context: &Context, construct: &'static str) -> ClauseError {
        ClauseError { context: context.clone(), kind: ClauseErrorKind::Unsupported(construct) }
    }
}

impl fmt::Display for ClauseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: ", self.context)?;
        match &self.kind {
            ClauseErrorKind::Malformed(message) => write!(f, "{}", message),
            ClauseErrorKind::Unsupported(construct) => {
                write!(f, "unsupported construct `{}` in clause body", construct)
            }
            ClauseErrorKind::ArityMismatch { predicate, expected, found } => {
                write!(f, "predicate `{}` was defined with {} argument(s), this clause has {}",
                       predicate, expected, found)
            }
        }
    }
}
impl std::error::Error for ClauseError {

}

/// Errors reported at the query boundary. None of them touch the engine's state
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryError {
    UnknownPredicate(String),
    ArityMismatch {
        predicate: String,
        expected: usize,
        found: usize,
    },
    Syntax(String),
}

impl fmt::Display for QueryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryError::UnknownPredicate(name) => write!(f, "unknown predicate `{}`", name),
            QueryError::ArityMismatch { predicate, expected, found } => {
                write!(f, "predicate `{}` takes {} argument(s), the query supplied {}",
                       predicate, expected, found)
            }
            QueryError::Syntax(why) => write!(f, "invalid query: {}", why),
        }
    }
}
impl std::error::Error for QueryError {

}
