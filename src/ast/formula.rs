use crate::ast::{Term, Sentence, Context};

/// A logic formula as it comes out of the reader, before normalization.
/// Arguments of calls may still be nested sentences
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Formula {
    /// A goal. Anything other than a sentence here is malformed
    Call(Term),
    /// Proven left to right
    And(Vec<Formula>),
    /// Alternatives, tried in order
    Or(Vec<Formula>),
    IfElse {
        condition: Box<Formula>,
        then: Box<Formula>,
        otherwise: Option<Box<Formula>>,
    },
    Not(Box<Formula>),
}

impl Formula {
    pub fn call(sentence: Sentence) -> Formula {
        Formula::Call(Term::Sentence(sentence))
    }
    pub fn if_else(condition: Formula, then: Formula, otherwise: Option<Formula>) -> Formula {
        Formula::IfElse {
            condition: Box::new(condition),
            then: Box::new(then),
            otherwise: otherwise.map(Box::new),
        }
    }
    pub fn negate(self) -> Formula {
        Formula::Not(Box::new(self))
    }
}

/// `head :- body`. A clause without a body is a fact
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Clause {
    pub head: Sentence,
    pub body: Option<Formula>,
    pub context: Context,
}

impl Clause {
    pub fn fact(head: Sentence) -> Clause {
        let context = head.context.clone();
        Clause { head, body: None, context }
    }
    pub fn rule(head: Sentence, body: Formula) -> Clause {
        let context = head.context.clone();
        Clause { head, body: Some(body), context }
    }
    pub fn is_fact(&self) -> bool {
        self.body.is_none()
    }
}
