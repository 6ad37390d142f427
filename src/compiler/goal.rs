use std::fmt;
use indexmap::IndexSet;
use itertools::Itertools;
use map_in_place::MapVecInPlace;

use crate::ast::{Variable, Sentence, FlatSentence, Context, SymbolTable, PrettyPrint};

/// A normalized body formula. Every call is flat, nested structure only
/// survives as the right hand side of a `Match`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Goal {
    Call(FlatSentence),
    /// Proven left to right. The empty conjunction is `true`
    And(Vec<Goal>),
    /// The empty disjunction is `false`
    Or(Vec<Goal>),
    IfElse {
        condition: Box<Goal>,
        then: Box<Goal>,
        otherwise: Option<Box<Goal>>,
    },
    Not(Box<Goal>),
    Unify(Variable, Variable),
    /// Unify the variable with a fresh copy of the structure
    Match(Variable, Sentence),
}

/// A clause whose head arguments are all variables
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedClause {
    /// The parameters are the head's elements, each marked `is_head`
    pub head: FlatSentence,
    /// Every variable in the body that is not a parameter, in order of first mention
    pub locals: IndexSet<Variable>,
    pub body: Option<Goal>,
    pub context: Context,
}

impl NormalizedClause {
    pub fn params(&self) -> &[Variable] {
        self.head.elements.as_slice()
    }
    pub fn is_fact(&self) -> bool {
        self.body.is_none()
    }
    /// The first construct the rewriter cannot compile, if any
    pub fn find_unsupported(&self) -> Option<&'static str> {
        self.body.as_ref().and_then(Goal::find_unsupported)
    }
}

impl Goal {
    /// Wraps the goals in a conjunction, unless there is exactly one
    pub fn conjunction(mut goals: Vec<Goal>) -> Goal {
        if goals.len() == 1 {
            goals.remove(0)
        } else {
            Goal::And(goals)
        }
    }
    /// Splice nested conjunctions into their parents, and unwrap singleton conjunctions
    pub fn flatten(self) -> Goal {
        match self {
            Goal::And(goals) => {
                let mut flat = Vec::with_capacity(goals.len());
                for goal in goals.map_in_place(Goal::flatten) {
                    match goal {
                        Goal::And(inner) => flat.extend(inner),
                        other => flat.push(other),
                    }
                }
                Goal::conjunction(flat)
            }
            Goal::Or(branches) => Goal::Or(branches.map_in_place(Goal::flatten)),
            Goal::IfElse { condition, then, otherwise } => Goal::IfElse {
                condition: Box::new(condition.flatten()),
                then: Box::new(then.flatten()),
                otherwise: otherwise.map(|goal| Box::new(goal.flatten())),
            },
            Goal::Not(inner) => Goal::Not(Box::new(inner.flatten())),
            leaf => leaf,
        }
    }
    /// The goals of a conjunction, or the goal itself otherwise
    pub fn into_conjuncts(self) -> Vec<Goal> {
        match self {
            Goal::And(goals) => goals,
            other => vec![other],
        }
    }
    pub fn find_unsupported(&self) -> Option<&'static str> {
        match self {
            Goal::Not(_) => Some("negation"),
            Goal::And(goals) | Goal::Or(goals) => goals.iter().find_map(Goal::find_unsupported),
            Goal::IfElse { condition, then, otherwise } => condition.find_unsupported()
                .or_else(|| then.find_unsupported())
                .or_else(|| otherwise.as_ref().and_then(|goal| goal.find_unsupported())),
            Goal::Call(_) | Goal::Unify(_, _) | Goal::Match(_, _) => None,
        }
    }
    /// Visit every variable mentioned by the goal
    pub fn visit_variables_mut(&mut self, f: &mut impl FnMut(&mut Variable)) {
        match self {
            Goal::Call(sentence) => sentence.elements.iter_mut().for_each(|v| f(v)),
            Goal::And(goals) | Goal::Or(goals) => {
                for goal in goals.iter_mut() {
                    goal.visit_variables_mut(f);
                }
            }
            Goal::IfElse { condition, then, otherwise } => {
                condition.visit_variables_mut(f);
                then.visit_variables_mut(f);
                if let Some(otherwise) = otherwise {
                    otherwise.visit_variables_mut(f);
                }
            }
            Goal::Not(inner) => inner.visit_variables_mut(f),
            Goal::Unify(left, right) => {
                f(left);
                f(right);
            }
            Goal::Match(var, sentence) => {
                f(var);
                visit_sentence_mut(sentence, f);
            }
        }
    }
}

fn visit_sentence_mut(sentence: &mut Sentence, f: &mut impl FnMut(&mut Variable)) {
    use crate::ast::Term;
    for element in sentence.elements.iter_mut() {
        match element {
            Term::Variable(v) => f(v),
            Term::Sentence(s) => visit_sentence_mut(s, f),
        }
    }
}

impl PrettyPrint for Goal {
    fn pretty_fmt(&self, symbols: &SymbolTable, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Goal::Call(sentence) => sentence.pretty_fmt(symbols, f),
            Goal::And(goals) if goals.is_empty() => write!(f, "true"),
            Goal::And(goals) => {
                write!(f, "({})", goals.iter().map(|g| symbols.pretty(g).to_string()).join(" and "))
            }
            Goal::Or(goals) if goals.is_empty() => write!(f, "false"),
            Goal::Or(goals) => {
                write!(f, "({})", goals.iter().map(|g| symbols.pretty(g).to_string()).join(" or "))
            }
            Goal::IfElse { condition, then, otherwise } => {
                write!(f, "if {} then {}", symbols.pretty(&**condition), symbols.pretty(&**then))?;
                if let Some(otherwise) = otherwise {
                    write!(f, " else {}", symbols.pretty(&**otherwise))?;
                }
                Ok(())
            }
            Goal::Not(inner) => write!(f, "not {}", symbols.pretty(&**inner)),
            Goal::Unify(left, right) => write!(f, "{:?} = {:?}", left, right),
            Goal::Match(var, sentence) => write!(f, "{:?} = {}", var, symbols.pretty(sentence)),
        }
    }
}

impl PrettyPrint for NormalizedClause {
    fn pretty_fmt(&self, symbols: &SymbolTable, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", symbols.pretty(&self.head))?;
        if let Some(body) = &self.body {
            write!(f, " :- {}", symbols.pretty(body))?;
        }
        Ok(())
    }
}
