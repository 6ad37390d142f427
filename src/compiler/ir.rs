use std::fmt;
use itertools::Itertools;

use crate::ast::{Variable, Sentence, FlatSentence, Context, SymbolTable, PrettyPrint};
use crate::error::BoxedErrorTrait;

/// Continuation ids. `0` is the continuation the caller supplied,
/// `k > 0` names the `k`th entry of the procedure's continuation table
pub type ContNum = usize;
/// Indices of condition flags within a call frame
pub type CondNum = usize;

/// The semi-deterministic tests a `Conditional` can perform
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Test {
    /// Unify two variables
    Unify(Variable, Variable),
    /// Build the structure and unify the variable with it
    Structure(Variable, Sentence),
    /// Passes while the flag has not been raised
    FlagClear(CondNum),
}

/// One instruction of the intermediate representation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EmissionVerb {
    /// The branch simply does not continue
    Fail,
    /// Invoke the continuation
    Succeed(ContNum),
    /// Invoke another procedure, continuing with `next` for each of its solutions
    Call {
        next: ContNum,
        sentence: FlatSentence,
    },
    /// Invoke `next` if the test passes
    Conditional {
        next: ContNum,
        test: Test,
    },
    /// Try each branch in order from one choice point
    Disjunction(Vec<EmissionVerb>),
    SetCondition(CondNum),
    ClearCondition(CondNum),
    /// Run each step to completion, in order
    Sequence(Vec<EmissionVerb>),
}

/// A compiled predicate
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Procedure {
    /// The name and the parameters, in argument order
    pub head: FlatSentence,
    /// Every variable of the body that is not a parameter. Fresh at each call
    pub locals: Vec<Variable>,
    /// How many condition flags a call frame needs
    pub conditions: usize,
    /// Continuation `k` is stored at index `k - 1`
    pub continuations: Vec<EmissionVerb>,
    /// The entry point
    pub body: EmissionVerb,
    pub context: Context,
}

impl Procedure {
    pub fn params(&self) -> &[Variable] {
        self.head.elements.as_slice()
    }
    pub fn arity(&self) -> usize {
        self.head.arity()
    }
    /// The code of continuation `id`. `0` belongs to the caller and has no code here
    pub fn continuation(&self, id: ContNum) -> Option<&EmissionVerb> {
        if id == 0 {
            None
        } else {
            self.continuations.get(id - 1)
        }
    }
    /// Every instruction in the procedure, including the nested ones
    pub fn instructions(&self) -> Vec<&EmissionVerb> {
        let mut found = Vec::new();
        let mut stack: Vec<&EmissionVerb> = self.continuations.iter().collect();
        stack.push(&self.body);
        while let Some(verb) = stack.pop() {
            found.push(verb);
            match verb {
                EmissionVerb::Disjunction(inner) | EmissionVerb::Sequence(inner) => {
                    stack.extend(inner.iter());
                }
                _ => {}
            }
        }
        found
    }
    /// Check that every continuation id refers to the caller or to an entry of the table,
    /// and that every flag is within the frame
    pub fn validate(&self) -> Result<(), BoxedErrorTrait> {
        let table = self.continuations.len();
        for verb in self.instructions() {
            let (next, flag) = match verb {
                EmissionVerb::Succeed(next) => (Some(*next), None),
                EmissionVerb::Call { next, .. } => (Some(*next), None),
                EmissionVerb::Conditional { next, test: Test::FlagClear(flag) } => (Some(*next), Some(*flag)),
                EmissionVerb::Conditional { next, .. } => (Some(*next), None),
                EmissionVerb::SetCondition(flag) | EmissionVerb::ClearCondition(flag) => (None, Some(*flag)),
                EmissionVerb::Fail | EmissionVerb::Disjunction(_) | EmissionVerb::Sequence(_) => (None, None),
            };
            if next.map_or(false, |next| next > table) {
                return internal_error!();
            }
            if flag.map_or(false, |flag| flag >= self.conditions) {
                return internal_error!();
            }
        }
        Ok(())
    }
}

impl PrettyPrint for Test {
    fn pretty_fmt(&self, symbols: &SymbolTable, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Test::Unify(left, right) => write!(f, "{:?} = {:?}", left, right),
            Test::Structure(var, sentence) => write!(f, "{:?} = {}", var, symbols.pretty(sentence)),
            Test::FlagClear(flag) => write!(f, "!cond_{}", flag),
        }
    }
}

impl PrettyPrint for EmissionVerb {
    fn pretty_fmt(&self, symbols: &SymbolTable, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EmissionVerb::Fail => write!(f, "fail"),
            EmissionVerb::Succeed(next) => write!(f, "cont_{}", next),
            EmissionVerb::Call { next, sentence } => {
                write!(f, "call {} -> cont_{}", symbols.pretty(sentence), next)
            }
            EmissionVerb::Conditional { next, test } => {
                write!(f, "if {} -> cont_{}", symbols.pretty(test), next)
            }
            EmissionVerb::Disjunction(branches) => {
                let branches = branches.iter()
                    .map(|b| symbols.pretty(b).to_string())
                    .join(" | ");
                write!(f, "or[{}]", branches)
            }
            EmissionVerb::SetCondition(flag) => write!(f, "cond_{} := true", flag),
            EmissionVerb::ClearCondition(flag) => write!(f, "cond_{} := false", flag),
            EmissionVerb::Sequence(steps) => {
                let steps = steps.iter()
                    .map(|s| symbols.pretty(s).to_string())
                    .join("; ");
                write!(f, "seq[{}]", steps)
            }
        }
    }
}

impl PrettyPrint for Procedure {
    fn pretty_fmt(&self, symbols: &SymbolTable, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} {{", symbols.pretty(&self.head))?;
        writeln!(f, "    variables: [{}]", self.locals.iter().map(|v| format!("{:?}", v)).join(", "))?;
        writeln!(f, "    conditions: {}", self.conditions)?;
        for (idx, continuation) in self.continuations.iter().enumerate() {
            writeln!(f, "    cont_{}: {}", idx + 1, symbols.pretty(continuation))?;
        }
        writeln!(f, "    entry: {}", symbols.pretty(&self.body))?;
        write!(f, "}}")
    }
}
