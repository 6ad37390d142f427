mod goal;
pub use goal::*;

mod ir;
pub use ir::*;

mod normalize;
pub use normalize::normalize;

mod merge;
pub use merge::merge;

mod rewrite;
pub use rewrite::Rewriter;

use std::fmt;
use indexmap::IndexMap;

use crate::ast::{SymbolTable, Clause, Identifier};
use crate::error::{ClauseError, ClauseErrorKind, BoxedErrorTrait};

/// A compiled unit: one procedure per predicate, and the names they use
#[derive(Debug, Clone)]
pub struct Program {
    symbols: SymbolTable,
    procedures: IndexMap<Identifier, Procedure>,
}

/// The program, along with every clause that had to be left out of it
#[derive(Debug)]
pub struct Compilation {
    pub program: Program,
    pub errors: Vec<ClauseError>,
}

impl Program {
    pub fn symbols(&self) -> &SymbolTable {
        &self.symbols
    }
    pub fn procedure(&self, name: Identifier) -> Option<&Procedure> {
        self.procedures.get(&name)
    }
    /// Find a procedure by the spelling of its name
    pub fn lookup(&self, name: &str) -> Option<&Procedure> {
        self.symbols.lookup(name)
            .and_then(|id| self.procedure(id))
    }
    /// The procedures, in the order their predicates were first defined
    pub fn procedures(&self) -> impl Iterator<Item=&Procedure> {
        self.procedures.values()
    }
    pub fn len(&self) -> usize {
        self.procedures.len()
    }
    pub fn is_empty(&self) -> bool {
        self.procedures.is_empty()
    }
}

/// Compile a unit of clauses.
/// A clause that cannot be compiled is reported and left out, the rest of its predicate still compiles.
/// Only a defect in the compiler itself fails the whole unit
pub fn compile(clauses: Vec<Clause>, mut symbols: SymbolTable) -> Result<Compilation, BoxedErrorTrait> {
    let mut groups: IndexMap<Identifier, Vec<Clause>> = IndexMap::new();
    for clause in clauses {
        groups.entry(clause.head.name).or_insert_with(Vec::new).push(clause);
    }
    debug!("compiling {} predicate(s)", groups.len());

    let mut errors = vec![];
    let mut procedures = IndexMap::with_capacity(groups.len());
    for (name, group) in groups {
        let arity = group[0].head.arity();
        let mut normalized = Vec::with_capacity(group.len());
        for clause in group.iter() {
            if clause.head.arity() != arity {
                errors.push(ClauseError {
                    context: clause.context.clone(),
                    kind: ClauseErrorKind::ArityMismatch {
                        predicate: symbols.name(name).to_string(),
                        expected: arity,
                        found: clause.head.arity(),
                    },
                });
                continue;
            }
            let clause = match normalize(clause, &mut symbols) {
                Ok(clause) => clause,
                Err(why) => {
                    errors.push(why);
                    continue;
                }
            };
            if let Some(construct) = clause.find_unsupported() {
                errors.push(ClauseError::unsupported(&clause.context, construct));
                continue;
            }
            trace!("normalized: {}", symbols.pretty(&clause));
            normalized.push(clause);
        }
        if normalized.is_empty() {
            warn!("predicate `{}` has no clause that compiled", symbols.name(name));
            continue;
        }

        let merged = merge(normalized, &mut symbols);
        let procedure = match Rewriter::new().rewrite(&merged) {
            Ok(procedure) => procedure,
            Err(why) => {
                errors.push(why);
                continue;
            }
        };
        procedure.validate()?;
        debug!("compiled {}", symbols.pretty(&procedure));
        procedures.insert(name, procedure);
    }

    let program = Program { symbols, procedures };
    program.link();
    for why in errors.iter() {
        error!("{}", why);
    }
    info!("compiled {} procedure(s) with {} rejected clause(s)", program.len(), errors.len());
    Ok(Compilation { program, errors })
}

impl Program {
    /// Calls that cannot be resolved simply fail at run time, but they are almost always mistakes
    fn link(&self) {
        for procedure in self.procedures() {
            for verb in procedure.instructions() {
                let sentence = match verb {
                    EmissionVerb::Call { sentence, .. } => sentence,
                    _ => continue,
                };
                match self.procedure(sentence.name) {
                    None => warn!("{}: call to undefined predicate `{}`",
                                  sentence.context, self.symbols.name(sentence.name)),
                    Some(target) if target.arity() != sentence.arity() => {
                        warn!("{}: `{}` takes {} argument(s), this call passes {}",
                              sentence.context, self.symbols.name(sentence.name),
                              target.arity(), sentence.arity())
                    }
                    Some(_) => {}
                }
            }
        }
    }
}

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for procedure in self.procedures() {
            writeln!(f, "{}", self.symbols.pretty(procedure))?;
        }
        Ok(())
    }
}
