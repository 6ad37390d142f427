use std::collections::HashSet;
use indexmap::IndexSet;
use itertools::Itertools;

use crate::ast::{SymbolTable, FlatSentence, Variable};
use crate::compiler::{Goal, NormalizedClause};

/// Merge every clause of one predicate into a single clause whose body is the disjunction
/// of the clause bodies.
/// All clauses must share the name and arity of the first, and there must be at least one
pub fn merge(mut clauses: Vec<NormalizedClause>, symbols: &mut SymbolTable) -> NormalizedClause {
    assert!(!clauses.is_empty(), "merging an empty predicate");
    if clauses.len() == 1 {
        return clauses.remove(0);
    }
    let first = &clauses[0];
    let name = first.head.name;
    let head_context = first.head.context.clone();
    let context = first.context.clone();
    let arity = first.head.arity();
    debug_assert!(clauses.iter().all(|c| c.head.name == name && c.head.arity() == arity));

    if arity == 0 {
        let mut locals = IndexSet::new();
        let mut branches = vec![];
        for clause in clauses {
            locals.extend(clause.locals);
            match clause.body {
                None => branches.push(Goal::And(vec![])),
                Some(Goal::Or(inner)) => branches.extend(inner),
                Some(body) => branches.push(body),
            }
        }
        let head = FlatSentence { name, elements: vec![], context: head_context };
        return NormalizedClause { head, locals, body: Some(Goal::Or(branches)), context };
    }

    let params: Vec<Variable> = (0..arity)
        .map(|_| Variable::fresh(symbols, head_context.clone(), true))
        .collect();

    let mut locals = IndexSet::new();
    let mut branches = Vec::with_capacity(clauses.len());
    for clause in clauses {
        // the clause's own parameters are ordinary variables of its branch now
        let demoted: HashSet<_> = clause.head.elements.iter().map(|v| v.id).collect();
        let mut goals: Vec<Goal> = params.iter()
            .zip_eq(clause.head.elements.iter())
            .map(|(fresh, original)| Goal::Unify(fresh.clone(), original.clone()))
            .collect();
        if let Some(body) = clause.body {
            goals.extend(body.into_conjuncts());
        }
        let mut branch = Goal::And(goals);
        branch.visit_variables_mut(&mut |v: &mut Variable| {
            if demoted.contains(&v.id) {
                v.is_head = false;
            }
        });
        for mut var in clause.head.elements {
            var.is_head = false;
            locals.insert(var);
        }
        locals.extend(clause.locals);
        branches.push(branch);
    }

    let head = FlatSentence { name, elements: params, context: head_context };
    NormalizedClause { head, locals, body: Some(Goal::Or(branches)), context }
}
