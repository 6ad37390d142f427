use std::collections::HashSet;
use indexmap::IndexSet;

use crate::ast::{SymbolTable, Clause, Formula, Term, Sentence, FlatSentence, Variable, VarId, Context};
use crate::compiler::{Goal, NormalizedClause};
use crate::error::ClauseError;

/// Flatten the clause so that every argument of the head and of every call is a variable.
/// Nested structure moves into `Match` goals that run before the goal that mentioned it
pub fn normalize(clause: &Clause, symbols: &mut SymbolTable) -> Result<NormalizedClause, ClauseError> {
    let mut normalizer = Normalizer {
        symbols,
        head_ids: HashSet::new(),
        locals: IndexSet::new(),
    };
    normalizer.normalize_clause(clause)
}

struct Normalizer<'s> {
    symbols: &'s mut SymbolTable,
    /// Variables that appear directly as head arguments
    head_ids: HashSet<VarId>,
    locals: IndexSet<Variable>,
}

impl <'s> Normalizer<'s> {
    fn normalize_clause(&mut self, clause: &Clause) -> Result<NormalizedClause, ClauseError> {
        // the first mention of a variable in the head claims its position,
        // so collect those before anything else is marked
        let mut claims = Vec::with_capacity(clause.head.arity());
        for element in clause.head.elements.iter() {
            let claimed = match element {
                Term::Variable(v) => self.head_ids.insert(v.id),
                Term::Sentence(_) => false,
            };
            claims.push(claimed);
        }

        let mut goals = vec![];
        let mut params = Vec::with_capacity(clause.head.arity());
        for (element, claimed) in clause.head.elements.iter().zip(claims) {
            match element {
                Term::Variable(v) if claimed => params.push(v.clone().as_head()),
                Term::Variable(v) => {
                    // repeated head variable: `p(X, X)` becomes `p(X, _1) :- _1 = X`
                    let fresh = Variable::fresh(self.symbols, v.context.clone(), true);
                    goals.push(Goal::Unify(fresh.clone(), self.mark(v)));
                    params.push(fresh);
                }
                Term::Sentence(s) => {
                    let fresh = Variable::fresh(self.symbols, s.context.clone(), true);
                    let s = self.mark_sentence(s);
                    goals.push(Goal::Match(fresh.clone(), s));
                    params.push(fresh);
                }
            }
        }

        if let Some(body) = &clause.body {
            let body = self.normalize_formula(body)?;
            goals.extend(body.flatten().into_conjuncts());
        }

        let body = if goals.is_empty() && clause.body.is_none() {
            None
        } else {
            Some(Goal::conjunction(goals).flatten())
        };

        let head = FlatSentence {
            name: clause.head.name,
            elements: params,
            context: clause.head.context.clone(),
        };
        Ok(NormalizedClause {
            head,
            locals: std::mem::take(&mut self.locals),
            body,
            context: clause.context.clone(),
        })
    }

    fn normalize_formula(&mut self, formula: &Formula) -> Result<Goal, ClauseError> {
        match formula {
            Formula::Call(Term::Variable(v)) => Err(ClauseError::malformed(
                &v.context,
                format!("expected a predicate call, found the variable `{}`", v.name),
            )),
            Formula::Call(Term::Sentence(s)) if s.name == self.symbols.equals() => self.normalize_equality(s),
            Formula::Call(Term::Sentence(s)) => Ok(self.normalize_call(s)),
            Formula::And(formulas) => {
                let goals = formulas.iter()
                    .map(|f| self.normalize_formula(f))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Goal::And(goals))
            }
            Formula::Or(formulas) => {
                let goals = formulas.iter()
                    .map(|f| self.normalize_formula(f))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Goal::Or(goals))
            }
            Formula::IfElse { condition, then, otherwise } => {
                let condition = self.normalize_formula(condition)?;
                let then = self.normalize_formula(then)?;
                let otherwise = match otherwise {
                    Some(f) => Some(Box::new(self.normalize_formula(f)?)),
                    None => None,
                };
                Ok(Goal::IfElse {
                    condition: Box::new(condition),
                    then: Box::new(then),
                    otherwise,
                })
            }
            Formula::Not(inner) => {
                let inner = self.normalize_formula(inner)?;
                Ok(Goal::Not(Box::new(inner)))
            }
        }
    }

    /// `left = right`, specialized on which sides are variables
    fn normalize_equality(&mut self, sentence: &Sentence) -> Result<Goal, ClauseError> {
        if sentence.arity() != 2 {
            return Err(ClauseError::malformed(
                &sentence.context,
                format!("equality takes 2 arguments, found {}", sentence.arity()),
            ));
        }
        let goal = match (&sentence.elements[0], &sentence.elements[1]) {
            (Term::Variable(left), Term::Variable(right)) => {
                Goal::Unify(self.mark(left), self.mark(right))
            }
            (Term::Variable(var), Term::Sentence(s)) | (Term::Sentence(s), Term::Variable(var)) => {
                Goal::Match(self.mark(var), self.mark_sentence(s))
            }
            (Term::Sentence(left), Term::Sentence(right)) => {
                let l = self.fresh_local(&left.context);
                let r = self.fresh_local(&right.context);
                Goal::And(vec![
                    Goal::Match(l.clone(), self.mark_sentence(left)),
                    Goal::Match(r.clone(), self.mark_sentence(right)),
                    Goal::Unify(l, r),
                ])
            }
        };
        Ok(goal)
    }

    fn normalize_call(&mut self, sentence: &Sentence) -> Goal {
        let mut goals = vec![];
        let mut elements = Vec::with_capacity(sentence.arity());
        for element in sentence.elements.iter() {
            match element {
                Term::Variable(v) => elements.push(self.mark(v)),
                Term::Sentence(s) => {
                    let fresh = self.fresh_local(&s.context);
                    goals.push(Goal::Match(fresh.clone(), self.mark_sentence(s)));
                    elements.push(fresh);
                }
            }
        }
        goals.push(Goal::Call(FlatSentence {
            name: sentence.name,
            elements,
            context: sentence.context.clone(),
        }));
        Goal::conjunction(goals)
    }

    fn fresh_local(&mut self, context: &Context) -> Variable {
        let fresh = Variable::fresh(self.symbols, context.clone(), false);
        self.locals.insert(fresh.clone());
        fresh
    }

    /// Tag the variable with whether it is a parameter, and remember it if it isn't
    fn mark(&mut self, var: &Variable) -> Variable {
        let mut var = var.clone();
        var.is_head = self.head_ids.contains(&var.id);
        if !var.is_head {
            self.locals.insert(var.clone());
        }
        var
    }

    fn mark_sentence(&mut self, sentence: &Sentence) -> Sentence {
        let elements = sentence.elements.iter()
            .map(|element| match element {
                Term::Variable(v) => Term::Variable(self.mark(v)),
                Term::Sentence(s) => Term::Sentence(self.mark_sentence(s)),
            })
            .collect();
        Sentence::new(sentence.name, elements, sentence.context.clone())
    }
}
