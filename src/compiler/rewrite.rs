use crate::compiler::{Goal, NormalizedClause, EmissionVerb, Test, Procedure, ContNum, CondNum};
use crate::ast::Context;
use crate::error::ClauseError;

/// Rewrites one normalized clause into continuation passing form.
/// A rewriter numbers continuations and flags from scratch, so use a fresh one per clause
#[derive(Debug, Default)]
pub struct Rewriter {
    continuations: Vec<EmissionVerb>,
    conditions: usize,
}

impl Rewriter {
    pub fn new() -> Rewriter {
        Rewriter::default()
    }

    pub fn rewrite(mut self, clause: &NormalizedClause) -> Result<Procedure, ClauseError> {
        let body = match &clause.body {
            None => EmissionVerb::Succeed(0),
            Some(goal) => self.rewrite_goal(goal, 0, &clause.context)?,
        };
        let procedure = Procedure {
            head: clause.head.clone(),
            locals: clause.locals.iter().cloned().collect(),
            conditions: self.conditions,
            continuations: self.continuations,
            body,
            context: clause.context.clone(),
        };
        debug_assert!(procedure.validate().is_ok(), "rewriter produced a dangling continuation");
        Ok(procedure)
    }

    /// Append to the continuation table, returning the new continuation's id
    fn push(&mut self, verb: EmissionVerb) -> ContNum {
        self.continuations.push(verb);
        self.continuations.len()
    }

    fn new_condition(&mut self) -> CondNum {
        self.conditions += 1;
        self.conditions - 1
    }

    /// Compile `goal` so that each of its solutions invokes continuation `next`
    fn rewrite_goal(&mut self, goal: &Goal, next: ContNum, context: &Context) -> Result<EmissionVerb, ClauseError> {
        let verb = match goal {
            Goal::Call(sentence) => EmissionVerb::Call { next, sentence: sentence.clone() },
            Goal::Unify(left, right) => EmissionVerb::Conditional {
                next,
                test: Test::Unify(left.clone(), right.clone()),
            },
            Goal::Match(var, sentence) => EmissionVerb::Conditional {
                next,
                test: Test::Structure(var.clone(), sentence.clone()),
            },
            Goal::And(goals) => self.rewrite_conjunction(goals, next, context)?,
            Goal::Or(branches) if branches.is_empty() => EmissionVerb::Fail,
            Goal::Or(branches) => {
                let branches = branches.iter()
                    .map(|branch| self.rewrite_goal(branch, next, context))
                    .collect::<Result<Vec<_>, _>>()?;
                EmissionVerb::Disjunction(branches)
            }
            Goal::IfElse { condition, then, otherwise: None } => {
                // without an else, `if c then t` proves the same things as `c, t`
                self.rewrite_conjunction_of(&[&**condition, &**then], next, context)?
            }
            Goal::IfElse { condition, then, otherwise: Some(otherwise) } => {
                let flag = self.new_condition();
                let then = self.rewrite_goal(then, next, context)?;
                let then = self.push(EmissionVerb::Sequence(vec![
                    EmissionVerb::SetCondition(flag),
                    then,
                ]));
                let condition = self.rewrite_goal(condition, then, context)?;
                let otherwise = self.rewrite_goal(otherwise, next, context)?;
                let otherwise = self.push(otherwise);
                EmissionVerb::Sequence(vec![
                    EmissionVerb::ClearCondition(flag),
                    EmissionVerb::Disjunction(vec![
                        condition,
                        EmissionVerb::Conditional { next: otherwise, test: Test::FlagClear(flag) },
                    ]),
                ])
            }
            Goal::Not(_) => return Err(ClauseError::unsupported(context, "negation")),
        };
        Ok(verb)
    }

    fn rewrite_conjunction(&mut self, goals: &[Goal], next: ContNum, context: &Context) -> Result<EmissionVerb, ClauseError> {
        let goals: Vec<&Goal> = goals.iter().collect();
        self.rewrite_conjunction_of(&goals, next, context)
    }

    /// Right to left: every goal but the leftmost becomes a continuation of the goal before it
    fn rewrite_conjunction_of(&mut self, goals: &[&Goal], next: ContNum, context: &Context) -> Result<EmissionVerb, ClauseError> {
        let (first, rest) = match goals.split_first() {
            Some(split) => split,
            None => return Ok(EmissionVerb::Succeed(next)),
        };
        let mut next = next;
        for goal in rest.iter().rev() {
            let verb = self.rewrite_goal(goal, next, context)?;
            next = self.push(verb);
        }
        self.rewrite_goal(first, next, context)
    }
}
