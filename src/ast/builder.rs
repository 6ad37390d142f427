use std::collections::HashMap;
use crate::ast::{SymbolTable, Variable, Term, Sentence, Formula, Clause, Context};

/// Builds one clause at a time, resolving variable names within the clause's scope.
/// The same spelling yields the same variable until the builder is finished, except `_`,
/// which is fresh every time
pub struct ClauseBuilder<'s> {
    symbols: &'s mut SymbolTable,
    scope: HashMap<String, Variable>,
    context: Context,
}

impl <'s> ClauseBuilder<'s> {
    pub fn new(symbols: &'s mut SymbolTable) -> ClauseBuilder<'s> {
        ClauseBuilder {
            symbols,
            scope: HashMap::new(),
            context: Context::synthetic(),
        }
    }
    /// Tag everything built from here on with `context`
    pub fn at(mut self, context: Context) -> ClauseBuilder<'s> {
        self.context = context;
        self
    }
    pub fn var(&mut self, name: &str) -> Term {
        if name == "_" {
            let id = self.symbols.make_var();
            return Variable::new(name, id, self.context.clone()).into();
        }
        if let Some(var) = self.scope.get(name) {
            return var.clone().into();
        }
        let id = self.symbols.make_var();
        let var = Variable::new(name, id, self.context.clone());
        self.scope.insert(name.to_string(), var.clone());
        var.into()
    }
    pub fn atom(&mut self, name: &str) -> Term {
        self.sentence(name, vec![]).into()
    }
    pub fn compound(&mut self, name: &str, args: Vec<Term>) -> Term {
        self.sentence(name, args).into()
    }
    pub fn sentence(&mut self, name: &str, args: Vec<Term>) -> Sentence {
        let name = self.symbols.intern(name);
        Sentence::new(name, args, self.context.clone())
    }
    pub fn call(&mut self, name: &str, args: Vec<Term>) -> Formula {
        Formula::call(self.sentence(name, args))
    }
    /// The equality pseudo-predicate `left = right`
    pub fn equals(&mut self, left: Term, right: Term) -> Formula {
        let name = self.symbols.equals();
        Formula::call(Sentence::new(name, vec![left, right], self.context.clone()))
    }
    pub fn fact(mut self, name: &str, args: Vec<Term>) -> Clause {
        let head = self.sentence(name, args);
        Clause { head, body: None, context: self.context }
    }
    pub fn rule(mut self, name: &str, args: Vec<Term>, body: Formula) -> Clause {
        let head = self.sentence(name, args);
        Clause { head, body: Some(body), context: self.context }
    }
}

/// Shorthand for a fact whose arguments are all atoms, such as `father(terach, abraham)`
pub fn ground_fact(symbols: &mut SymbolTable, name: &str, atoms: &[&str]) -> Clause {
    let mut builder = ClauseBuilder::new(symbols);
    let args = atoms.iter()
        .map(|atom| builder.atom(atom))
        .collect();
    builder.fact(name, args)
}
