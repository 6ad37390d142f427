mod heap;
pub use heap::*;

mod trail;
pub use trail::*;

mod interpret;

use std::fmt;
use indexmap::IndexMap;
use itertools::Itertools;

use crate::ast::{SymbolTable, Sentence, Term, VarId, parse_query};
use crate::compiler::{Program, Procedure};
use crate::config::Config;
use crate::error::QueryError;

/// What to do after a solution has been reported
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Stop,
}

/// The bindings of the query's variables in one solution, in the order the query mentions them
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Answer {
    pub bindings: IndexMap<String, String>,
}

impl Answer {
    pub fn get(&self, name: &str) -> Option<&str> {
        self.bindings.get(name).map(String::as_str)
    }
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

impl fmt::Display for Answer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let pairs = self.bindings.iter()
            .map(|(name, value)| format!("{} = {}", name, value))
            .join(", ");
        write!(f, "{}", pairs)
    }
}

/// One query session against a compiled program. It owns every runtime term it makes,
/// so sessions over the same program are independent of each other.
/// Term ids are never reused, so the heap only grows for the life of the session:
/// drop the engine and make a new one to give the memory back
pub struct Engine<'p> {
    program: &'p Program,
    /// The program's names, plus whatever the queries have added
    symbols: SymbolTable,
    heap: Heap,
    config: Config,
}

impl <'p> Engine<'p> {
    pub fn new(program: &'p Program) -> Engine<'p> {
        Engine::with_config(program, Config::default())
    }
    pub fn with_config(program: &'p Program, config: Config) -> Engine<'p> {
        Engine {
            program,
            symbols: program.symbols().clone(),
            heap: Heap::new(),
            config,
        }
    }
    pub fn program(&self) -> &'p Program {
        self.program
    }
    pub fn symbols(&self) -> &SymbolTable {
        &self.symbols
    }
    pub fn heap(&self) -> &Heap {
        &self.heap
    }
    /// For building the arguments of `solve`
    pub fn heap_mut(&mut self) -> &mut Heap {
        &mut self.heap
    }
    pub fn make_variable(&mut self, name: &str) -> TermId {
        self.heap.make_variable(name)
    }
    pub fn make_atom(&mut self, name: &str) -> TermId {
        let name = self.symbols.intern(name);
        self.heap.make_atom(name)
    }
    pub fn make_compound(&mut self, name: &str, args: Vec<TermId>) -> TermId {
        let name = self.symbols.intern(name);
        self.heap.make_compound(name, args)
    }
    pub fn render(&self, id: TermId) -> String {
        self.heap.render(id, &self.symbols)
    }

    /// Prove `name(args...)`, calling `on_solution` once for every proof.
    /// The bindings made by a proof are visible to the callback and undone afterwards.
    /// Returns how many solutions were reported
    pub fn solve<F>(&mut self, name: &str, args: &[TermId], on_solution: F) -> Result<usize, QueryError>
        where F: FnMut(&Engine<'p>) -> Flow
    {
        let procedure = self.resolve(name, args.len())?;
        Ok(self.solve_procedure(procedure, args, on_solution))
    }

    fn resolve(&self, name: &str, arity: usize) -> Result<&'p Procedure, QueryError> {
        let program: &'p Program = self.program;
        let procedure = program.lookup(name)
            .ok_or_else(|| QueryError::UnknownPredicate(name.to_string()))?;
        if procedure.arity() != arity {
            return Err(QueryError::ArityMismatch {
                predicate: name.to_string(),
                expected: procedure.arity(),
                found: arity,
            });
        }
        Ok(procedure)
    }

    fn solve_procedure<F>(&mut self, procedure: &'p Procedure, args: &[TermId], on_solution: F) -> usize
        where F: FnMut(&Engine<'p>) -> Flow
    {
        debug!("solving {}", self.symbols.pretty(&procedure.head));
        // the query's own choice point undoes everything the proofs bound
        self.heap.new_choice_point();
        let solutions = interpret::run(self, procedure, args, on_solution);
        self.heap.restore_choice_point();
        self.heap.remove_choice_point();
        debug!("{} solution(s), {} term(s) on the heap", solutions, self.heap.len());
        solutions
    }

    /// Read and prove a query such as `son(?A, terach)`, collecting the answers.
    /// Stops early once the configured solution limit is reached
    pub fn query(&mut self, text: &str) -> Result<Vec<Answer>, QueryError> {
        let sentence = parse_query(text, &mut self.symbols)
            .map_err(|why| QueryError::Syntax(why.to_string()))?;
        let name = self.symbols.name(sentence.name).to_string();
        let procedure = self.resolve(&name, sentence.arity())?;

        let mut variables = IndexMap::new();
        let args: Vec<TermId> = sentence.elements.iter()
            .map(|element| self.materialize(element, &mut variables))
            .collect();

        let limit = self.config.solution_limit;
        let mut answers = vec![];
        self.solve_procedure(procedure, &args, |engine| {
            answers.push(engine.answer(&variables));
            match limit {
                Some(limit) if answers.len() >= limit => Flow::Stop,
                _ => Flow::Continue,
            }
        });
        info!("{}: {} answer(s)", text.trim(), answers.len());
        Ok(answers)
    }

    /// Lay out a query term on the heap, making each variable once
    fn materialize(&mut self, term: &Term, variables: &mut IndexMap<VarId, (String, TermId)>) -> TermId {
        match term {
            Term::Variable(var) => {
                if let Some((_, id)) = variables.get(&var.id) {
                    return *id;
                }
                let id = self.heap.make_variable(&var.name);
                variables.insert(var.id, (var.name.to_string(), id));
                id
            }
            Term::Sentence(Sentence { name, elements, .. }) => {
                let args = elements.iter()
                    .map(|element| self.materialize(element, variables))
                    .collect();
                self.heap.make_compound(*name, args)
            }
        }
    }

    fn answer(&self, variables: &IndexMap<VarId, (String, TermId)>) -> Answer {
        let bindings = variables.values()
            .filter(|(name, _)| !name.starts_with('_'))
            .map(|(name, id)| (name.clone(), self.render(*id)))
            .collect();
        Answer { bindings }
    }
}


#[cfg(test)]
mod tests {
    use crate::ast::{SymbolTable, ClauseBuilder, Formula, Clause, ground_fact};
    use crate::compiler::{compile, Program};
    use crate::machine::{Heap, NodeKind, Engine, Flow};
    use crate::config::Config;
    use crate::error::QueryError;

    fn symbols_with(names: &[&str]) -> SymbolTable {
        let mut symbols = SymbolTable::new();
        for name in names {
            symbols.intern(name);
        }
        symbols
    }

    #[test]
    fn unify_0() {
        let symbols = symbols_with(&["a", "b"]);
        let mut heap = Heap::new();
        let x = heap.make_variable("X");
        let a = heap.make_atom(symbols.lookup("a").unwrap());
        let b = heap.make_atom(symbols.lookup("b").unwrap());
        assert!(heap.unify(x, a));
        assert_eq!(heap.dereference(x), a);
        assert!(heap.unify(a, x));
        assert!(!heap.unify(x, b));
    }
    #[test]
    fn unify_1() {
        // f(X, b) = f(a, Y)
        let symbols = symbols_with(&["f", "a", "b"]);
        let f = symbols.lookup("f").unwrap();
        let mut heap = Heap::new();
        let x = heap.make_variable("X");
        let y = heap.make_variable("Y");
        let a = heap.make_atom(symbols.lookup("a").unwrap());
        let b = heap.make_atom(symbols.lookup("b").unwrap());
        let left = heap.make_compound(f, vec![x, b]);
        let right = heap.make_compound(f, vec![a, y]);
        assert!(heap.unify(left, right));
        assert_eq!(heap.render(x, &symbols), "a");
        assert_eq!(heap.render(y, &symbols), "b");
        assert_eq!(heap.render(left, &symbols), "f(a, b)");
    }
    #[test]
    fn unify_2() {
        // mismatched names and arities fail
        let symbols = symbols_with(&["f", "g", "a"]);
        let (f, g) = (symbols.lookup("f").unwrap(), symbols.lookup("g").unwrap());
        let mut heap = Heap::new();
        let a = heap.make_atom(symbols.lookup("a").unwrap());
        let fa = heap.make_compound(f, vec![a]);
        let ga = heap.make_compound(g, vec![a]);
        let faa = heap.make_compound(f, vec![a, a]);
        assert!(!heap.unify(fa, ga));
        assert!(!heap.unify(fa, faa));
        assert!(!heap.unify(fa, a));
        assert!(heap.unify(fa, fa));
    }
    #[test]
    fn unify_symmetric_0() {
        // unify(a, b) and unify(b, a) bind the same way
        let symbols = symbols_with(&["f", "a"]);
        let f = symbols.lookup("f").unwrap();
        let build = |heap: &mut Heap| {
            let x = heap.make_variable("X");
            let y = heap.make_variable("Y");
            let a = heap.make_atom(symbols.lookup("a").unwrap());
            let left = heap.make_compound(f, vec![x, a]);
            let right = heap.make_compound(f, vec![y, y]);
            (x, y, left, right)
        };
        let mut forward = Heap::new();
        let (x0, y0, l0, r0) = build(&mut forward);
        let mut backward = Heap::new();
        let (x1, y1, l1, r1) = build(&mut backward);
        assert_eq!(forward.unify(l0, r0), backward.unify(r1, l1));
        assert_eq!(forward.render(x0, &symbols), backward.render(x1, &symbols));
        assert_eq!(forward.render(y0, &symbols), backward.render(y1, &symbols));
        assert_eq!(forward.render(x0, &symbols), "a");
    }
    #[test]
    fn bind_older_0() {
        // the younger variable always points at the older one
        let mut heap = Heap::new();
        let old = heap.make_variable("Old");
        let young = heap.make_variable("Young");
        heap.bind(old, young);
        assert_eq!(heap.kind(old), &NodeKind::Unbound);
        assert_eq!(heap.kind(young), &NodeKind::Bound(old));
        assert_eq!(heap.label(young), Some("Young"));
    }
    #[test]
    fn bind_bound_0() {
        // a bound variable keeps its value
        let symbols = symbols_with(&["a", "b"]);
        let mut heap = Heap::new();
        let x = heap.make_variable("X");
        let a = heap.make_atom(symbols.lookup("a").unwrap());
        let b = heap.make_atom(symbols.lookup("b").unwrap());
        heap.bind(x, a);
        heap.bind(x, b);
        assert_eq!(heap.kind(x), &NodeKind::Bound(a));
        heap.bind(a, b);
        assert_eq!(heap.render(a, &symbols), "a");
    }
    #[test]
    fn copy_0() {
        // binding to a template leaves the template alone
        let symbols = symbols_with(&["f", "a"]);
        let f = symbols.lookup("f").unwrap();
        let mut heap = Heap::new();
        let inner = heap.make_variable("Inner");
        let template = heap.make_template(f, vec![inner, inner]);
        let x = heap.make_variable("X");
        heap.bind(x, template);
        let copy = heap.dereference(x);
        assert_ne!(copy, template);
        assert_eq!(heap.node(copy).copy_of, Some(template));
        // the shared variable is copied once, and still aliases the original
        match heap.kind(copy).clone() {
            NodeKind::Compound(_, args) => {
                assert_eq!(args[0], args[1]);
                assert_eq!(heap.dereference(args[0]), inner);
            }
            other => panic!("expected a compound, found {:?}", other),
        }
        let a = heap.make_atom(symbols.lookup("a").unwrap());
        let fa = heap.make_compound(f, vec![a, a]);
        assert!(heap.unify(x, fa));
        assert_eq!(heap.render(inner, &symbols), "a");
        assert!(heap.node(template).template);
    }
    #[test]
    fn trail_0() {
        let symbols = symbols_with(&["a", "b"]);
        let mut heap = Heap::new();
        let before = heap.make_variable("Before");
        let during = heap.make_variable("During");
        let a = heap.make_atom(symbols.lookup("a").unwrap());
        assert!(heap.unify(before, a));

        heap.new_choice_point();
        let b = heap.make_atom(symbols.lookup("b").unwrap());
        assert!(heap.unify(during, b));
        let young = heap.make_variable("Young");
        assert!(heap.unify(young, b));
        heap.restore_choice_point();

        // bindings made before the choice point survive, the rest are undone
        assert_eq!(heap.render(before, &symbols), "a");
        assert!(heap.is_unbound(during));
        // the choice point is still open
        assert_eq!(heap.choice_depth(), 1);
        heap.remove_choice_point();
        assert_eq!(heap.choice_depth(), 0);
    }
    #[test]
    fn trail_1() {
        // only variables older than the choice point are recorded
        let symbols = symbols_with(&["a"]);
        let mut heap = Heap::new();
        let old = heap.make_variable("Old");
        heap.new_choice_point();
        let young = heap.make_variable("Young");
        let a = heap.make_atom(symbols.lookup("a").unwrap());
        assert!(heap.unify(young, a));
        assert_eq!(heap.trail().len(), 0);
        assert!(heap.unify(old, a));
        assert_eq!(heap.trail().len(), 1);
        heap.restore_choice_point();
        assert_eq!(heap.trail().len(), 0);
        assert!(heap.is_unbound(old));
    }
    #[test]
    fn trail_nested_0() {
        // bindings kept by a removed choice point are still undone by the one around it
        let symbols = symbols_with(&["a"]);
        let mut heap = Heap::new();
        let x = heap.make_variable("X");
        heap.new_choice_point();
        heap.new_choice_point();
        let a = heap.make_atom(symbols.lookup("a").unwrap());
        assert!(heap.unify(x, a));
        heap.remove_choice_point();
        assert!(!heap.is_unbound(x));
        heap.restore_choice_point();
        assert!(heap.is_unbound(x));
        heap.remove_choice_point();
    }

    #[test]
    fn cyclic_0() {
        // there is no occurs check, X = f(X) makes a cyclic term
        let symbols = symbols_with(&["f"]);
        let f = symbols.lookup("f").unwrap();
        let mut heap = Heap::new();
        let x = heap.make_variable("X");
        let model = heap.make_template(f, vec![x]);
        assert!(heap.unify(x, model));
        let printed = heap.render(x, &symbols);
        assert!(printed.starts_with("f(f(f("));
        assert!(printed.contains("..."));
    }

    fn family() -> Program {
        let mut symbols = SymbolTable::new();
        let mut clauses: Vec<Clause> = vec![
            ground_fact(&mut symbols, "father", &["terach", "abraham"]),
            ground_fact(&mut symbols, "father", &["terach", "nachor"]),
            ground_fact(&mut symbols, "male", &["terach"]),
            ground_fact(&mut symbols, "male", &["abraham"]),
        ];
        let mut builder = ClauseBuilder::new(&mut symbols);
        let x = builder.var("X");
        let y = builder.var("Y");
        let body = Formula::And(vec![
            builder.call("father", vec![y.clone(), x.clone()]),
            builder.call("male", vec![x.clone()]),
        ]);
        clauses.push(builder.rule("son", vec![x, y], body));
        compile(clauses, symbols).expect("no internal errors").program
    }

    #[test]
    fn solve_0() {
        let program = family();
        let mut engine = Engine::new(&program);
        let a = engine.make_variable("A");
        let terach = engine.make_atom("terach");
        let mut found = vec![];
        let count = engine.solve("son", &[a, terach], |engine| {
            found.push(engine.render(a));
            Flow::Continue
        }).unwrap();
        assert_eq!(count, 1);
        assert_eq!(found, vec!["abraham".to_string()]);
        // the query leaves nothing bound behind
        assert!(engine.heap().is_unbound(a));
        assert_eq!(engine.heap().choice_depth(), 0);
    }
    #[test]
    fn solve_1() {
        let program = family();
        let mut engine = Engine::new(&program);
        let son = engine.make_variable("S");
        let father = engine.make_variable("F");
        let mut found = vec![];
        engine.solve("father", &[father, son], |engine| {
            found.push(engine.render(son));
            Flow::Stop
        }).unwrap();
        assert_eq!(found, vec!["abraham".to_string()]);
        assert_eq!(engine.heap().choice_depth(), 0);
        assert!(engine.heap().is_unbound(son));
    }
    #[test]
    fn query_errors_0() {
        let program = family();
        let mut engine = Engine::new(&program);
        assert_eq!(engine.query("mother(?A, ?B)"), Err(QueryError::UnknownPredicate("mother".to_string())));
        match engine.query("son(?A)") {
            Err(QueryError::ArityMismatch { expected: 2, found: 1, .. }) => {}
            other => panic!("expected an arity mismatch, found {:?}", other),
        }
        assert!(matches!(engine.query("son(?A,"), Err(QueryError::Syntax(_))));
        // the engine is still usable
        let answers = engine.query("son(?A, terach)").unwrap();
        assert_eq!(answers.len(), 1);
        assert_eq!(answers[0].get("A"), Some("abraham"));
    }
    #[test]
    fn query_limit_0() {
        let program = family();
        let config = Config { solution_limit: Some(1), ..Config::default() };
        let mut engine = Engine::with_config(&program, config);
        let answers = engine.query("father(terach, ?Son)").unwrap();
        assert_eq!(answers.len(), 1);
        assert_eq!(answers[0].to_string(), "Son = abraham");
    }
    #[test]
    fn session_heap_0() {
        // later queries make new terms, they never reuse old ids
        let program = family();
        let mut engine = Engine::new(&program);
        let before = engine.make_variable("Before");
        engine.query("son(?A, terach)").unwrap();
        let grown = engine.heap().len();
        assert!(grown > before.index() + 1);
        engine.query("son(?A, terach)").unwrap();
        assert!(engine.heap().len() > grown);
        let after = engine.make_variable("After");
        assert!(after > before);
        assert_eq!(after.index(), engine.heap().len() - 1);
    }
}
