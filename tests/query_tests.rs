use clause_machine::{compile, Config, Engine, Flow, Program, QueryError};
use clause_machine::ast::{SymbolTable, Clause, ClauseBuilder, Formula, ground_fact};

/// Facts about terach's family, then whatever rules the test adds
fn family(rules: impl FnOnce(&mut SymbolTable) -> Vec<Clause>) -> Program {
    let mut symbols = SymbolTable::new();
    let mut clauses = vec![
        ground_fact(&mut symbols, "father", &["terach", "abraham"]),
        ground_fact(&mut symbols, "father", &["terach", "nachor"]),
        ground_fact(&mut symbols, "father", &["abraham", "isaac"]),
        ground_fact(&mut symbols, "male", &["terach"]),
        ground_fact(&mut symbols, "male", &["abraham"]),
    ];
    clauses.extend(rules(&mut symbols));
    let compilation = compile(clauses, symbols).expect("should not error");
    assert!(compilation.errors.is_empty(), "rejected clauses: {:?}", compilation.errors);
    compilation.program
}

fn son(symbols: &mut SymbolTable) -> Vec<Clause> {
    // son(X, Y) :- father(Y, X), male(X)
    let mut b = ClauseBuilder::new(symbols);
    let (x, y) = (b.var("X"), b.var("Y"));
    let body = Formula::And(vec![
        b.call("father", vec![y.clone(), x.clone()]),
        b.call("male", vec![x.clone()]),
    ]);
    vec![b.rule("son", vec![x, y], body)]
}

fn values(program: &Program, query: &str, var: &str) -> Vec<String> {
    let mut engine = Engine::new(program);
    engine.query(query).expect("should not error")
        .iter()
        .map(|answer| answer.get(var).expect("variable is bound in every answer").to_string())
        .collect()
}

#[test]
fn son_0() {
    let program = family(son);
    // nachor is terach's son too, but nobody said he was male
    assert_eq!(values(&program, "son(?A, terach)", "A"), vec!["abraham"]);
}
#[test]
fn son_1() {
    let program = family(son);
    let mut engine = Engine::new(&program);
    assert_eq!(engine.query("son(abraham, terach)").unwrap().len(), 1);
    assert!(engine.query("son(nachor, terach)").unwrap().is_empty());
    assert!(engine.query("son(terach, abraham)").unwrap().is_empty());
}
#[test]
fn son_2() {
    // the same engine answers the same query the same way twice
    let program = family(son);
    let mut engine = Engine::new(&program);
    let first = engine.query("son(?A, ?B)").unwrap();
    let second = engine.query("son(?A, ?B)").unwrap();
    assert_eq!(first, second);
    assert_eq!(first.len(), 1);
    assert_eq!(first[0].to_string(), "A = abraham, B = terach");
}

#[test]
fn disjunction_0() {
    // pick(X) :- (X = 1 or X = 2), X = 2
    let program = family(|symbols| {
        let mut b = ClauseBuilder::new(symbols);
        let x = b.var("X");
        let (one, two) = (b.atom("1"), b.atom("2"));
        let body = Formula::And(vec![
            Formula::Or(vec![b.equals(x.clone(), one), b.equals(x.clone(), two.clone())]),
            b.equals(x.clone(), two),
        ]);
        vec![b.rule("pick", vec![x], body)]
    });
    // the binding to 1 is undone before the second branch binds 2
    assert_eq!(values(&program, "pick(?X)", "X"), vec!["2"]);
}
#[test]
fn disjunction_1() {
    // any(X) :- X = a or X = b or X = c
    let program = family(|symbols| {
        let mut b = ClauseBuilder::new(symbols);
        let x = b.var("X");
        let branches = ["a", "b", "c"].iter()
            .map(|name| {
                let atom = b.atom(name);
                b.equals(x.clone(), atom)
            })
            .collect();
        vec![b.rule("any", vec![x], Formula::Or(branches))]
    });
    assert_eq!(values(&program, "any(?X)", "X"), vec!["a", "b", "c"]);
}

#[test]
fn merge_0() {
    // ancestor(X, Z) :- father(X, Z).
    // ancestor(X, Z) :- father(X, Y), ancestor(Y, Z).
    let program = family(|symbols| {
        let mut b = ClauseBuilder::new(symbols);
        let (x, z) = (b.var("X"), b.var("Z"));
        let body = b.call("father", vec![x.clone(), z.clone()]);
        let direct = b.rule("ancestor", vec![x, z], body);

        let mut b = ClauseBuilder::new(symbols);
        let (x, y, z) = (b.var("X"), b.var("Y"), b.var("Z"));
        let body = Formula::And(vec![
            b.call("father", vec![x.clone(), y.clone()]),
            b.call("ancestor", vec![y, z.clone()]),
        ]);
        let indirect = b.rule("ancestor", vec![x, z], body);
        vec![direct, indirect]
    });
    assert!(program.lookup("ancestor").is_some());
    assert_eq!(values(&program, "ancestor(terach, ?D)", "D"), vec!["abraham", "nachor", "isaac"]);
    assert_eq!(values(&program, "ancestor(?A, isaac)", "A"), vec!["abraham", "terach"]);
}

fn kind(symbols: &mut SymbolTable) -> Vec<Clause> {
    // kind(X, K) :- if male(X) then K = man else K = unknown
    let mut b = ClauseBuilder::new(symbols);
    let (x, k) = (b.var("X"), b.var("K"));
    let (man, unknown) = (b.atom("man"), b.atom("unknown"));
    let body = Formula::if_else(
        b.call("male", vec![x.clone()]),
        b.equals(k.clone(), man),
        Some(b.equals(k.clone(), unknown)),
    );
    vec![b.rule("kind", vec![x, k], body)]
}

#[test]
fn if_else_0() {
    let program = family(kind);
    assert_eq!(values(&program, "kind(terach, ?K)", "K"), vec!["man"]);
    // else only runs when the condition never succeeded
    assert_eq!(values(&program, "kind(nachor, ?K)", "K"), vec!["unknown"]);
}
#[test]
fn if_else_1() {
    // has_children(X, R) :- if father(X, _) then R = yes else R = no
    let program = family(|symbols| {
        let mut b = ClauseBuilder::new(symbols);
        let (x, r, anyone) = (b.var("X"), b.var("R"), b.var("_"));
        let (yes, no) = (b.atom("yes"), b.atom("no"));
        let body = Formula::if_else(
            b.call("father", vec![x.clone(), anyone]),
            b.equals(r.clone(), yes),
            Some(b.equals(r.clone(), no)),
        );
        vec![b.rule("has_children", vec![x, r], body)]
    });
    // the then branch runs once per solution of the condition
    assert_eq!(values(&program, "has_children(terach, ?R)", "R"), vec!["yes", "yes"]);
    assert_eq!(values(&program, "has_children(isaac, ?R)", "R"), vec!["no"]);
}
#[test]
fn if_else_2() {
    // an if without an else behaves like a conjunction
    let program = family(|symbols| {
        let mut b = ClauseBuilder::new(symbols);
        let (x, k) = (b.var("X"), b.var("K"));
        let man = b.atom("man");
        let body = Formula::if_else(b.call("male", vec![x.clone()]), b.equals(k.clone(), man), None);
        vec![b.rule("maybe_man", vec![x, k], body)]
    });
    assert_eq!(values(&program, "maybe_man(abraham, ?K)", "K"), vec!["man"]);
    assert!(values(&program, "maybe_man(nachor, ?K)", "K").is_empty());
}

#[test]
fn if_else_3() {
    // pick(X, R) :- (X = terach or X = nachor), if male(X) then R = man else R = unknown
    // the second branch re-enters the if/then/else in the same call, and must not see
    // the flag the first branch raised
    let program = family(|symbols| {
        let mut b = ClauseBuilder::new(symbols);
        let (x, r) = (b.var("X"), b.var("R"));
        let (terach, nachor) = (b.atom("terach"), b.atom("nachor"));
        let (man, unknown) = (b.atom("man"), b.atom("unknown"));
        let body = Formula::And(vec![
            Formula::Or(vec![b.equals(x.clone(), terach), b.equals(x.clone(), nachor)]),
            Formula::if_else(
                b.call("male", vec![x.clone()]),
                b.equals(r.clone(), man),
                Some(b.equals(r.clone(), unknown)),
            ),
        ]);
        vec![b.rule("pick", vec![x, r], body)]
    });
    let mut engine = Engine::new(&program);
    let answers: Vec<String> = engine.query("pick(?X, ?R)").unwrap()
        .iter()
        .map(|answer| answer.to_string())
        .collect();
    assert_eq!(answers, vec!["X = terach, R = man", "X = nachor, R = unknown"]);
}

#[test]
fn structure_0() {
    // swap(pair(A, B), pair(B, A)).
    let program = family(|symbols| {
        let mut b = ClauseBuilder::new(symbols);
        let (a, c) = (b.var("A"), b.var("B"));
        let left = b.compound("pair", vec![a.clone(), c.clone()]);
        let right = b.compound("pair", vec![c, a]);
        vec![b.fact("swap", vec![left, right])]
    });
    assert_eq!(values(&program, "swap(pair(x, y), ?P)", "P"), vec!["pair(y, x)"]);
    assert_eq!(values(&program, "swap(?P, pair(x, y))", "P"), vec!["pair(y, x)"]);
    assert!(values(&program, "swap(pair(x, y), pair(x, y))", "P").is_empty());
}
#[test]
fn structure_1() {
    // unification reaches into nested structure on both sides
    // same(X, X).
    let program = family(|symbols| {
        let mut b = ClauseBuilder::new(symbols);
        let x = b.var("X");
        vec![b.fact("same", vec![x.clone(), x])]
    });
    let mut engine = Engine::new(&program);
    let answers = engine.query("same(f(?A, b), f(a, ?B))").unwrap();
    assert_eq!(answers.len(), 1);
    assert_eq!(answers[0].to_string(), "A = a, B = b");
    assert!(engine.query("same(a, b)").unwrap().is_empty());
}

fn nat(symbols: &mut SymbolTable) -> Vec<Clause> {
    // nat(z).
    // nat(s(N)) :- nat(N).
    let mut b = ClauseBuilder::new(symbols);
    let z = b.atom("z");
    let zero = b.fact("nat", vec![z]);
    let mut b = ClauseBuilder::new(symbols);
    let n = b.var("N");
    let sn = b.compound("s", vec![n.clone()]);
    let body = b.call("nat", vec![n]);
    let succ = b.rule("nat", vec![sn], body);
    vec![zero, succ]
}

#[test]
fn solution_limit_0() {
    let program = family(nat);
    let config = Config { solution_limit: Some(3), ..Config::default() };
    let mut engine = Engine::with_config(&program, config);
    let answers = engine.query("nat(?N)").unwrap();
    let found: Vec<_> = answers.iter().map(|answer| answer.get("N").unwrap()).collect();
    assert_eq!(found, vec!["z", "s(z)", "s(s(z))"]);
}
#[test]
fn solution_limit_1() {
    // deep recursion runs on the task stack, not the native one
    let program = family(nat);
    let config = Config { solution_limit: Some(1000), ..Config::default() };
    let mut engine = Engine::with_config(&program, config);
    assert_eq!(engine.query("nat(?N)").unwrap().len(), 1000);
}

fn down(symbols: &mut SymbolTable) -> Vec<Clause> {
    // down(s(N)) :- down(N).
    let mut b = ClauseBuilder::new(symbols);
    let n = b.var("N");
    let sn = b.compound("s", vec![n.clone()]);
    let body = b.call("down", vec![n]);
    vec![b.rule("down", vec![sn], body)]
}

#[test]
fn deep_0() {
    // a long chain of calls that finally fails is released without recursing
    let program = family(down);
    let mut engine = Engine::new(&program);
    let mut term = engine.make_atom("z");
    for _ in 0..200_000 {
        term = engine.make_compound("s", vec![term]);
    }
    assert_eq!(engine.solve("down", &[term], |_| Flow::Continue), Ok(0));
    assert_eq!(engine.heap().choice_depth(), 0);
}
#[test]
fn deep_1() {
    // stopping far down a recursion releases every pending call
    let program = family(nat);
    let mut engine = Engine::new(&program);
    let n = engine.make_variable("N");
    let mut seen = 0;
    let count = engine.solve("nat", &[n], |_| {
        seen += 1;
        if seen == 50_000 { Flow::Stop } else { Flow::Continue }
    }).unwrap();
    assert_eq!(count, 50_000);
    assert_eq!(engine.heap().choice_depth(), 0);
    assert!(engine.heap().is_unbound(n));
}

#[test]
fn solve_0() {
    let program = family(son);
    let mut engine = Engine::new(&program);
    let child = engine.make_variable("Child");
    let parent = engine.make_variable("Parent");
    let mut seen = vec![];
    let count = engine.solve("father", &[parent, child], |engine| {
        seen.push(format!("{} -> {}", engine.render(parent), engine.render(child)));
        Flow::Continue
    }).unwrap();
    assert_eq!(count, 3);
    assert_eq!(seen, vec!["terach -> abraham", "terach -> nachor", "abraham -> isaac"]);
}
#[test]
fn solve_1() {
    let program = family(son);
    let mut engine = Engine::new(&program);
    let x = engine.make_variable("X");
    assert_eq!(engine.solve("father", &[x], |_| Flow::Continue),
               Err(QueryError::ArityMismatch { predicate: "father".to_string(), expected: 2, found: 1 }));
    assert_eq!(engine.solve("mother", &[x, x], |_| Flow::Continue),
               Err(QueryError::UnknownPredicate("mother".to_string())));
}

#[test]
fn undefined_0() {
    // calls to predicates nobody defined simply fail
    let program = family(|symbols| {
        let mut b = ClauseBuilder::new(symbols);
        let x = b.var("X");
        let body = b.call("nobody", vec![x.clone()]);
        vec![b.rule("orphan", vec![x], body)]
    });
    assert!(values(&program, "orphan(?X)", "X").is_empty());
}
#[test]
fn rejected_0() {
    // a negated goal is rejected, and its predicate is left out
    let mut symbols = SymbolTable::new();
    let mut b = ClauseBuilder::new(&mut symbols);
    let x = b.var("X");
    let body = b.call("male", vec![x.clone()]).negate();
    let clauses = vec![b.rule("female", vec![x], body)];
    let compilation = compile(clauses, symbols).expect("should not error");
    assert_eq!(compilation.errors.len(), 1);
    assert!(compilation.errors[0].to_string().contains("negation"));
    let mut engine = Engine::new(&compilation.program);
    assert_eq!(engine.query("female(?X)"), Err(QueryError::UnknownPredicate("female".to_string())));
}
