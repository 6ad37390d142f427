#[macro_use] extern crate log;

use std::{env, process};

use clause_machine::{compile, Config, Engine};
use clause_machine::ast::{SymbolTable, Clause, ClauseBuilder, Formula, ground_fact};

const DEFAULT_QUERY: &str = "son(?A, terach)";

/// A small family tree, with a few rules that need backtracking
fn demo_program(symbols: &mut SymbolTable) -> Vec<Clause> {
    let mut clauses = vec![
        ground_fact(symbols, "father", &["terach", "abraham"]),
        ground_fact(symbols, "father", &["terach", "nachor"]),
        ground_fact(symbols, "father", &["terach", "haran"]),
        ground_fact(symbols, "father", &["abraham", "isaac"]),
        ground_fact(symbols, "male", &["terach"]),
        ground_fact(symbols, "male", &["abraham"]),
        ground_fact(symbols, "male", &["isaac"]),
    ];

    // son(X, Y) :- father(Y, X), male(X)
    let mut b = ClauseBuilder::new(symbols);
    let (x, y) = (b.var("X"), b.var("Y"));
    let body = Formula::And(vec![
        b.call("father", vec![y.clone(), x.clone()]),
        b.call("male", vec![x.clone()]),
    ]);
    clauses.push(b.rule("son", vec![x, y], body));

    // grandfather(X, Z) :- father(X, Y), father(Y, Z)
    let mut b = ClauseBuilder::new(symbols);
    let (x, y, z) = (b.var("X"), b.var("Y"), b.var("Z"));
    let body = Formula::And(vec![
        b.call("father", vec![x.clone(), y.clone()]),
        b.call("father", vec![y, z.clone()]),
    ]);
    clauses.push(b.rule("grandfather", vec![x, z], body));

    // kind(X, K) :- if male(X) then K = man else K = unknown
    let mut b = ClauseBuilder::new(symbols);
    let (x, k) = (b.var("X"), b.var("K"));
    let (man, unknown) = (b.atom("man"), b.atom("unknown"));
    let body = Formula::if_else(
        b.call("male", vec![x.clone()]),
        b.equals(k.clone(), man),
        Some(b.equals(k.clone(), unknown)),
    );
    clauses.push(b.rule("kind", vec![x, k], body));

    // later(X) :- (X = isaac or X = haran), father(terach, X)
    let mut b = ClauseBuilder::new(symbols);
    let x = b.var("X");
    let (isaac, haran, terach) = (b.atom("isaac"), b.atom("haran"), b.atom("terach"));
    let body = Formula::And(vec![
        Formula::Or(vec![b.equals(x.clone(), isaac), b.equals(x.clone(), haran)]),
        b.call("father", vec![terach, x.clone()]),
    ]);
    clauses.push(b.rule("later", vec![x], body));

    clauses
}

fn main() {
    pretty_env_logger::init();

    let config = match Config::load() {
        Ok(config) => config,
        Err(why) => {
            error!("could not load the configuration: {}", why);
            process::exit(1);
        }
    };

    let mut symbols = SymbolTable::new();
    let clauses = demo_program(&mut symbols);
    let compilation = match compile(clauses, symbols) {
        Ok(compilation) => compilation,
        Err(why) => {
            error!("{}", why);
            process::exit(2);
        }
    };
    for why in compilation.errors.iter() {
        eprintln!("{}", why);
    }
    let program = compilation.program;
    if config.dump_ir {
        println!("{}", program);
    }

    let query = env::args().nth(1)
        .or_else(|| config.query.clone())
        .unwrap_or_else(|| DEFAULT_QUERY.to_string());
    let mut engine = Engine::with_config(&program, config);
    match engine.query(&query) {
        Ok(answers) if answers.is_empty() => println!("no"),
        Ok(answers) => {
            for answer in answers {
                if answer.is_empty() {
                    println!("yes");
                } else {
                    println!("yes: {}", answer);
                }
            }
        }
        Err(why) => {
            eprintln!("{}", why);
            process::exit(3);
        }
    }
}
