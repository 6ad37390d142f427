use std::collections::HashMap;

use pest::Parser;
use pest::iterators::Pair;
use pest::error::Error;

use pest_derive::*;
use crate::ast::{SymbolTable, Sentence, Term, Variable, Context};

#[derive(Parser)]
#[grammar = "../grammar.pest"]
struct Grammar;

/// Parse a single query sentence such as `son(?A, terach)`.
/// Variables are written `?Name`; the same name refers to the same variable
pub fn parse_query(source: &str, symbols: &mut SymbolTable) -> Result<Sentence, Error<Rule>> {
    // pest tokenizes it for us, all we have to do is build the sentence
    let mut pairs = Grammar::parse(Rule::source, source)?;
    let pair = pairs.next()
        .expect("the grammar guarantees one sentence before EOI");
    let mut scope = HashMap::new();
    Ok(parse_sentence(pair, symbols, &mut scope))
}

fn parse_sentence(pair: Pair<'_, Rule>, symbols: &mut SymbolTable, scope: &mut HashMap<String, Variable>) -> Sentence {
    let context = context_of(&pair);
    let mut inner = pair.into_inner();
    let name = inner.next()
        .expect("sentence missing its name");
    let name = symbols.intern(name.as_str());
    let elements = inner
        .map(|arg| parse_term(arg, symbols, scope))
        .collect();
    Sentence::new(name, elements, context)
}

fn parse_term(pair: Pair<'_, Rule>, symbols: &mut SymbolTable, scope: &mut HashMap<String, Variable>) -> Term {
    match pair.as_rule() {
        Rule::variable => {
            let name = pair.as_str().trim_start_matches('?');
            if let Some(var) = scope.get(name) {
                return var.clone().into();
            }
            let var = Variable::new(name, symbols.make_var(), context_of(&pair));
            scope.insert(name.to_string(), var.clone());
            var.into()
        }
        Rule::sentence => parse_sentence(pair, symbols, scope).into(),
        // silent rules produce nothing, and names only appear at the start of a sentence
        rule => panic!("rule {:?} should not appear as an argument", rule),
    }
}

fn context_of(pair: &Pair<'_, Rule>) -> Context {
    let (line, column) = pair.as_span().start_pos().line_col();
    Context::new("<query>", line as u32, column as u32)
}
