use crate::ast::{Identifier, SymbolTable, VarId};

use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::Rc;
use itertools::Itertools;

/// Where a piece of source came from. Only used for diagnostics
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Context {
    pub file: Rc<str>,
    pub line: u32,
    pub column: u32,
}

impl Context {
    pub fn new(file: &str, line: u32, column: u32) -> Context {
        Context { file: file.into(), line, column }
    }
    /// A context for terms that were synthesized rather than read
    pub fn synthetic() -> Context {
        Context::new("<generated>", 0, 0)
    }
}

/// A logical variable. Two variables are the same iff their ids are the same,
/// the name and context only exist for humans
#[derive(Clone)]
pub struct Variable {
    pub name: Rc<str>,
    pub id: VarId,
    /// Set on clause-head parameters
    pub is_head: bool,
    pub context: Context,
}

impl Variable {
    pub fn new(name: &str, id: VarId, context: Context) -> Variable {
        Variable { name: name.into(), id, is_head: false, context }
    }
    /// A fresh, compiler-introduced variable
    pub fn fresh(symbols: &mut SymbolTable, context: Context, is_head: bool) -> Variable {
        let id = symbols.make_var();
        Variable {
            name: format!("_{}", id).into(),
            id,
            is_head,
            context,
        }
    }
    pub fn as_head(mut self) -> Variable {
        self.is_head = true;
        self
    }
}

impl PartialEq for Variable {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}
impl Eq for Variable {}
impl Hash for Variable {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state)
    }
}

/// A name applied to an ordered list of terms. Atoms are sentences without elements
#[derive(Clone, PartialEq, Eq)]
pub struct Sentence {
    pub name: Identifier,
    pub elements: Vec<Term>,
    pub context: Context,
}

/// A sentence whose elements are all variables, as produced by normalization
#[derive(Clone, PartialEq, Eq)]
pub struct FlatSentence {
    pub name: Identifier,
    pub elements: Vec<Variable>,
    pub context: Context,
}

#[derive(Clone, PartialEq, Eq)]
pub enum Term {
    Variable(Variable),
    Sentence(Sentence),
}

impl Sentence {
    pub fn new(name: Identifier, elements: Vec<Term>, context: Context) -> Sentence {
        Sentence { name, elements, context }
    }
    pub fn arity(&self) -> usize {
        self.elements.len()
    }
    pub fn is_atom(&self) -> bool {
        self.elements.is_empty()
    }
    /// Every variable mentioned anywhere in the sentence, outermost first
    pub fn variables(&self) -> Vec<&Variable> {
        let mut found = Vec::new();
        let mut stack: Vec<&Term> = self.elements.iter().rev().collect();
        while let Some(term) = stack.pop() {
            match term {
                Term::Variable(v) => found.push(v),
                Term::Sentence(s) => stack.extend(s.elements.iter().rev()),
            }
        }
        found
    }
}

impl FlatSentence {
    pub fn arity(&self) -> usize {
        self.elements.len()
    }
}

impl Term {
    pub fn context(&self) -> &Context {
        match self {
            Term::Variable(v) => &v.context,
            Term::Sentence(s) => &s.context,
        }
    }
    pub fn is_variable(&self) -> bool {
        if let Term::Variable(_) = self {
            true
        } else {
            false
        }
    }
}

impl From<Variable> for Term {
    fn from(v: Variable) -> Self {
        Term::Variable(v)
    }
}
impl From<Sentence> for Term {
    fn from(s: Sentence) -> Self {
        Term::Sentence(s)
    }
}

/// Things that can only be printed with the help of the symbol table
pub trait PrettyPrint {
    fn pretty_fmt(&self, symbols: &SymbolTable, f: &mut fmt::Formatter<'_>) -> fmt::Result;
}

/// Pairs a value with the table needed to print its identifiers
pub struct Pretty<'s, T: ?Sized> {
    pub symbols: &'s SymbolTable,
    pub item: &'s T,
}

impl SymbolTable {
    pub fn pretty<'s, T: PrettyPrint + ?Sized>(&'s self, item: &'s T) -> Pretty<'s, T> {
        Pretty { symbols: self, item }
    }
}

impl <T: PrettyPrint + ?Sized> fmt::Display for Pretty<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.item.pretty_fmt(self.symbols, f)
    }
}

impl PrettyPrint for Variable {
    fn pretty_fmt(&self, _: &SymbolTable, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

impl PrettyPrint for Term {
    fn pretty_fmt(&self, symbols: &SymbolTable, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Term::Variable(v) => v.pretty_fmt(symbols, f),
            Term::Sentence(s) => s.pretty_fmt(symbols, f),
        }
    }
}

impl PrettyPrint for Sentence {
    fn pretty_fmt(&self, symbols: &SymbolTable, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", symbols.name(self.name))?;
        if !self.elements.is_empty() {
            let args = self.elements.iter()
                .map(|e| symbols.pretty(e).to_string())
                .join(", ");
            write!(f, "({})", args)?;
        }
        Ok(())
    }
}

impl PrettyPrint for FlatSentence {
    fn pretty_fmt(&self, symbols: &SymbolTable, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", symbols.name(self.name))?;
        if !self.elements.is_empty() {
            write!(f, "({})", self.elements.iter().map(|v| format!("{:?}", v)).join(", "))?;
        }
        Ok(())
    }
}

impl fmt::Display for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.file, self.line, self.column)
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}>", self)
    }
}

impl fmt::Debug for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "?{}#{}", self.name, self.id)
    }
}

impl fmt::Debug for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Term::Variable(v) => write!(f, "{:?}", v),
            Term::Sentence(s) => write!(f, "{:?}", s),
        }
    }
}

impl fmt::Debug for Sentence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.name)?;
        if !self.elements.is_empty() {
            let mut first = true;
            for arg in &self.elements {
                if first {
                    first = false;
                    write!(f, "(")?;
                } else {
                    write!(f, ", ")?;
                }
                write!(f, "{:?}", arg)?;
            }
            write!(f, ")")?;
        }
        Ok(())
    }
}

impl fmt::Debug for FlatSentence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}({})", self.name, self.elements.iter().map(|v| format!("{:?}", v)).join(", "))
    }
}
