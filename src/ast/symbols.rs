use std::fmt;
use indexmap::IndexSet;

/// An opaque value representing a singular variable,
/// where two variables are the same iff their VarId's are equal.
/// VarIds are handed out in creation order
#[derive(Copy, Clone, PartialOrd, Ord, PartialEq, Eq, Hash)]
pub struct VarId(u32);

/// An opaque value representing an interned predicate or functor name,
/// where two names are the same iff their Identifiers are equal
#[derive(Copy, Clone, PartialOrd, Ord, PartialEq, Eq, Hash)]
pub struct Identifier(u32);

/// The spelling of the equality pseudo-predicate
pub const EQUALS: &str = "=";

#[derive(Debug, Clone)]
pub struct SymbolTable {
    var_count: u32,
    names: IndexSet<String>, // identifier spellings, indexed by Identifier
}

impl SymbolTable {
    pub fn new() -> SymbolTable {
        let mut table = SymbolTable {
            var_count: 0,
            names: IndexSet::new(),
        };
        table.intern(EQUALS);
        table
    }
    /// Make a fresh VarId, strictly greater than every VarId made before it
    pub fn make_var(&mut self) -> VarId {
        let var = VarId(self.var_count);
        self.var_count += 1;
        var
    }
    /// Return the Identifier associated with `name`, making a new one if needed
    pub fn intern(&mut self, name: &str) -> Identifier {
        if let Some(idx) = self.names.get_index_of(name) {
            return Identifier(idx as u32);
        }
        let (idx, _) = self.names.insert_full(name.to_string());
        Identifier(idx as u32)
    }
    /// Return the Identifier associated with `name`, if any
    pub fn lookup(&self, name: &str) -> Option<Identifier> {
        self.names.get_index_of(name).map(|idx| Identifier(idx as u32))
    }
    /// The identifier of the equality pseudo-predicate
    pub fn equals(&self) -> Identifier {
        Identifier(0)
    }
    /// Return the spelling of the given identifier
    pub fn name(&self, id: Identifier) -> &str {
        self.names.get_index(id.0 as usize)
            .map(String::as_str)
            .expect("an Identifier from another symbol table was used")
    }
    /// A count of how many identifiers there are
    pub fn count(&self) -> usize {
        self.names.len()
    }
}

impl fmt::Debug for VarId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "${}", self.0)
    }
}

impl fmt::Display for VarId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "f{}", self.0)}
}
