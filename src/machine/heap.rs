use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use crate::ast::{Identifier, SymbolTable};
use crate::machine::Trail;

/// Index of a node on the heap. Ids are handed out in creation order and never reused,
/// so comparing two ids compares the age of their nodes
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TermId(usize);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    Unbound,
    Bound(TermId),
    Atom(Identifier),
    Compound(Identifier, Vec<TermId>),
}

#[derive(Debug, Clone)]
pub struct Node {
    pub kind: NodeKind,
    /// Literal structure from a clause, which must be copied before anything is bound to it
    pub template: bool,
    /// The node this one was copied from
    pub copy_of: Option<TermId>,
    /// The variable name, for printing
    pub label: Option<Rc<str>>,
}

impl Node {
    fn new(kind: NodeKind) -> Node {
        Node { kind, template: false, copy_of: None, label: None }
    }
}

enum Step {
    Bind(TermId, TermId),
    Descend(Vec<(TermId, TermId)>),
    Done,
}

/// Nested structure beyond this depth is printed as `...`
const RENDER_DEPTH: usize = 64;

/// The arena of runtime terms, together with the trail that undoes bindings to it
#[derive(Debug, Clone, Default)]
pub struct Heap {
    nodes: Vec<Node>,
    trail: Trail,
}

impl Heap {
    pub fn new() -> Heap {
        Heap::default()
    }
    pub fn len(&self) -> usize {
        self.nodes.len()
    }
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
    /// The id the next node will receive
    pub fn next_id(&self) -> TermId {
        TermId(self.nodes.len())
    }
    pub fn node(&self, id: TermId) -> &Node {
        &self.nodes[id.0]
    }
    pub fn kind(&self, id: TermId) -> &NodeKind {
        &self.nodes[id.0].kind
    }
    pub fn trail(&self) -> &Trail {
        &self.trail
    }

    fn push(&mut self, node: Node) -> TermId {
        let id = self.next_id();
        self.nodes.push(node);
        id
    }
    pub fn make_variable(&mut self, name: &str) -> TermId {
        let mut node = Node::new(NodeKind::Unbound);
        node.label = Some(name.into());
        let id = self.push(node);
        trace!("new variable {} as {:?}", name, id);
        id
    }
    /// The name a variable was made with
    pub fn label(&self, id: TermId) -> Option<&str> {
        self.nodes[id.0].label.as_deref()
    }
    pub fn make_atom(&mut self, name: Identifier) -> TermId {
        self.push(Node::new(NodeKind::Atom(name)))
    }
    /// A compound without arguments is the atom of the same name
    pub fn make_compound(&mut self, name: Identifier, args: Vec<TermId>) -> TermId {
        if args.is_empty() {
            return self.make_atom(name);
        }
        self.push(Node::new(NodeKind::Compound(name, args)))
    }
    /// Like `make_compound`, but the structure is copied whenever a variable is bound to it
    pub fn make_template(&mut self, name: Identifier, args: Vec<TermId>) -> TermId {
        if args.is_empty() {
            return self.make_atom(name);
        }
        let mut node = Node::new(NodeKind::Compound(name, args));
        node.template = true;
        self.push(node)
    }

    pub fn is_unbound(&self, id: TermId) -> bool {
        self.kind(id) == &NodeKind::Unbound
    }

    /// Follow bindings until an unbound variable or a value.
    /// Gives up on a cycle of bindings after visiting every node once
    pub fn dereference(&self, id: TermId) -> TermId {
        let mut current = id;
        let mut steps = 0;
        while let NodeKind::Bound(next) = self.nodes[current.0].kind {
            current = next;
            steps += 1;
            if steps > self.nodes.len() {
                warn!("binding cycle through {:?}", id);
                break;
            }
        }
        current
    }

    /// Overwrite a node, recording its previous state if the innermost choice point can see it
    fn write(&mut self, id: TermId, kind: NodeKind) {
        if self.trail.needs_entry(id) {
            let previous = std::mem::replace(&mut self.nodes[id.0].kind, kind);
            self.trail.record(id, previous);
        } else {
            self.nodes[id.0].kind = kind;
        }
    }

    /// Bind an unbound variable to a value. A node that is not an unbound variable is left as it is
    pub(crate) fn bind(&mut self, var: TermId, value: TermId) {
        if !self.is_unbound(var) {
            warn!("refusing to bind {:?}, which is not an unbound variable", var);
            return;
        }
        let value = self.dereference(value);
        if value == var {
            return;
        }
        let node = &self.nodes[value.0];
        let unbound = node.kind == NodeKind::Unbound;
        let template = node.template && matches!(node.kind, NodeKind::Compound(..));
        if unbound {
            // the older variable stays the representative
            let (younger, older) = if var > value { (var, value) } else { (value, var) };
            trace!("bind {:?} -> {:?}", younger, older);
            self.write(younger, NodeKind::Bound(older));
        } else if template {
            let copy = self.copy(value);
            trace!("bind {:?} -> {:?} (copied from {:?})", var, copy, value);
            self.write(var, NodeKind::Bound(copy));
        } else {
            trace!("bind {:?} -> {:?}", var, value);
            self.write(var, NodeKind::Bound(value));
        }
    }

    /// Copy a template, so that binding into the copy leaves the template as it was.
    /// Unbound variables inside it are shared through fresh indirections, and a node reachable
    /// twice from the template is copied once
    pub fn copy(&mut self, id: TermId) -> TermId {
        let mut copies = HashMap::new();
        self.copy_node(id, &mut copies)
    }

    fn copy_node(&mut self, id: TermId, copies: &mut HashMap<TermId, TermId>) -> TermId {
        if let Some(&copied) = copies.get(&id) {
            return copied;
        }
        let template = self.nodes[id.0].template;
        let copied = match self.nodes[id.0].kind.clone() {
            NodeKind::Compound(name, args) if template => {
                let args = args.into_iter()
                    .map(|arg| self.copy_node(arg, copies))
                    .collect();
                let mut node = Node::new(NodeKind::Compound(name, args));
                node.copy_of = Some(id);
                self.push(node)
            }
            NodeKind::Unbound | NodeKind::Bound(_) => {
                let target = self.dereference(id);
                if self.is_unbound(target) {
                    let mut node = Node::new(NodeKind::Bound(target));
                    node.copy_of = Some(target);
                    self.push(node)
                } else {
                    target
                }
            }
            // values that are not templates are never written to, so they can be shared
            NodeKind::Atom(_) | NodeKind::Compound(..) => id,
        };
        copies.insert(id, copied);
        copied
    }

    /// Unify two terms, binding variables as needed. On failure, some bindings may have
    /// been made already, undoing them is the job of the enclosing choice point
    pub fn unify(&mut self, left: TermId, right: TermId) -> bool {
        let mut pending = vec![(left, right)];
        while let Some((left, right)) = pending.pop() {
            let left = self.dereference(left);
            let right = self.dereference(right);
            if left == right {
                continue;
            }
            let step = match (self.kind(left), self.kind(right)) {
                (NodeKind::Unbound, _) => Step::Bind(left, right),
                (_, NodeKind::Unbound) => Step::Bind(right, left),
                (NodeKind::Atom(a), NodeKind::Atom(b)) if a == b => Step::Done,
                (NodeKind::Compound(f, xs), NodeKind::Compound(g, ys)) if f == g && xs.len() == ys.len() => {
                    // leftmost argument pairs are examined first
                    Step::Descend(xs.iter().copied().zip(ys.iter().copied()).rev().collect())
                }
                _ => return false,
            };
            match step {
                Step::Bind(var, value) => self.bind(var, value),
                Step::Descend(pairs) => pending.extend(pairs),
                Step::Done => {}
            }
        }
        true
    }

    pub fn new_choice_point(&mut self) {
        let watermark = self.next_id();
        self.trail.new_choice_point(watermark);
    }
    pub fn restore_choice_point(&mut self) {
        let nodes = &mut self.nodes;
        self.trail.restore_choice_point(|id, previous| {
            nodes[id.0].kind = previous;
        });
    }
    pub fn remove_choice_point(&mut self) {
        self.trail.remove_choice_point();
    }
    pub fn choice_depth(&self) -> usize {
        self.trail.depth()
    }
    /// Restore and remove choice points until only `depth` of them are open
    pub fn unwind_to(&mut self, depth: usize) {
        while self.choice_depth() > depth {
            self.restore_choice_point();
            self.remove_choice_point();
        }
    }

    /// Print a term, following bindings. Unbound variables print as `_G<id>`
    pub fn render(&self, id: TermId, symbols: &SymbolTable) -> String {
        let mut out = String::new();
        self.render_into(id, symbols, RENDER_DEPTH, &mut out);
        out
    }

    fn render_into(&self, id: TermId, symbols: &SymbolTable, depth: usize, out: &mut String) {
        if depth == 0 {
            out.push_str("...");
            return;
        }
        let id = self.dereference(id);
        let node = self.node(id);
        match &node.kind {
            NodeKind::Unbound => out.push_str(&format!("_G{}", id.0)),
            NodeKind::Atom(name) => out.push_str(symbols.name(*name)),
            NodeKind::Compound(name, args) => {
                out.push_str(symbols.name(*name));
                out.push('(');
                for (idx, arg) in args.iter().enumerate() {
                    if idx > 0 {
                        out.push_str(", ");
                    }
                    self.render_into(*arg, symbols, depth - 1, out);
                }
                out.push(')');
            }
            // a cycle of bindings that dereference gave up on
            NodeKind::Bound(_) => out.push_str("..."),
        }
    }
}

impl TermId {
    /// Position on the heap
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Debug for TermId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}
