//! The type-term lattice: `TypeTerm`, `UnionType`, and the `Deferred`
//! expression obligations that Pass 1 accumulates for Pass 2 to resolve.
//!
//! `UnionType` is deliberately a sorted, deduplicated `Vec<TypeTerm>` rather
//! than a hash set: canonical order is part of the public contract, since
//! the final symbol table is serialized as an observable snapshot fact.

use std::fmt;

/// A source position: byte offsets plus the literal token text.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Astn {
    pub start: usize,
    pub end: usize,
    pub value: String,
}

impl Astn {
    pub fn new(start: usize, end: usize, value: impl Into<String>) -> Self {
        Astn {
            start,
            end,
            value: value.into(),
        }
    }
}

/// Which Kythe edge kind a `dot` resolution should emit: `binds` for a
/// binding occurrence (`self.x = ...`), `ref` for a read occurrence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DotEdgeKind {
    Binds,
    Ref,
}

impl DotEdgeKind {
    pub fn from_binds(binds: bool) -> Self {
        if binds {
            DotEdgeKind::Binds
        } else {
            DotEdgeKind::Ref
        }
    }

    pub fn kythe_edge_name(&self) -> &'static str {
        match self {
            DotEdgeKind::Binds => pykythe_core::vname::EDGE_DEFINES_BINDING,
            DotEdgeKind::Ref => pykythe_core::vname::EDGE_REF,
        }
    }
}

/// The central sum type: every node in the cooked AST evaluates to one of
/// these.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TypeTerm {
    /// An unresolved reference to the symbol named by FQN `F`.
    Fqn(String),
    /// A class whose FQN is `F`, with base-class union types.
    Class(String, Vec<UnionType>),
    /// A function whose FQN is `F`, returning union `Return`.
    Func(String, Box<UnionType>),
    /// An imported binding at FQN `F` resolving to module `Path`.
    Import(String, String),
    /// A plain variable binding.
    Var(String),
    /// Attribute access to be resolved: `Atom.attr` at span `Astn`.
    Dot(Box<UnionType>, Astn, DotEdgeKind),
    /// A call to be resolved: `Atom(Args...)`.
    Call(Box<UnionType>, Vec<UnionType>),
    /// An opaque operator application; preserved verbatim for later tooling.
    CallOp(Vec<Astn>, Vec<UnionType>),
    /// `...` literal.
    Ellipsis,
    /// A syntactically-omitted slot (e.g. a bare annotation with no value).
    Omitted,
    /// `*args`/`*` placeholder.
    Star,
    /// A construct not yet analyzed; evaluates to the empty union.
    TodoX(String),
}

impl fmt::Display for TypeTerm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeTerm::Fqn(fqn) => write!(f, "fqn({fqn})"),
            TypeTerm::Class(fqn, bases) => write!(f, "class({fqn}, {bases:?})"),
            TypeTerm::Func(fqn, ret) => write!(f, "func({fqn}, {ret:?})"),
            TypeTerm::Import(fqn, path) => write!(f, "import({fqn}, {path})"),
            TypeTerm::Var(fqn) => write!(f, "var({fqn})"),
            TypeTerm::Dot(atom, astn, ek) => write!(f, "dot({atom:?}, {astn:?}, {ek:?})"),
            TypeTerm::Call(atom, args) => write!(f, "call({atom:?}, {args:?})"),
            TypeTerm::CallOp(ops, args) => write!(f, "call_op({ops:?}, {args:?})"),
            TypeTerm::Ellipsis => write!(f, "ellipsis"),
            TypeTerm::Omitted => write!(f, "omitted"),
            TypeTerm::Star => write!(f, "star"),
            TypeTerm::TodoX(kind) => write!(f, "todo_{kind}"),
        }
    }
}

/// An ordered, deduplicated set of type terms: "any of". The empty union
/// denotes "no information" and never contradicts another type during
/// propagation.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct UnionType(Vec<TypeTerm>);

impl UnionType {
    pub fn empty() -> Self {
        UnionType(Vec::new())
    }

    pub fn single(term: TypeTerm) -> Self {
        UnionType(vec![term])
    }

    pub fn from_terms(terms: impl IntoIterator<Item = TypeTerm>) -> Self {
        let mut u = UnionType::empty();
        for t in terms {
            u.insert(t);
        }
        u
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, TypeTerm> {
        self.0.iter()
    }

    pub fn as_slice(&self) -> &[TypeTerm] {
        &self.0
    }

    pub fn contains(&self, term: &TypeTerm) -> bool {
        self.0.binary_search(term).is_ok()
    }

    /// Insert `term`, keeping canonical sorted-deduplicated order.
    pub fn insert(&mut self, term: TypeTerm) {
        match self.0.binary_search(&term) {
            Ok(_) => {}
            Err(idx) => self.0.insert(idx, term),
        }
    }

    /// `self ∪ other`, as a new union.
    pub fn union(&self, other: &UnionType) -> UnionType {
        let mut result = self.clone();
        for term in other.iter() {
            result.insert(term.clone());
        }
        result
    }

    /// `self ⊆ other` — used by the fixpoint's reject classification.
    pub fn is_subset_of(&self, other: &UnionType) -> bool {
        self.0.iter().all(|t| other.contains(t))
    }

    /// If this union reduces to exactly one term, return it.
    pub fn as_single(&self) -> Option<&TypeTerm> {
        if self.0.len() == 1 {
            self.0.first()
        } else {
            None
        }
    }
}

impl IntoIterator for UnionType {
    type Item = TypeTerm;
    type IntoIter = std::vec::IntoIter<TypeTerm>;
    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl FromIterator<TypeTerm> for UnionType {
    fn from_iter<I: IntoIterator<Item = TypeTerm>>(iter: I) -> Self {
        UnionType::from_terms(iter)
    }
}

/// A deferred expression obligation: produced by Pass 1, resolved by Pass 2.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Deferred {
    /// Bind `lhs` to the evaluated `rhs`.
    Assign { lhs: UnionType, rhs: UnionType },
    /// Evaluate for side effects (anchor/edge emission).
    Expr(UnionType),
    /// Seed the symbol table with a class declaration.
    ClassDecl { fqn: String, bases: Vec<UnionType> },
    /// Seed the symbol table with a function declaration.
    FuncDecl { fqn: String, ret: UnionType },
    /// Seed the symbol table with an import binding: `path` is the
    /// resolved module path, `fqn` is the bound name.
    ImportFrom { path: String, fqn: String },
}
