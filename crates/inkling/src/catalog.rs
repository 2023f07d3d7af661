//! The builtin function table.
//!
//! Precedence and associativity are published for an external parser;
//! higher precedence binds tighter.

use crate::builtin::Op;
use crate::function::{Argument, Arity, Associativity, Function};
use crate::key::{Interner, Key};
use crate::number::{Arith, Math};
use crate::ops::Comparison;
use crate::range::Bounds;
use rustc_hash::FxHashMap;
use serde::Serialize;
use std::sync::Arc;

struct Entry {
    name: &'static str,
    op: Op,
    precedence: u16,
    associativity: Associativity,
    left: &'static [&'static str],
    right: &'static [&'static str],
    short_circuit: bool,
    summary: &'static str,
}

const fn binary(name: &'static str, op: Op, precedence: u16, summary: &'static str) -> Entry {
    Entry {
        name,
        op,
        precedence,
        associativity: Associativity::Left,
        left: &["a"],
        right: &["b"],
        short_circuit: false,
        summary,
    }
}

const fn prefix(name: &'static str, op: Op, precedence: u16, summary: &'static str) -> Entry {
    Entry {
        name,
        op,
        precedence,
        associativity: Associativity::Right,
        left: &[],
        right: &["x"],
        short_circuit: false,
        summary,
    }
}

const fn postfix(name: &'static str, op: Op, precedence: u16, summary: &'static str) -> Entry {
    Entry {
        name,
        op,
        precedence,
        associativity: Associativity::Left,
        left: &["x"],
        right: &[],
        short_circuit: false,
        summary,
    }
}

const fn right_assoc(entry: Entry) -> Entry {
    Entry {
        associativity: Associativity::Right,
        ..entry
    }
}

const fn lazy(entry: Entry) -> Entry {
    Entry {
        short_circuit: true,
        ..entry
    }
}

const ENTRIES: &[Entry] = &[
    binary(".", Op::At, 1000, "value at an index, key or field"),
    binary("/.", Op::Select, 1000, "extend a selection path"),
    prefix("!", Op::Not, 900, "logical not"),
    prefix("\\", Op::Raise, 900, "construct an error"),
    right_assoc(binary("**", Op::Arith(Arith::Pow), 800, "power")),
    right_assoc(binary("*/", Op::Arith(Arith::Root), 800, "n-th root")),
    binary("*", Op::Arith(Arith::Mul), 700, "product, or matrix product"),
    binary("/", Op::Arith(Arith::Div), 700, "quotient"),
    binary("%", Op::Arith(Arith::Rem), 700, "truncated remainder"),
    binary("+", Op::Arith(Arith::Add), 600, "sum"),
    binary("-", Op::Arith(Arith::Sub), 600, "difference"),
    binary("...", Op::Range(Bounds::Closed), 500, "closed range"),
    binary("..<", Op::Range(Bounds::HalfOpen), 500, "range open above"),
    binary("<..", Op::Range(Bounds::OpenClosed), 500, "range open below"),
    binary("<.<", Op::Range(Bounds::Open), 500, "open range"),
    binary("__", Op::Step, 490, "range step"),
    postfix(";", Op::Group, 450, "group rows into a matrix"),
    postfix(";-", Op::Ungroup, 450, "flatten a matrix into rows"),
    binary("map", Op::Map, 400, "apply to each element"),
    binary("filter", Op::Filter, 400, "keep elements passing a predicate"),
    Entry {
        name: "reduce",
        op: Op::Reduce,
        precedence: 400,
        associativity: Associativity::Left,
        left: &["collection"],
        right: &["initial", "f"],
        short_circuit: false,
        summary: "fold elements into an accumulator",
    },
    binary("is", Op::Is, 350, "membership in a type, range or collection"),
    binary("==", Op::Compare(Comparison::Equal), 300, "structural equality"),
    binary("!=", Op::Compare(Comparison::NotEqual), 300, "structural inequality"),
    binary("<", Op::Compare(Comparison::Less), 300, "less than"),
    binary("<=", Op::Compare(Comparison::LessEqual), 300, "less than or equal"),
    binary(">", Op::Compare(Comparison::Greater), 300, "greater than"),
    binary(">=", Op::Compare(Comparison::GreaterEqual), 300, "greater than or equal"),
    lazy(binary("&&", Op::And, 250, "logical and")),
    lazy(binary("||", Op::Or, 240, "logical or, or type union")),
    lazy(binary("??", Op::Coalesce, 230, "fallback for nil")),
    lazy(binary("???", Op::Recover, 230, "fallback for an error")),
    lazy(right_assoc(binary("?", Op::When, 220, "value when true, else nil"))),
    right_assoc(binary(":", Op::Pair, 210, "build a dictionary")),
    prefix("floor", Op::Math(Math::Floor), 200, "round down"),
    prefix("round", Op::Math(Math::Round), 200, "round to nearest"),
    prefix("ceil", Op::Math(Math::Ceil), 200, "round up"),
    prefix("abs", Op::Math(Math::Abs), 200, "absolute value"),
    prefix("sqrt", Op::Math(Math::Sqrt), 200, "square root"),
    prefix("sin", Op::Math(Math::Sin), 200, "sine"),
    prefix("cos", Op::Math(Math::Cos), 200, "cosine"),
    prefix("tan", Op::Math(Math::Tan), 200, "tangent"),
    prefix("asin", Op::Math(Math::Asin), 200, "arcsine"),
    prefix("acos", Op::Math(Math::Acos), 200, "arccosine"),
    prefix("atan", Op::Math(Math::Atan), 200, "arctangent"),
    binary("atan2", Op::Atan2, 200, "angle of the point (x, y)"),
    prefix("counta", Op::Count, 200, "number of elements"),
    prefix("random", Op::Random, 200, "random element or number"),
    binary("<-", Op::Set, 100, "replace the selected value"),
    binary("++", Op::Insert, 100, "insert at the selection, or append"),
    postfix("--", Op::Remove, 100, "remove the selected value"),
];

/// Published description of one builtin.
#[derive(Debug, Clone, Serialize)]
pub struct Metadata {
    pub name: String,
    pub precedence: u16,
    pub associativity: Associativity,
    pub arity: Arity,
    pub left: Vec<String>,
    pub right: Vec<String>,
    pub short_circuit: bool,
    pub summary: String,
}

#[derive(Debug)]
pub struct Catalog {
    functions: FxHashMap<Key, Arc<Function>>,
    order: Vec<Key>,
    interner: Interner,
}

impl Catalog {
    pub fn standard() -> Self {
        let mut interner = Interner::new();
        let mut functions = FxHashMap::default();
        let mut order = Vec::with_capacity(ENTRIES.len());
        for entry in ENTRIES {
            let key = interner.register(entry.name, entry.summary);
            let arguments = |names: &[&str]| names.iter().map(Argument::new).collect::<Vec<_>>();
            let mut function = Function::primitive(entry.op)
                .with_precedence(entry.precedence)
                .with_associativity(entry.associativity)
                .with_left(arguments(entry.left))
                .with_right(arguments(entry.right));
            function.name = Some(key.clone());
            if entry.short_circuit {
                function = function.short_circuiting();
            }
            functions.insert(key.clone(), Arc::new(function));
            order.push(key);
        }
        log::debug!("catalog registered {} builtins", order.len());
        Self {
            functions,
            order,
            interner,
        }
    }

    pub fn get(&self, name: &Key) -> Option<&Arc<Function>> {
        self.functions.get(name)
    }

    pub fn get_str(&self, name: &str) -> Option<&Arc<Function>> {
        self.interner.get(name).and_then(|key| self.functions.get(key))
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Builtin names in table order.
    pub fn names(&self) -> impl Iterator<Item = &Key> {
        self.order.iter()
    }

    pub fn metadata(&self) -> Vec<Metadata> {
        self.order
            .iter()
            .filter_map(|key| self.functions.get(key).map(|function| (key, function)))
            .map(|(key, function)| Metadata {
                name: key.to_string(),
                precedence: function.precedence,
                associativity: function.associativity,
                arity: function.arity(),
                left: function.left.iter().map(|a| a.name.to_string()).collect(),
                right: function.right.iter().map(|a| a.name.to_string()).collect(),
                short_circuit: function.short_circuit,
                summary: key.info().map(|info| info.summary.clone()).unwrap_or_default(),
            })
            .collect()
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::standard()
    }
}
