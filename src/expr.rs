//! Arithmetic expression tree, evaluated against a [`Record`] to produce a
//! [`V`]. Shared by projections (`RETURN n.age + 1`), `ORDER BY` keys, and
//! the filter tree's leaf comparands.

use crate::errors::QueryResult;
use crate::record::Record;
use crate::value::{ops, V};

#[derive(Debug, Clone)]
pub enum Exp {
    /// A literal constant, embedded at compile time.
    Const(V),
    /// A bound alias's value, e.g. `n` in `n.age`.
    Alias(String),
    /// Attribute access on an alias, e.g. `n.age`.
    Property { alias: String, attribute: String },
    Add(Box<Exp>, Box<Exp>),
    Sub(Box<Exp>, Box<Exp>),
    Mul(Box<Exp>, Box<Exp>),
    Div(Box<Exp>, Box<Exp>),
    Mod(Box<Exp>, Box<Exp>),
    Neg(Box<Exp>),
    /// A named function call, e.g. `distance(n.loc, $origin)`.
    FunctionCall { name: String, args: Vec<Exp> },
}

impl Exp {
    /// `true` when this subtree can be evaluated without a `Record` — a
    /// literal, or an arithmetic/function combination of literals. Drives
    /// filter-tree constant folding (§4.5) and the index push-down's
    /// "applicable subtree" test (§4.6).
    pub fn is_constant(&self) -> bool {
        match self {
            Exp::Const(_) => true,
            Exp::Alias(_) | Exp::Property { .. } => false,
            Exp::Add(a, b) | Exp::Sub(a, b) | Exp::Mul(a, b) | Exp::Div(a, b) | Exp::Mod(a, b) => {
                a.is_constant() && b.is_constant()
            }
            Exp::Neg(a) => a.is_constant(),
            Exp::FunctionCall { args, .. } => args.iter().all(Exp::is_constant),
        }
    }

    /// Evaluate a constant expression without needing a `Record`. Panics if
    /// called on a non-constant subtree — callers must check
    /// [`Exp::is_constant`] first.
    pub fn eval_const(&self, functions: &dyn Fn(&str, &[V]) -> QueryResult<V>) -> QueryResult<V> {
        debug_assert!(self.is_constant(), "eval_const called on a non-constant expression");
        let schema = crate::record::RecordSchema::new(Vec::new());
        let record = Record::new(schema);
        self.eval(&record, functions)
    }

    pub fn eval(&self, record: &Record, functions: &dyn Fn(&str, &[V]) -> QueryResult<V>) -> QueryResult<V> {
        match self {
            Exp::Const(v) => Ok(v.clone()),
            Exp::Alias(alias) => Ok(record.get(alias).cloned().unwrap_or(V::Null)),
            Exp::Property { alias, attribute } => {
                // Property projection is resolved by the operator that owns
                // the AttributeSet lookup (the planner rewrites `n.age`
                // into a dedicated projection step before this expression
                // tree ever runs); here we only read the already-projected
                // value out of the record under its synthesized column.
                let key = format!("{alias}.{attribute}");
                Ok(record.get(&key).cloned().unwrap_or(V::Null))
            }
            Exp::Add(a, b) => Ok(ops::add(&a.eval(record, functions)?, &b.eval(record, functions)?)?),
            Exp::Sub(a, b) => Ok(ops::sub(&a.eval(record, functions)?, &b.eval(record, functions)?)?),
            Exp::Mul(a, b) => Ok(ops::mul(&a.eval(record, functions)?, &b.eval(record, functions)?)?),
            Exp::Div(a, b) => Ok(ops::div(&a.eval(record, functions)?, &b.eval(record, functions)?)?),
            Exp::Mod(a, b) => Ok(ops::modulo(&a.eval(record, functions)?, &b.eval(record, functions)?)?),
            Exp::Neg(a) => Ok(ops::neg(&a.eval(record, functions)?)?),
            Exp::FunctionCall { name, args } => {
                let values = args
                    .iter()
                    .map(|a| a.eval(record, functions))
                    .collect::<QueryResult<Vec<_>>>()?;
                functions(name, &values)
            }
        }
    }
}
