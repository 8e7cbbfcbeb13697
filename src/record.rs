//! `Record`: one row flowing through the execution plan, indexed by the
//! alias-to-column mapping established when the plan was compiled.

use crate::value::V;
use std::sync::Arc;

/// Maps an alias name to its column position in every `Record` produced by
/// a given plan. Shared (via `Arc`) across every record a plan produces so
/// cloning a `Record` never re-allocates the mapping.
#[derive(Debug, Clone, Default)]
pub struct RecordSchema {
    aliases: Arc<Vec<String>>,
}

impl RecordSchema {
    pub fn new(aliases: Vec<String>) -> Self {
        Self { aliases: Arc::new(aliases) }
    }

    pub fn index_of(&self, alias: &str) -> Option<usize> {
        self.aliases.iter().position(|a| a == alias)
    }

    pub fn width(&self) -> usize {
        self.aliases.len()
    }

    pub fn aliases(&self) -> &[String] {
        &self.aliases
    }

    /// Extend this schema with a new alias, returning the new schema and
    /// the index the alias was assigned. Used when an operator (`expand`,
    /// `apply`) introduces a binding its children didn't have.
    pub fn with_alias(&self, alias: impl Into<String>) -> (RecordSchema, usize) {
        let mut aliases = self.aliases.as_ref().clone();
        aliases.push(alias.into());
        let idx = aliases.len() - 1;
        (RecordSchema { aliases: Arc::new(aliases) }, idx)
    }
}

#[derive(Debug, Clone)]
pub struct Record {
    schema: RecordSchema,
    values: Vec<V>,
}

impl Record {
    pub fn new(schema: RecordSchema) -> Self {
        let values = vec![V::Null; schema.width()];
        Self { schema, values }
    }

    pub fn schema(&self) -> &RecordSchema {
        &self.schema
    }

    pub fn get(&self, alias: &str) -> Option<&V> {
        self.schema.index_of(alias).map(|i| &self.values[i])
    }

    pub fn get_at(&self, idx: usize) -> Option<&V> {
        self.values.get(idx)
    }

    pub fn set(&mut self, alias: &str, value: V) {
        if let Some(idx) = self.schema.index_of(alias) {
            self.values[idx] = value;
        }
    }

    pub fn set_at(&mut self, idx: usize, value: V) {
        if idx < self.values.len() {
            self.values[idx] = value;
        }
    }

    /// Grow this record's backing storage to match a schema extended via
    /// [`RecordSchema::with_alias`], filling the new slot with `V::Null`.
    pub fn extended(mut self, schema: RecordSchema) -> Self {
        self.values.resize(schema.width(), V::Null);
        self.schema = schema;
        self
    }

    pub fn values(&self) -> &[V] {
        &self.values
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_and_get_by_alias() {
        let schema = RecordSchema::new(vec!["n".into(), "m".into()]);
        let mut r = Record::new(schema);
        r.set("n", V::Int64(1));
        assert_eq!(r.get("n"), Some(&V::Int64(1)));
        assert_eq!(r.get("m"), Some(&V::Null));
        assert_eq!(r.get("missing"), None);
    }

    #[test]
    fn extending_schema_preserves_prior_values() {
        let schema = RecordSchema::new(vec!["n".into()]);
        let mut r = Record::new(schema.clone());
        r.set("n", V::Int64(7));
        let (extended_schema, idx) = schema.with_alias("m");
        let mut r2 = r.extended(extended_schema);
        r2.set_at(idx, V::Int64(9));
        assert_eq!(r2.get("n"), Some(&V::Int64(7)));
        assert_eq!(r2.get("m"), Some(&V::Int64(9)));
    }
}
