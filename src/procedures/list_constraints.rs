//! `db.constraints()` (§10.5): one row per declared constraint, columns in
//! the original's `proc_list_constraints.c` order — `type`, `label`,
//! `properties`, `entitytype`, `status`.

use crate::constraints::{Constraint, ConstraintKind, ConstraintRegistry, ConstraintStatus, EntityType, SchemaId};
use crate::graph::store::GraphStore;
use crate::value::V;

pub const COLUMNS: [&str; 5] = ["type", "label", "properties", "entitytype", "status"];

fn type_value(kind: ConstraintKind) -> V {
    V::from(match kind {
        ConstraintKind::Unique => "unique",
        ConstraintKind::Mandatory => "mandatory",
    })
}

fn entity_type_value(entity_type: EntityType) -> V {
    V::from(match entity_type {
        EntityType::Node => "NODE",
        EntityType::Edge => "RELATIONSHIP",
    })
}

fn status_value(status: ConstraintStatus) -> V {
    V::from(match status {
        ConstraintStatus::Active => "OPERATIONAL",
        ConstraintStatus::Pending => "UNDER CONSTRUCTION",
        ConstraintStatus::Failed => "FAILED",
    })
}

fn label_value(store: &GraphStore, schema_id: SchemaId) -> V {
    let name = match schema_id {
        SchemaId::Label(l) => store.schema().label_name(l).map(|n| n.to_string()),
        SchemaId::RelType(r) => store.schema().rel_type_name(r).map(|n| n.to_string()),
    };
    V::from(name.unwrap_or_default())
}

fn properties_value(store: &GraphStore, constraint: &Constraint) -> V {
    let names = constraint
        .attr_ids
        .iter()
        .map(|a| V::from(store.schema().attr_name(*a).map(|n| n.to_string()).unwrap_or_default()))
        .collect();
    V::array(names)
}

fn row(store: &GraphStore, constraint: &Constraint) -> Vec<V> {
    vec![
        type_value(constraint.kind),
        label_value(store, constraint.schema_id),
        properties_value(store, constraint),
        entity_type_value(constraint.entity_type),
        status_value(constraint.status()),
    ]
}

/// Produce the full output of `CALL db.constraints()` against the current
/// registry, in declaration order.
pub fn list_constraints(store: &GraphStore, registry: &ConstraintRegistry) -> Vec<Vec<V>> {
    registry.iter().map(|c| row(store, c)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constraints::Constraint;
    use crate::types::SchemaName;

    #[test]
    fn emits_one_row_per_constraint_in_column_order() {
        let mut store = GraphStore::new();
        let person = store.schema_mut().get_or_create_label(SchemaName::new("Person").unwrap());
        let email = store.schema_mut().get_or_create_attr(SchemaName::new("email").unwrap()).unwrap();

        let mut registry = ConstraintRegistry::new();
        registry.declare(Constraint::new_pending(ConstraintKind::Mandatory, EntityType::Node, SchemaId::Label(person), vec![email]));

        let rows = list_constraints(&store, &registry);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0][0], V::from("mandatory"));
        assert_eq!(rows[0][1], V::from("Person"));
        assert_eq!(rows[0][3], V::from("NODE"));
        assert_eq!(rows[0][4], V::from("UNDER CONSTRUCTION"));
    }
}
