//! Result sets and the two wire-format encoders a host exposes to its
//! clients (§4.7 "sinks", §6 "wire/result encoding").
//!
//! A query either commits its mutations and reports [`ExecutionStats`], or
//! drains its compiled operator tree into a [`ResultSet`]: column headers
//! named after the `RETURN`/`WITH` projection, the buffered rows, and the
//! same execution statistics every query reports regardless of whether it
//! produced rows. [`verbose_row`] and [`compact_row`] are the two per-row
//! encoders named in §6; both need `&GraphStore` to resolve a node's or
//! edge's current attributes and schema names, since a projected [`V::Node`]
//! / [`V::Edge`] carries only an id and cached label/rel-type tags.

use crate::graph::entities::GraphEntity;
use crate::graph::store::GraphStore;
use crate::plan::{ExecutionStats, Operator, QueryCtx};
use crate::record::Record;
use crate::types::{AttrId, LabelId, RelTypeId};
use crate::value::{render, V};
use serde_json::{Number, Value as Json};

/// Compact-protocol type tag (§6). A column header always reports
/// [`ColumnKind::Scalar`] — the tag that varies per row travels with each
/// value, not the header, since `RETURN n.age` may yield `integer` or
/// `null` on different rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeTag {
    Null = 1,
    String = 2,
    Integer = 3,
    Boolean = 4,
    Double = 5,
    Array = 6,
    Edge = 7,
    Node = 8,
    Path = 9,
    Map = 10,
    Point = 11,
}

impl TypeTag {
    /// Map a runtime value to its wire tag. The temporal variants
    /// (`Datetime`, `LocalDateTime`, `Date`, `Time`, `LocalTime`,
    /// `Duration`) have no slot of their own in the original 11-tag table;
    /// they travel as `String`, carrying their ISO-8601 rendering
    /// ([`render::display`]) as the wire value.
    pub fn of(v: &V) -> TypeTag {
        match v {
            V::Null => TypeTag::Null,
            V::String(_) => TypeTag::String,
            V::Int64(_) => TypeTag::Integer,
            V::Bool(_) => TypeTag::Boolean,
            V::Double(_) => TypeTag::Double,
            V::Array(_) => TypeTag::Array,
            V::Edge(_) => TypeTag::Edge,
            V::Node(_) => TypeTag::Node,
            V::Path(_) => TypeTag::Path,
            V::Map(_) => TypeTag::Map,
            V::Point(_) => TypeTag::Point,
            V::Datetime(_) | V::LocalDateTime(_) | V::Date(_) | V::Time(_) | V::LocalTime(_) | V::Duration(_) => TypeTag::String,
        }
    }

    pub fn code(self) -> u8 {
        self as u8
    }
}

/// The only column kind §6 names for the compact protocol; kept as an enum
/// rather than a bare constant so a host extending the wire format (e.g. an
/// "all properties" projection shorthand) has somewhere to add a variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Scalar,
}

#[derive(Debug, Clone)]
pub struct ColumnHeader {
    pub name: String,
    pub kind: ColumnKind,
}

impl ColumnHeader {
    pub fn scalar(name: impl Into<String>) -> Self {
        Self { name: name.into(), kind: ColumnKind::Scalar }
    }
}

/// A drained, buffered result of one query (§6 "a result set comprising:
/// column headers ..., row iterator, and execution statistics").
#[derive(Debug, Clone)]
pub struct ResultSet {
    pub headers: Vec<ColumnHeader>,
    pub rows: Vec<Vec<V>>,
    pub stats: ExecutionStats,
}

impl ResultSet {
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }
}

/// Pull every row out of `root` into a buffered [`ResultSet`], projecting
/// each [`Record`] down to the columns named by `headers` at the positions
/// given in `column_idxs` (the planner's final `RETURN`/`WITH` column list,
/// which may be a subset of a wider internal record schema once named-path
/// and intermediate bindings are accounted for).
pub fn drain(
    root: &mut dyn Operator,
    ctx: &mut QueryCtx,
    headers: Vec<ColumnHeader>,
    column_idxs: &[usize],
) -> crate::errors::QueryResult<ResultSet> {
    debug_assert_eq!(headers.len(), column_idxs.len());
    let mut rows = Vec::new();
    while let Some(record) = root.consume(ctx)? {
        rows.push(project_row(&record, column_idxs));
    }
    Ok(ResultSet { headers, rows, stats: ctx.stats.clone() })
}

fn project_row(record: &Record, column_idxs: &[usize]) -> Vec<V> {
    column_idxs.iter().map(|&i| record.get_at(i).cloned().unwrap_or(V::Null)).collect()
}

fn label_name(store: &GraphStore, id: u16) -> String {
    store.schema().label_name(LabelId::new(id)).map(|n| n.to_string()).unwrap_or_default()
}

fn rel_type_name(store: &GraphStore, id: u16) -> String {
    store.schema().rel_type_name(RelTypeId::new(id)).map(|n| n.to_string()).unwrap_or_default()
}

fn attr_name(store: &GraphStore, id: AttrId) -> String {
    store.schema().attr_name(id).map(|n| n.to_string()).unwrap_or_default()
}

fn double_json(d: f64) -> Json {
    Json::String(render::format_float_15g(d))
}

fn int_json(i: i64) -> Json {
    Json::Number(i.into())
}

/// Verbose encoding of one value (§6: nodes as `[id, labels[], properties]`,
/// edges as `[id, type, src, dst, properties]`, properties as
/// `[key, value]` pairs, doubles at 15-digit precision). Unlike
/// [`compact_value`] this never prefixes a value with a type tag — a
/// verbose row pairs the whole value with its column *name* instead, in
/// [`verbose_row`].
pub fn verbose_value(v: &V, store: &GraphStore) -> Json {
    match v {
        V::Null => Json::Null,
        V::Bool(b) => Json::Bool(*b),
        V::Int64(i) => int_json(*i),
        V::Double(d) => double_json(*d),
        V::String(s) => Json::String(s.to_string()),
        V::Array(items) => Json::Array(items.iter().map(|i| verbose_value(i, store)).collect()),
        V::Map(entries) => Json::Array(
            entries.iter().map(|(k, val)| Json::Array(vec![Json::String(k.to_string()), verbose_value(val, store)])).collect(),
        ),
        V::Point(p) => Json::Array(vec![
            Json::Number(Number::from_f64(p.lat).unwrap_or_else(|| 0.into())),
            Json::Number(Number::from_f64(p.lon).unwrap_or_else(|| 0.into())),
        ]),
        V::Node(n) => {
            let labels = Json::Array(n.labels.iter().map(|l| Json::String(label_name(store, *l))).collect());
            let properties = store
                .get_node(n.id)
                .map(|node| {
                    Json::Array(
                        node.attrs()
                            .iter()
                            .map(|(attr, val)| Json::Array(vec![Json::String(attr_name(store, attr)), verbose_value(val, store)]))
                            .collect(),
                    )
                })
                .unwrap_or_else(|| Json::Array(Vec::new()));
            Json::Array(vec![int_json(n.id.get() as i64), labels, properties])
        }
        V::Edge(e) => {
            let properties = store
                .get_edge(e.id)
                .map(|edge| {
                    Json::Array(
                        edge.attrs()
                            .iter()
                            .map(|(attr, val)| Json::Array(vec![Json::String(attr_name(store, attr)), verbose_value(val, store)]))
                            .collect(),
                    )
                })
                .unwrap_or_else(|| Json::Array(Vec::new()));
            Json::Array(vec![
                int_json(e.id.get() as i64),
                Json::String(rel_type_name(store, e.rel_type)),
                int_json(e.src.get() as i64),
                int_json(e.dest.get() as i64),
                properties,
            ])
        }
        V::Path(p) => Json::Array(vec![
            Json::Array(p.nodes.iter().map(|id| verbose_value(&V::Node(crate::value::NodeRef { id: *id, labels: Vec::new() }), store)).collect()),
            Json::Array(p.edges.iter().filter_map(|id| store.get_edge(*id)).map(|e| verbose_value(&e.to_value(), store)).collect()),
        ]),
        V::Datetime(_) | V::LocalDateTime(_) | V::Date(_) | V::Time(_) | V::LocalTime(_) | V::Duration(_) => {
            Json::String(render::display(v))
        }
    }
}

/// One verbose-format row: each column's value paired with its name,
/// `[name, value]` (§6).
pub fn verbose_row(headers: &[ColumnHeader], row: &[V], store: &GraphStore) -> Json {
    Json::Array(
        headers
            .iter()
            .zip(row)
            .map(|(h, v)| Json::Array(vec![Json::String(h.name.clone()), verbose_value(v, store)]))
            .collect(),
    )
}

/// Compact encoding of one value's body, *without* its leading type tag —
/// the caller ([`compact_row`] or a recursive call from an array/map/path)
/// supplies the tag. Nodes carry `label_ids[]` and `properties_by_id`
/// (`[attr_id, [type_tag, value]]` triplets collapsed to a 2-tuple since
/// the inner pair already is the tagged encoding); edges carry
/// `rel_id`/`src_id`/`dst_id` the same way (§6).
fn compact_value(v: &V, store: &GraphStore) -> Json {
    match v {
        V::Null => Json::Null,
        V::Bool(b) => Json::Bool(*b),
        V::Int64(i) => int_json(*i),
        V::Double(d) => double_json(*d),
        V::String(s) => Json::String(s.to_string()),
        V::Array(items) => Json::Array(items.iter().map(|i| compact_tagged(i, store)).collect()),
        V::Map(entries) => Json::Array(
            entries.iter().map(|(k, val)| Json::Array(vec![Json::String(k.to_string()), compact_tagged(val, store)])).collect(),
        ),
        V::Point(p) => Json::Array(vec![
            Json::Number(Number::from_f64(p.lat).unwrap_or_else(|| 0.into())),
            Json::Number(Number::from_f64(p.lon).unwrap_or_else(|| 0.into())),
        ]),
        V::Node(n) => {
            let label_ids = Json::Array(n.labels.iter().map(|l| int_json(*l as i64)).collect());
            let properties = store
                .get_node(n.id)
                .map(|node| {
                    Json::Array(node.attrs().iter().map(|(attr, val)| Json::Array(vec![int_json(attr.get() as i64), compact_tagged(val, store)])).collect())
                })
                .unwrap_or_else(|| Json::Array(Vec::new()));
            Json::Array(vec![int_json(n.id.get() as i64), label_ids, properties])
        }
        V::Edge(e) => {
            let properties = store
                .get_edge(e.id)
                .map(|edge| {
                    Json::Array(edge.attrs().iter().map(|(attr, val)| Json::Array(vec![int_json(attr.get() as i64), compact_tagged(val, store)])).collect())
                })
                .unwrap_or_else(|| Json::Array(Vec::new()));
            Json::Array(vec![
                int_json(e.id.get() as i64),
                int_json(e.rel_type as i64),
                int_json(e.src.get() as i64),
                int_json(e.dest.get() as i64),
                properties,
            ])
        }
        V::Path(p) => Json::Array(vec![
            Json::Array(p.nodes.iter().filter_map(|id| store.get_node(*id)).map(|n| compact_tagged(&n.to_value(), store)).collect()),
            Json::Array(p.edges.iter().filter_map(|id| store.get_edge(*id)).map(|e| compact_tagged(&e.to_value(), store)).collect()),
        ]),
        V::Datetime(_) | V::LocalDateTime(_) | V::Date(_) | V::Time(_) | V::LocalTime(_) | V::Duration(_) => {
            Json::String(render::display(v))
        }
    }
}

/// A full `[type_tag, value]` pair (§6), used wherever a compact encoding
/// nests another value — array elements, map entries, path segments.
fn compact_tagged(v: &V, store: &GraphStore) -> Json {
    Json::Array(vec![Json::Number(TypeTag::of(v).code().into()), compact_value(v, store)])
}

/// One compact-format row: each column's value as `[type_tag, value]` (§6).
pub fn compact_row(row: &[V], store: &GraphStore) -> Json {
    Json::Array(row.iter().map(|v| compact_tagged(v, store)).collect())
}

/// Whole-result-set verbose encoding: header names, every row through
/// [`verbose_row`], and the execution statistics (§6).
pub fn verbose_result(result: &ResultSet, store: &GraphStore) -> Json {
    Json::Array(vec![
        Json::Array(result.headers.iter().map(|h| Json::String(h.name.clone())).collect()),
        Json::Array(result.rows.iter().map(|r| verbose_row(&result.headers, r, store)).collect()),
        stats_json(&result.stats),
    ])
}

/// Whole-result-set compact encoding: headers as `[name, scalar-marker]`
/// pairs (every header reports [`ColumnKind::Scalar`], §6), every row
/// through [`compact_row`], and the execution statistics.
pub fn compact_result(result: &ResultSet, store: &GraphStore) -> Json {
    let headers = result
        .headers
        .iter()
        .map(|h| {
            let kind = match h.kind {
                ColumnKind::Scalar => "scalar",
            };
            Json::Array(vec![Json::String(h.name.clone()), Json::String(kind.into())])
        })
        .collect();
    Json::Array(vec![Json::Array(headers), Json::Array(result.rows.iter().map(|r| compact_row(r, store)).collect()), stats_json(&result.stats)])
}

fn stats_json(stats: &ExecutionStats) -> Json {
    let mut map = serde_json::Map::new();
    map.insert("nodes_created".into(), int_json(stats.nodes_created as i64));
    map.insert("nodes_deleted".into(), int_json(stats.nodes_deleted as i64));
    map.insert("relationships_created".into(), int_json(stats.relationships_created as i64));
    map.insert("relationships_deleted".into(), int_json(stats.relationships_deleted as i64));
    map.insert("properties_set".into(), int_json(stats.properties_set as i64));
    map.insert("labels_added".into(), int_json(stats.labels_added as i64));
    map.insert("labels_removed".into(), int_json(stats.labels_removed as i64));
    Json::Object(map)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::scan::UnitScan;
    use crate::record::RecordSchema;
    use crate::types::SchemaName;

    fn noop_functions(_name: &str, _args: &[V]) -> crate::errors::QueryResult<V> {
        Err(crate::errors::QueryError::invalid_argument("test", "no functions registered"))
    }

    #[test]
    fn type_tag_assigns_temporal_values_to_string() {
        assert_eq!(TypeTag::of(&V::Int64(1)), TypeTag::Integer);
        assert_eq!(TypeTag::of(&V::Date(chrono::NaiveDate::from_ymd_opt(2020, 1, 1).unwrap())), TypeTag::String);
    }

    #[test]
    fn drain_projects_requested_columns_in_order() {
        let mut store = GraphStore::new();
        let functions = std::sync::Arc::new(noop_functions);
        let mut ctx = QueryCtx::new(&mut store, functions);
        let schema = RecordSchema::new(vec!["a".into(), "b".into()]);
        let mut scan = UnitScan::new(schema);
        let headers = vec![ColumnHeader::scalar("b"), ColumnHeader::scalar("a")];
        let result = drain(&mut scan, &mut ctx, headers, &[1, 0]).unwrap();
        assert_eq!(result.row_count(), 1);
        assert_eq!(result.rows[0], vec![V::Null, V::Null]);
    }

    #[test]
    fn compact_row_wraps_each_value_with_its_type_tag() {
        let store = GraphStore::new();
        let row = vec![V::Int64(5), V::from("x")];
        let json = compact_row(&row, &store);
        let Json::Array(entries) = json else { panic!("expected array") };
        assert_eq!(entries[0], Json::Array(vec![Json::Number(3.into()), int_json(5)]));
        assert_eq!(entries[1], Json::Array(vec![Json::Number(2.into()), Json::String("x".into())]));
    }

    #[test]
    fn verbose_row_pairs_each_value_with_its_column_name() {
        let store = GraphStore::new();
        let headers = vec![ColumnHeader::scalar("n")];
        let row = vec![V::Bool(true)];
        let json = verbose_row(&headers, &row, &store);
        assert_eq!(json, Json::Array(vec![Json::Array(vec![Json::String("n".into()), Json::Bool(true)])]));
    }

    #[test]
    fn verbose_node_includes_resolved_label_names_and_properties() {
        let mut store = GraphStore::new();
        let person = store.schema_mut().get_or_create_label(SchemaName::new("Person").unwrap());
        let age = store.schema_mut().get_or_create_attr(SchemaName::new("age").unwrap()).unwrap();
        let n = store.create_node(vec![person]);
        store.set_node_attr(n, age, V::Int64(30)).unwrap();
        let node = store.get_node(n).unwrap().to_value();

        let json = verbose_value(&node, &store);
        let Json::Array(fields) = json else { panic!("expected array") };
        assert_eq!(fields[1], Json::Array(vec![Json::String("Person".into())]));
        assert_eq!(fields[2], Json::Array(vec![Json::Array(vec![Json::String("age".into()), int_json(30)])]));
    }

    #[test]
    fn double_renders_at_fifteen_digit_precision_as_a_string() {
        let store = GraphStore::new();
        assert_eq!(compact_value(&V::Double(1.0), &store), Json::String("1.0".into()));
    }
}
