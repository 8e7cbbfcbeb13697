//! End-to-end coverage for the six seed scenarios: hand-built operator
//! trees standing in for a compiled query plan, since this crate has no
//! parser of its own.

use graphcore::constraints::{Constraint, ConstraintKind, EntityType, SchemaId};
use graphcore::graph::schema::IndexTarget;
use graphcore::plan::call_subquery::{CallSubquery, SubplanBuilder};
use graphcore::plan::expand::Expand;
use graphcore::plan::filter::Filter as FilterOp;
use graphcore::plan::mutate::{Create, EdgeTemplate, NodeTemplate};
use graphcore::plan::project::{ComputedColumn, Project, PropertyColumn};
use graphcore::plan::scan::{IndexScan, NodeByLabelScan, UnitScan};
use graphcore::{
    constraints, filter::index_pushdown::push_down, procedures, resultset, BoxOperator, CompareOp, Direction, Exp,
    FilterTree, Operator, QueryCtx, QueryResult, Record, RecordSchema, SchemaName, GraphStore, V,
};
use std::collections::HashSet;
use std::sync::Arc;

fn test_functions() -> graphcore::plan::FunctionRegistry {
    Arc::new(|name: &str, _args: &[V]| Err(graphcore::QueryError::invalid_argument(name, "no functions registered in this test")))
}

fn name(s: &str) -> SchemaName {
    SchemaName::new(s.to_string()).unwrap()
}

/// Feeds exactly one pre-built row through the pipeline, standing in for
/// whatever outer binding a compiled plan would already have produced.
#[derive(Debug)]
struct SeedRow(Option<Record>);

impl Operator for SeedRow {
    fn consume(&mut self, _ctx: &mut QueryCtx) -> QueryResult<Option<Record>> {
        Ok(self.0.take())
    }
}

/// Re-shapes a child's record onto an unrelated target schema, copying
/// only the named `(dest_idx, source_idx)` pairs and leaving everything
/// else `V::Null` — the mechanism [`CallSubquery`] relies on to let a
/// subquery's `RETURN` overlay just the columns it actually names onto
/// the outer row (§4.4's projection-restoring rewrite).
#[derive(Debug)]
struct Remap {
    child: BoxOperator,
    schema: RecordSchema,
    mapping: Vec<(usize, usize)>,
}

impl Operator for Remap {
    fn consume(&mut self, ctx: &mut QueryCtx) -> QueryResult<Option<Record>> {
        let Some(src) = self.child.consume(ctx)? else { return Ok(None) };
        let mut rec = Record::new(self.schema.clone());
        for (dest, source) in &self.mapping {
            rec.set_at(*dest, src.get_at(*source).cloned().unwrap_or(V::Null));
        }
        Ok(Some(rec))
    }

    fn reset(&mut self) {
        self.child.reset();
    }
}

// 1. CREATE (a:P {name:'x'})-[:R {w:2}]->(b:P {name:'y'}); stats, then a MATCH round-trip.
#[test]
fn create_then_match_emits_expected_row_and_stats() {
    let mut store = GraphStore::new();
    let r = store.schema_mut().get_or_create_rel_type(name("R"));
    let name_attr = store.schema_mut().get_or_create_attr(name("name")).unwrap();
    let w_attr = store.schema_mut().get_or_create_attr(name("w")).unwrap();
    let functions = test_functions();

    {
        let mut ctx = QueryCtx::new(&mut store, functions.clone());
        let schema = RecordSchema::new(vec!["a".into(), "b".into(), "r".into()]);
        let nodes = vec![
            NodeTemplate { dest_idx: 0, labels: vec![name("P")], attrs: vec![(name_attr, Exp::Const(V::from("x")))] },
            NodeTemplate { dest_idx: 1, labels: vec![name("P")], attrs: vec![(name_attr, Exp::Const(V::from("y")))] },
        ];
        let edges = vec![EdgeTemplate { dest_idx: 2, rel_type: r, src_idx: 0, dest_node_idx: 1, attrs: vec![(w_attr, Exp::Const(V::Int64(2)))] }];
        let mut create = Create::new(Box::new(UnitScan::new(RecordSchema::new(vec![]))), schema, nodes, edges);
        while create.consume(&mut ctx).unwrap().is_some() {}

        assert_eq!(ctx.stats.nodes_created, 2);
        assert_eq!(ctx.stats.relationships_created, 1);
        assert_eq!(ctx.stats.properties_set, 3);
        // Both node templates name the same label; `P` is a brand-new
        // schema entry the first time it's resolved (the first node), and
        // a cache hit for the second, so labels_added counts the distinct
        // schema, not the per-node label write (spec.md:303).
        assert_eq!(ctx.stats.labels_added, 1);
    }

    let p = store.schema().resolve_label(&name("P")).unwrap();
    // MATCH (a:P)-[r:R]->(b:P) RETURN a.name, b.name, r.w
    let mut ctx = QueryCtx::new(&mut store, functions);
    let scan_schema = RecordSchema::new(vec!["a".into()]);
    let scan = NodeByLabelScan::new(scan_schema.clone(), "a", ctx.store.nodes_with_label(p));
    let (schema1, r_idx) = scan_schema.with_alias("r");
    let (schema2, b_idx) = schema1.with_alias("b");
    let expand = Expand::new(Box::new(scan), schema2.clone(), "a", Some("r"), "b", vec![r], Direction::Outgoing);

    let (schema3, a_name_idx) = schema2.with_alias("a.name");
    let (schema4, b_name_idx) = schema3.with_alias("b.name");
    let (schema5, r_w_idx) = schema4.with_alias("r.w");
    let properties = vec![
        PropertyColumn { source_idx: 0, attribute_name: "name".into(), dest_idx: a_name_idx },
        PropertyColumn { source_idx: b_idx, attribute_name: "name".into(), dest_idx: b_name_idx },
        PropertyColumn { source_idx: r_idx, attribute_name: "w".into(), dest_idx: r_w_idx },
    ];
    let mut project = Project::new(Box::new(expand), schema5, properties, vec![]);

    let headers = vec![
        resultset::ColumnHeader::scalar("a.name"),
        resultset::ColumnHeader::scalar("b.name"),
        resultset::ColumnHeader::scalar("r.w"),
    ];
    let result = resultset::drain(&mut project, &mut ctx, headers, &[a_name_idx, b_name_idx, r_w_idx]).unwrap();

    assert_eq!(result.row_count(), 1);
    assert_eq!(result.rows[0], vec![V::from("x"), V::from("y"), V::Int64(2)]);
}

// 2. A unique index on P.age turns `MATCH (n:P {age:30})` into an `IndexScan`
// with no residual filter, and returns exactly the matching node.
#[test]
fn unique_indexed_match_produces_index_scan_with_no_residual_filter() {
    let mut store = GraphStore::new();
    let p = store.schema_mut().get_or_create_label(name("P"));
    let age_attr = store.schema_mut().get_or_create_attr(name("age")).unwrap();
    let name_attr = store.schema_mut().get_or_create_attr(name("name")).unwrap();
    store.create_index(IndexTarget::Node, p, age_attr);
    let functions = test_functions();

    {
        let mut ctx = QueryCtx::new(&mut store, functions.clone());
        let schema = RecordSchema::new(vec!["n".into()]);
        let nodes = vec![
            NodeTemplate { dest_idx: 0, labels: vec![name("P")], attrs: vec![(age_attr, Exp::Const(V::Int64(30))), (name_attr, Exp::Const(V::from("a")))] },
        ];
        let mut create = Create::new(Box::new(UnitScan::new(RecordSchema::new(vec![]))), schema.clone(), nodes, vec![]);
        while create.consume(&mut ctx).unwrap().is_some() {}
        let nodes2 = vec![
            NodeTemplate { dest_idx: 0, labels: vec![name("P")], attrs: vec![(age_attr, Exp::Const(V::Int64(31))), (name_attr, Exp::Const(V::from("b")))] },
        ];
        let mut create2 = Create::new(Box::new(UnitScan::new(RecordSchema::new(vec![]))), schema, nodes2, vec![]);
        while create2.consume(&mut ctx).unwrap().is_some() {}
    }

    let indexed: HashSet<String> = ["age".to_string()].into_iter().collect();
    let tree = FilterTree::Pred { lhs: Exp::Property { alias: "n".into(), attribute: "age".into() }, op: CompareOp::Eq, rhs: Exp::Const(V::Int64(30)) };
    let (query, residual) = push_down(&tree, "n", &indexed);
    assert!(residual.is_none(), "a fully indexed equality predicate leaves no residual filter");
    let query = query.unwrap();

    let mut ctx = QueryCtx::new(&mut store, functions);
    let schema = RecordSchema::new(vec!["n".into()]);
    let scan = IndexScan::new(schema.clone(), "n", p, age_attr, &query, ctx.store);
    let (schema1, name_idx) = schema.with_alias("n.name");
    let mut project = Project::new(
        Box::new(scan),
        schema1,
        vec![PropertyColumn { source_idx: 0, attribute_name: "name".into(), dest_idx: name_idx }],
        vec![],
    );

    let headers = vec![resultset::ColumnHeader::scalar("n.name")];
    let result = resultset::drain(&mut project, &mut ctx, headers, &[name_idx]).unwrap();
    assert_eq!(result.row_count(), 1);
    assert_eq!(result.rows[0], vec![V::from("a")]);
}

// 3. `n.v > 5 AND n.v < 5` collapses to `IndexQueryNode::Empty` regardless
// of what the index actually holds: zero rows, zero work at the expand layer.
#[test]
fn contradictory_range_collapses_to_zero_rows() {
    let mut store = GraphStore::new();
    let l = store.schema_mut().get_or_create_label(name("L"));
    let v_attr = store.schema_mut().get_or_create_attr(name("v")).unwrap();
    store.create_index(IndexTarget::Node, l, v_attr);
    let functions = test_functions();
    {
        let mut ctx = QueryCtx::new(&mut store, functions.clone());
        let schema = RecordSchema::new(vec!["n".into()]);
        let nodes = vec![NodeTemplate { dest_idx: 0, labels: vec![name("L")], attrs: vec![(v_attr, Exp::Const(V::Int64(5)))] }];
        let mut create = Create::new(Box::new(UnitScan::new(RecordSchema::new(vec![]))), schema, nodes, vec![]);
        while create.consume(&mut ctx).unwrap().is_some() {}
    }

    let indexed: HashSet<String> = ["v".to_string()].into_iter().collect();
    let tree = FilterTree::and(
        FilterTree::Pred { lhs: Exp::Property { alias: "n".into(), attribute: "v".into() }, op: CompareOp::Gt, rhs: Exp::Const(V::Int64(5)) },
        FilterTree::Pred { lhs: Exp::Property { alias: "n".into(), attribute: "v".into() }, op: CompareOp::Lt, rhs: Exp::Const(V::Int64(5)) },
    );
    let (query, _residual) = push_down(&tree, "n", &indexed);
    let query = query.unwrap();
    assert_eq!(query, graphcore::filter::index_pushdown::IndexQueryNode::Empty);

    let mut ctx = QueryCtx::new(&mut store, functions);
    let schema = RecordSchema::new(vec!["n".into()]);
    let mut scan = IndexScan::new(schema, "n", l, v_attr, &query, ctx.store);
    assert!(scan.consume(&mut ctx).unwrap().is_none());
}

// 4. A duplicate value under an active unique constraint is detected after
// the creating rows commit; the undo log rolls the store back to its
// pre-query state while the constraint itself stays `Active`.
#[test]
fn rollback_restores_pre_query_state_after_a_unique_violation() {
    let mut store = GraphStore::new();
    let p = store.schema_mut().get_or_create_label(name("P"));
    let id_attr = store.schema_mut().get_or_create_attr(name("id")).unwrap();

    let constraint = Constraint::new_pending(ConstraintKind::Unique, EntityType::Node, SchemaId::Label(p), vec![id_attr]);
    constraints::enforce(&constraint, &store, &mut || {});
    assert_eq!(constraint.status(), graphcore::ConstraintStatus::Active);

    let pre_query_count = store.all_node_ids().count();
    let functions = test_functions();
    let mut ctx = QueryCtx::new(&mut store, functions);

    let schema = RecordSchema::new(vec!["a".into(), "b".into()]);
    let nodes = vec![
        NodeTemplate { dest_idx: 0, labels: vec![name("P")], attrs: vec![(id_attr, Exp::Const(V::Int64(1)))] },
        NodeTemplate { dest_idx: 1, labels: vec![name("P")], attrs: vec![(id_attr, Exp::Const(V::Int64(1)))] },
    ];
    let mut create = Create::new(Box::new(UnitScan::new(RecordSchema::new(vec![]))), schema, nodes, vec![]);
    while create.consume(&mut ctx).unwrap().is_some() {}
    assert_eq!(ctx.stats.nodes_created, 2);

    // Simulate the constraint re-check a host runs against the rows this
    // statement just touched: two live `P` nodes share `id = 1`.
    let mut seen_ids = HashSet::new();
    let mut violated = false;
    for id in ctx.store.nodes_with_label(p) {
        let value = ctx.store.get_node(id).and_then(|n| n.attrs.get(id_attr)).cloned();
        if let Some(v) = value {
            if !seen_ids.insert(format!("{v:?}")) {
                violated = true;
            }
        }
    }
    assert!(violated, "both created nodes share id=1");

    ctx.undo.rollback(ctx.store);

    assert_eq!(ctx.store.all_node_ids().count(), pre_query_count);
    assert_eq!(constraint.status(), graphcore::ConstraintStatus::Active);
}

// 5. `MATCH (n) CALL { WITH n CREATE (n)-[:R]->(:X) RETURN 1 AS k } RETURN k`
// against 3 `P` nodes creates 3 `X` nodes and 3 `R` edges, one subquery
// invocation per outer row.
#[test]
fn eager_correlated_subquery_runs_once_per_outer_row() {
    let mut store = GraphStore::new();
    let p = store.schema_mut().get_or_create_label(name("P"));
    let x_label = store.schema_mut().get_or_create_label(name("X"));
    let r = store.schema_mut().get_or_create_rel_type(name("R"));
    for _ in 0..3 {
        store.create_node(vec![p]);
    }
    let functions = test_functions();
    let mut ctx = QueryCtx::new(&mut store, functions);

    let outer_schema0 = RecordSchema::new(vec!["n".into()]);
    let scan = NodeByLabelScan::new(outer_schema0.clone(), "n", ctx.store.nodes_with_label(p));
    let (outer_schema1, k_idx) = outer_schema0.with_alias("k");

    let builder: SubplanBuilder = Box::new(move |left: &Record| {
        let n_val = left.get("n").cloned().unwrap_or(V::Null);
        let inner_schema0 = RecordSchema::new(vec!["@n".into()]);
        let mut seed = Record::new(inner_schema0.clone());
        seed.set_at(0, n_val);

        let (s1, x_idx) = inner_schema0.with_alias("x");
        let (s2, r_idx) = s1.with_alias("r");
        let nodes = vec![NodeTemplate { dest_idx: x_idx, labels: vec![name("X")], attrs: vec![] }];
        let edges = vec![EdgeTemplate { dest_idx: r_idx, rel_type: r, src_idx: 0, dest_node_idx: x_idx, attrs: vec![] }];
        let create = Create::new(Box::new(SeedRow(Some(seed))), s2.clone(), nodes, edges);

        let (s3, k_idx_inner) = s2.with_alias("k");
        let computed = vec![ComputedColumn { expr: Exp::Const(V::Int64(1)), dest_idx: k_idx_inner }];
        let projected = Project::new(Box::new(create), s3, vec![], computed);

        Box::new(Remap { child: Box::new(projected), schema: outer_schema1.clone(), mapping: vec![(k_idx, k_idx_inner)] })
    });

    let mut call = CallSubquery::new(Box::new(scan), builder, outer_schema1, true);
    let mut k_values = Vec::new();
    while let Some(row) = call.consume(&mut ctx).unwrap() {
        k_values.push(row.get_at(k_idx).cloned().unwrap());
    }

    assert_eq!(k_values, vec![V::Int64(1), V::Int64(1), V::Int64(1)]);
    assert_eq!(ctx.stats.nodes_created, 3);
    assert_eq!(ctx.stats.relationships_created, 3);
    assert_eq!(ctx.store.nodes_with_label(x_label).len(), 3);
}

// 6. `algo.SPpaths({sourceNode:a, targetNode:c, relTypes:['E'], weightProp:'w',
// pathCount:2})` over `(a)-[:E{w:1}]->(b)-[:E{w:1}]->(c)` and `(a)-[:E{w:3}]->(c)`
// emits the two-hop path (weight 2) before the one-hop path (weight 3).
#[test]
fn path_finding_orders_results_by_weight_then_cost_then_length() {
    let mut store = GraphStore::new();
    let e = store.schema_mut().get_or_create_rel_type(name("E"));
    let w = store.schema_mut().get_or_create_attr(name("w")).unwrap();
    let a = store.create_node(vec![]);
    let b = store.create_node(vec![]);
    let c = store.create_node(vec![]);
    let e1 = store.create_edge(e, a, b).unwrap();
    store.set_edge_attr(e1, w, V::Int64(1)).unwrap();
    let e2 = store.create_edge(e, b, c).unwrap();
    store.set_edge_attr(e2, w, V::Int64(1)).unwrap();
    let e3 = store.create_edge(e, a, c).unwrap();
    store.set_edge_attr(e3, w, V::Int64(3)).unwrap();

    let mut config = procedures::path::PathConfig::new(a, vec![e]);
    config.target_node = Some(c);
    config.weight_prop = Some(w);
    config.path_count = 2;

    let rows = procedures::all_paths_rows(&store, &config);
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0][1], V::Double(2.0));
    assert_eq!(rows[1][1], V::Double(3.0));
    let V::Path(first) = &rows[0][0] else { panic!("expected a path value") };
    assert_eq!(first.edges.len(), 2);
    let V::Path(second) = &rows[1][0] else { panic!("expected a path value") };
    assert_eq!(second.edges.len(), 1);
}
