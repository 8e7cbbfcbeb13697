// Engine benchmarks: filter-tree evaluation, matrix iteration, and
// aggregate grouping at a few representative sizes.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use graphcore::graph::matrix::RelationMatrix;
use graphcore::{CompareOp, Exp, FilterTree, GraphStore, Operator, QueryCtx, Record, RecordSchema, V};
use std::sync::Arc;

fn noop_functions(_name: &str, _args: &[V]) -> graphcore::QueryResult<V> {
    Err(graphcore::QueryError::invalid_argument("bench", "no functions registered"))
}

/// Feeds a fixed in-memory row set through an operator tree, standing in
/// for a leaf scan so the aggregate benchmark can drive a real
/// `Aggregate` operator without first building a graph.
#[derive(Debug)]
struct VecScan {
    rows: std::vec::IntoIter<Record>,
}

impl VecScan {
    fn new(rows: Vec<Record>) -> Self {
        Self { rows: rows.into_iter() }
    }
}

impl Operator for VecScan {
    fn consume(&mut self, _ctx: &mut QueryCtx) -> graphcore::QueryResult<Option<Record>> {
        Ok(self.rows.next())
    }
}

fn bench_filter_apply(c: &mut Criterion) {
    let mut group = c.benchmark_group("filter_apply");

    let tree = FilterTree::and(
        FilterTree::Pred { lhs: Exp::Alias("age".into()), op: CompareOp::Gt, rhs: Exp::Const(V::Int64(18)) },
        FilterTree::Pred { lhs: Exp::Alias("age".into()), op: CompareOp::Lt, rhs: Exp::Const(V::Int64(65)) },
    );
    let schema = RecordSchema::new(vec!["age".into()]);

    for size in [100, 10_000].iter() {
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, &size| {
            let records: Vec<Record> = (0..size)
                .map(|i| {
                    let mut r = Record::new(schema.clone());
                    r.set("age", V::Int64((i % 90) as i64));
                    r
                })
                .collect();

            b.iter(|| {
                let mut admitted = 0;
                for r in &records {
                    if tree.apply(r, &noop_functions).unwrap().is_true() {
                        admitted += 1;
                    }
                }
                black_box(admitted)
            });
        });
    }

    group.finish();
}

fn bench_relation_matrix_expand(c: &mut Criterion) {
    use graphcore::{EdgeId, NodeId};

    let mut group = c.benchmark_group("relation_matrix_expand");

    for size in [100u64, 10_000].iter() {
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, &size| {
            let mut matrix = RelationMatrix::new();
            for i in 0..size {
                let src = NodeId::new(i).unwrap();
                let dest = NodeId::new((i + 1) % size).unwrap();
                matrix.insert(src, dest, EdgeId::new(i).unwrap());
            }

            b.iter(|| {
                let mut total = 0usize;
                for i in 0..size {
                    total += matrix.successors(NodeId::new(i).unwrap()).len();
                }
                black_box(total)
            });
        });
    }

    group.finish();
}

fn bench_aggregate_grouping(c: &mut Criterion) {
    use graphcore::plan::aggregate::{AggFunc, Aggregate, Aggregation};

    let mut group = c.benchmark_group("aggregate_grouping");
    let functions: Arc<dyn Fn(&str, &[V]) -> graphcore::QueryResult<V> + Send + Sync> = Arc::new(noop_functions);

    for size in [100, 10_000].iter() {
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, &size| {
            let schema = RecordSchema::new(vec!["k".into(), "v".into()]);
            let records: Vec<Record> = (0..size)
                .map(|i| {
                    let mut r = Record::new(schema.clone());
                    r.set("k", V::Int64((i % 10) as i64));
                    r.set("v", V::Int64(i as i64));
                    r
                })
                .collect();

            b.iter(|| {
                let mut store = GraphStore::new();
                let mut ctx = QueryCtx::new(&mut store, functions.clone());
                let aggregations = vec![Aggregation { func: AggFunc::Sum, arg: Exp::Alias("v".into()), percentile: None, distinct: false, dest_idx: 1 }];
                let mut aggregate = Aggregate::new(Box::new(VecScan::new(records.clone())), schema.clone(), vec![(Exp::Alias("k".into()), 0)], aggregations);
                let mut total_groups = 0;
                while aggregate.consume(&mut ctx).unwrap().is_some() {
                    total_groups += 1;
                }
                black_box(total_groups)
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_filter_apply, bench_relation_matrix_expand, bench_aggregate_grouping);
criterion_main!(benches);
