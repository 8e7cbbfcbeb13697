//! `Aggregate` (§4.7): partitions rows by a group-by key, maintains
//! per-group aggregator state (`sum`/`avg`/`min`/`max`/`count`/
//! `percentile_disc`/`percentile_cont`/`stdev`/`stdevp`/`collect`) and
//! emits one row per group on input exhaustion. The `distinct` variant
//! filters each aggregator's inputs through a set keyed by `hash64(v)`.

use super::{check_cancelled, Operator, QueryCtx};
use crate::errors::QueryResult;
use crate::expr::Exp;
use crate::record::{Record, RecordSchema};
use crate::value::hashing::hash64;
use crate::value::ops::total_order;
use crate::value::V;
use indexmap::IndexMap;
use std::collections::HashSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggFunc {
    Sum,
    Avg,
    Min,
    Max,
    Count,
    Collect,
    PercentileDisc,
    PercentileCont,
    Stdev,
    StdevP,
}

#[derive(Debug, Clone)]
pub struct Aggregation {
    pub func: AggFunc,
    pub arg: Exp,
    /// Second argument for `percentile_disc`/`percentile_cont` (the
    /// percentile, `0.0..=1.0`); unused otherwise.
    pub percentile: Option<f64>,
    pub distinct: bool,
    pub dest_idx: usize,
}

#[derive(Default)]
struct AggState {
    count: u64,
    sum: f64,
    sum_present: bool,
    min: Option<V>,
    max: Option<V>,
    values: Vec<V>,
    seen: HashSet<u64>,
}

impl AggState {
    fn feed(&mut self, agg: &Aggregation, value: V) {
        if value.is_null() {
            return;
        }
        if agg.distinct {
            let h = hash64(&value);
            if !self.seen.insert(h) {
                return;
            }
        }
        // `COUNT` over an array-valued operand counts every element,
        // including nested nulls, rather than the array itself as one item.
        if matches!(agg.func, AggFunc::Count) {
            if let V::Array(items) = &value {
                self.count += items.len() as u64;
                return;
            }
        }
        self.count += 1;
        if let V::Int64(i) = value {
            self.sum += i as f64;
            self.sum_present = true;
        } else if let V::Double(d) = value {
            self.sum += d;
            self.sum_present = true;
        }
        match &self.min {
            Some(cur) if total_order(&value, cur) != std::cmp::Ordering::Less => {}
            _ => self.min = Some(value.clone()),
        }
        match &self.max {
            Some(cur) if total_order(&value, cur) != std::cmp::Ordering::Greater => {}
            _ => self.max = Some(value.clone()),
        }
        self.values.push(value);
    }

    fn finalize(&self, agg: &Aggregation) -> QueryResult<V> {
        match agg.func {
            AggFunc::Count => Ok(V::Int64(self.count as i64)),
            AggFunc::Sum => Ok(if self.sum_present { V::Double(self.sum) } else { V::Int64(0) }),
            AggFunc::Avg => Ok(if self.count == 0 { V::Null } else { V::Double(self.sum / self.count as f64) }),
            AggFunc::Min => Ok(self.min.clone().unwrap_or(V::Null)),
            AggFunc::Max => Ok(self.max.clone().unwrap_or(V::Null)),
            AggFunc::Collect => Ok(V::array(self.values.clone())),
            AggFunc::Stdev | AggFunc::StdevP => {
                if self.values.is_empty() {
                    return Ok(V::Null);
                }
                let nums: Vec<f64> = self.values.iter().filter_map(as_f64).collect();
                if nums.is_empty() {
                    return Ok(V::Null);
                }
                let mean = nums.iter().sum::<f64>() / nums.len() as f64;
                let variance_sum: f64 = nums.iter().map(|v| (v - mean).powi(2)).sum();
                let denom = if agg.func == AggFunc::Stdev { (nums.len() as f64 - 1.0).max(1.0) } else { nums.len() as f64 };
                Ok(V::Double((variance_sum / denom).sqrt()))
            }
            AggFunc::PercentileDisc | AggFunc::PercentileCont => {
                let p = agg.percentile.unwrap_or(0.5).clamp(0.0, 1.0);
                let mut nums: Vec<f64> = self.values.iter().filter_map(as_f64).collect();
                if nums.is_empty() {
                    return Ok(V::Null);
                }
                nums.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
                let rank = p * (nums.len() as f64 - 1.0);
                if agg.func == AggFunc::PercentileDisc {
                    Ok(V::Double(nums[rank.round() as usize]))
                } else {
                    let lo = rank.floor() as usize;
                    let hi = rank.ceil() as usize;
                    if lo == hi {
                        Ok(V::Double(nums[lo]))
                    } else {
                        let frac = rank - lo as f64;
                        Ok(V::Double(nums[lo] + (nums[hi] - nums[lo]) * frac))
                    }
                }
            }
        }
    }
}

fn as_f64(v: &V) -> Option<f64> {
    match v {
        V::Int64(i) => Some(*i as f64),
        V::Double(d) => Some(*d),
        _ => None,
    }
}

#[derive(Debug)]
pub struct Aggregate {
    child: super::BoxOperator,
    schema: RecordSchema,
    group_keys: Vec<(Exp, usize)>,
    aggregations: Vec<Aggregation>,
    output: Option<std::vec::IntoIter<Record>>,
}

impl Aggregate {
    pub fn new(child: super::BoxOperator, schema: RecordSchema, group_keys: Vec<(Exp, usize)>, aggregations: Vec<Aggregation>) -> Self {
        Self { child, schema, group_keys, aggregations, output: None }
    }

    fn materialize(&mut self, ctx: &mut QueryCtx) -> QueryResult<()> {
        let mut groups: IndexMap<Vec<u64>, (Vec<V>, Vec<AggState>)> = IndexMap::new();
        while let Some(row) = self.child.consume(ctx)? {
            check_cancelled(ctx)?;
            let functions = ctx.functions.clone();
            let eval = |exp: &Exp| exp.eval(&row, &|n, a| (functions)(n, a));
            let key_values = self.group_keys.iter().map(|(e, _)| eval(e)).collect::<QueryResult<Vec<_>>>()?;
            let key_hash: Vec<u64> = key_values.iter().map(hash64).collect();
            let entry = groups.entry(key_hash).or_insert_with(|| (key_values.clone(), self.aggregations.iter().map(|_| AggState::default()).collect()));
            for (agg, state) in self.aggregations.iter().zip(entry.1.iter_mut()) {
                let value = eval(&agg.arg)?;
                state.feed(agg, value);
            }
        }

        let mut rows = Vec::with_capacity(groups.len());
        for (key_values, states) in groups.into_values() {
            let mut record = Record::new(self.schema.clone());
            for ((_, idx), value) in self.group_keys.iter().zip(key_values) {
                record.set_at(*idx, value);
            }
            for (agg, state) in self.aggregations.iter().zip(states.iter()) {
                record.set_at(agg.dest_idx, state.finalize(agg)?);
            }
            rows.push(record);
        }
        self.output = Some(rows.into_iter());
        Ok(())
    }
}

impl Operator for Aggregate {
    fn consume(&mut self, ctx: &mut QueryCtx) -> QueryResult<Option<Record>> {
        check_cancelled(ctx)?;
        if self.output.is_none() {
            self.materialize(ctx)?;
        }
        Ok(self.output.as_mut().and_then(|it| it.next()))
    }

    fn reset(&mut self) {
        self.output = None;
        self.child.reset();
    }
}
