//! `Sort` (§4.7): materialize the child's full output, then merge-sort by a
//! composite key whose components each carry their own ascending/
//! descending direction.

use super::{check_cancelled, Operator, QueryCtx};
use crate::errors::QueryResult;
use crate::expr::Exp;
use crate::record::Record;
use crate::value::ops::total_order;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

#[derive(Debug)]
pub struct SortKey {
    pub expr: Exp,
    pub direction: SortDirection,
}

#[derive(Debug)]
pub struct Sort {
    child: super::BoxOperator,
    keys: Vec<SortKey>,
    buffer: Option<std::vec::IntoIter<Record>>,
}

impl Sort {
    pub fn new(child: super::BoxOperator, keys: Vec<SortKey>) -> Self {
        Self { child, keys, buffer: None }
    }

    fn materialize(&mut self, ctx: &mut QueryCtx) -> QueryResult<()> {
        let mut rows = Vec::new();
        while let Some(row) = self.child.consume(ctx)? {
            rows.push(row);
        }
        let functions = ctx.functions.clone();
        let eval = |exp: &Exp, rec: &Record| exp.eval(rec, &|n, a| (functions)(n, a));
        let mut keyed: Vec<(Vec<crate::value::V>, Record)> = Vec::with_capacity(rows.len());
        for row in rows {
            let key = self.keys.iter().map(|k| eval(&k.expr, &row)).collect::<QueryResult<Vec<_>>>()?;
            keyed.push((key, row));
        }
        keyed.sort_by(|(a, _), (b, _)| {
            for (i, key) in self.keys.iter().enumerate() {
                let ord = total_order(&a[i], &b[i]);
                let ord = match key.direction {
                    SortDirection::Ascending => ord,
                    SortDirection::Descending => ord.reverse(),
                };
                if ord != std::cmp::Ordering::Equal {
                    return ord;
                }
            }
            std::cmp::Ordering::Equal
        });
        self.buffer = Some(keyed.into_iter().map(|(_, r)| r).collect::<Vec<_>>().into_iter());
        Ok(())
    }
}

impl Operator for Sort {
    fn consume(&mut self, ctx: &mut QueryCtx) -> QueryResult<Option<Record>> {
        check_cancelled(ctx)?;
        if self.buffer.is_none() {
            self.materialize(ctx)?;
        }
        Ok(self.buffer.as_mut().and_then(|it| it.next()))
    }

    fn reset(&mut self) {
        self.buffer = None;
        self.child.reset();
    }
}
