//! `Limit` / `Skip` (§4.7): simple row counters over a child operator.

use super::{check_cancelled, Operator, QueryCtx};
use crate::errors::QueryResult;
use crate::record::Record;

#[derive(Debug)]
pub struct Skip {
    child: super::BoxOperator,
    count: u64,
    skipped: u64,
}

impl Skip {
    pub fn new(child: super::BoxOperator, count: u64) -> Self {
        Self { child, count, skipped: 0 }
    }
}

impl Operator for Skip {
    fn consume(&mut self, ctx: &mut QueryCtx) -> QueryResult<Option<Record>> {
        while self.skipped < self.count {
            check_cancelled(ctx)?;
            if self.child.consume(ctx)?.is_none() {
                return Ok(None);
            }
            self.skipped += 1;
        }
        self.child.consume(ctx)
    }

    fn reset(&mut self) {
        self.skipped = 0;
        self.child.reset();
    }
}

#[derive(Debug)]
pub struct Limit {
    child: super::BoxOperator,
    count: u64,
    emitted: u64,
}

impl Limit {
    pub fn new(child: super::BoxOperator, count: u64) -> Self {
        Self { child, count, emitted: 0 }
    }
}

impl Operator for Limit {
    fn consume(&mut self, ctx: &mut QueryCtx) -> QueryResult<Option<Record>> {
        check_cancelled(ctx)?;
        if self.emitted >= self.count {
            return Ok(None);
        }
        let next = self.child.consume(ctx)?;
        if next.is_some() {
            self.emitted += 1;
        }
        Ok(next)
    }

    fn reset(&mut self) {
        self.emitted = 0;
        self.child.reset();
    }
}
