//! `Filter`: pulls from its child and discards rows whose [`FilterTree`]
//! evaluates to anything but `Tvl::True` (§3.7, §4.5's three-valued logic —
//! `Unknown` is treated as a rejection, same as `False`).

use super::{check_cancelled, Operator, QueryCtx};
use crate::errors::QueryResult;
use crate::filter::FilterTree;
use crate::record::Record;
use crate::value::ops::Tvl;

#[derive(Debug)]
pub struct Filter {
    child: super::BoxOperator,
    tree: FilterTree,
}

impl Filter {
    pub fn new(child: super::BoxOperator, tree: FilterTree) -> Self {
        Self { child, tree }
    }
}

impl Operator for Filter {
    fn consume(&mut self, ctx: &mut QueryCtx) -> QueryResult<Option<Record>> {
        loop {
            check_cancelled(ctx)?;
            let Some(record) = self.child.consume(ctx)? else { return Ok(None) };
            let functions = ctx.functions.clone();
            let verdict = self.tree.apply(&record, &move |name, args| (functions)(name, args))?;
            if verdict == Tvl::True {
                return Ok(Some(record));
            }
        }
    }

    fn reset(&mut self) {
        self.child.reset();
    }
}
