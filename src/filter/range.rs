//! Per-attribute range tightening (§4.6), supplemented from the original's
//! skiplist-backed range utilities (`src/util/skiplist.c`, `src/util/
//! range/numeric_range.c`, `.../string_range.c`). `sub_trees()` hands index
//! push-down a list of independent predicate subtrees; this module folds
//! every predicate touching one attribute into a single tightened
//! `[min, max]` bound, so `x > 5 AND x < 10` becomes one range rather than
//! two residual predicates, and `x > 5 AND x < 5` becomes a provably empty
//! one the index scan can skip entirely without ever touching the B+ tree.

use super::CompareOp;
use std::cmp::Ordering;

/// One side of a range: `inclusive` tracks whether the bound itself is a
/// valid match (`<=`/`>=`) or excluded (`<`/`>`).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bound<T> {
    pub value: T,
    pub inclusive: bool,
}

/// A tightened `[min, max]` range over a totally ordered scalar domain.
/// `None` on either side means unbounded in that direction.
#[derive(Debug, Clone, PartialEq)]
pub struct Range<T> {
    pub min: Option<Bound<T>>,
    pub max: Option<Bound<T>>,
}

pub type NumericRange = Range<f64>;
pub type StringRange = Range<String>;

impl<T: PartialOrd + Clone> Range<T> {
    pub fn unbounded() -> Self {
        Self { min: None, max: None }
    }

    /// A single-point range (`x = value`), i.e. both bounds closed and equal.
    pub fn point(value: T) -> Self {
        Self {
            min: Some(Bound { value: value.clone(), inclusive: true }),
            max: Some(Bound { value, inclusive: true }),
        }
    }

    /// Tighten the range's lower bound against `x >[=] value`.
    pub fn tighten_min(&mut self, value: T, inclusive: bool) {
        self.min = Some(tighter(self.min.take(), Bound { value, inclusive }, true));
    }

    /// Tighten the range's upper bound against `x <[=] value`.
    pub fn tighten_max(&mut self, value: T, inclusive: bool) {
        self.max = Some(tighter(self.max.take(), Bound { value, inclusive }, false));
    }

    /// Tighten against a single normalized predicate (`attribute <op> value`,
    /// constant already on the right per [`super::normalize`]). `Eq`
    /// collapses both bounds to a point; `Ne`/`In`/string-match ops aren't
    /// representable as a range and are left to the residual filter tree by
    /// the caller (not dispatched here).
    pub fn tighten(&mut self, op: CompareOp, value: T) {
        match op {
            CompareOp::Eq => {
                self.tighten_min(value.clone(), true);
                self.tighten_max(value, true);
            }
            CompareOp::Gt => self.tighten_min(value, false),
            CompareOp::Ge => self.tighten_min(value, true),
            CompareOp::Lt => self.tighten_max(value, false),
            CompareOp::Le => self.tighten_max(value, true),
            _ => {}
        }
    }

    /// A range is invalid (and thus an empty index scan, §4.6 / §8
    /// "range validity") when the tightened bounds cross, or meet at a
    /// point excluded by either side (`x > 5 AND x < 5`).
    pub fn is_empty(&self) -> bool {
        match (&self.min, &self.max) {
            (Some(lo), Some(hi)) => match cmp(&lo.value, &hi.value) {
                Ordering::Greater => true,
                Ordering::Equal => !(lo.inclusive && hi.inclusive),
                Ordering::Less => false,
            },
            _ => false,
        }
    }

    pub fn is_point(&self) -> bool {
        match (&self.min, &self.max) {
            (Some(lo), Some(hi)) => lo.inclusive && hi.inclusive && cmp(&lo.value, &hi.value) == Ordering::Equal,
            _ => false,
        }
    }

    pub fn is_unbounded(&self) -> bool {
        self.min.is_none() && self.max.is_none()
    }
}

fn cmp<T: PartialOrd>(a: &T, b: &T) -> Ordering {
    a.partial_cmp(b).unwrap_or(Ordering::Equal)
}

/// Keep the tighter of an existing bound and a new one. For a lower bound
/// (`is_min`) tighter means larger (or, at equal value, the exclusive one);
/// for an upper bound tighter means smaller.
fn tighter<T: PartialOrd + Clone>(existing: Option<Bound<T>>, incoming: Bound<T>, is_min: bool) -> Bound<T> {
    let Some(existing) = existing else { return incoming };
    let ord = cmp(&incoming.value, &existing.value);
    let incoming_tighter = match ord {
        Ordering::Equal => incoming.inclusive != existing.inclusive && !incoming.inclusive,
        Ordering::Greater => is_min,
        Ordering::Less => !is_min,
    };
    if incoming_tighter {
        incoming
    } else {
        existing
    }
}

/// Named per §10.5's grounding note (`tighten_numeric_range` in the
/// original) — tighten a [`NumericRange`] in place against one predicate.
pub fn tighten_numeric_range(range: &mut NumericRange, op: CompareOp, value: f64) {
    range.tighten(op, value);
}

/// Named per §10.5's grounding note (`tighten_string_range`) — tighten a
/// [`StringRange`] in place against one predicate.
pub fn tighten_string_range(range: &mut StringRange, op: CompareOp, value: String) {
    range.tighten(op, value);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crossed_bounds_are_empty() {
        let mut r = NumericRange::unbounded();
        tighten_numeric_range(&mut r, CompareOp::Gt, 5.0);
        tighten_numeric_range(&mut r, CompareOp::Lt, 5.0);
        assert!(r.is_empty());
    }

    #[test]
    fn equal_closed_bounds_form_a_point_range() {
        let mut r = NumericRange::unbounded();
        tighten_numeric_range(&mut r, CompareOp::Ge, 5.0);
        tighten_numeric_range(&mut r, CompareOp::Le, 5.0);
        assert!(!r.is_empty());
        assert!(r.is_point());
    }

    #[test]
    fn two_sided_open_range_is_valid_and_not_a_point() {
        let mut r = NumericRange::unbounded();
        tighten_numeric_range(&mut r, CompareOp::Gt, 0.0);
        tighten_numeric_range(&mut r, CompareOp::Lt, 10.0);
        assert!(!r.is_empty());
        assert!(!r.is_point());
    }

    #[test]
    fn repeated_tightening_keeps_the_tighter_bound() {
        let mut r = NumericRange::unbounded();
        tighten_numeric_range(&mut r, CompareOp::Gt, 0.0);
        tighten_numeric_range(&mut r, CompareOp::Gt, 5.0);
        assert_eq!(r.min.unwrap().value, 5.0);
    }

    #[test]
    fn string_range_tightens_lexicographically() {
        let mut r = StringRange::unbounded();
        tighten_string_range(&mut r, CompareOp::Ge, "apple".to_string());
        tighten_string_range(&mut r, CompareOp::Lt, "banana".to_string());
        assert!(!r.is_empty());
    }

    #[test]
    fn eq_collapses_both_bounds() {
        let mut r = NumericRange::unbounded();
        tighten_numeric_range(&mut r, CompareOp::Eq, 3.0);
        assert!(r.is_point());
    }

    #[test]
    fn exclusive_meets_inclusive_at_same_point_is_still_empty() {
        let mut r = NumericRange::unbounded();
        tighten_numeric_range(&mut r, CompareOp::Ge, 5.0);
        tighten_numeric_range(&mut r, CompareOp::Lt, 5.0);
        assert!(r.is_empty());
    }
}
