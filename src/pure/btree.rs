//! Generic B+ tree used as the backing structure for exact-match attribute
//! indexes (`graph::schema::ExactMatchIndex`).
//!
//! All functions here are pure (no side effects, deterministic) so the
//! index-push-down planner (`filter::index_pushdown`) and the constraint
//! enforcer (`constraints::enforce`) can reason about them without holding
//! any lock beyond the `BTreeRoot` value itself.

use std::cmp::Ordering as CmpOrdering;
use std::fmt;

/// B+ tree node types, generic over an ordered key and an arbitrary payload.
#[derive(Debug, Clone, PartialEq)]
pub enum BTreeNode<K, V> {
    Leaf {
        keys: Vec<K>,
        values: Vec<V>,
        next_leaf: Option<Box<BTreeNode<K, V>>>,
    },
    Internal {
        keys: Vec<K>,
        children: Vec<Box<BTreeNode<K, V>>>,
    },
}

/// Minimum degree (t). Maximum keys per node is `2t - 1`, minimum `t - 1`.
pub const MIN_DEGREE: usize = 3;
pub const MAX_KEYS: usize = 2 * MIN_DEGREE - 1;
pub const MIN_KEYS: usize = MIN_DEGREE - 1;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BTreeError(pub String);

impl fmt::Display for BTreeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for BTreeError {}

type BResult<T> = Result<T, BTreeError>;

fn bterr<T>(msg: impl Into<String>) -> BResult<T> {
    Err(BTreeError(msg.into()))
}

/// Tree root wrapper.
#[derive(Debug, Clone)]
pub struct BTreeRoot<K, V> {
    pub root: Option<Box<BTreeNode<K, V>>>,
    pub height: u32,
    pub total_keys: usize,
}

impl<K: Ord + Clone, V: Clone> BTreeNode<K, V> {
    pub fn is_leaf(&self) -> bool {
        matches!(self, BTreeNode::Leaf { .. })
    }

    pub fn key_count(&self) -> usize {
        match self {
            BTreeNode::Leaf { keys, .. } => keys.len(),
            BTreeNode::Internal { keys, .. } => keys.len(),
        }
    }

    pub fn needs_split(&self) -> bool {
        self.key_count() > MAX_KEYS
    }

    pub fn keys(&self) -> &[K] {
        match self {
            BTreeNode::Leaf { keys, .. } => keys,
            BTreeNode::Internal { keys, .. } => keys,
        }
    }
}

pub fn create_empty_tree<K, V>() -> BTreeRoot<K, V> {
    BTreeRoot {
        root: None,
        height: 0,
        total_keys: 0,
    }
}

fn create_leaf_node<K, V>() -> BTreeNode<K, V> {
    BTreeNode::Leaf {
        keys: Vec::with_capacity(MAX_KEYS + 1),
        values: Vec::with_capacity(MAX_KEYS + 1),
        next_leaf: None,
    }
}

fn create_internal_node<K, V>() -> BTreeNode<K, V> {
    BTreeNode::Internal {
        keys: Vec::with_capacity(MAX_KEYS + 1),
        children: Vec::with_capacity(MAX_KEYS + 2),
    }
}

/// Search for a value by exact key match.
pub fn search_in_tree<K: Ord + Clone, V: Clone>(root: &BTreeRoot<K, V>, key: &K) -> Option<V> {
    let mut current = root.root.as_ref()?;
    loop {
        match current.as_ref() {
            BTreeNode::Leaf { keys, values, .. } => {
                return keys.binary_search(key).ok().map(|i| values[i].clone());
            }
            BTreeNode::Internal { keys, children } => {
                let child_index = match keys.binary_search(key) {
                    Ok(index) => index + 1,
                    Err(index) => index,
                };
                if child_index >= children.len() {
                    return None;
                }
                current = &children[child_index];
            }
        }
    }
}

/// Range scan `[lo, hi)` over the leaf chain, in ascending key order.
/// `lo`/`hi` of `None` are unbounded on that side.
pub fn range_in_tree<K: Ord + Clone, V: Clone>(
    root: &BTreeRoot<K, V>,
    lo: Option<&K>,
    hi: Option<&K>,
) -> Vec<(K, V)> {
    let Some(root_node) = root.root.as_ref() else {
        return Vec::new();
    };
    let mut leaf = descend_to_leaf(root_node, lo);
    let mut out = Vec::new();
    while let Some(node) = leaf {
        if let BTreeNode::Leaf {
            keys,
            values,
            next_leaf,
        } = node.as_ref()
        {
            for (k, v) in keys.iter().zip(values.iter()) {
                if let Some(l) = lo {
                    if k < l {
                        continue;
                    }
                }
                if let Some(h) = hi {
                    if k >= h {
                        return out;
                    }
                }
                out.push((k.clone(), v.clone()));
            }
            leaf = next_leaf.as_ref();
        } else {
            break;
        }
    }
    out
}

fn descend_to_leaf<'a, K: Ord + Clone, V: Clone>(
    node: &'a BTreeNode<K, V>,
    lo: Option<&K>,
) -> Option<&'a Box<BTreeNode<K, V>>> {
    match node {
        BTreeNode::Internal { keys, children } => {
            let idx = match lo {
                None => 0,
                Some(k) => match keys.binary_search(k) {
                    Ok(i) => i + 1,
                    Err(i) => i,
                },
            };
            let child = children.get(idx)?;
            match child.as_ref() {
                BTreeNode::Leaf { .. } => Some(child),
                BTreeNode::Internal { .. } => descend_to_leaf(child, lo),
            }
        }
        BTreeNode::Leaf { .. } => None,
    }
}

fn insert_key_value_in_leaf<K: Ord + Clone, V: Clone>(
    mut node: BTreeNode<K, V>,
    key: K,
    value: V,
) -> BResult<BTreeNode<K, V>> {
    if let BTreeNode::Leaf {
        ref mut keys,
        ref mut values,
        ..
    } = node
    {
        match keys.binary_search(&key) {
            Ok(index) => values[index] = value,
            Err(index) => {
                keys.insert(index, key);
                values.insert(index, value);
            }
        }
        Ok(node)
    } else {
        bterr("cannot insert key-value into non-leaf node")
    }
}

fn split_leaf_node<K: Ord + Clone, V: Clone>(
    node: BTreeNode<K, V>,
) -> BResult<(BTreeNode<K, V>, K, BTreeNode<K, V>)> {
    if let BTreeNode::Leaf {
        keys,
        values,
        next_leaf,
    } = node
    {
        if keys.len() <= MAX_KEYS {
            return bterr("node does not need splitting");
        }
        let mid_index = keys.len() / 2;
        let mut left_keys = keys;
        let mut left_values = values;
        let right_keys = left_keys.split_off(mid_index);
        let right_values = left_values.split_off(mid_index);
        let median_key = right_keys[0].clone();

        let left_node = BTreeNode::Leaf {
            keys: left_keys,
            values: left_values,
            next_leaf: None,
        };
        let right_node = BTreeNode::Leaf {
            keys: right_keys,
            values: right_values,
            next_leaf,
        };
        Ok((left_node, median_key, right_node))
    } else {
        bterr("cannot split non-leaf node with leaf split function")
    }
}

fn split_internal_node<K: Ord + Clone, V: Clone>(
    node: BTreeNode<K, V>,
) -> BResult<(BTreeNode<K, V>, K, BTreeNode<K, V>)> {
    if let BTreeNode::Internal { keys, children } = node {
        if keys.len() <= MAX_KEYS {
            return bterr("node does not need splitting");
        }
        let mid_index = keys.len() / 2;
        let mut left_keys = keys;
        let mut left_children = children;
        let right_keys = left_keys.split_off(mid_index + 1);
        let right_children = left_children.split_off(mid_index + 1);
        let median_key = left_keys.pop().expect("split point guarantees a key");

        let left_node = BTreeNode::Internal {
            keys: left_keys,
            children: left_children,
        };
        let right_node = BTreeNode::Internal {
            keys: right_keys,
            children: right_children,
        };
        Ok((left_node, median_key, right_node))
    } else {
        bterr("cannot split leaf node with internal split function")
    }
}

/// Insert a key-value pair into the tree, replacing the value if the key
/// already exists.
pub fn insert_into_tree<K: Ord + Clone, V: Clone>(
    mut root: BTreeRoot<K, V>,
    key: K,
    value: V,
) -> BResult<BTreeRoot<K, V>> {
    if root.root.is_none() {
        let leaf = insert_key_value_in_leaf(create_leaf_node(), key, value)?;
        root.root = Some(Box::new(leaf));
        root.height = 1;
        root.total_keys = 1;
        return Ok(root);
    }

    let exists = search_in_tree(&root, &key).is_some();
    let root_node = root.root.take().expect("checked above");
    let (new_root, split) = insert_recursive(root_node, key, value)?;

    if let Some((left_child, median_key, right_child)) = split {
        let mut new_internal = create_internal_node();
        if let BTreeNode::Internal {
            ref mut keys,
            ref mut children,
        } = new_internal
        {
            keys.push(median_key);
            children.push(left_child);
            children.push(right_child);
        }
        root.root = Some(Box::new(new_internal));
        root.height += 1;
    } else {
        root.root = Some(new_root);
    }

    if !exists {
        root.total_keys += 1;
    }
    Ok(root)
}

#[allow(clippy::type_complexity)]
fn insert_recursive<K: Ord + Clone, V: Clone>(
    mut node: Box<BTreeNode<K, V>>,
    key: K,
    value: V,
) -> BResult<(Box<BTreeNode<K, V>>, Option<(Box<BTreeNode<K, V>>, K, Box<BTreeNode<K, V>>)>)> {
    match node.as_mut() {
        BTreeNode::Leaf { .. } => {
            *node = insert_key_value_in_leaf(*node, key, value)?;
            if node.needs_split() {
                let (left, median, right) = split_leaf_node(*node)?;
                Ok((Box::new(left.clone()), Some((Box::new(left), median, Box::new(right)))))
            } else {
                Ok((node, None))
            }
        }
        BTreeNode::Internal { keys, children } => {
            let child_index = match keys.binary_search(&key) {
                Ok(index) => index + 1,
                Err(index) => index,
            };
            let child = children.remove(child_index);
            let (new_child, split_info) = insert_recursive(child, key, value)?;

            if let Some((left_child, median_key, right_child)) = split_info {
                keys.insert(child_index, median_key);
                children.insert(child_index, left_child);
                children.insert(child_index + 1, right_child);

                if keys.len() > MAX_KEYS {
                    let (left, median, right) = split_internal_node(*node)?;
                    Ok((Box::new(left.clone()), Some((Box::new(left), median, Box::new(right)))))
                } else {
                    Ok((node, None))
                }
            } else {
                children.insert(child_index, new_child);
                Ok((node, None))
            }
        }
    }
}

/// Delete a key from the tree. A no-op if the key is absent.
pub fn delete_from_tree<K: Ord + Clone, V: Clone>(
    mut root: BTreeRoot<K, V>,
    key: &K,
) -> BResult<BTreeRoot<K, V>> {
    if search_in_tree(&root, key).is_none() {
        return Ok(root);
    }

    let root_node = root.root.take().expect("key found implies a root");
    let new_root = delete_recursive(root_node, key)?;

    if let Some(new_root_node) = new_root {
        if let BTreeNode::Internal { keys, children } = new_root_node.as_ref() {
            if keys.is_empty() && children.len() == 1 {
                root.root = Some(children[0].clone());
                root.height = root.height.saturating_sub(1);
            } else {
                root.root = Some(new_root_node);
            }
        } else {
            root.root = Some(new_root_node);
        }
    } else {
        root.root = None;
        root.height = 0;
    }

    root.total_keys = root.total_keys.saturating_sub(1);
    Ok(root)
}

fn delete_recursive<K: Ord + Clone, V: Clone>(
    mut node: Box<BTreeNode<K, V>>,
    key: &K,
) -> BResult<Option<Box<BTreeNode<K, V>>>> {
    match node.as_mut() {
        BTreeNode::Leaf { keys, values, .. } => {
            if let Ok(index) = keys.binary_search(key) {
                keys.remove(index);
                values.remove(index);
            }
            if keys.is_empty() {
                Ok(None)
            } else {
                Ok(Some(node))
            }
        }
        BTreeNode::Internal { keys, children } => {
            let child_index = match keys.binary_search(key) {
                Ok(index) => index + 1,
                Err(index) => index,
            };
            let child = children.remove(child_index);
            let new_child = delete_recursive(child, key)?;

            if let Some(new_child_node) = new_child {
                children.insert(child_index, new_child_node);
                if child_index < children.len() {
                    let child_keys = children[child_index].key_count();
                    if child_keys < MIN_KEYS {
                        rebalance_after_deletion(keys, children, child_index)?;
                    }
                }
            } else if child_index > 0 && child_index <= keys.len() {
                keys.remove(child_index - 1);
            }
            Ok(Some(node))
        }
    }
}

fn rebalance_after_deletion<K: Ord + Clone, V: Clone>(
    keys: &mut Vec<K>,
    children: &mut Vec<Box<BTreeNode<K, V>>>,
    child_index: usize,
) -> BResult<()> {
    if child_index > 0 && children[child_index - 1].key_count() > MIN_KEYS {
        return borrow_from_left_sibling(keys, children, child_index);
    }
    if child_index < children.len() - 1 && children[child_index + 1].key_count() > MIN_KEYS {
        return borrow_from_right_sibling(keys, children, child_index);
    }
    if child_index > 0 {
        merge_with_left_sibling(keys, children, child_index)
    } else if child_index < children.len() - 1 {
        merge_with_right_sibling(keys, children, child_index)
    } else {
        Ok(())
    }
}

fn borrow_from_left_sibling<K: Ord + Clone, V: Clone>(
    parent_keys: &mut [K],
    children: &mut [Box<BTreeNode<K, V>>],
    child_index: usize,
) -> BResult<()> {
    let separator_index = child_index - 1;
    let separator_key = parent_keys[separator_index].clone();
    let (left, right) = children.split_at_mut(child_index);
    let left_child = left.last_mut().ok_or_else(|| BTreeError("missing left sibling".into()))?;
    let right_child = right.first_mut().ok_or_else(|| BTreeError("missing right child".into()))?;

    match (left_child.as_mut(), right_child.as_mut()) {
        (
            BTreeNode::Leaf { keys: lk, values: lv, .. },
            BTreeNode::Leaf { keys: rk, values: rv, .. },
        ) => {
            let bk = lk.pop().ok_or_else(|| BTreeError("left leaf empty".into()))?;
            let bv = lv.pop().ok_or_else(|| BTreeError("left leaf empty".into()))?;
            rk.insert(0, bk.clone());
            rv.insert(0, bv);
            parent_keys[separator_index] = bk;
        }
        (
            BTreeNode::Internal { keys: lk, children: lc },
            BTreeNode::Internal { keys: rk, children: rc },
        ) => {
            rk.insert(0, separator_key);
            let new_sep = lk.pop().ok_or_else(|| BTreeError("left internal empty".into()))?;
            parent_keys[separator_index] = new_sep;
            let bc = lc.pop().ok_or_else(|| BTreeError("left internal has no children".into()))?;
            rc.insert(0, bc);
        }
        _ => return bterr("sibling nodes must be of same kind"),
    }
    Ok(())
}

fn borrow_from_right_sibling<K: Ord + Clone, V: Clone>(
    parent_keys: &mut [K],
    children: &mut [Box<BTreeNode<K, V>>],
    child_index: usize,
) -> BResult<()> {
    let separator_index = child_index;
    let separator_key = parent_keys[separator_index].clone();
    let (left, right) = children.split_at_mut(child_index + 1);
    let left_child = left.last_mut().ok_or_else(|| BTreeError("missing left child".into()))?;
    let right_child = right.first_mut().ok_or_else(|| BTreeError("missing right sibling".into()))?;

    match (left_child.as_mut(), right_child.as_mut()) {
        (
            BTreeNode::Leaf { keys: lk, values: lv, .. },
            BTreeNode::Leaf { keys: rk, values: rv, .. },
        ) => {
            let bk = rk.remove(0);
            let bv = rv.remove(0);
            lk.push(bk);
            lv.push(bv);
            parent_keys[separator_index] = rk[0].clone();
        }
        (
            BTreeNode::Internal { keys: lk, children: lc },
            BTreeNode::Internal { keys: rk, children: rc },
        ) => {
            lk.push(separator_key);
            let new_sep = rk.remove(0);
            parent_keys[separator_index] = new_sep;
            let bc = rc.remove(0);
            lc.push(bc);
        }
        _ => return bterr("sibling nodes must be of same kind"),
    }
    Ok(())
}

fn merge_with_left_sibling<K: Ord + Clone, V: Clone>(
    parent_keys: &mut Vec<K>,
    children: &mut Vec<Box<BTreeNode<K, V>>>,
    child_index: usize,
) -> BResult<()> {
    let separator_index = child_index - 1;
    let separator_key = parent_keys.remove(separator_index);
    let right_node = children.remove(child_index);
    let left_node = &mut children[child_index - 1];

    match (left_node.as_mut(), right_node.as_ref()) {
        (
            BTreeNode::Leaf { keys: lk, values: lv, next_leaf },
            BTreeNode::Leaf { keys: rk, values: rv, next_leaf: rn },
        ) => {
            lk.extend(rk.iter().cloned());
            lv.extend(rv.iter().cloned());
            *next_leaf = rn.clone();
        }
        (
            BTreeNode::Internal { keys: lk, children: lc },
            BTreeNode::Internal { keys: rk, children: rc },
        ) => {
            lk.push(separator_key);
            lk.extend(rk.iter().cloned());
            lc.extend(rc.iter().cloned());
        }
        _ => return bterr("cannot merge nodes of different kinds"),
    }
    Ok(())
}

fn merge_with_right_sibling<K: Ord + Clone, V: Clone>(
    parent_keys: &mut Vec<K>,
    children: &mut Vec<Box<BTreeNode<K, V>>>,
    child_index: usize,
) -> BResult<()> {
    let separator_index = child_index;
    let separator_key = parent_keys.remove(separator_index);
    let left_node = children.remove(child_index);
    let right_node = &mut children[child_index];

    match (left_node.as_ref(), right_node.as_mut()) {
        (
            BTreeNode::Leaf { keys: lk, values: lv, .. },
            BTreeNode::Leaf { keys: rk, values: rv, .. },
        ) => {
            let mut nk = lk.clone();
            nk.extend(rk.iter().cloned());
            *rk = nk;
            let mut nv = lv.clone();
            nv.extend(rv.iter().cloned());
            *rv = nv;
        }
        (
            BTreeNode::Internal { keys: lk, children: lc },
            BTreeNode::Internal { keys: rk, children: rc },
        ) => {
            let mut nk = lk.clone();
            nk.push(separator_key);
            nk.extend(rk.iter().cloned());
            *rk = nk;
            let mut nc = lc.clone();
            nc.extend(rc.iter().cloned());
            *rc = nc;
        }
        _ => return bterr("cannot merge nodes of different kinds"),
    }
    Ok(())
}

pub fn count_total_keys<K, V>(root: &BTreeRoot<K, V>) -> usize {
    root.total_keys
}

/// Invariant check used by tests: keys sorted, fanout bounds respected.
pub fn is_valid_btree<K: Ord + Clone, V: Clone>(root: &BTreeRoot<K, V>) -> bool {
    match root.root.as_ref() {
        Some(node) => check_invariants(node.as_ref(), true).is_ok(),
        None => true,
    }
}

fn check_invariants<K: Ord + Clone, V: Clone>(node: &BTreeNode<K, V>, is_root: bool) -> BResult<()> {
    let key_count = node.key_count();
    if !is_root && key_count < MIN_KEYS {
        return bterr("non-root node has too few keys");
    }
    if key_count > MAX_KEYS {
        return bterr("node has too many keys");
    }
    let keys = node.keys();
    for i in 1..keys.len() {
        if keys[i - 1].cmp(&keys[i]) != CmpOrdering::Less {
            return bterr("keys not in sorted order");
        }
    }
    match node {
        BTreeNode::Leaf { keys, values, .. } => {
            if keys.len() != values.len() {
                return bterr("leaf key/value count mismatch");
            }
        }
        BTreeNode::Internal { keys, children } => {
            if children.len() != keys.len() + 1 {
                return bterr("internal key/child count mismatch");
            }
            for child in children {
                check_invariants(child.as_ref(), false)?;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_tree_creation() {
        let tree: BTreeRoot<i64, &str> = create_empty_tree();
        assert!(tree.root.is_none());
        assert_eq!(tree.total_keys, 0);
    }

    #[test]
    fn single_insertion_and_lookup() {
        let mut tree = create_empty_tree();
        tree = insert_into_tree(tree, 42i64, "node:42").unwrap();
        assert_eq!(tree.total_keys, 1);
        assert_eq!(search_in_tree(&tree, &42i64), Some("node:42"));
        assert_eq!(search_in_tree(&tree, &7i64), None);
    }

    #[test]
    fn many_insertions_trigger_splits_and_stay_valid() {
        let mut tree = create_empty_tree();
        let mut expect = Vec::new();
        for i in 0..200i64 {
            tree = insert_into_tree(tree, i, i * 10).unwrap();
            expect.push((i, i * 10));
        }
        assert_eq!(tree.total_keys, 200);
        assert!(is_valid_btree(&tree));
        for (k, v) in &expect {
            assert_eq!(search_in_tree(&tree, k), Some(*v));
        }
    }

    #[test]
    fn deletions_keep_tree_valid() {
        let mut tree = create_empty_tree();
        for i in 0..64i64 {
            tree = insert_into_tree(tree, i, i).unwrap();
        }
        for i in (0..64i64).step_by(2) {
            tree = delete_from_tree(tree, &i).unwrap();
        }
        assert!(is_valid_btree(&tree));
        assert_eq!(tree.total_keys, 32);
        for i in (1..64i64).step_by(2) {
            assert_eq!(search_in_tree(&tree, &i), Some(i));
        }
        for i in (0..64i64).step_by(2) {
            assert_eq!(search_in_tree(&tree, &i), None);
        }
    }

    #[test]
    fn range_scan_is_ordered_and_bounded() {
        let mut tree = create_empty_tree();
        for i in 0..50i64 {
            tree = insert_into_tree(tree, i, i).unwrap();
        }
        let out = range_in_tree(&tree, Some(&10), Some(&15));
        assert_eq!(out, vec![(10, 10), (11, 11), (12, 12), (13, 13), (14, 14)]);
    }
}
