//! `Node` and `Edge`: the two graph entity kinds, each an id plus a label
//! (or relationship-type) tag and an [`AttributeSet`].

use crate::attribute_set::AttributeSet;
use crate::types::{EdgeId, LabelId, NodeId, RelTypeId};
use crate::value::{EdgeRef, NodeRef, V};

/// Behavior shared by `Node` and `Edge`: both carry an attribute set and
/// can be projected into a [`V`] for inclusion in a result row.
pub trait GraphEntity {
    fn attrs(&self) -> &AttributeSet;
    fn attrs_mut(&mut self) -> &mut AttributeSet;
    fn to_value(&self) -> V;
}

#[derive(Debug, Clone)]
pub struct Node {
    pub id: NodeId,
    pub labels: Vec<LabelId>,
    pub attrs: AttributeSet,
}

impl Node {
    pub fn new(id: NodeId) -> Self {
        Self { id, labels: Vec::new(), attrs: AttributeSet::new() }
    }

    pub fn has_label(&self, label: LabelId) -> bool {
        self.labels.contains(&label)
    }

    pub fn add_label(&mut self, label: LabelId) {
        if !self.has_label(label) {
            self.labels.push(label);
        }
    }

    pub fn remove_label(&mut self, label: LabelId) -> bool {
        let before = self.labels.len();
        self.labels.retain(|l| *l != label);
        self.labels.len() != before
    }
}

impl GraphEntity for Node {
    fn attrs(&self) -> &AttributeSet {
        &self.attrs
    }

    fn attrs_mut(&mut self) -> &mut AttributeSet {
        &mut self.attrs
    }

    fn to_value(&self) -> V {
        V::Node(NodeRef {
            id: self.id,
            labels: self.labels.iter().map(|l| l.get()).collect(),
        })
    }
}

#[derive(Debug, Clone)]
pub struct Edge {
    pub id: EdgeId,
    pub rel_type: RelTypeId,
    pub src: NodeId,
    pub dest: NodeId,
    pub attrs: AttributeSet,
}

impl Edge {
    pub fn new(id: EdgeId, rel_type: RelTypeId, src: NodeId, dest: NodeId) -> Self {
        Self { id, rel_type, src, dest, attrs: AttributeSet::new() }
    }

    pub fn is_self_loop(&self) -> bool {
        self.src == self.dest
    }
}

impl GraphEntity for Edge {
    fn attrs(&self) -> &AttributeSet {
        &self.attrs
    }

    fn attrs_mut(&mut self) -> &mut AttributeSet {
        &mut self.attrs
    }

    fn to_value(&self) -> V {
        V::Edge(EdgeRef { id: self.id, rel_type: self.rel_type.get(), src: self.src, dest: self.dest })
    }
}
