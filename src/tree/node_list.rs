use super::NodeId;

/// An ordered snapshot of node handles.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NodeList {
    items: Vec<NodeId>,
}

impl NodeList {
    #[must_use]
    pub fn length(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    #[must_use]
    pub fn item(&self, index: usize) -> Option<NodeId> {
        self.items.get(index).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.items.iter().copied()
    }

    #[must_use]
    pub fn as_slice(&self) -> &[NodeId] {
        &self.items
    }
}

impl FromIterator<NodeId> for NodeList {
    fn from_iter<I: IntoIterator<Item = NodeId>>(iter: I) -> Self {
        Self {
            items: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for NodeList {
    type Item = NodeId;
    type IntoIter = std::vec::IntoIter<NodeId>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

impl From<NodeList> for Vec<NodeId> {
    fn from(list: NodeList) -> Self {
        list.items
    }
}
