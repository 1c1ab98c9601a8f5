use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::model::ImageData;

use super::{DataNode, Result, StorageError};

/// Handle of a node owned by [`DataStorage`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(u64);

impl fmt::Display for NodeId {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "#{}", self.0)
    }
}

#[derive(Debug)]
struct Entry {
    node: DataNode,
    parent: Option<NodeId>,
}

/// Arena of data nodes. The storage alone decides node lifetime; everyone
/// else holds [`NodeId`]s and resolves them on each use.
#[derive(Debug, Default)]
pub struct DataStorage {
    entries: BTreeMap<NodeId, Entry>,
    next_id: u64,
}

impl DataStorage {
    pub fn new() -> Self {
        Self::default()
    }

    fn next_id(&mut self) -> NodeId {
        self.next_id = self.next_id.saturating_add(1);
        NodeId(self.next_id)
    }

    pub fn add(&mut self, node: DataNode, parent: Option<NodeId>) -> Result<NodeId> {
        if let Some(parent) = parent {
            if !self.entries.contains_key(&parent) {
                return Err(StorageError::UnknownParent(parent));
            }
        }
        let id = self.next_id();
        debug!(node = %id, parent = ?parent, name = ?node.name(), "node added");
        self.entries.insert(id, Entry { node, parent });
        Ok(id)
    }

    /// Removes a node and hands it back. Its children stay, detached from it.
    pub fn remove(&mut self, id: NodeId) -> Result<DataNode> {
        let entry = self
            .entries
            .remove(&id)
            .ok_or(StorageError::UnknownNode(id))?;
        for child in self.entries.values_mut() {
            if child.parent == Some(id) {
                child.parent = None;
            }
        }
        debug!(node = %id, "node removed");
        Ok(entry.node)
    }

    pub fn exists(&self, id: NodeId) -> bool {
        self.entries.contains_key(&id)
    }

    pub fn get(&self, id: NodeId) -> Option<&DataNode> {
        self.entries.get(&id).map(|entry| &entry.node)
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut DataNode> {
        self.entries.get_mut(&id).map(|entry| &mut entry.node)
    }

    pub fn node(&self, id: NodeId) -> Result<&DataNode> {
        self.get(id).ok_or(StorageError::UnknownNode(id))
    }

    pub fn node_mut(&mut self, id: NodeId) -> Result<&mut DataNode> {
        self.get_mut(id).ok_or(StorageError::UnknownNode(id))
    }

    pub fn data(&self, id: NodeId) -> Option<&ImageData> {
        self.get(id)?.data()
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.entries.get(&id)?.parent
    }

    pub fn children(&self, id: NodeId) -> Vec<NodeId> {
        self.entries
            .iter()
            .filter(|(_, entry)| entry.parent == Some(id))
            .map(|(child, _)| *child)
            .collect()
    }

    pub fn find_by_name(&self, name: &str) -> Option<NodeId> {
        self.entries
            .iter()
            .find(|(_, entry)| entry.node.name() == Some(name))
            .map(|(id, _)| *id)
    }

    pub fn notify_modified(&mut self, id: NodeId) -> Result<()> {
        self.node_mut(id)?.modified();
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
