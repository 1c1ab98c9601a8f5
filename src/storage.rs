mod error;
mod node;
mod store;

#[cfg(test)]
mod tests;

pub use error::{Result, StorageError};
pub use node::{DataNode, Property, property_names};
pub use store::{DataStorage, NodeId};
