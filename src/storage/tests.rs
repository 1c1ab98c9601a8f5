use crate::model::{Color, Geometry, PixelType, SpatialDim, TimeGeometry, Volume};

use super::{DataNode, DataStorage, Property, StorageError, property_names};

fn small_volume() -> Volume {
    let geometry = TimeGeometry::static_geometry(Geometry::new([2, 2, 2])).expect("geometry");
    Volume::zeros(PixelType::U8, SpatialDim::Three, geometry).expect("volume")
}

#[test]
fn add_resolve_and_remove_nodes() {
    let mut storage = DataStorage::new();
    let mut reference = DataNode::with_data(small_volume());
    reference.set_name("reference");
    let parent = storage.add(reference, None).expect("add reference");
    let child = storage.add(DataNode::new(), Some(parent)).expect("add child");

    assert!(storage.exists(parent));
    assert_eq!(storage.find_by_name("reference"), Some(parent));
    assert_eq!(storage.children(parent), vec![child]);
    assert!(storage.data(parent).is_some());
    assert!(storage.data(child).is_none());

    let removed = storage.remove(parent).expect("remove");
    assert_eq!(removed.name(), Some("reference"));
    assert!(!storage.exists(parent));
    assert_eq!(storage.parent(child), None);
    assert!(matches!(
        storage.remove(parent),
        Err(StorageError::UnknownNode(id)) if id == parent
    ));
}

#[test]
fn add_rejects_unknown_parent() {
    let mut storage = DataStorage::new();
    let id = storage.add(DataNode::new(), None).expect("add");
    storage.remove(id).expect("remove");
    assert!(matches!(
        storage.add(DataNode::new(), Some(id)),
        Err(StorageError::UnknownParent(_))
    ));
    assert!(storage.is_empty());
}

#[test]
fn ids_are_not_reused() {
    let mut storage = DataStorage::new();
    let first = storage.add(DataNode::new(), None).expect("add");
    storage.remove(first).expect("remove");
    let second = storage.add(DataNode::new(), None).expect("add");
    assert_ne!(first, second);
}

#[test]
fn typed_property_accessors() {
    let mut node = DataNode::new();
    node.set_color(Color::GREEN);
    node.set_opacity(0.3);
    node.set_property(property_names::BINARY, Property::Bool(true));
    node.set_property(property_names::LAYER, Property::Int(51));

    assert_eq!(node.color_property(property_names::COLOR), Some(Color::GREEN));
    assert_eq!(node.float_property(property_names::OPACITY), Some(0.3));
    assert_eq!(node.bool_property(property_names::BINARY), Some(true));
    assert_eq!(node.int_property(property_names::LAYER), Some(51));
    assert_eq!(node.bool_property(property_names::LAYER), None);
}

#[test]
fn data_changes_and_notifications_bump_modified_count() {
    let mut storage = DataStorage::new();
    let id = storage.add(DataNode::new(), None).expect("add");
    let before = storage.node(id).expect("node").modified_count();

    storage
        .node_mut(id)
        .expect("node")
        .set_data(Some(small_volume().into()));
    storage.notify_modified(id).expect("notify");
    assert_eq!(storage.node(id).expect("node").modified_count(), before + 2);

    let node = storage.node_mut(id).expect("node");
    let data = node.take_data().expect("data");
    node.restore_data(data);
    assert_eq!(node.modified_count(), before + 2);
}
