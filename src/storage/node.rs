use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::model::{Color, ImageData};

/// Well-known property keys.
pub mod property_names {
    pub const NAME: &str = "name";
    pub const COLOR: &str = "color";
    pub const OPACITY: &str = "opacity";
    pub const BINARY: &str = "binary";
    pub const HELPER_OBJECT: &str = "helper object";
    pub const LAYER: &str = "layer";
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Property {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Color(Color),
}

/// Container pairing optional image data with display properties.
#[derive(Debug, Clone, Default)]
pub struct DataNode {
    data: Option<ImageData>,
    properties: BTreeMap<String, Property>,
    modified: u64,
}

impl DataNode {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_data(data: impl Into<ImageData>) -> Self {
        Self {
            data: Some(data.into()),
            ..Self::default()
        }
    }

    pub fn data(&self) -> Option<&ImageData> {
        self.data.as_ref()
    }

    pub fn data_mut(&mut self) -> Option<&mut ImageData> {
        self.data.as_mut()
    }

    pub fn set_data(&mut self, data: Option<ImageData>) {
        self.data = data;
        self.modified();
    }

    pub fn take_data(&mut self) -> Option<ImageData> {
        self.data.take()
    }

    /// Restores data taken with [`DataNode::take_data`] without counting a modification.
    pub fn restore_data(&mut self, data: ImageData) {
        self.data = Some(data);
    }

    /// Bumps the modification counter observers compare against.
    pub fn modified(&mut self) {
        self.modified = self.modified.wrapping_add(1);
    }

    pub fn modified_count(&self) -> u64 {
        self.modified
    }

    pub fn set_property(&mut self, key: impl Into<String>, value: Property) {
        self.properties.insert(key.into(), value);
    }

    pub fn property(&self, key: &str) -> Option<&Property> {
        self.properties.get(key)
    }

    pub fn properties(&self) -> impl Iterator<Item = (&str, &Property)> {
        self.properties.iter().map(|(key, value)| (key.as_str(), value))
    }

    pub fn bool_property(&self, key: &str) -> Option<bool> {
        match self.properties.get(key)? {
            Property::Bool(value) => Some(*value),
            _ => None,
        }
    }

    pub fn int_property(&self, key: &str) -> Option<i64> {
        match self.properties.get(key)? {
            Property::Int(value) => Some(*value),
            _ => None,
        }
    }

    pub fn float_property(&self, key: &str) -> Option<f64> {
        match self.properties.get(key)? {
            Property::Float(value) => Some(*value),
            _ => None,
        }
    }

    pub fn color_property(&self, key: &str) -> Option<Color> {
        match self.properties.get(key)? {
            Property::Color(value) => Some(*value),
            _ => None,
        }
    }

    pub fn name(&self) -> Option<&str> {
        match self.properties.get(property_names::NAME)? {
            Property::Text(value) => Some(value),
            _ => None,
        }
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.set_property(property_names::NAME, Property::Text(name.into()));
    }

    pub fn set_color(&mut self, color: Color) {
        self.set_property(property_names::COLOR, Property::Color(color));
    }

    pub fn set_opacity(&mut self, opacity: f64) {
        self.set_property(property_names::OPACITY, Property::Float(opacity));
    }
}
