use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::{CoreError, DEFAULT_SEGMENTATION_PIXEL_TYPE, Result, Volume};

pub type LabelValue = u16;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Color {
    pub const GREEN: Self = Self::new(0.0, 1.0, 0.0);
    pub const RED: Self = Self::new(1.0, 0.0, 0.0);

    pub const fn new(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Label {
    pub value: LabelValue,
    pub name: String,
    pub color: Color,
    #[serde(default = "default_visible")]
    pub visible: bool,
    #[serde(default = "default_opacity")]
    pub opacity: f32,
}

fn default_visible() -> bool {
    true
}

fn default_opacity() -> f32 {
    0.6
}

impl Label {
    pub fn new(value: LabelValue, name: impl Into<String>, color: Color) -> Self {
        Self {
            value,
            name: name.into(),
            color,
            visible: true,
            opacity: default_opacity(),
        }
    }

    fn rgba(&self) -> [f32; 4] {
        let alpha = if self.visible { self.opacity } else { 0.0 };
        [self.color.r, self.color.g, self.color.b, alpha]
    }
}

/// Named segmentation classes with exactly one active label.
///
/// Values are unique by construction (map keys). The lookup table caches
/// display RGBA per value and is only refreshed by
/// [`LabelSet::update_lookup_table`].
#[derive(Debug, Clone, PartialEq)]
pub struct LabelSet {
    labels: BTreeMap<LabelValue, Label>,
    active: LabelValue,
    lookup: BTreeMap<LabelValue, [f32; 4]>,
}

impl LabelSet {
    pub fn new(active: Label) -> Self {
        let value = active.value;
        let lookup = BTreeMap::from([(value, active.rgba())]);
        Self {
            labels: BTreeMap::from([(value, active)]),
            active: value,
            lookup,
        }
    }

    pub fn add_label(&mut self, label: Label) -> Result<()> {
        if self.labels.contains_key(&label.value) {
            return Err(CoreError::DuplicateLabel(label.value));
        }
        self.lookup.insert(label.value, label.rgba());
        self.labels.insert(label.value, label);
        Ok(())
    }

    pub fn remove_label(&mut self, value: LabelValue) -> Result<Label> {
        if value == self.active {
            return Err(CoreError::ActiveLabelRemoval(value));
        }
        let label = self
            .labels
            .remove(&value)
            .ok_or(CoreError::UnknownLabel(value))?;
        self.lookup.remove(&value);
        Ok(label)
    }

    pub fn label(&self, value: LabelValue) -> Option<&Label> {
        self.labels.get(&value)
    }

    pub fn labels(&self) -> impl Iterator<Item = &Label> {
        self.labels.values()
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn active_label(&self) -> &Label {
        &self.labels[&self.active]
    }

    pub fn set_active_label(&mut self, value: LabelValue) -> Result<()> {
        if !self.labels.contains_key(&value) {
            return Err(CoreError::UnknownLabel(value));
        }
        self.active = value;
        Ok(())
    }

    /// Changes the active label color. The lookup table keeps the previous
    /// color until [`LabelSet::update_lookup_table`] runs for that value.
    pub fn set_active_label_color(&mut self, color: Color) {
        if let Some(label) = self.labels.get_mut(&self.active) {
            label.color = color;
        }
    }

    pub fn set_label_visible(&mut self, value: LabelValue, visible: bool) -> Result<()> {
        let label = self
            .labels
            .get_mut(&value)
            .ok_or(CoreError::UnknownLabel(value))?;
        label.visible = visible;
        Ok(())
    }

    pub fn update_lookup_table(&mut self, value: LabelValue) -> Result<()> {
        let label = self.labels.get(&value).ok_or(CoreError::UnknownLabel(value))?;
        self.lookup.insert(value, label.rgba());
        Ok(())
    }

    pub fn lookup(&self, value: LabelValue) -> Option<[f32; 4]> {
        self.lookup.get(&value).copied()
    }
}

/// Labeled volume: voxels of the default segmentation pixel type plus a label set.
#[derive(Debug, Clone, PartialEq)]
pub struct LabelSetImage {
    volume: Volume,
    labels: LabelSet,
}

impl LabelSetImage {
    pub fn new(volume: Volume, labels: LabelSet) -> Result<Self> {
        if volume.pixel_type() != DEFAULT_SEGMENTATION_PIXEL_TYPE {
            return Err(CoreError::PixelTypeMismatch {
                expected: DEFAULT_SEGMENTATION_PIXEL_TYPE,
                actual: volume.pixel_type(),
            });
        }
        Ok(Self { volume, labels })
    }

    pub fn volume(&self) -> &Volume {
        &self.volume
    }

    pub fn volume_mut(&mut self) -> &mut Volume {
        &mut self.volume
    }

    pub fn labels(&self) -> &LabelSet {
        &self.labels
    }

    pub fn labels_mut(&mut self) -> &mut LabelSet {
        &mut self.labels
    }

    pub fn active_label(&self) -> &Label {
        self.labels.active_label()
    }

    pub fn into_parts(self) -> (Volume, LabelSet) {
        (self.volume, self.labels)
    }
}
