use super::{LabelSet, LabelSetImage, PixelType, Result, Volume};

/// Data held by a storage node.
#[derive(Debug, Clone, PartialEq)]
pub enum ImageData {
    Volume(Volume),
    LabelSet(LabelSetImage),
}

impl ImageData {
    pub fn volume(&self) -> &Volume {
        match self {
            Self::Volume(volume) => volume,
            Self::LabelSet(image) => image.volume(),
        }
    }

    pub fn volume_mut(&mut self) -> &mut Volume {
        match self {
            Self::Volume(volume) => volume,
            Self::LabelSet(image) => image.volume_mut(),
        }
    }

    pub fn as_label_set(&self) -> Option<&LabelSetImage> {
        match self {
            Self::LabelSet(image) => Some(image),
            Self::Volume(_) => None,
        }
    }

    pub fn as_label_set_mut(&mut self) -> Option<&mut LabelSetImage> {
        match self {
            Self::LabelSet(image) => Some(image),
            Self::Volume(_) => None,
        }
    }

    pub fn labels(&self) -> Option<&LabelSet> {
        self.as_label_set().map(LabelSetImage::labels)
    }

    pub fn pixel_type(&self) -> PixelType {
        self.volume().pixel_type()
    }

    pub fn time_steps(&self) -> usize {
        self.volume().time_steps()
    }

    /// Swaps in new voxels, keeping the label set when there is one.
    pub fn with_volume(self, volume: Volume) -> Result<Self> {
        match self {
            Self::Volume(_) => Ok(Self::Volume(volume)),
            Self::LabelSet(image) => {
                let (_, labels) = image.into_parts();
                Ok(Self::LabelSet(LabelSetImage::new(volume, labels)?))
            }
        }
    }
}

impl From<Volume> for ImageData {
    fn from(volume: Volume) -> Self {
        Self::Volume(volume)
    }
}

impl From<LabelSetImage> for ImageData {
    fn from(image: LabelSetImage) -> Self {
        Self::LabelSet(image)
    }
}
