mod crop;
mod error;
mod pad;
mod stats;
mod threshold;

#[cfg(test)]
mod tests;

pub use crop::{IndexBox, RegionOfInterest, crop, mask_and_cut};
pub use error::{FilterError, Result};
pub use pad::{PadOptions, pad_to_reference};
pub use stats::{count_in_range, min_max};
pub use threshold::{ThresholdWindow, binary_threshold, otsu_threshold};
