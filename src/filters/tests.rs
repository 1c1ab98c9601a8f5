use ndarray::{Array, ArrayD, IxDyn};

use crate::model::{Geometry, PixelType, SpatialDim, TimeGeometry, Volume};

use super::{
    FilterError, IndexBox, PadOptions, RegionOfInterest, ThresholdWindow, binary_threshold,
    count_in_range, crop, mask_and_cut, min_max, otsu_threshold, pad_to_reference,
};

fn volume_from(values: Vec<f32>, extent: [usize; 3], time_steps: usize) -> Volume {
    let geometry = Geometry::new(extent).with_origin([10.0, 20.0, 30.0]);
    let time_geometry = TimeGeometry::proportional(geometry, time_steps, 1.0).expect("geometry");
    let frame = Array::from_shape_vec(IxDyn(&extent), values).expect("shape");
    Volume::from_frames(vec![frame; time_steps], time_geometry).expect("volume")
}

fn counting_volume(extent: [usize; 3]) -> Volume {
    let count = extent.iter().product::<usize>();
    volume_from((0..count).map(|value| value as f32).collect(), extent, 1)
}

#[test]
fn threshold_window_rejects_inverted_bounds() {
    assert!(matches!(
        ThresholdWindow::new(2.0, 1.0),
        Err(FilterError::InvalidWindow { .. })
    ));
}

#[test]
fn binary_threshold_writes_inside_value_in_output_type() {
    let volume = counting_volume([2, 2, 2]);
    let window = ThresholdWindow::new(2.0, 5.0).expect("window");
    let output = binary_threshold(&volume, 0, window, 3.0, PixelType::U16).expect("threshold");
    assert_eq!(output.pixel_type(), PixelType::U16);
    assert_eq!(output.time_steps(), 1);
    let frame = output.frame::<u16>(0).expect("frame");
    let values = frame.iter().copied().collect::<Vec<_>>();
    assert_eq!(values, vec![0, 0, 3, 3, 3, 3, 0, 0]);
    assert_eq!(output.geometry(0), volume.geometry(0));
}

#[test]
fn binary_threshold_rejects_missing_time_step() {
    let volume = counting_volume([2, 2, 2]);
    let window = ThresholdWindow::new(0.0, 1.0).expect("window");
    assert!(binary_threshold(&volume, 1, window, 1.0, PixelType::U8).is_err());
}

#[test]
fn otsu_separates_two_clusters() {
    let volume = volume_from(vec![0.05, 0.1, 0.2, 0.8, 0.9, 0.95, 0.85, 0.15], [2, 2, 2], 1);
    let threshold = otsu_threshold(&volume, 0).expect("otsu");
    assert!(threshold > 0.2 && threshold <= 0.8, "threshold {threshold}");
}

#[test]
fn crop_shifts_geometry_and_keeps_time_steps() {
    let volume = volume_from((0..64).map(|v| v as f32).collect(), [4, 4, 4], 3);
    let region = IndexBox::new([1, 1, 2], [3, 4, 4]);
    let cropped = crop(&volume, &region).expect("crop");
    assert_eq!(cropped.time_steps(), 3);
    assert_eq!(cropped.shape(), vec![2, 3, 2]);
    let geometry = cropped.geometry(2).expect("geometry");
    assert_eq!(geometry.origin, [11.0, 21.0, 32.0]);
    assert_eq!(geometry.extent, [2, 3, 2]);
    let frame = cropped.frame::<f32>(0).expect("frame");
    assert_eq!(frame[[0, 0, 0]], 16.0 + 4.0 + 2.0);
}

#[test]
fn crop_rejects_region_outside_extent() {
    let volume = counting_volume([4, 4, 4]);
    let result = crop(&volume, &IndexBox::new([0, 0, 0], [5, 4, 4]));
    assert!(matches!(result, Err(FilterError::RegionOutOfBounds { .. })));
    let empty = crop(&volume, &IndexBox::new([2, 0, 0], [2, 4, 4]));
    assert!(matches!(empty, Err(FilterError::EmptyRegion)));
}

#[test]
fn mask_and_cut_uses_mask_bounding_box_and_fills_outside() {
    let volume = volume_from((1..=27).map(|v| v as f32).collect(), [3, 3, 3], 1);
    let mut mask_values = vec![0u8; 27];
    mask_values[13] = 1; // [1, 1, 1]
    mask_values[14] = 1; // [1, 1, 2]
    mask_values[26] = 1; // [2, 2, 2]
    let mask = Volume::from_frames(
        vec![Array::from_shape_vec(IxDyn(&[3, 3, 3]), mask_values).expect("shape")],
        volume.time_geometry().clone(),
    )
    .expect("mask");

    let cut = mask_and_cut(&volume, &RegionOfInterest::Mask(mask)).expect("cut");
    assert_eq!(cut.shape(), vec![2, 2, 2]);
    let frame = cut.frame::<f32>(0).expect("frame");
    assert_eq!(frame[[0, 0, 0]], 14.0);
    assert_eq!(frame[[0, 0, 1]], 15.0);
    assert_eq!(frame[[1, 1, 1]], 27.0);
    assert_eq!(frame[[1, 0, 0]], 14.0);
}

#[test]
fn mask_and_cut_rejects_empty_or_misfit_masks() {
    let volume = counting_volume([3, 3, 3]);
    let empty = Volume::zeros(
        PixelType::U8,
        SpatialDim::Three,
        volume.time_geometry().clone(),
    )
    .expect("zeros");
    assert!(matches!(
        mask_and_cut(&volume, &RegionOfInterest::Mask(empty)),
        Err(FilterError::EmptyRegion)
    ));

    let other = Volume::zeros(
        PixelType::U8,
        SpatialDim::Three,
        TimeGeometry::static_geometry(Geometry::new([2, 3, 3])).expect("geometry"),
    )
    .expect("zeros");
    assert!(matches!(
        mask_and_cut(&volume, &RegionOfInterest::Mask(other)),
        Err(FilterError::MaskExtentMismatch { .. })
    ));
}

#[test]
fn pad_restores_reference_extent_with_binary_mapping() {
    let reference = counting_volume([4, 4, 4]);
    let cropped = crop(&reference, &IndexBox::new([1, 1, 1], [3, 3, 3])).expect("crop");
    let padded = pad_to_reference(&cropped, &reference, &PadOptions::binary(21.0, 21.0))
        .expect("pad");
    assert_eq!(padded.shape(), vec![4, 4, 4]);
    assert_eq!(padded.geometry(0), reference.geometry(0));
    let frame = padded.frame::<f32>(0).expect("frame");
    assert_eq!(frame[[1, 1, 1]], 1.0);
    assert_eq!(frame.iter().filter(|value| **value != 0.0).count(), 1);
}

#[test]
fn pad_copies_values_when_not_binary() {
    let reference = counting_volume([3, 3, 3]);
    let cropped = crop(&reference, &IndexBox::new([0, 1, 2], [2, 3, 3])).expect("crop");
    let padded = pad_to_reference(&cropped, &reference, &PadOptions::default()).expect("pad");
    let frame = padded.frame::<f32>(0).expect("frame");
    assert_eq!(frame[[0, 1, 2]], 5.0);
    assert_eq!(frame[[1, 2, 2]], 17.0);
    assert_eq!(frame[[0, 0, 0]], 0.0);
}

#[test]
fn pad_rejects_misaligned_input() {
    let reference = counting_volume([4, 4, 4]);
    let geometry = Geometry::new([2, 2, 2]).with_origin([10.5, 20.0, 30.0]);
    let shifted = Volume::from_frames(
        vec![ArrayD::<f32>::zeros(IxDyn(&[2, 2, 2]))],
        TimeGeometry::static_geometry(geometry).expect("geometry"),
    )
    .expect("volume");
    assert!(matches!(
        pad_to_reference(&shifted, &reference, &PadOptions::default()),
        Err(FilterError::Misaligned(_))
    ));
}

#[test]
fn stats_report_range_counts_and_extrema() {
    let volume = counting_volume([2, 2, 2]);
    assert_eq!(count_in_range(&volume, 0, 2.0, 4.0).expect("count"), 3);
    assert_eq!(min_max(&volume, 0).expect("min max"), (0.0, 7.0));
    assert!(min_max(&volume, 1).is_err());
}

#[test]
fn otsu_works_on_integer_frames_and_skips_non_finite_voxels() {
    let geometry = TimeGeometry::static_geometry(Geometry::new([2, 2, 2])).expect("geometry");
    let values = vec![10u16, 12, 11, 10, 200, 210, 205, 190];
    let frame = Array::from_shape_vec(IxDyn(&[2, 2, 2]), values).expect("shape");
    let volume = Volume::from_frames(vec![frame], geometry.clone()).expect("volume");
    let threshold = otsu_threshold(&volume, 0).expect("otsu");
    assert!(threshold >= 12.0 && threshold < 190.0, "threshold {threshold}");
    assert!(otsu_threshold(&volume, 1).is_err());

    let noisy = vec![0.1f32, f32::NAN, 0.2, 0.9, f32::INFINITY, 0.8, 0.85, 0.15];
    let frame = Array::from_shape_vec(IxDyn(&[2, 2, 2]), noisy).expect("shape");
    let volume = Volume::from_frames(vec![frame], geometry).expect("volume");
    let threshold = otsu_threshold(&volume, 0).expect("otsu");
    assert!(threshold > 0.2 && threshold <= 0.8, "threshold {threshold}");
}
