use std::cell::RefCell;
use std::rc::Rc;
use std::time::Instant;

use ndarray::{ArrayD, Dimension, IxDyn};
use tracing::info;

use crate::filters::{IndexBox, RegionOfInterest, count_in_range};
use crate::model::{
    Color, CoreError, Geometry, ImageData, Label, LabelSet, LabelSetImage, PixelType, Scalar,
    TimeGeometry, Volume, with_pixel_type,
};
use crate::storage::{DataNode, DataStorage, Property, property_names};
use crate::tool::{AutoSegmentationTool, ToolError, ToolId, ToolManager};

use super::{
    Phantom, ReferenceSpec, Result, ResultSummary, SessionError, SessionReport, SessionSpec, SessionStep,
    StepReport, WorkingKind, WorkingSpec,
};

fn extent_of(shape: &[usize]) -> [usize; 3] {
    [shape[0], shape[1], shape.get(2).copied().unwrap_or(1)]
}

fn distance(index: &[usize], center: [f64; 3]) -> f64 {
    index
        .iter()
        .zip(center)
        .map(|(position, centre)| (*position as f64 - centre).powi(2))
        .sum::<f64>()
        .sqrt()
}

fn volume_centre(extent: [usize; 3]) -> [f64; 3] {
    extent.map(|size| (size as f64 - 1.0) / 2.0)
}

fn phantom_frame(phantom: &Phantom, shape: &[usize], extent: [usize; 3], time_step: usize) -> ArrayD<f64> {
    match phantom {
        Phantom::Ramp => ArrayD::from_shape_fn(IxDyn(shape), |index| (index[0] + time_step) as f64),
        Phantom::Sphere {
            center,
            radius,
            intensity,
            growth,
        } => {
            let center = center.unwrap_or_else(|| volume_centre(extent));
            let radius = radius + growth * time_step as f64;
            ArrayD::from_shape_fn(IxDyn(shape), |index| {
                if distance(index.slice(), center) <= radius {
                    *intensity
                } else {
                    0.0
                }
            })
        }
    }
}

fn cast_frames<T: Scalar>(frames: &[ArrayD<f64>]) -> Vec<ArrayD<T>> {
    frames
        .iter()
        .map(|frame| frame.mapv(T::from_f64))
        .collect()
}

fn typed_volume(
    pixel_type: PixelType,
    frames: &[ArrayD<f64>],
    time_geometry: TimeGeometry,
) -> Result<Volume> {
    Ok(with_pixel_type!(pixel_type, T => {
        Volume::from_frames(cast_frames::<T>(frames), time_geometry)?
    }))
}

/// Synthetic reference volume described by `spec`.
pub fn build_reference(spec: &ReferenceSpec) -> Result<Volume> {
    let extent = extent_of(&spec.shape);
    let geometry = Geometry::new(extent)
        .with_origin(spec.origin)
        .with_spacing(spec.spacing);
    let time_geometry = TimeGeometry::proportional(geometry, spec.time_steps, spec.step_duration)?;
    let frames = (0..spec.time_steps)
        .map(|time_step| phantom_frame(&spec.phantom, &spec.shape, extent, time_step))
        .collect::<Vec<_>>();
    typed_volume(spec.pixel_type, &frames, time_geometry)
}

/// Empty segmentation on the grid of `reference`.
pub fn build_working(spec: &WorkingSpec, reference: &Volume) -> Result<ImageData> {
    let time_geometry = if spec.static_segmentation {
        let geometry = reference
            .geometry(0)
            .cloned()
            .ok_or(CoreError::EmptyVolume)?;
        TimeGeometry::static_geometry(geometry)?
    } else {
        reference.time_geometry().clone()
    };
    let volume = Volume::zeros(PixelType::U16, reference.dimension(), time_geometry)?;
    Ok(match spec.kind {
        WorkingKind::LabelSet => {
            let label = Label::new(spec.active_label, spec.label_name.clone(), Color::RED);
            LabelSetImage::new(volume, LabelSet::new(label))?.into()
        }
        WorkingKind::Volume => volume.into(),
    })
}

fn ball_mask(reference: &Volume, center: [f64; 3], radius: f64) -> Result<Volume> {
    let shape = reference.shape();
    let geometry = reference
        .geometry(0)
        .cloned()
        .ok_or(CoreError::EmptyVolume)?;
    let frame = ArrayD::from_shape_fn(IxDyn(&shape), |index| {
        u8::from(distance(index.slice(), center) <= radius)
    });
    Ok(Volume::from_frames(
        vec![frame],
        TimeGeometry::static_geometry(geometry)?,
    )?)
}

fn foreground(volume: &Volume) -> Result<Vec<usize>> {
    (0..volume.time_steps())
        .map(|time_step| Ok(count_in_range(volume, time_step, 0.5, f64::INFINITY)?))
        .collect()
}

struct Session {
    manager: ToolManager,
    tool: ToolId,
    reference: Volume,
}

impl Session {
    fn tool(&self) -> Result<&AutoSegmentationTool> {
        self.manager
            .tool(self.tool)
            .ok_or_else(|| SessionError::Parse("session tool is not registered".to_string()))
    }

    fn require_active(&self) -> std::result::Result<(), ToolError> {
        if self.manager.active_tool() == Some(self.tool) {
            Ok(())
        } else {
            Err(ToolError::InvalidState("the session tool is not active".to_string()))
        }
    }

    fn execute(&mut self, step: &SessionStep) -> Result<StepReport> {
        let mut report = StepReport {
            index: 0,
            step: step.name().to_string(),
            duration_ms: 0,
            active: false,
            time_point: 0.0,
            preview_state: self.tool()?.engine().state(),
            preview_foreground: None,
            update: None,
            commit: None,
        };
        let outcome: std::result::Result<(), ToolError> = match step {
            SessionStep::Activate => self.manager.activate_tool(Some(self.tool)),
            SessionStep::SelectTimePoint { time_point } => {
                self.manager.set_selected_time_point(*time_point)
            }
            SessionStep::SetRoi { min, max } => self
                .manager
                .set_roi(Some(RegionOfInterest::Box(IndexBox::new(*min, *max)))),
            SessionStep::SetRoiMask { center, radius } => {
                let mask = ball_mask(&self.reference, *center, *radius)?;
                self.manager.set_roi(Some(RegionOfInterest::Mask(mask)))
            }
            SessionStep::ClearRoi => self.manager.set_roi(None),
            SessionStep::Update { ignore_lazy } => self.require_active().and_then(|()| {
                let (tool, context) = self
                    .manager
                    .tool_and_context_mut::<AutoSegmentationTool>(self.tool)
                    .ok_or_else(|| ToolError::UnknownTool(self.tool.index()))?;
                report.update = Some(tool.update_preview(context, *ignore_lazy)?);
                Ok(())
            }),
            SessionStep::Confirm => self.require_active().and_then(|()| self.manager.confirm()),
            SessionStep::Deactivate => self.manager.activate_tool(None),
        };
        outcome.map_err(|source| SessionError::Step {
            index: 0,
            step: step.name(),
            source,
        })?;

        if matches!(step, SessionStep::Confirm) {
            report.commit = self.tool()?.last_commit().cloned();
        }
        let tool = self.tool()?;
        report.active = self.manager.active_tool() == Some(self.tool);
        report.time_point = self.manager.context().selected_time_point();
        report.preview_state = tool.engine().state();
        report.preview_foreground = match tool.preview_segmentation(self.manager.context()) {
            Some(preview) if report.active => Some(foreground(preview.volume())?.iter().sum()),
            _ => None,
        };
        Ok(report)
    }
}

/// Runs the steps of `spec` against a fresh storage and tool.
pub fn run_session(spec: &SessionSpec) -> Result<SessionReport> {
    spec.validate()?;
    let reference = build_reference(&spec.reference)?;
    let working = build_working(&spec.working, &reference)?;

    let mut storage = DataStorage::new();
    let mut reference_node = DataNode::with_data(reference.clone());
    reference_node.set_name("reference");
    if let Some(layer) = spec.reference.layer {
        reference_node.set_property(property_names::LAYER, Property::Int(layer));
    }
    let reference_id = storage.add(reference_node, None)?;
    let mut working_node = DataNode::with_data(working);
    working_node.set_name("segmentation");
    let working_id = storage.add(working_node, Some(reference_id))?;

    let mut manager = ToolManager::new(storage);
    manager.set_reference_data(Some(reference_id));
    manager.set_working_data(Some(working_id));

    let mut tool = AutoSegmentationTool::with_algorithm(
        spec.tool.name.clone(),
        &spec.tool.algorithm,
        spec.tool.settings,
    )?;
    let messages = Rc::new(RefCell::new(Vec::new()));
    {
        let messages = Rc::clone(&messages);
        tool.engine_mut()
            .error_message
            .connect(move |message: &String| messages.borrow_mut().push(message.clone()));
    }
    let tool = manager.register_tool(Box::new(tool));
    let mut session = Session {
        manager,
        tool,
        reference,
    };

    let mut steps = Vec::with_capacity(spec.steps.len());
    for (index, step) in spec.steps.iter().enumerate() {
        let started = Instant::now();
        let mut report = session.execute(step).map_err(|error| match error {
            SessionError::Step { step, source, .. } => SessionError::Step {
                index,
                step,
                source,
            },
            other => other,
        })?;
        report.index = index;
        report.duration_ms = started.elapsed().as_millis();
        steps.push(report);
    }

    let result = session
        .manager
        .storage()
        .data(working_id)
        .map(ImageData::volume)
        .ok_or_else(|| SessionError::Parse("working segmentation disappeared".to_string()))?;
    let summary = ResultSummary {
        extent: result.geometry(0).map(|geometry| geometry.extent).unwrap_or_default(),
        time_steps: result.time_steps(),
        foreground_per_time_step: foreground(result)?,
    };
    info!(
        session = spec.name.as_deref().unwrap_or("unnamed"),
        steps = steps.len(),
        foreground = ?summary.foreground_per_time_step,
        "session finished"
    );

    let error_messages = messages.borrow().clone();
    Ok(SessionReport {
        session_name: spec.name.clone(),
        tool: spec.tool.name.clone(),
        algorithm: spec.tool.algorithm.name().to_string(),
        settings: spec.tool.settings,
        steps,
        render_requests: session.manager.context().render_requests(),
        error_messages,
        result: summary,
    })
}
