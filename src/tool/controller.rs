use std::any::Any;

use tracing::{debug, info, warn};

use crate::filters::{RegionOfInterest, mask_and_cut};
use crate::model::{Color, DEFAULT_SEGMENTATION_PIXEL_TYPE, ImageData, Volume};
use crate::storage::{DataNode, DataStorage, NodeId, Property, property_names};

use super::{
    AlgorithmSpec, CommitReport, PreviewEngine, PreviewHooks, Result, SubscriptionId,
    TimePointTrigger, Tool, ToolContext, ToolError, ToolEvent, ToolSettings, TransferError,
    UpdateOutcome, pad_to_reference_segmentation, should_update_on_time_point_change,
    transfer_preview,
};

/// Layer of the preview relative to the reference node.
pub const PREVIEW_LAYER_OFFSET: i64 = 1;
const DEFAULT_REFERENCE_LAYER: i64 = 50;
const PREVIEW_OPACITY: f64 = 0.3;

/// Preview node with the fixed display properties of a tool preview.
pub fn default_preview_node(tool_name: &str) -> DataNode {
    let mut node = DataNode::new();
    node.set_color(Color::GREEN);
    node.set_name(format!("{tool_name} preview"));
    node.set_opacity(PREVIEW_OPACITY);
    node.set_property(property_names::BINARY, Property::Bool(true));
    node.set_property(property_names::HELPER_OBJECT, Property::Bool(true));
    node
}

#[derive(Debug)]
enum PreviewSlot {
    Detached(DataNode),
    Registered(NodeId),
}

#[derive(Debug)]
enum SegmentationInput {
    Reference(NodeId),
    /// Reference restricted to a region; owned by the tool.
    Cropped {
        node: DataNode,
        roi: RegionOfInterest,
    },
}

fn resolve_input<'a>(
    input: Option<&'a SegmentationInput>,
    storage: &'a DataStorage,
) -> Option<&'a Volume> {
    match input? {
        SegmentationInput::Reference(id) => storage.data(*id).map(ImageData::volume),
        SegmentationInput::Cropped { node, .. } => node.data().map(ImageData::volume),
    }
}

fn preview_node_in<'a>(slot: &'a PreviewSlot, storage: &'a DataStorage) -> Option<&'a DataNode> {
    match slot {
        PreviewSlot::Detached(node) => Some(node),
        PreviewSlot::Registered(id) => storage.get(*id),
    }
}

fn preview_node_mut<'a>(
    slot: &'a mut PreviewSlot,
    storage: &'a mut DataStorage,
) -> Option<&'a mut DataNode> {
    match slot {
        PreviewSlot::Detached(node) => Some(node),
        PreviewSlot::Registered(id) => storage.get_mut(*id),
    }
}

pub(super) fn commit_error_message(error: &TransferError) -> String {
    match error {
        TransferError::Access { .. }
        | TransferError::PixelTypeMismatch { .. }
        | TransferError::GeometryMismatch { .. } => format!(
            "Error accessing single time steps of the original image. Cannot create segmentation. {error}"
        ),
        other => other.to_string(),
    }
}

/// Tool computing a segmentation preview and committing it on confirm.
///
/// The preview is a clone of the working segmentation, recomputed by the
/// tool's [`PreviewHooks`] whenever the input, the region of interest or
/// (depending on [`ToolSettings`]) the selected time point changes.
#[derive(Debug)]
pub struct AutoSegmentationTool {
    name: String,
    settings: ToolSettings,
    engine: PreviewEngine,
    reference: Option<NodeId>,
    input: Option<SegmentationInput>,
    preview: PreviewSlot,
    subscriptions: Vec<SubscriptionId>,
    last_commit: Option<CommitReport>,
}

impl AutoSegmentationTool {
    pub fn new(
        name: impl Into<String>,
        hooks: Box<dyn PreviewHooks>,
        settings: ToolSettings,
    ) -> Self {
        let name = name.into();
        Self {
            preview: PreviewSlot::Detached(default_preview_node(&name)),
            name,
            settings,
            engine: PreviewEngine::new(hooks),
            reference: None,
            input: None,
            subscriptions: Vec::new(),
            last_commit: None,
        }
    }

    pub fn with_algorithm(
        name: impl Into<String>,
        algorithm: &AlgorithmSpec,
        settings: ToolSettings,
    ) -> Result<Self> {
        Ok(Self::new(name, algorithm.build()?, settings))
    }

    pub fn settings(&self) -> &ToolSettings {
        &self.settings
    }

    pub fn settings_mut(&mut self) -> &mut ToolSettings {
        &mut self.settings
    }

    pub fn engine(&self) -> &PreviewEngine {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut PreviewEngine {
        &mut self.engine
    }

    pub fn last_time_point_of_update(&self) -> f64 {
        self.engine.last_time_point()
    }

    pub fn last_commit(&self) -> Option<&CommitReport> {
        self.last_commit.as_ref()
    }

    /// Storage id of the preview while it is shown.
    pub fn preview_node_id(&self) -> Option<NodeId> {
        match self.preview {
            PreviewSlot::Registered(id) => Some(id),
            PreviewSlot::Detached(_) => None,
        }
    }

    pub fn preview_node<'a>(&'a self, context: &'a ToolContext) -> Option<&'a DataNode> {
        preview_node_in(&self.preview, &context.storage)
    }

    pub fn preview_segmentation<'a>(&'a self, context: &'a ToolContext) -> Option<&'a ImageData> {
        self.preview_node(context)?.data()
    }

    pub fn segmentation_input<'a>(&'a self, context: &'a ToolContext) -> Option<&'a Volume> {
        resolve_input(self.input.as_ref(), &context.storage)
    }

    pub fn reference_data<'a>(&'a self, context: &'a ToolContext) -> Option<&'a Volume> {
        context
            .storage
            .data(self.reference?)
            .map(ImageData::volume)
    }

    /// Whether the input is restricted to a region of interest.
    pub fn is_input_cropped(&self) -> bool {
        matches!(self.input, Some(SegmentationInput::Cropped { .. }))
    }

    /// Recomputes the preview at the selected time point.
    pub fn update_preview(
        &mut self,
        context: &mut ToolContext,
        ignore_lazy: bool,
    ) -> Result<UpdateOutcome> {
        let time_point = context.selected_time_point();
        let mut preview = preview_node_mut(&mut self.preview, &mut context.storage)
            .and_then(DataNode::take_data);
        let input = resolve_input(self.input.as_ref(), &context.storage);
        let result = self.engine.update(
            input,
            preview.as_mut(),
            time_point,
            &self.settings,
            ignore_lazy,
        );

        let completed = matches!(result, Ok(UpdateOutcome::Completed { .. }));
        if let (Some(data), Some(node)) = (
            preview,
            preview_node_mut(&mut self.preview, &mut context.storage),
        ) {
            node.restore_data(data);
            if completed {
                node.modified();
            }
        }
        if completed {
            context.request_render_update();
        }
        result
    }

    /// Runs a full update if needed, commits the preview into the working
    /// segmentation and requests deactivation unless the tool stays active.
    pub fn confirm_segmentation(
        &mut self,
        context: &mut ToolContext,
    ) -> Result<Option<CommitReport>> {
        if self.settings.lazy_dynamic_previews && self.settings.create_all_time_steps {
            self.update_preview(context, true)?;
        }

        let report = match self.create_result_segmentation_from_preview(context) {
            Ok(report) => report,
            Err(error) => {
                self.engine.error_message.send(&commit_error_message(&error));
                return Err(error.into());
            }
        };

        context.request_render_update();
        if !self.settings.keep_active_after_accept {
            context.request_activation(None);
        }
        self.last_commit = report.clone();
        Ok(report)
    }

    fn create_result_segmentation_from_preview(
        &self,
        context: &mut ToolContext,
    ) -> std::result::Result<Option<CommitReport>, TransferError> {
        if resolve_input(self.input.as_ref(), &context.storage).is_none() {
            return Ok(None);
        }
        let Some(preview) = preview_node_in(&self.preview, &context.storage).and_then(DataNode::data)
        else {
            return Ok(None);
        };
        let Some(target) = context.working_node() else {
            return Ok(None);
        };
        let mut result = context.storage.data(target).cloned().ok_or_else(|| {
            TransferError::InvalidState("result segmentation node has no data".to_string())
        })?;

        let roi = match &self.input {
            Some(SegmentationInput::Cropped { roi, .. }) => Some(roi),
            _ => None,
        };
        if let Some(roi) = roi {
            let cropped = mask_and_cut(result.volume(), roi)?;
            result = result
                .with_volume(cropped)
                .map_err(|error| TransferError::InvalidState(error.to_string()))?;
        }

        let transferred_time_steps = transfer_preview(
            preview.volume(),
            result.volume_mut(),
            self.settings.create_all_time_steps,
            context.selected_time_point(),
        )?;

        if roi.is_some() {
            let reference = self
                .reference
                .and_then(|id| context.storage.data(id))
                .ok_or_else(|| TransferError::InvalidState("reference data is gone".to_string()))?;
            let padded = pad_to_reference_segmentation(result.volume(), reference.volume())?;
            result = result
                .with_volume(padded)
                .map_err(|error| TransferError::InvalidState(error.to_string()))?;
        }

        let report = CommitReport {
            transferred_time_steps,
            padded: roi.is_some(),
            result_extent: result
                .volume()
                .geometry(0)
                .map(|geometry| geometry.extent)
                .unwrap_or_default(),
        };
        context.storage.node_mut(target)?.set_data(Some(result));
        context.storage.notify_modified(target)?;
        info!(
            tool = %self.name,
            result_node = %target,
            time_steps = ?report.transferred_time_steps,
            padded = report.padded,
            "committed preview"
        );
        Ok(Some(report))
    }

    fn select_input(&mut self, context: &ToolContext) -> Result<()> {
        self.input = match (context.roi(), self.reference) {
            (_, None) => None,
            (None, Some(reference)) => Some(SegmentationInput::Reference(reference)),
            (Some(roi), Some(reference)) => {
                let Some(image) = context.storage.data(reference) else {
                    return Ok(());
                };
                let cropped = mask_and_cut(image.volume(), roi)?;
                debug!(
                    tool = %self.name,
                    extent = ?cropped.geometry(0).map(|geometry| geometry.extent),
                    "restricted segmentation input to region of interest"
                );
                Some(SegmentationInput::Cropped {
                    node: DataNode::with_data(cropped),
                    roi: roi.clone(),
                })
            }
        };
        Ok(())
    }

    /// Replaces the preview with a fresh clone of the working segmentation,
    /// restricted like the input, and shows it above the reference.
    fn reset_preview_node(&mut self, context: &mut ToolContext) -> Result<()> {
        if resolve_input(self.input.as_ref(), &context.storage).is_none() {
            return Ok(());
        }
        let working = context.working_data().ok_or_else(|| {
            ToolError::InvalidState("cannot set up preview without working data".to_string())
        })?;
        let mut preview = match working {
            ImageData::LabelSet(image) => {
                let mut image = image.clone();
                let active = image.active_label().value;
                image.labels_mut().set_active_label_color(Color::GREEN);
                image.labels_mut().update_lookup_table(active)?;
                ImageData::LabelSet(image)
            }
            ImageData::Volume(volume) if volume.pixel_type() == DEFAULT_SEGMENTATION_PIXEL_TYPE => {
                ImageData::Volume(volume.clone())
            }
            ImageData::Volume(volume) => {
                return Err(ToolError::InvalidState(format!(
                    "working data of pixel type {} is not a supported segmentation",
                    volume.pixel_type()
                )));
            }
        };
        if let Some(SegmentationInput::Cropped { roi, .. }) = &self.input {
            let cropped = mask_and_cut(preview.volume(), roi)?;
            preview = preview.with_volume(cropped)?;
        }

        let reference_node = self.reference.and_then(|id| context.storage.get(id));
        let layer = reference_node
            .and_then(|node| node.int_property(property_names::LAYER))
            .unwrap_or(DEFAULT_REFERENCE_LAYER);
        let parent = reference_node.and(self.reference);

        let id = self.register_preview(&mut context.storage, parent)?;
        let node = context.storage.node_mut(id)?;
        node.set_data(Some(preview));
        node.set_color(Color::GREEN);
        node.set_property(
            property_names::LAYER,
            Property::Int(layer + PREVIEW_LAYER_OFFSET),
        );
        Ok(())
    }

    fn register_preview(
        &mut self,
        storage: &mut DataStorage,
        parent: Option<NodeId>,
    ) -> Result<NodeId> {
        if let PreviewSlot::Registered(id) = self.preview
            && storage.exists(id)
        {
            return Ok(id);
        }
        let node = match std::mem::replace(&mut self.preview, PreviewSlot::Detached(DataNode::new())) {
            PreviewSlot::Detached(node) => node,
            PreviewSlot::Registered(_) => default_preview_node(&self.name),
        };
        let id = storage.add(node, parent)?;
        self.preview = PreviewSlot::Registered(id);
        Ok(id)
    }

    fn initiate_tool_by_input(&mut self, context: &ToolContext) -> Result<()> {
        match resolve_input(self.input.as_ref(), &context.storage) {
            Some(input) => self.engine.initiate_by_input(input),
            None => Ok(()),
        }
    }

    fn on_roi_changed(&mut self, context: &mut ToolContext) -> Result<()> {
        self.select_input(context)?;
        self.reset_preview_node(context)?;
        self.initiate_tool_by_input(context)?;
        self.update_preview(context, false)?;
        Ok(())
    }

    fn on_time_point_changed(&mut self, context: &mut ToolContext) -> Result<()> {
        let trigger = TimePointTrigger {
            time_point_change_aware: self.settings.time_point_change_aware,
            lazy_dynamic_previews: self.settings.lazy_dynamic_previews,
            preview_time_steps: preview_node_in(&self.preview, &context.storage)
                .and_then(DataNode::data)
                .map(ImageData::time_steps),
            input_time_steps: resolve_input(self.input.as_ref(), &context.storage)
                .map(Volume::time_steps),
            time_point: context.selected_time_point(),
            last_time_point: self.engine.last_time_point(),
        };
        if should_update_on_time_point_change(&trigger) {
            self.update_preview(context, false)?;
        }
        Ok(())
    }
}

impl Tool for AutoSegmentationTool {
    fn name(&self) -> &str {
        &self.name
    }

    /// Accepts label-set working data and plain volumes of the default
    /// segmentation pixel type.
    fn can_handle(&self, _reference: Option<&ImageData>, working: Option<&ImageData>) -> bool {
        match working {
            None | Some(ImageData::LabelSet(_)) => true,
            Some(ImageData::Volume(volume)) => {
                volume.pixel_type() == DEFAULT_SEGMENTATION_PIXEL_TYPE
            }
        }
    }

    fn activated(&mut self, context: &mut ToolContext) -> Result<()> {
        self.subscriptions.push(context.subscribe(ToolEvent::RoiChanged)?);
        self.subscriptions
            .push(context.subscribe(ToolEvent::TimePointChanged)?);

        self.reference = context.reference_node();
        self.engine.reset_last_time_point();
        self.select_input(context)?;

        if resolve_input(self.input.as_ref(), &context.storage).is_none() {
            debug!(tool = %self.name, "no segmentation input, requesting deactivation");
            context.request_activation(None);
            return Ok(());
        }
        self.reset_preview_node(context)?;
        self.initiate_tool_by_input(context)?;
        self.update_preview(context, false)?;
        Ok(())
    }

    fn deactivated(&mut self, context: &mut ToolContext) {
        for id in self.subscriptions.drain(..) {
            context.unsubscribe(id);
        }
        self.input = None;
        self.reference = None;

        if let PreviewSlot::Registered(id) = self.preview {
            let node = match context.storage.remove(id) {
                Ok(node) => {
                    context.request_render_update();
                    node
                }
                Err(error) => {
                    warn!(tool = %self.name, %error, "preview node could not be removed");
                    default_preview_node(&self.name)
                }
            };
            self.preview = PreviewSlot::Detached(node);
        }
        if let PreviewSlot::Detached(node) = &mut self.preview {
            node.set_data(None);
        }
    }

    fn handle_event(&mut self, event: ToolEvent, context: &mut ToolContext) -> Result<()> {
        match event {
            ToolEvent::RoiChanged => self.on_roi_changed(context),
            ToolEvent::TimePointChanged => self.on_time_point_changed(context),
        }
    }

    fn confirm(&mut self, context: &mut ToolContext) -> Result<()> {
        self.confirm_segmentation(context).map(|_| ())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
