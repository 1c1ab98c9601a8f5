use std::any::Any;
use std::collections::BTreeMap;
use std::fmt;

use tracing::{debug, info};

use crate::filters::RegionOfInterest;
use crate::model::ImageData;
use crate::storage::{DataStorage, NodeId};

use super::{Result, ToolError};

/// Notifications a tool may subscribe to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ToolEvent {
    RoiChanged,
    TimePointChanged,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ToolId(usize);

impl ToolId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Subscription handle for unsubscribing from events
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SubscriptionId(u64);

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Sub({})", self.0)
    }
}

#[derive(Debug, Default)]
pub struct EventBus {
    subscriptions: BTreeMap<SubscriptionId, (ToolEvent, ToolId)>,
    next_id: u64,
}

impl EventBus {
    pub fn subscribe(&mut self, event: ToolEvent, tool: ToolId) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.subscriptions.insert(id, (event, tool));
        debug!("Subscription {} added for {:?}", id, event);
        id
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let removed = self.subscriptions.remove(&id).is_some();
        if removed {
            debug!("Subscription {} removed", id);
        }
        removed
    }

    /// Subscribed tools in subscription order, without duplicates.
    pub fn subscribers(&self, event: ToolEvent) -> Vec<ToolId> {
        let mut tools = Vec::new();
        for (subscribed, tool) in self.subscriptions.values() {
            if *subscribed == event && !tools.contains(tool) {
                tools.push(*tool);
            }
        }
        tools
    }

    pub fn subscription_count(&self) -> usize {
        self.subscriptions.len()
    }
}

/// Shared state tools read their inputs from and report back to.
#[derive(Debug, Default)]
pub struct ToolContext {
    pub storage: DataStorage,
    reference: Option<NodeId>,
    working: Option<NodeId>,
    roi: Option<RegionOfInterest>,
    time_point: f64,
    render_requests: u64,
    bus: EventBus,
    current_tool: Option<ToolId>,
    pending_activation: Option<Option<ToolId>>,
}

impl ToolContext {
    pub fn new(storage: DataStorage) -> Self {
        Self {
            storage,
            ..Self::default()
        }
    }

    pub fn reference_node(&self) -> Option<NodeId> {
        self.reference
    }

    pub fn working_node(&self) -> Option<NodeId> {
        self.working
    }

    pub fn reference_data(&self) -> Option<&ImageData> {
        self.reference.and_then(|id| self.storage.data(id))
    }

    pub fn working_data(&self) -> Option<&ImageData> {
        self.working.and_then(|id| self.storage.data(id))
    }

    pub fn roi(&self) -> Option<&RegionOfInterest> {
        self.roi.as_ref()
    }

    pub fn selected_time_point(&self) -> f64 {
        self.time_point
    }

    pub fn request_render_update(&mut self) {
        self.render_requests += 1;
    }

    pub fn render_requests(&self) -> u64 {
        self.render_requests
    }

    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    /// Subscribes the tool currently being called to `event`.
    pub fn subscribe(&mut self, event: ToolEvent) -> Result<SubscriptionId> {
        let tool = self.current_tool.ok_or_else(|| {
            ToolError::InvalidState("subscriptions require a calling tool".to_string())
        })?;
        Ok(self.bus.subscribe(event, tool))
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.bus.unsubscribe(id)
    }

    /// Asks the manager to switch tools once the current call returns.
    /// `None` deactivates the active tool.
    pub fn request_activation(&mut self, tool: Option<ToolId>) {
        self.pending_activation = Some(tool);
    }
}

/// Interactive segmentation tool hosted by a [`ToolManager`].
pub trait Tool: Any {
    fn name(&self) -> &str;

    fn can_handle(&self, reference: Option<&ImageData>, working: Option<&ImageData>) -> bool;

    fn activated(&mut self, context: &mut ToolContext) -> Result<()>;

    /// Must not fail; cleanup problems are logged and swallowed.
    fn deactivated(&mut self, context: &mut ToolContext);

    fn handle_event(&mut self, event: ToolEvent, context: &mut ToolContext) -> Result<()>;

    fn confirm(&mut self, _context: &mut ToolContext) -> Result<()> {
        Ok(())
    }

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// Hosts tools, owns the data storage and dispatches selection changes.
#[derive(Default)]
pub struct ToolManager {
    context: ToolContext,
    tools: Vec<Box<dyn Tool>>,
    active: Option<ToolId>,
}

impl fmt::Debug for ToolManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ToolManager")
            .field("context", &self.context)
            .field(
                "tools",
                &self.tools.iter().map(|tool| tool.name()).collect::<Vec<_>>(),
            )
            .field("active", &self.active)
            .finish()
    }
}

impl ToolManager {
    pub fn new(storage: DataStorage) -> Self {
        Self {
            context: ToolContext::new(storage),
            ..Self::default()
        }
    }

    pub fn register_tool(&mut self, tool: Box<dyn Tool>) -> ToolId {
        let id = ToolId(self.tools.len());
        debug!(tool = tool.name(), id = id.0, "registered tool");
        self.tools.push(tool);
        id
    }

    pub fn context(&self) -> &ToolContext {
        &self.context
    }

    pub fn context_mut(&mut self) -> &mut ToolContext {
        &mut self.context
    }

    pub fn storage(&self) -> &DataStorage {
        &self.context.storage
    }

    pub fn storage_mut(&mut self) -> &mut DataStorage {
        &mut self.context.storage
    }

    pub fn active_tool(&self) -> Option<ToolId> {
        self.active
    }

    pub fn tool<T: Tool>(&self, id: ToolId) -> Option<&T> {
        self.tools.get(id.0)?.as_any().downcast_ref::<T>()
    }

    pub fn tool_mut<T: Tool>(&mut self, id: ToolId) -> Option<&mut T> {
        self.tools.get_mut(id.0)?.as_any_mut().downcast_mut::<T>()
    }

    /// Tool `id` together with the context it operates on.
    pub fn tool_and_context_mut<T: Tool>(
        &mut self,
        id: ToolId,
    ) -> Option<(&mut T, &mut ToolContext)> {
        let tool = self.tools.get_mut(id.0)?.as_any_mut().downcast_mut::<T>()?;
        Some((tool, &mut self.context))
    }

    pub fn set_reference_data(&mut self, node: Option<NodeId>) {
        self.context.reference = node;
    }

    pub fn set_working_data(&mut self, node: Option<NodeId>) {
        self.context.working = node;
    }

    pub fn set_roi(&mut self, roi: Option<RegionOfInterest>) -> Result<()> {
        self.context.roi = roi;
        self.publish(ToolEvent::RoiChanged)
    }

    pub fn set_selected_time_point(&mut self, time_point: f64) -> Result<()> {
        self.context.time_point = time_point;
        self.publish(ToolEvent::TimePointChanged)
    }

    /// Deactivates the active tool and activates `tool`, if any.
    ///
    /// A tool that cannot handle the selected data is rejected before it is
    /// activated; a tool whose activation fails is deactivated again.
    pub fn activate_tool(&mut self, tool: Option<ToolId>) -> Result<()> {
        self.switch_tool(tool)?;
        self.apply_pending_activation()
    }

    /// Confirms the active tool's preview.
    pub fn confirm(&mut self) -> Result<()> {
        let id = self.active.ok_or_else(|| {
            ToolError::InvalidState("no active tool to confirm".to_string())
        })?;
        self.context.current_tool = Some(id);
        let result = self.tools[id.0].confirm(&mut self.context);
        self.context.current_tool = None;
        result?;
        self.apply_pending_activation()
    }

    fn switch_tool(&mut self, tool: Option<ToolId>) -> Result<()> {
        if tool == self.active {
            return Ok(());
        }
        if let Some(id) = tool
            && id.0 >= self.tools.len()
        {
            return Err(ToolError::UnknownTool(id.0));
        }
        self.deactivate_current();

        let Some(id) = tool else {
            return Ok(());
        };
        let candidate = &self.tools[id.0];
        if !candidate.can_handle(self.context.reference_data(), self.context.working_data()) {
            return Err(ToolError::CannotHandle(candidate.name().to_string()));
        }

        self.active = Some(id);
        self.context.current_tool = Some(id);
        let result = self.tools[id.0].activated(&mut self.context);
        self.context.current_tool = None;
        match result {
            Ok(()) => {
                info!(tool = self.tools[id.0].name(), "tool activated");
                Ok(())
            }
            Err(error) => {
                self.deactivate_current();
                Err(error)
            }
        }
    }

    fn deactivate_current(&mut self) {
        if let Some(id) = self.active.take() {
            self.context.current_tool = Some(id);
            self.tools[id.0].deactivated(&mut self.context);
            self.context.current_tool = None;
            info!(tool = self.tools[id.0].name(), "tool deactivated");
        }
    }

    fn apply_pending_activation(&mut self) -> Result<()> {
        while let Some(request) = self.context.pending_activation.take() {
            self.switch_tool(request)?;
        }
        Ok(())
    }

    fn publish(&mut self, event: ToolEvent) -> Result<()> {
        for id in self.context.bus.subscribers(event) {
            self.context.current_tool = Some(id);
            let result = self.tools[id.0].handle_event(event, &mut self.context);
            self.context.current_tool = None;
            result?;
        }
        self.apply_pending_activation()
    }
}
