mod algorithms;
mod commit;
mod controller;
mod error;
mod hooks;
mod manager;
mod preview;
mod settings;
mod signal;
mod transfer;


pub use algorithms::{
    AlgorithmSchema, AlgorithmSpec, OtsuThresholdHooks, ParamSpec, ThresholdHooks,
    list_algorithms,
};
pub use commit::{CommitReport, pad_to_reference_segmentation, transfer_preview};
pub use controller::{AutoSegmentationTool, PREVIEW_LAYER_OFFSET, default_preview_node};
pub use error::{Result, ToolError, TransferError};
pub use hooks::{NoopHooks, PreviewHooks};
pub use manager::{EventBus, SubscriptionId, Tool, ToolContext, ToolEvent, ToolId, ToolManager};
pub use preview::{
    PreviewEngine, PreviewState, TimePointTrigger, UpdateOutcome, UpdateScope,
    should_update_on_time_point_change, update_scope,
};
pub use settings::ToolSettings;
pub use signal::{ConnectionId, PREVIEW_PROGRESS_STEPS, Progress, Signal};
pub use transfer::{transfer_time_step, transfer_volume};
