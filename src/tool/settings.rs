use serde::{Deserialize, Serialize};

/// Behavior switches of a preview-based segmentation tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolSettings {
    /// Recompute only the selected time step while interacting; the rest is
    /// computed on confirm.
    pub lazy_dynamic_previews: bool,
    /// Commit every time step instead of only the selected one.
    pub create_all_time_steps: bool,
    pub keep_active_after_accept: bool,
    pub time_point_change_aware: bool,
}

impl Default for ToolSettings {
    fn default() -> Self {
        Self {
            lazy_dynamic_previews: false,
            create_all_time_steps: true,
            keep_active_after_accept: false,
            time_point_change_aware: true,
        }
    }
}
