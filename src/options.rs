use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::dom::NodeId;

/// Per-dialog configuration, resolved once when the dialog is requested and
/// immutable afterwards.
///
/// Hosts typically start from [`Options::default`] and override individual
/// fields with struct-update syntax:
///
/// ```ignore
/// let options = Options {
///     fade_duration_ms: Some(150),
///     show_close: true,
///     ..Options::default()
/// };
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Options {
    /// Close every already-open dialog before this one is pushed.
    pub close_existing: bool,
    /// Escape closes the dialog while it is the current one.
    pub escape_close: bool,
    /// A click directly on the blocking layer closes the dialog.
    pub click_close: bool,
    /// Label of the generated close affordance.
    pub close_text: String,
    /// Extra class for the generated close affordance.
    pub close_class: String,
    /// Class applied to the dialog content, also the prefix for the
    /// `-visible` and `-spinner` modifier classes.
    pub modal_class: String,
    /// Show the loading indicator during remote content resolution.
    pub show_spinner: bool,
    /// Markup placed inside the loading indicator.
    pub spinner_markup: Option<String>,
    /// Generate a close affordance inside the dialog content.
    pub show_close: bool,
    /// Fade duration in milliseconds. Absent means every fade branch
    /// collapses to an immediate transition.
    pub fade_duration_ms: Option<u64>,
    /// Point during the blocker's fade-in at which the content begins to
    /// reveal (0.5 = halfway, 1.5 = 150%; values past 1.0 defer the reveal
    /// beyond the blocker fade).
    pub fade_delay_fraction: f64,
    /// Suspend background scrolling while any dialog is open.
    pub scroll_lock: bool,
    /// Element the dialog docks against (tooltip-style positioning).
    pub dock_anchor: Option<NodeId>,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            close_existing: true,
            escape_close: true,
            click_close: true,
            close_text: "Close".to_string(),
            close_class: String::new(),
            modal_class: "dockedmodal".to_string(),
            show_spinner: true,
            spinner_markup: None,
            show_close: false,
            fade_duration_ms: None,
            fade_delay_fraction: 1.0,
            scroll_lock: false,
            dock_anchor: None,
        }
    }
}

impl Options {
    /// Whether open/close transitions animate at all.
    pub fn do_fade(&self) -> bool {
        self.fade_duration_ms.is_some()
    }

    pub fn fade_duration(&self) -> Duration {
        Duration::from_millis(self.fade_duration_ms.unwrap_or(0))
    }

    /// Delay between the blocker appearing and the content reveal starting.
    pub fn reveal_delay(&self) -> Duration {
        let ms = self.fade_duration_ms.unwrap_or(0) as f64 * self.fade_delay_fraction.max(0.0);
        Duration::from_millis(ms as u64)
    }
}
