use std::time::{SystemTime, UNIX_EPOCH};

use tracing::{info, warn};

/// Pin the calling thread to `core`; logs and continues if the core is unavailable
pub fn pin_current_thread(core: usize) -> bool {
    let Some(ids) = core_affinity::get_core_ids() else {
        warn!("Unable to query CPU cores, worker left unpinned");
        return false;
    };

    match ids.into_iter().find(|id| id.id == core) {
        Some(id) if core_affinity::set_for_current(id) => {
            info!("Frame worker pinned to core {}", core);
            true
        }
        _ => {
            warn!("Could not pin frame worker to core {}", core);
            false
        }
    }
}

/// Session identity from the wall clock, in milliseconds since the Unix epoch
pub fn default_session_id() -> String {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or_default();
    format!("VID_{}", millis)
}
