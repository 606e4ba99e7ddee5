//! Per-route "GPS active" flags kept on the device.
//!
//! Distribution routes show a prompt to turn on GPS tracking. Once a unit on
//! that route is tracking, the flag is set so the prompt stays hidden; when
//! the unit arrives back at a depot the flag is cleared.

use std::collections::HashSet;

use parking_lot::Mutex;

/// Local storage for route GPS flags.
pub trait RouteFlags: Send + Sync {
    fn mark_gps_active(&self, route_id: &str);

    fn clear_gps_active(&self, route_id: &str);

    fn is_gps_active(&self, route_id: &str) -> bool;
}

/// In-process route flags.
#[derive(Debug, Default)]
pub struct MemoryRouteFlags {
    active: Mutex<HashSet<String>>,
}

impl MemoryRouteFlags {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RouteFlags for MemoryRouteFlags {
    fn mark_gps_active(&self, route_id: &str) {
        self.active.lock().insert(route_id.to_string());
    }

    fn clear_gps_active(&self, route_id: &str) {
        self.active.lock().remove(route_id);
    }

    fn is_gps_active(&self, route_id: &str) -> bool {
        self.active.lock().contains(route_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mark_and_clear() {
        let flags = MemoryRouteFlags::new();
        assert!(!flags.is_gps_active("HDR-1"));

        flags.mark_gps_active("HDR-1");
        assert!(flags.is_gps_active("HDR-1"));
        assert!(!flags.is_gps_active("HDR-2"));

        flags.clear_gps_active("HDR-1");
        assert!(!flags.is_gps_active("HDR-1"));
    }

    #[test]
    fn test_clear_unknown_route_is_noop() {
        let flags = MemoryRouteFlags::new();
        flags.clear_gps_active("missing");
        assert!(!flags.is_gps_active("missing"));
    }
}
