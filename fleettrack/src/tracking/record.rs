//! Location record: the per-unit document in the store.
//!
//! There is exactly one record per unit. Every observation overwrites it
//! completely, so each write is a full snapshot and write order between the
//! poll and the watch does not matter.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::geo::Site;
use crate::host::{Document, Fields, PositionObservation, StoreError};

use super::unit::{Sector, TrackedUnit};

/// Field filled by the store with its write time.
pub const CAPTURED_AT_FIELD: &str = "capturedAt";

/// Snapshot of a unit's last known location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationRecord {
    #[serde(rename = "unit")]
    pub unit_id: String,
    pub plate: String,
    pub driver_name: String,
    pub lat: f64,
    pub lng: f64,
    pub is_active: bool,
    pub is_at_site: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub site_name: Option<String>,
    pub checklist_id: Option<String>,
    pub sector: Sector,
    pub route_document_id: Option<String>,
    /// Device clock at the time of the write.
    pub client_captured_at: DateTime<Utc>,
    /// Store clock at the time of the write. Only present on records read
    /// back from the store.
    #[serde(default, skip_serializing)]
    pub captured_at: Option<DateTime<Utc>>,
}

impl LocationRecord {
    fn base(unit: &TrackedUnit, lat: f64, lng: f64) -> Self {
        Self {
            unit_id: unit.unit_id.clone(),
            plate: unit.plate.clone(),
            driver_name: unit.driver_name.clone(),
            lat,
            lng,
            is_active: true,
            is_at_site: false,
            site_name: None,
            checklist_id: unit.checklist_id.clone(),
            sector: unit.effective_sector(),
            route_document_id: unit.route_document_id.clone(),
            client_captured_at: Utc::now(),
            captured_at: None,
        }
    }

    /// Unit on the move, at the raw device position.
    pub fn in_transit(unit: &TrackedUnit, observation: &PositionObservation) -> Self {
        Self::base(unit, observation.lat, observation.lng)
    }

    /// Unit parked at a site. Uses the site's coordinates, not the device's.
    pub fn at_site(unit: &TrackedUnit, site: &Site) -> Self {
        Self {
            is_active: false,
            is_at_site: true,
            site_name: Some(site.name.clone()),
            ..Self::base(unit, site.lat, site.lng)
        }
    }

    /// Full document for an overwrite.
    pub fn to_document(&self) -> Result<Document, StoreError> {
        Ok(Document::from_serialize(self)?.with_server_timestamp(CAPTURED_AT_FIELD))
    }

    /// Decode a record read back from the store.
    pub fn from_fields(fields: Fields) -> Result<Self, StoreError> {
        Ok(serde_json::from_value(serde_json::Value::Object(fields))?)
    }
}

/// Merge patch that marks a unit inactive without touching anything else.
pub fn inactive_patch() -> Document {
    Document::new()
        .set("isActive", false)
        .with_server_timestamp(CAPTURED_AT_FIELD)
}

/// Store key for a unit: `"<prefix>-<unit_id>"`.
pub fn document_key(prefix: &str, unit_id: &str) -> String {
    format!("{prefix}-{unit_id}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn unit() -> TrackedUnit {
        TrackedUnit::new("42", "AB123CD", "Juan Pérez").with_checklist("chk-1")
    }

    #[test]
    fn test_document_key() {
        assert_eq!(document_key("INT", "42"), "INT-42");
    }

    #[test]
    fn test_in_transit_shape() {
        let record = LocationRecord::in_transit(&unit(), &PositionObservation::new(-34.0, -58.0));
        let doc = record.to_document().unwrap();
        let fields = doc.fields();

        assert_eq!(fields.get("unit"), Some(&json!("42")));
        assert_eq!(fields.get("driverName"), Some(&json!("Juan Pérez")));
        assert_eq!(fields.get("lat"), Some(&json!(-34.0)));
        assert_eq!(fields.get("lng"), Some(&json!(-58.0)));
        assert_eq!(fields.get("isActive"), Some(&json!(true)));
        assert_eq!(fields.get("isAtSite"), Some(&json!(false)));
        assert_eq!(fields.get("sector"), Some(&json!("bulk")));
        assert_eq!(fields.get("checklistId"), Some(&json!("chk-1")));
        assert_eq!(fields.get("routeDocumentId"), Some(&json!(null)));
        assert!(!fields.contains_key("siteName"));
        assert!(fields.contains_key("clientCapturedAt"));
        assert_eq!(doc.server_timestamp_fields(), [CAPTURED_AT_FIELD.to_string()]);
    }

    #[test]
    fn test_at_site_uses_site_coordinates() {
        let site = Site::new("x", -34.3601, -59.0099, "Depot X");
        let record = LocationRecord::at_site(&unit(), &site);

        assert_eq!((record.lat, record.lng), (-34.3601, -59.0099));
        assert!(!record.is_active);
        assert!(record.is_at_site);
        assert_eq!(record.site_name.as_deref(), Some("Depot X"));
    }

    #[test]
    fn test_inactive_patch_fields() {
        let fields = inactive_patch().resolve(Utc::now());
        assert_eq!(fields.len(), 2);
        assert_eq!(fields.get("isActive"), Some(&json!(false)));
        assert!(fields.contains_key(CAPTURED_AT_FIELD));
    }

    #[test]
    fn test_read_back_with_server_timestamp() {
        let record = LocationRecord::in_transit(&unit(), &PositionObservation::new(-34.0, -58.0));
        let fields = record.to_document().unwrap().resolve(Utc::now());

        let decoded = LocationRecord::from_fields(fields).unwrap();
        assert_eq!(decoded.unit_id, "42");
        assert!(decoded.captured_at.is_some());
        assert!(decoded.is_active);
    }
}
