//! The vehicle being tracked.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Business sector a unit operates in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Sector {
    /// Bulk deliveries. Written for units with no sector set.
    #[default]
    Bulk,
    /// Route-based distribution; the only sector with route documents.
    Distribution,
    MedicalGas,
}

impl Sector {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Bulk => "bulk",
            Self::Distribution => "distribution",
            Self::MedicalGas => "medical-gas",
        }
    }
}

impl fmt::Display for Sector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Sector {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "bulk" => Ok(Self::Bulk),
            "distribution" => Ok(Self::Distribution),
            "medical-gas" | "medical_gas" => Ok(Self::MedicalGas),
            other => Err(format!(
                "unknown sector '{other}' (expected bulk, distribution or medical-gas)"
            )),
        }
    }
}

/// Identity of the unit a tracking session reports for.
///
/// Fixed for the lifetime of one session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackedUnit {
    /// Unit identifier, e.g. the vehicle number.
    pub unit_id: String,
    pub plate: String,
    pub driver_name: String,
    pub sector: Option<Sector>,
    /// Route document; only meaningful for [`Sector::Distribution`].
    pub route_document_id: Option<String>,
    /// Checklist the session was started from, for correlation.
    pub checklist_id: Option<String>,
}

impl TrackedUnit {
    pub fn new(
        unit_id: impl Into<String>,
        plate: impl Into<String>,
        driver_name: impl Into<String>,
    ) -> Self {
        Self {
            unit_id: unit_id.into(),
            plate: plate.into(),
            driver_name: driver_name.into(),
            sector: None,
            route_document_id: None,
            checklist_id: None,
        }
    }

    pub fn with_sector(mut self, sector: Sector) -> Self {
        self.sector = Some(sector);
        self
    }

    pub fn with_route_document(mut self, route_document_id: impl Into<String>) -> Self {
        self.route_document_id = Some(route_document_id.into());
        self
    }

    pub fn with_checklist(mut self, checklist_id: impl Into<String>) -> Self {
        self.checklist_id = Some(checklist_id.into());
        self
    }

    /// Sector as written to the store.
    pub fn effective_sector(&self) -> Sector {
        self.sector.unwrap_or_default()
    }

    /// The route whose "GPS active" flag this unit drives, if any.
    pub fn tracked_route(&self) -> Option<&str> {
        match self.sector {
            Some(Sector::Distribution) => self.route_document_id.as_deref(),
            _ => None,
        }
    }

    /// Name of the first required identity field that is blank.
    pub fn missing_field(&self) -> Option<&'static str> {
        [
            ("unit_id", &self.unit_id),
            ("plate", &self.plate),
            ("driver_name", &self.driver_name),
        ]
        .into_iter()
        .find(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| name)
    }

    /// Whether the unit id can be part of a record key.
    ///
    /// Path separators and NUL are rejected since keys double as file names.
    pub fn has_addressable_id(&self) -> bool {
        !self.unit_id.contains(&['/', '\\', '\0'][..])
    }
}
