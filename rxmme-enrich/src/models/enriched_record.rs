//! Enriched drug record
//!
//! One output row per product identifier. Every field except the NDC is
//! optional: a record is a best-effort aggregate of whatever the terminology
//! service could answer. Serde names double as the output table header.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Output column names, in table order
pub const COLUMNS: [&str; 12] = [
    "NDC",
    "Medication_Name",
    "Simple_Generic_1",
    "Route",
    "Form",
    "Strength",
    "Pharm_Class_1",
    "Thera_Class_1",
    "Strength_Per_Unit",
    "MME_Conversion_Factor",
    "Calculated_MME",
    "DEA_Class",
];

/// DEA controlled-substance schedule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeaSchedule {
    #[serde(rename = "C-I")]
    CI,
    #[serde(rename = "C-II")]
    CII,
    #[serde(rename = "C-III")]
    CIII,
    #[serde(rename = "C-IV")]
    CIV,
    #[serde(rename = "C-V")]
    CV,
}

impl DeaSchedule {
    /// Map the RxNorm `SCHEDULE` property value ("1".."5") to a schedule
    ///
    /// Any other value, including "0" for non-controlled products, is `None`.
    pub fn from_property(value: &str) -> Option<Self> {
        match value.trim() {
            "1" => Some(Self::CI),
            "2" => Some(Self::CII),
            "3" => Some(Self::CIII),
            "4" => Some(Self::CIV),
            "5" => Some(Self::CV),
            _ => None,
        }
    }

    /// Display label ("C-I".."C-V")
    pub fn label(&self) -> &'static str {
        match self {
            Self::CI => "C-I",
            Self::CII => "C-II",
            Self::CIII => "C-III",
            Self::CIV => "C-IV",
            Self::CV => "C-V",
        }
    }
}

impl fmt::Display for DeaSchedule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Enriched record for one NDC
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EnrichedRecord {
    /// Product identifier (join key)
    #[serde(rename = "NDC")]
    pub ndc: String,

    /// Full RxTerms display name
    #[serde(rename = "Medication_Name", default)]
    pub medication_name: Option<String>,

    /// Full generic name
    #[serde(rename = "Simple_Generic_1", default)]
    pub generic_name: Option<String>,

    /// Administration route
    #[serde(rename = "Route", default)]
    pub route: Option<String>,

    /// RxTerms dose form
    #[serde(rename = "Form", default)]
    pub form: Option<String>,

    /// RxTerms strength descriptor (e.g. "5 mg / 325 mg")
    #[serde(rename = "Strength", default)]
    pub strength: Option<String>,

    /// VA pharmacologic class name
    #[serde(rename = "Pharm_Class_1", default)]
    pub pharm_class: Option<String>,

    /// VA therapeutic class name (parent of the pharmacologic class)
    #[serde(rename = "Thera_Class_1", default)]
    pub thera_class: Option<String>,

    /// Strength of the last opioid ingredient used in the MME calculation
    #[serde(rename = "Strength_Per_Unit", default)]
    pub strength_per_unit: Option<f64>,

    /// Conversion factor applied to that ingredient
    #[serde(rename = "MME_Conversion_Factor", default)]
    pub conversion_factor: Option<f64>,

    /// Summed MME, rounded to 3 decimals
    #[serde(rename = "Calculated_MME", default)]
    pub calculated_mme: Option<f64>,

    /// Controlled-substance schedule
    #[serde(rename = "DEA_Class", default)]
    pub dea_class: Option<DeaSchedule>,
}

impl EnrichedRecord {
    /// Record holding only the identifier (unresolved NDC)
    pub fn unresolved(ndc: impl Into<String>) -> Self {
        Self {
            ndc: ndc.into(),
            ..Self::default()
        }
    }

    /// True when no field besides the NDC is populated
    pub fn is_identifier_only(&self) -> bool {
        *self == Self::unresolved(self.ndc.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schedule_mapping() {
        assert_eq!(DeaSchedule::from_property("1"), Some(DeaSchedule::CI));
        assert_eq!(DeaSchedule::from_property("2"), Some(DeaSchedule::CII));
        assert_eq!(DeaSchedule::from_property("3"), Some(DeaSchedule::CIII));
        assert_eq!(DeaSchedule::from_property("4"), Some(DeaSchedule::CIV));
        assert_eq!(DeaSchedule::from_property("5"), Some(DeaSchedule::CV));
        assert_eq!(DeaSchedule::from_property("0"), None);
        assert_eq!(DeaSchedule::from_property("6"), None);
        assert_eq!(DeaSchedule::from_property("CII"), None);
        assert_eq!(DeaSchedule::CIV.to_string(), "C-IV");
    }

    #[test]
    fn test_unresolved_record() {
        let record = EnrichedRecord::unresolved("00000000000");
        assert_eq!(record.ndc, "00000000000");
        assert!(record.is_identifier_only());

        let record = EnrichedRecord {
            calculated_mme: Some(0.0),
            ..EnrichedRecord::unresolved("00000000000")
        };
        assert!(!record.is_identifier_only());
    }

    #[test]
    fn test_json_preserves_absent_fields() {
        let record = EnrichedRecord {
            medication_name: Some("fentaNYL 25 MCG/HR Transdermal Patch".to_string()),
            strength_per_unit: Some(0.025),
            conversion_factor: Some(2400.0),
            calculated_mme: Some(60.0),
            dea_class: Some(DeaSchedule::CII),
            ..EnrichedRecord::unresolved("00093302255")
        };

        let json = serde_json::to_string(&record).unwrap();
        assert!(json.contains("\"DEA_Class\":\"C-II\""));
        assert!(json.contains("\"Route\":null"));

        let loaded: EnrichedRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(loaded, record);
    }
}
