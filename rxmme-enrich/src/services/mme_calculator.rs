//! MME conversion engine
//!
//! Computes the Morphine Milligram Equivalent of a concept from its
//! ingredient composition. Each ingredient contributes
//! `conversion factor × strength`; the total is rounded to 3 decimals.
//!
//! Buprenorphine and fentanyl factors depend on the delivery route, so they
//! have dedicated rules. Every other tracked opioid uses a fixed factor from
//! [`CONVERSION_FACTORS`]. Ingredients matching no rule contribute nothing.

use crate::types::{DefinitionalFeatures, IngredientStrength};
use thiserror::Error;

/// Fixed MME conversion factors, keyed by lower-cased base ingredient name
pub const CONVERSION_FACTORS: [(&str, f64); 16] = [
    ("butorphanol", 7.0),
    ("codeine", 0.15),
    ("dihydrocodeine", 0.25),
    ("hydrocodone", 4.0),
    ("hydromorphone", 5.0),
    ("levomethadyl acetate", 8.0),
    ("levorphanol tartrate", 11.0),
    ("meperidine", 0.1),
    ("methadone", 4.7),
    ("morphine", 1.0),
    ("opium", 1.0),
    ("oxycodone", 1.5),
    ("oxymorphone", 3.0),
    ("pentazocine", 0.37),
    ("tapentadol", 0.4),
    ("tramadol", 0.2),
];

/// Denominator unit of continuous-delivery (per hour) strengths
const PER_HOUR: &str = "HR";

const BUPRENORPHINE_TRANSDERMAL: f64 = 12600.0;
const BUPRENORPHINE_OTHER: f64 = 30.0;

const FENTANYL_TRANSDERMAL: f64 = 2400.0;
const FENTANYL_NASAL: f64 = 160.0;
const FENTANYL_MUCOSAL: f64 = 180.0;
const FENTANYL_BUCCAL_FILM: f64 = 180.0;
const FENTANYL_OTHER: f64 = 130.0;

/// MME calculation errors
#[derive(Debug, Error, PartialEq)]
pub enum MmeError {
    #[error("Non-numeric strength {value:?} for {ingredient}")]
    NonNumericStrength { ingredient: String, value: String },

    #[error("Negative strength {value} for {ingredient}")]
    NegativeStrength { ingredient: String, value: f64 },
}

/// Result of an MME calculation
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MmeCalculation {
    /// Summed MME, rounded to 3 decimals
    pub calculated_mme: f64,
    /// Strength of the last ingredient that matched a rule
    pub strength_per_unit: Option<f64>,
    /// Factor applied to that ingredient
    pub conversion_factor: Option<f64>,
}

/// Look up the fixed conversion factor of an ingredient
pub fn table_factor(base_name: &str) -> Option<f64> {
    let name = base_name.to_lowercase();
    CONVERSION_FACTORS
        .iter()
        .find(|(ingredient, _)| *ingredient == name)
        .map(|(_, factor)| *factor)
}

/// Conversion factor for one ingredient of a concept, if it is a tracked opioid
pub fn conversion_factor(
    ingredient: &IngredientStrength,
    features: &DefinitionalFeatures,
) -> Option<f64> {
    let per_hour = ingredient.denominator_unit == PER_HOUR;

    match ingredient.base_name.to_lowercase().as_str() {
        "buprenorphine" => Some(if per_hour {
            BUPRENORPHINE_TRANSDERMAL
        } else {
            BUPRENORPHINE_OTHER
        }),
        "fentanyl" => {
            let has_group = |name: &str| features.dose_form_groups.iter().any(|g| g == name);
            let has_form = |name: &str| features.dose_forms.iter().any(|f| f == name);

            Some(if per_hour {
                FENTANYL_TRANSDERMAL
            } else if has_group("Nasal Product") {
                FENTANYL_NASAL
            } else if has_group("Mucosal Product") {
                FENTANYL_MUCOSAL
            } else if has_form("Buccal Film") {
                FENTANYL_BUCCAL_FILM
            } else {
                FENTANYL_OTHER
            })
        }
        other => table_factor(other),
    }
}

fn parse_strength(ingredient: &IngredientStrength) -> Result<f64, MmeError> {
    let raw = ingredient.numerator_value.trim();
    let value: f64 = raw
        .parse()
        .ok()
        .filter(|v: &f64| v.is_finite())
        .ok_or_else(|| MmeError::NonNumericStrength {
            ingredient: ingredient.base_name.clone(),
            value: ingredient.numerator_value.clone(),
        })?;

    if value < 0.0 {
        return Err(MmeError::NegativeStrength {
            ingredient: ingredient.base_name.clone(),
            value,
        });
    }
    Ok(value)
}

/// Round to 3 decimal places
fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

/// Calculate the MME of a concept
///
/// Ingredients are processed in source order. The strength and factor of
/// the last matching ingredient are reported alongside the summed total.
pub fn calculate_mme(features: &DefinitionalFeatures) -> Result<MmeCalculation, MmeError> {
    let mut total = 0.0;
    let mut result = MmeCalculation::default();

    for ingredient in &features.ingredients {
        let Some(factor) = conversion_factor(ingredient, features) else {
            continue;
        };

        let strength = parse_strength(ingredient)?;
        total += factor * strength;

        result.strength_per_unit = Some(strength);
        result.conversion_factor = Some(factor);

        tracing::trace!(
            ingredient = %ingredient.base_name,
            strength,
            factor,
            "MME contribution"
        );
    }

    result.calculated_mme = round3(total);
    Ok(result)
}
