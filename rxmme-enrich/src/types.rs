//! Core types and the terminology source trait
//!
//! [`TerminologySource`] is the seam between the enrichment pipeline and the
//! remote drug terminology service. The production implementation is
//! [`RxNavClient`](crate::services::RxNavClient); tests substitute fakes.
//!
//! Soft absence ("the service has no data for this") is `Ok(None)` or an
//! empty collection. `Err` is reserved for hard failures (transport,
//! unexpected HTTP status, unparseable required response).

use crate::services::rxnav_client::RxNavError;

/// Descriptive attributes from RxTerms
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DrugDescription {
    pub full_name: Option<String>,
    pub full_generic_name: Option<String>,
    pub route: Option<String>,
    pub dose_form: Option<String>,
    pub strength: Option<String>,
}

/// Pharmacologic class assignment (VA class)
#[derive(Debug, Clone, PartialEq)]
pub struct DrugClass {
    pub class_id: String,
    pub class_name: String,
}

/// One node of a class graph
#[derive(Debug, Clone, PartialEq)]
pub struct ClassConcept {
    pub class_id: String,
    pub class_name: String,
    pub class_type: Option<String>,
}

/// Class graph response, nodes in service order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClassGraph {
    pub concepts: Vec<ClassConcept>,
}

impl ClassGraph {
    /// Therapeutic class name: the second node of the graph
    ///
    /// The first node is the requested class itself, the second its parent.
    /// Graphs with fewer than two nodes have no therapeutic class.
    pub fn therapeutic_class_name(&self) -> Option<&str> {
        self.concepts.get(1).map(|c| c.class_name.as_str())
    }
}

/// One active ingredient with its strength
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IngredientStrength {
    pub base_name: String,
    /// Raw numerator value as reported; parsed by the MME calculator
    pub numerator_value: String,
    pub numerator_unit: String,
    pub denominator_unit: String,
}

impl IngredientStrength {
    pub fn new(
        base_name: impl Into<String>,
        numerator_value: impl Into<String>,
        numerator_unit: impl Into<String>,
        denominator_unit: impl Into<String>,
    ) -> Self {
        Self {
            base_name: base_name.into(),
            numerator_value: numerator_value.into(),
            numerator_unit: numerator_unit.into(),
            denominator_unit: denominator_unit.into(),
        }
    }
}

/// Ingredient composition and dose form descriptors of a concept
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DefinitionalFeatures {
    pub ingredients: Vec<IngredientStrength>,
    /// Dose form group names (e.g. "Nasal Product")
    pub dose_form_groups: Vec<String>,
    /// Dose form names (e.g. "Buccal Film")
    pub dose_forms: Vec<String>,
}

/// Remote drug terminology service
///
/// # Example
/// ```rust,ignore
/// use rxmme_enrich::types::TerminologySource;
///
/// if let Some(rxcui) = source.resolve_ndc("00406052301").await? {
///     let features = source.definitional_features(&rxcui).await?;
///     println!("{} ingredients", features.ingredients.len());
/// }
/// ```
#[async_trait::async_trait]
pub trait TerminologySource: Send + Sync {
    /// Resolve an NDC to its RxCUI
    ///
    /// `None` when the NDC is unknown, not current, or maps to no concept.
    async fn resolve_ndc(&self, ndc: &str) -> Result<Option<String>, RxNavError>;

    /// RxTerms descriptive attributes
    async fn describe(&self, rxcui: &str) -> Result<Option<DrugDescription>, RxNavError>;

    /// First VA pharmacologic class of the concept
    async fn classify(&self, rxcui: &str) -> Result<Option<DrugClass>, RxNavError>;

    /// Class graph rooted at a class id
    async fn class_graph(&self, class_id: &str) -> Result<Option<ClassGraph>, RxNavError>;

    /// Raw `SCHEDULE` property value
    async fn schedule(&self, rxcui: &str) -> Result<Option<String>, RxNavError>;

    /// Ingredient composition and dose forms
    async fn definitional_features(&self, rxcui: &str)
        -> Result<DefinitionalFeatures, RxNavError>;
}
