//! RxNav REST API client
//!
//! Resolves NDCs to RxCUIs and fetches the descriptive, classification,
//! schedule and ingredient data used to build an enriched record.
//!
//! # API Reference
//! - NDC status: `/ndcstatus.json?ndc={ndc}`
//! - RxTerms: `/RxTerms/rxcui/{rxcui}/allinfo.json`
//! - RxClass: `/rxclass/class/byRxcui.json`, `/rxclass/classGraph.json`
//! - Properties: `/rxcui/{rxcui}/property.json?propName=SCHEDULE`
//! - History: `/rxcui/{rxcui}/historystatus.json`
//! - Rate limit: 20 requests/second per client (RxNav Terms of Service)
//!
//! A 404 or a missing sub-object is reported as absence. For the optional
//! sub-queries an unparseable body is also absence (logged at WARN). The NDC
//! status and history status bodies are required to parse.

use crate::types::{
    ClassConcept, ClassGraph, DefinitionalFeatures, DrugClass, DrugDescription,
    IngredientStrength, TerminologySource,
};
use crate::utils::retry_transient;
use rxmme_common::config::RxNavSettings;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, warn};

const USER_AGENT: &str = concat!("rxmme/", env!("CARGO_PKG_VERSION"));

/// RxNav client errors
#[derive(Debug, Error)]
pub enum RxNavError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("API error {0}: {1}")]
    Api(u16, String),

    #[error("Parse error: {0}")]
    Parse(String),
}

impl RxNavError {
    /// Whether retrying the same request may succeed
    ///
    /// Connectivity failures, timeouts, 429 and 5xx are transient; client
    /// errors and malformed bodies are not.
    pub fn is_transient(&self) -> bool {
        match self {
            RxNavError::Network(_) | RxNavError::Timeout(_) => true,
            RxNavError::Api(status, _) => *status == 429 || (500..600).contains(status),
            RxNavError::Parse(_) => false,
        }
    }

    fn from_reqwest(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            RxNavError::Timeout(err.to_string())
        } else {
            RxNavError::Network(err.to_string())
        }
    }
}

// ============================================================================
// Wire format
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NdcStatusResponse {
    ndc_status: Option<NdcStatus>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NdcStatus {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    concept_status: Option<String>,
    #[serde(default)]
    rxcui: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RxTermsResponse {
    rxterms_properties: Option<RxTermsProperties>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RxTermsProperties {
    #[serde(default)]
    full_name: Option<String>,
    #[serde(default)]
    full_generic_name: Option<String>,
    #[serde(default)]
    route: Option<String>,
    #[serde(default)]
    rxterms_dose_form: Option<String>,
    #[serde(default)]
    strength: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ClassByRxcuiResponse {
    rxclass_drug_info_list: Option<RxClassDrugInfoList>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RxClassDrugInfoList {
    #[serde(default)]
    rxclass_drug_info: Vec<RxClassDrugInfo>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RxClassDrugInfo {
    rxclass_min_concept_item: RxClassMinConcept,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RxClassMinConcept {
    class_id: String,
    class_name: String,
    #[serde(default)]
    class_type: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ClassGraphResponse {
    rxclass_graph: Option<RxClassGraph>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RxClassGraph {
    #[serde(default)]
    rxclass_min_concept_item: Vec<RxClassMinConcept>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PropertyResponse {
    prop_concept_group: Option<PropConceptGroup>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PropConceptGroup {
    #[serde(default)]
    prop_concept: Vec<PropConcept>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PropConcept {
    #[serde(default)]
    prop_value: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct HistoryStatusResponse {
    #[serde(default)]
    rxcui_status_history: Option<RxcuiStatusHistory>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RxcuiStatusHistory {
    #[serde(default)]
    definitional_features: Option<WireDefinitionalFeatures>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireDefinitionalFeatures {
    #[serde(default)]
    ingredient_and_strength: Vec<WireIngredient>,
    #[serde(default)]
    dose_form_concept: Vec<DoseFormConcept>,
    #[serde(default)]
    dose_form_group_concept: Vec<DoseFormGroupConcept>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireIngredient {
    #[serde(default, deserialize_with = "lenient_string")]
    base_name: String,
    #[serde(default, deserialize_with = "lenient_string")]
    numerator_value: String,
    #[serde(default, deserialize_with = "lenient_string")]
    numerator_unit: String,
    #[serde(default, deserialize_with = "lenient_string")]
    denominator_unit: String,
}

/// Accept a string, a number or null; null becomes the empty string
///
/// Numbers keep their JSON text so the MME calculator parses them like
/// string values, and null reaches it as a non-numeric strength.
fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(s)) => s,
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        _ => String::new(),
    })
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DoseFormConcept {
    #[serde(default)]
    dose_form_name: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DoseFormGroupConcept {
    #[serde(default)]
    dose_form_group_name: Option<String>,
}

// ============================================================================
// Response mapping
// ============================================================================

/// Map an `ndcstatus` body to an RxCUI
fn rxcui_from_ndc_status(body: &str) -> Result<Option<String>, RxNavError> {
    let response: NdcStatusResponse = serde_json::from_str(body)
        .map_err(|e| RxNavError::Parse(format!("ndcstatus: {}", e)))?;

    let status = response
        .ndc_status
        .ok_or_else(|| RxNavError::Parse("ndcstatus: missing ndcStatus".to_string()))?;

    if status.concept_status.as_deref() == Some("NOTCURRENT") {
        return Ok(None);
    }
    if status.status.as_deref() == Some("UNKNOWN") {
        return Ok(None);
    }

    Ok(status.rxcui.filter(|rxcui| !rxcui.trim().is_empty()))
}

fn description_from(response: RxTermsResponse) -> Option<DrugDescription> {
    response.rxterms_properties.map(|p| DrugDescription {
        full_name: p.full_name,
        full_generic_name: p.full_generic_name,
        route: p.route,
        dose_form: p.rxterms_dose_form,
        strength: p.strength,
    })
}

fn drug_class_from(response: ClassByRxcuiResponse) -> Option<DrugClass> {
    response
        .rxclass_drug_info_list?
        .rxclass_drug_info
        .into_iter()
        .next()
        .map(|info| DrugClass {
            class_id: info.rxclass_min_concept_item.class_id,
            class_name: info.rxclass_min_concept_item.class_name,
        })
}

fn class_graph_from(response: ClassGraphResponse) -> Option<ClassGraph> {
    response.rxclass_graph.map(|graph| ClassGraph {
        concepts: graph
            .rxclass_min_concept_item
            .into_iter()
            .map(|c| ClassConcept {
                class_id: c.class_id,
                class_name: c.class_name,
                class_type: c.class_type,
            })
            .collect(),
    })
}

fn schedule_from(response: PropertyResponse) -> Option<String> {
    response
        .prop_concept_group?
        .prop_concept
        .into_iter()
        .next()?
        .prop_value
}

/// Map a `historystatus` body to definitional features
///
/// Missing sub-objects are an empty composition, but a body that does not
/// parse is an error: reading it as empty would yield an MME of 0.
fn features_from_history_status(body: &str) -> Result<DefinitionalFeatures, RxNavError> {
    let response: HistoryStatusResponse = serde_json::from_str(body)
        .map_err(|e| RxNavError::Parse(format!("historystatus: {}", e)))?;
    Ok(features_from(response))
}

fn features_from(response: HistoryStatusResponse) -> DefinitionalFeatures {
    let wire = response
        .rxcui_status_history
        .and_then(|h| h.definitional_features)
        .unwrap_or_default();

    DefinitionalFeatures {
        ingredients: wire
            .ingredient_and_strength
            .into_iter()
            .map(|i| IngredientStrength {
                base_name: i.base_name,
                numerator_value: i.numerator_value,
                numerator_unit: i.numerator_unit,
                denominator_unit: i.denominator_unit,
            })
            .collect(),
        dose_form_groups: wire
            .dose_form_group_concept
            .into_iter()
            .filter_map(|g| g.dose_form_group_name)
            .collect(),
        dose_forms: wire
            .dose_form_concept
            .into_iter()
            .filter_map(|f| f.dose_form_name)
            .collect(),
    }
}

/// Parse an optional sub-query body, treating malformed bodies as absent
fn decode_optional<T: DeserializeOwned>(endpoint: &str, body: Option<String>) -> Option<T> {
    let body = body?;
    match serde_json::from_str(&body) {
        Ok(parsed) => Some(parsed),
        Err(e) => {
            warn!(endpoint, error = %e, "Unparseable RxNav response, treating as absent");
            None
        }
    }
}

// ============================================================================
// Client
// ============================================================================

/// Rate limiter enforcing a minimum interval between requests
struct RateLimiter {
    last_request: Mutex<Option<Instant>>,
    min_interval: Duration,
}

impl RateLimiter {
    fn new(min_interval_ms: u64) -> Self {
        Self {
            last_request: Mutex::new(None),
            min_interval: Duration::from_millis(min_interval_ms),
        }
    }

    /// Wait if necessary to comply with rate limit
    async fn wait(&self) {
        let mut last = self.last_request.lock().await;

        if let Some(last_time) = *last {
            let elapsed = last_time.elapsed();
            if elapsed < self.min_interval {
                let wait_time = self.min_interval - elapsed;
                tracing::trace!("Rate limiting: waiting {:?}", wait_time);
                tokio::time::sleep(wait_time).await;
            }
        }

        *last = Some(Instant::now());
    }
}

/// RxNav REST client
pub struct RxNavClient {
    http_client: reqwest::Client,
    base_url: String,
    rate_limiter: RateLimiter,
    max_retry_wait_ms: u64,
}

impl RxNavClient {
    pub fn new(settings: &RxNavSettings) -> Result<Self, RxNavError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .map_err(|e| RxNavError::Network(e.to_string()))?;

        Ok(Self {
            http_client,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            rate_limiter: RateLimiter::new(settings.rate_limit_ms),
            max_retry_wait_ms: settings.max_retry_wait_ms,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// GET a JSON endpoint, retrying transient failures
    ///
    /// Returns the body text, or `None` on 404.
    async fn get_body(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<Option<String>, RxNavError> {
        let url_string = format!("{}{}", self.base_url, path);
        let url = url_string.as_str();
        retry_transient(path, self.max_retry_wait_ms, move || self.send_once(url, query)).await
    }

    async fn send_once(
        &self,
        url: &str,
        query: &[(&str, &str)],
    ) -> Result<Option<String>, RxNavError> {
        self.rate_limiter.wait().await;

        debug!(url = %url, ?query, "Querying RxNav");

        let response = self
            .http_client
            .get(url)
            .query(query)
            .send()
            .await
            .map_err(RxNavError::from_reqwest)?;

        let status = response.status();

        if status == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }

        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(RxNavError::Api(status.as_u16(), error_text));
        }

        response
            .text()
            .await
            .map(Some)
            .map_err(RxNavError::from_reqwest)
    }
}

#[async_trait::async_trait]
impl TerminologySource for RxNavClient {
    async fn resolve_ndc(&self, ndc: &str) -> Result<Option<String>, RxNavError> {
        let Some(body) = self.get_body("/ndcstatus.json", &[("ndc", ndc)]).await? else {
            return Ok(None);
        };
        let rxcui = rxcui_from_ndc_status(&body)?;
        debug!(ndc = %ndc, rxcui = ?rxcui, "Resolved NDC");
        Ok(rxcui)
    }

    async fn describe(&self, rxcui: &str) -> Result<Option<DrugDescription>, RxNavError> {
        let path = format!("/RxTerms/rxcui/{}/allinfo.json", rxcui);
        let body = self.get_body(&path, &[]).await?;
        Ok(decode_optional::<RxTermsResponse>(&path, body).and_then(description_from))
    }

    async fn classify(&self, rxcui: &str) -> Result<Option<DrugClass>, RxNavError> {
        let path = "/rxclass/class/byRxcui.json";
        let query = [("rxcui", rxcui), ("relaSource", "VA"), ("relas", "has_VAClass")];
        let body = self.get_body(path, &query).await?;
        Ok(decode_optional::<ClassByRxcuiResponse>(path, body).and_then(drug_class_from))
    }

    async fn class_graph(&self, class_id: &str) -> Result<Option<ClassGraph>, RxNavError> {
        let path = "/rxclass/classGraph.json";
        let body = self
            .get_body(path, &[("classId", class_id), ("source", "VA")])
            .await?;
        Ok(decode_optional::<ClassGraphResponse>(path, body).and_then(class_graph_from))
    }

    async fn schedule(&self, rxcui: &str) -> Result<Option<String>, RxNavError> {
        let path = format!("/rxcui/{}/property.json", rxcui);
        let body = self.get_body(&path, &[("propName", "SCHEDULE")]).await?;
        Ok(decode_optional::<PropertyResponse>(&path, body).and_then(schedule_from))
    }

    async fn definitional_features(
        &self,
        rxcui: &str,
    ) -> Result<DefinitionalFeatures, RxNavError> {
        let path = format!("/rxcui/{}/historystatus.json", rxcui);
        match self.get_body(&path, &[("caller", "RxNav")]).await? {
            Some(body) => features_from_history_status(&body),
            None => Ok(DefinitionalFeatures::default()),
        }
    }
}
