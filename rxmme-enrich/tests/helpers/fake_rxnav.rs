//! In-process RxNav stand-in
//!
//! An axum server bound to an ephemeral localhost port that answers canned
//! JSON bodies keyed by path and query, and records every request it sees.
//! Unknown paths return 404, which the client treats as absence.

use axum::extract::State;
use axum::http::{header, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::Router;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

const BASE_PATH: &str = "/REST";

struct Route {
    status: u16,
    body: String,
    /// Leading requests answered with 503 before the canned response
    failures_left: AtomicUsize,
}

/// Canned RxNav responses
#[derive(Default)]
pub struct RxNavFixture {
    routes: HashMap<String, Route>,
}

impl RxNavFixture {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer `key` (path after the base URL, with query) with `status` and `body`
    pub fn respond(mut self, key: &str, status: u16, body: impl Into<String>) -> Self {
        self.routes.insert(
            key.to_string(),
            Route {
                status,
                body: body.into(),
                failures_left: AtomicUsize::new(0),
            },
        );
        self
    }

    /// Answer the first `count` requests for `key` with 503
    pub fn flaky(mut self, key: &str, count: usize) -> Self {
        if let Some(route) = self.routes.get_mut(key) {
            route.failures_left = AtomicUsize::new(count);
        }
        self
    }

    fn json(self, key: &str, body: Value) -> Self {
        self.respond(key, 200, body.to_string())
    }

    pub fn active_ndc(self, ndc: &str, rxcui: &str) -> Self {
        self.json(
            &ndc_key(ndc),
            json!({"ndcStatus": {"ndc11": ndc, "status": "ACTIVE", "conceptStatus": "ACTIVE", "rxcui": rxcui}}),
        )
    }

    pub fn unknown_ndc(self, ndc: &str) -> Self {
        self.json(
            &ndc_key(ndc),
            json!({"ndcStatus": {"ndc11": ndc, "status": "UNKNOWN", "conceptStatus": "UNKNOWN", "rxcui": ""}}),
        )
    }

    pub fn rxterms(self, rxcui: &str, full_name: &str, route: &str, form: &str, strength: &str) -> Self {
        self.json(
            &format!("/RxTerms/rxcui/{}/allinfo.json", rxcui),
            json!({"rxtermsProperties": {
                "fullName": full_name,
                "fullGenericName": full_name,
                "route": route,
                "rxtermsDoseForm": form,
                "strength": strength
            }}),
        )
    }

    pub fn va_class(self, rxcui: &str, class_id: &str, class_name: &str) -> Self {
        self.json(
            &format!("/rxclass/class/byRxcui.json?rxcui={}&relaSource=VA&relas=has_VAClass", rxcui),
            json!({"rxclassDrugInfoList": {"rxclassDrugInfo": [
                {"rxclassMinConceptItem": {"classId": class_id, "className": class_name, "classType": "VA"}}
            ]}}),
        )
    }

    pub fn class_graph(self, class_id: &str, nodes: &[(&str, &str)]) -> Self {
        let items: Vec<Value> = nodes
            .iter()
            .map(|(id, name)| json!({"classId": id, "className": name, "classType": "VA"}))
            .collect();
        self.json(
            &format!("/rxclass/classGraph.json?classId={}&source=VA", class_id),
            json!({"rxclassGraph": {"rxclassMinConceptItem": items}}),
        )
    }

    pub fn schedule(self, rxcui: &str, value: &str) -> Self {
        self.json(
            &format!("/rxcui/{}/property.json?propName=SCHEDULE", rxcui),
            json!({"propConceptGroup": {"propConcept": [
                {"propCategory": "ATTRIBUTES", "propName": "SCHEDULE", "propValue": value}
            ]}}),
        )
    }

    /// Ingredients as (base name, numerator value, numerator unit, denominator unit)
    pub fn history(
        self,
        rxcui: &str,
        ingredients: &[(&str, &str, &str, &str)],
        dose_form_groups: &[&str],
    ) -> Self {
        let ingredients: Vec<Value> = ingredients
            .iter()
            .map(|(name, value, unit, denominator)| {
                json!({
                    "baseName": name,
                    "numeratorValue": value,
                    "numeratorUnit": unit,
                    "denominatorValue": "1",
                    "denominatorUnit": denominator
                })
            })
            .collect();
        let groups: Vec<Value> = dose_form_groups
            .iter()
            .map(|name| json!({"doseFormGroupName": name}))
            .collect();
        self.json(
            &history_key(rxcui),
            json!({"rxcuiStatusHistory": {"definitionalFeatures": {
                "ingredientAndStrength": ingredients,
                "doseFormGroupConcept": groups
            }}}),
        )
    }
}

pub fn ndc_key(ndc: &str) -> String {
    format!("/ndcstatus.json?ndc={}", ndc)
}

pub fn history_key(rxcui: &str) -> String {
    format!("/rxcui/{}/historystatus.json?caller=RxNav", rxcui)
}

struct ServerState {
    routes: HashMap<String, Route>,
    requests: Mutex<Vec<String>>,
}

/// Running fake RxNav server; stopped on drop
pub struct FakeRxNav {
    base_url: String,
    state: Arc<ServerState>,
    handle: JoinHandle<()>,
}

impl FakeRxNav {
    pub async fn start(fixture: RxNavFixture) -> Self {
        let state = Arc::new(ServerState {
            routes: fixture.routes,
            requests: Mutex::new(Vec::new()),
        });

        let app = Router::new().fallback(respond).with_state(Arc::clone(&state));

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url: format!("http://{}{}", addr, BASE_PATH),
            state,
            handle,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Requests received so far, as path (after the base) plus query
    pub fn requests(&self) -> Vec<String> {
        self.state.requests.lock().unwrap().clone()
    }

    pub fn request_count(&self) -> usize {
        self.state.requests.lock().unwrap().len()
    }

    /// Requests whose path or query mentions `needle`
    pub fn requests_mentioning(&self, needle: &str) -> usize {
        self.requests().iter().filter(|r| r.contains(needle)).count()
    }
}

impl Drop for FakeRxNav {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn respond(State(state): State<Arc<ServerState>>, uri: Uri) -> Response {
    let full = uri
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_default();
    let key = full.strip_prefix(BASE_PATH).unwrap_or(&full).to_string();
    state.requests.lock().unwrap().push(key.clone());

    let Some(route) = state.routes.get(&key) else {
        return StatusCode::NOT_FOUND.into_response();
    };

    let failing = route
        .failures_left
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
        .is_ok();
    if failing {
        return (StatusCode::SERVICE_UNAVAILABLE, "try again").into_response();
    }

    let status = StatusCode::from_u16(route.status).unwrap();
    (status, [(header::CONTENT_TYPE, "application/json")], route.body.clone()).into_response()
}
