//! In-memory terminology source and result cache for unit tests

use crate::db::RecordCache;
use crate::models::ResultStore;
use crate::services::rxnav_client::RxNavError;
use crate::types::{
    ClassGraph, DefinitionalFeatures, DrugClass, DrugDescription, TerminologySource,
};
use std::collections::HashMap;
use std::sync::Mutex;

/// Canned responses plus a call log
#[derive(Default)]
pub struct FakeSource {
    rxcuis: HashMap<String, String>,
    descriptions: HashMap<String, DrugDescription>,
    classes: HashMap<String, DrugClass>,
    graphs: HashMap<String, ClassGraph>,
    schedules: HashMap<String, String>,
    features: HashMap<String, DefinitionalFeatures>,
    failures: Vec<(String, Option<String>)>,
    calls: Mutex<Vec<(String, String)>>,
}

impl FakeSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_product(mut self, ndc: &str, rxcui: &str) -> Self {
        self.rxcuis.insert(ndc.to_string(), rxcui.to_string());
        self
    }

    pub fn with_description(mut self, rxcui: &str, description: DrugDescription) -> Self {
        self.descriptions.insert(rxcui.to_string(), description);
        self
    }

    pub fn with_class(mut self, rxcui: &str, class_id: &str, class_name: &str) -> Self {
        self.classes.insert(
            rxcui.to_string(),
            DrugClass {
                class_id: class_id.to_string(),
                class_name: class_name.to_string(),
            },
        );
        self
    }

    pub fn with_class_graph(mut self, class_id: &str, graph: ClassGraph) -> Self {
        self.graphs.insert(class_id.to_string(), graph);
        self
    }

    pub fn with_schedule(mut self, rxcui: &str, value: &str) -> Self {
        self.schedules.insert(rxcui.to_string(), value.to_string());
        self
    }

    pub fn with_features(mut self, rxcui: &str, features: DefinitionalFeatures) -> Self {
        self.features.insert(rxcui.to_string(), features);
        self
    }

    /// Fail every call of `operation`
    pub fn failing_on(mut self, operation: &str) -> Self {
        self.failures.push((operation.to_string(), None));
        self
    }

    /// Fail calls of `operation` with argument `arg`
    pub fn failing_for(mut self, operation: &str, arg: &str) -> Self {
        self.failures
            .push((operation.to_string(), Some(arg.to_string())));
        self
    }

    /// Number of calls to `operation`
    pub fn call_count(&self, operation: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(op, _)| op == operation)
            .count()
    }

    /// Number of calls of any operation with argument `arg`
    pub fn calls_with(&self, arg: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(_, a)| a == arg)
            .count()
    }

    pub fn total_calls(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    fn record(&self, operation: &str, arg: &str) -> Result<(), RxNavError> {
        self.calls
            .lock()
            .unwrap()
            .push((operation.to_string(), arg.to_string()));

        let fails = self.failures.iter().any(|(op, target)| {
            op == operation && target.as_deref().map_or(true, |t| t == arg)
        });
        if fails {
            return Err(RxNavError::Network(format!(
                "injected failure: {}({})",
                operation, arg
            )));
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl TerminologySource for FakeSource {
    async fn resolve_ndc(&self, ndc: &str) -> Result<Option<String>, RxNavError> {
        self.record("resolve_ndc", ndc)?;
        Ok(self.rxcuis.get(ndc).cloned())
    }

    async fn describe(&self, rxcui: &str) -> Result<Option<DrugDescription>, RxNavError> {
        self.record("describe", rxcui)?;
        Ok(self.descriptions.get(rxcui).cloned())
    }

    async fn classify(&self, rxcui: &str) -> Result<Option<DrugClass>, RxNavError> {
        self.record("classify", rxcui)?;
        Ok(self.classes.get(rxcui).cloned())
    }

    async fn class_graph(&self, class_id: &str) -> Result<Option<ClassGraph>, RxNavError> {
        self.record("class_graph", class_id)?;
        Ok(self.graphs.get(class_id).cloned())
    }

    async fn schedule(&self, rxcui: &str) -> Result<Option<String>, RxNavError> {
        self.record("schedule", rxcui)?;
        Ok(self.schedules.get(rxcui).cloned())
    }

    async fn definitional_features(
        &self,
        rxcui: &str,
    ) -> Result<DefinitionalFeatures, RxNavError> {
        self.record("definitional_features", rxcui)?;
        Ok(self.features.get(rxcui).cloned().unwrap_or_default())
    }
}

/// Result cache held in memory, counting saves
#[derive(Default)]
pub struct MemoryRecordCache {
    store: Mutex<ResultStore>,
    saves: Mutex<usize>,
}

impl MemoryRecordCache {
    pub fn with_store(store: ResultStore) -> Self {
        Self {
            store: Mutex::new(store),
            saves: Mutex::new(0),
        }
    }

    pub fn snapshot(&self) -> ResultStore {
        self.store.lock().unwrap().clone()
    }

    pub fn save_count(&self) -> usize {
        *self.saves.lock().unwrap()
    }
}

#[async_trait::async_trait]
impl RecordCache for MemoryRecordCache {
    async fn load(&self) -> rxmme_common::Result<ResultStore> {
        Ok(self.snapshot())
    }

    async fn save(&self, store: &ResultStore) -> rxmme_common::Result<()> {
        *self.store.lock().unwrap() = store.clone();
        *self.saves.lock().unwrap() += 1;
        Ok(())
    }
}
