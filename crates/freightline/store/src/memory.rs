//! In-memory implementations of the capability traits
//!
//! These are suitable for development and testing. Production deployments
//! should use persistent backends implementing the same traits.

use crate::auth::Authorizer;
use crate::error::{Result, StoreError};
use crate::events::EventRecorder;
use crate::freight::{FreightStore, WarehouseStore};
use crate::promotion::{PromotionStore, PromotionTemplateStore};
use crate::stage::StageStore;
use async_trait::async_trait;
use dashmap::DashMap;
use freightline_types::{Freight, Promotion, PromotionTemplate, Stage, Warehouse, WarehouseRef};
use std::collections::BTreeMap;
use std::sync::Mutex;

type Key = (String, String);

fn key(project: &str, name: &str) -> Key {
    (project.to_string(), name.to_string())
}

/// In-memory Stage store
pub struct InMemoryStageStore {
    stages: DashMap<Key, Stage>,
}

impl InMemoryStageStore {
    pub fn new() -> Self {
        Self {
            stages: DashMap::new(),
        }
    }

    pub fn insert(&self, stage: Stage) {
        self.stages
            .insert(key(&stage.project, &stage.name), stage);
    }
}

impl Default for InMemoryStageStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl StageStore for InMemoryStageStore {
    async fn get(&self, project: &str, name: &str) -> Result<Option<Stage>> {
        Ok(self.stages.get(&key(project, name)).map(|s| s.clone()))
    }

    async fn list(&self, project: &str) -> Result<Vec<Stage>> {
        Ok(self
            .stages
            .iter()
            .filter(|e| e.key().0 == project)
            .map(|e| e.value().clone())
            .collect())
    }

    async fn patch_signals(
        &self,
        project: &str,
        name: &str,
        signals: BTreeMap<String, serde_json::Value>,
    ) -> Result<()> {
        if signals.is_empty() {
            return Ok(());
        }
        let mut stage = self
            .stages
            .get_mut(&key(project, name))
            .ok_or_else(|| StoreError::NotFound(format!("stage {}/{}", project, name)))?;
        for (k, v) in signals {
            stage.signals.insert(k, v);
        }
        Ok(())
    }
}

/// In-memory Freight ledger
pub struct InMemoryFreightStore {
    freight: DashMap<Key, Freight>,
}

impl InMemoryFreightStore {
    pub fn new() -> Self {
        Self {
            freight: DashMap::new(),
        }
    }

    pub fn insert(&self, project: &str, freight: Freight) {
        self.freight.insert(key(project, &freight.id), freight);
    }

    /// Replace a stored piece of Freight, used by tests to grow its status
    /// map the way Stage reconciliation would.
    pub fn update(&self, project: &str, freight: Freight) {
        self.insert(project, freight);
    }
}

impl Default for InMemoryFreightStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl FreightStore for InMemoryFreightStore {
    async fn get(&self, project: &str, name: &str) -> Result<Option<Freight>> {
        Ok(self.freight.get(&key(project, name)).map(|f| f.clone()))
    }

    async fn get_by_alias(&self, project: &str, alias: &str) -> Result<Option<Freight>> {
        Ok(self
            .freight
            .iter()
            .find(|e| e.key().0 == project && e.value().alias.as_deref() == Some(alias))
            .map(|e| e.value().clone()))
    }

    async fn list_by_origin(&self, project: &str, origin: &WarehouseRef) -> Result<Vec<Freight>> {
        Ok(self
            .freight
            .iter()
            .filter(|e| e.key().0 == project && &e.value().origin == origin)
            .map(|e| e.value().clone())
            .collect())
    }
}

/// In-memory Warehouse store
pub struct InMemoryWarehouseStore {
    warehouses: DashMap<Key, Warehouse>,
}

impl InMemoryWarehouseStore {
    pub fn new() -> Self {
        Self {
            warehouses: DashMap::new(),
        }
    }

    pub fn insert(&self, warehouse: Warehouse) {
        self.warehouses
            .insert(key(&warehouse.project, &warehouse.name), warehouse);
    }
}

impl Default for InMemoryWarehouseStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl WarehouseStore for InMemoryWarehouseStore {
    async fn get(&self, project: &str, name: &str) -> Result<Option<Warehouse>> {
        Ok(self.warehouses.get(&key(project, name)).map(|w| w.clone()))
    }
}

/// In-memory Promotion store with idempotent-create semantics.
pub struct InMemoryPromotionStore {
    promotions: DashMap<Key, Promotion>,
    create_lock: Mutex<()>,
}

impl InMemoryPromotionStore {
    pub fn new() -> Self {
        Self {
            promotions: DashMap::new(),
            create_lock: Mutex::new(()),
        }
    }

    fn find_active(&self, project: &str, stage: &str, freight: &str) -> Option<Promotion> {
        self.promotions
            .iter()
            .find(|e| {
                let p = e.value();
                p.project == project
                    && p.stage == stage
                    && p.freight == freight
                    && p.status.phase.is_active()
            })
            .map(|e| e.value().clone())
    }
}

impl Default for InMemoryPromotionStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PromotionStore for InMemoryPromotionStore {
    async fn create(&self, promotion: Promotion) -> Result<Promotion> {
        // Serialize check-then-insert: concurrent creates for the same
        // active {stage, freight} must yield exactly one winner.
        let _guard = self
            .create_lock
            .lock()
            .map_err(|_| StoreError::Internal("promotion store lock poisoned".into()))?;
        if let Some(existing) = self.find_active(&promotion.project, &promotion.stage, &promotion.freight)
        {
            return Err(StoreError::AlreadyExists(existing.name));
        }
        self.promotions
            .insert(key(&promotion.project, &promotion.name), promotion.clone());
        Ok(promotion)
    }

    async fn get(&self, project: &str, name: &str) -> Result<Option<Promotion>> {
        Ok(self.promotions.get(&key(project, name)).map(|p| p.clone()))
    }

    async fn list(&self, project: &str) -> Result<Vec<Promotion>> {
        Ok(self
            .promotions
            .iter()
            .filter(|e| e.key().0 == project)
            .map(|e| e.value().clone())
            .collect())
    }
}

/// In-memory shared-template store
pub struct InMemoryTemplateStore {
    templates: DashMap<Key, PromotionTemplate>,
}

impl InMemoryTemplateStore {
    pub fn new() -> Self {
        Self {
            templates: DashMap::new(),
        }
    }

    pub fn insert(&self, project: &str, name: &str, template: PromotionTemplate) {
        self.templates.insert(key(project, name), template);
    }
}

impl Default for InMemoryTemplateStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PromotionTemplateStore for InMemoryTemplateStore {
    async fn get(&self, project: &str, name: &str) -> Result<Option<PromotionTemplate>> {
        Ok(self.templates.get(&key(project, name)).map(|t| t.clone()))
    }
}

/// Authorizer that allows everything (development and testing).
pub struct AllowAllAuthorizer;

#[async_trait]
impl Authorizer for AllowAllAuthorizer {
    async fn authorize(&self, _actor: &str, _verb: &str, _project: &str, _stage: &str) -> Result<()> {
        Ok(())
    }
}

/// Authorizer that denies everything.
pub struct DenyAllAuthorizer;

#[async_trait]
impl Authorizer for DenyAllAuthorizer {
    async fn authorize(&self, actor: &str, verb: &str, project: &str, stage: &str) -> Result<()> {
        Err(StoreError::Denied(format!(
            "{} may not {} stage {}/{}",
            actor, verb, project, stage
        )))
    }
}

/// One recorded domain event.
#[derive(Debug, Clone)]
pub struct RecordedEvent {
    pub actor: String,
    pub promotion: String,
    pub stage: String,
    pub freight: String,
}

/// Event sink that records everything it sees, for assertions in tests.
pub struct RecordingEventSink {
    events: Mutex<Vec<RecordedEvent>>,
}

impl RecordingEventSink {
    pub fn new() -> Self {
        Self {
            events: Mutex::new(Vec::new()),
        }
    }

    pub fn events(&self) -> Vec<RecordedEvent> {
        self.events.lock().map(|e| e.clone()).unwrap_or_default()
    }
}

impl Default for RecordingEventSink {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EventRecorder for RecordingEventSink {
    async fn promotion_created(&self, actor: &str, promotion: &Promotion, freight: &Freight) {
        if let Ok(mut events) = self.events.lock() {
            events.push(RecordedEvent {
                actor: actor.to_string(),
                promotion: promotion.name.clone(),
                stage: promotion.stage.clone(),
                freight: freight.id.clone(),
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use freightline_types::GitCommit;

    fn make_freight(alias: &str) -> Freight {
        Freight::new(
            WarehouseRef::new("p", "web"),
            vec![GitCommit {
                repo_url: "https://example.com/repo.git".into(),
                id: alias.to_string(),
                branch: None,
                tag: None,
            }],
            vec![],
            vec![],
        )
        .with_alias(alias)
    }

    #[tokio::test]
    async fn test_stage_store_round_trip() {
        let store = InMemoryStageStore::new();
        store.insert(Stage::new("p", "test"));
        store.insert(Stage::new("p", "prod"));
        store.insert(Stage::new("other", "test"));

        assert!(store.get("p", "test").await.unwrap().is_some());
        assert!(store.get("p", "missing").await.unwrap().is_none());
        assert_eq!(store.list("p").await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_patch_signals_merges() {
        let store = InMemoryStageStore::new();
        store.insert(Stage::new("p", "test"));

        let mut patch = BTreeMap::new();
        patch.insert("reverify".to_string(), serde_json::json!("verif-1"));
        store.patch_signals("p", "test", patch).await.unwrap();

        let mut patch = BTreeMap::new();
        patch.insert("abort".to_string(), serde_json::json!("verif-1"));
        store.patch_signals("p", "test", patch).await.unwrap();

        let stage = store.get("p", "test").await.unwrap().unwrap();
        assert_eq!(stage.signals.len(), 2);
    }

    #[tokio::test]
    async fn test_patch_signals_empty_is_noop() {
        let store = InMemoryStageStore::new();
        // No such stage, but an empty patch never touches the store.
        store
            .patch_signals("p", "missing", BTreeMap::new())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_freight_by_alias_and_origin() {
        let store = InMemoryFreightStore::new();
        let freight = make_freight("lucky-lion");
        store.insert("p", freight.clone());

        let by_alias = store.get_by_alias("p", "lucky-lion").await.unwrap();
        assert_eq!(by_alias.unwrap().id, freight.id);
        assert!(store.get_by_alias("p", "missing").await.unwrap().is_none());

        let by_origin = store
            .list_by_origin("p", &WarehouseRef::new("p", "web"))
            .await
            .unwrap();
        assert_eq!(by_origin.len(), 1);
    }

    #[tokio::test]
    async fn test_promotion_create_is_idempotent_per_active_pair() {
        let store = InMemoryPromotionStore::new();
        let first = Promotion::new("p", "prod", "abc123def", vec![]);
        let created = store.create(first.clone()).await.unwrap();

        let second = Promotion::new("p", "prod", "abc123def", vec![]);
        let err = store.create(second).await.unwrap_err();
        match err {
            StoreError::AlreadyExists(name) => assert_eq!(name, created.name),
            other => panic!("expected AlreadyExists, got {other}"),
        }

        // A different freight for the same stage is a new intent.
        let other = Promotion::new("p", "prod", "fff999000", vec![]);
        assert!(store.create(other).await.is_ok());
    }

    #[tokio::test]
    async fn test_promotion_create_single_winner_under_contention() {
        use std::sync::Arc;

        let store = Arc::new(InMemoryPromotionStore::new());
        let mut handles = Vec::new();
        for _ in 0..8 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store
                    .create(Promotion::new("p", "prod", "abc123def", vec![]))
                    .await
            }));
        }

        let mut winners = 0;
        for handle in handles {
            if handle.await.unwrap().is_ok() {
                winners += 1;
            }
        }
        assert_eq!(winners, 1);
        assert_eq!(store.list("p").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_authorizers() {
        assert!(AllowAllAuthorizer
            .authorize("alice", "promote", "p", "prod")
            .await
            .is_ok());
        let err = DenyAllAuthorizer
            .authorize("alice", "promote", "p", "prod")
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Denied(_)));
    }

    #[tokio::test]
    async fn test_recording_event_sink() {
        let sink = RecordingEventSink::new();
        let freight = make_freight("f");
        let promotion = Promotion::new("p", "prod", freight.id.clone(), vec![]);
        sink.promotion_created("alice", &promotion, &freight).await;

        let events = sink.events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].actor, "alice");
        assert_eq!(events[0].stage, "prod");
    }
}
