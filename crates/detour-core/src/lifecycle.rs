use crate::content::{ContentItem, ContentTypeUid, EntityId};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::sync::Arc;
use tracing::trace;

/// Lifecycle hook points of a content mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LifecycleAction {
    BeforeCreate,
    AfterCreate,
    BeforeUpdate,
    AfterUpdate,
    BeforeDelete,
    AfterDelete,
}

impl Display for LifecycleAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            LifecycleAction::BeforeCreate => "beforeCreate",
            LifecycleAction::AfterCreate => "afterCreate",
            LifecycleAction::BeforeUpdate => "beforeUpdate",
            LifecycleAction::AfterUpdate => "afterUpdate",
            LifecycleAction::BeforeDelete => "beforeDelete",
            LifecycleAction::AfterDelete => "afterDelete",
        };
        f.write_str(name)
    }
}

/// A single content mutation event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LifecycleEvent {
    pub action: LifecycleAction,
    pub uid: ContentTypeUid,
    /// Target of the mutation as given in the request parameters.
    pub entity_id: Option<EntityId>,
    /// The committed entity, present on `after*` events.
    pub result: Option<ContentItem>,
}

impl LifecycleEvent {
    pub fn before_update(uid: ContentTypeUid, id: EntityId) -> Self {
        Self {
            action: LifecycleAction::BeforeUpdate,
            uid,
            entity_id: Some(id),
            result: None,
        }
    }

    pub fn after_update(uid: ContentTypeUid, id: EntityId, result: ContentItem) -> Self {
        Self {
            action: LifecycleAction::AfterUpdate,
            uid,
            entity_id: Some(id),
            result: Some(result),
        }
    }

    pub fn after_create(uid: ContentTypeUid, result: ContentItem) -> Self {
        Self {
            action: LifecycleAction::AfterCreate,
            uid,
            entity_id: Some(result.id.clone()),
            result: Some(result),
        }
    }

    pub fn after_delete(uid: ContentTypeUid, id: EntityId) -> Self {
        Self {
            action: LifecycleAction::AfterDelete,
            uid,
            entity_id: Some(id),
            result: None,
        }
    }

    /// The id of the affected entity, preferring the committed result.
    pub fn target_id(&self) -> Option<&EntityId> {
        self.result
            .as_ref()
            .map(|item| &item.id)
            .or(self.entity_id.as_ref())
    }
}

/// A handler for content lifecycle events.
///
/// Subscribers run inline with the mutation and must never fail it: any
/// error is theirs to log and swallow.
#[async_trait]
pub trait LifecycleSubscriber: Send + Sync + 'static {
    async fn on_event(&self, event: &LifecycleEvent);
}

/// Fan-out of lifecycle events to the subscribers registered at start-up.
///
/// Subscribers are registered through `&mut self` before the bus is shared,
/// so the set is fixed once the host starts emitting.
#[derive(Clone, Default)]
pub struct LifecycleBus {
    subscribers: Vec<Arc<dyn LifecycleSubscriber>>,
}

impl LifecycleBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, subscriber: Arc<dyn LifecycleSubscriber>) {
        self.subscribers.push(subscriber);
    }

    pub fn len(&self) -> usize {
        self.subscribers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subscribers.is_empty()
    }

    /// Delivers `event` to every subscriber in registration order.
    pub async fn emit(&self, event: &LifecycleEvent) {
        trace!(action = %event.action, uid = %event.uid, "emitting lifecycle event");
        for subscriber in &self.subscribers {
            subscriber.on_event(event).await;
        }
    }
}

impl std::fmt::Debug for LifecycleBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LifecycleBus")
            .field("subscribers", &self.subscribers.len())
            .finish()
    }
}
