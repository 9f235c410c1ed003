use std::sync::Arc;

use hound_core::{ActorContext, AppResult};
use hound_domain::Action;

use crate::{ActionRecorder, Entity, EntityStore, Tracked};

/// Entity store decorator that records lifecycle actions around each write.
///
/// `create` records after insert, `update` records before the store commits, and
/// `destroy` records after delete.
pub struct TrackedRepository<E> {
    store: Arc<dyn EntityStore<E>>,
    recorder: ActionRecorder,
}

impl<E> Clone for TrackedRepository<E> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            recorder: self.recorder.clone(),
        }
    }
}

impl<E> TrackedRepository<E>
where
    E: Entity + 'static,
{
    /// Creates a tracked repository over an entity store.
    #[must_use]
    pub fn new(store: Arc<dyn EntityStore<E>>, recorder: ActionRecorder) -> Self {
        Self { store, recorder }
    }

    /// Returns the recorder used by this repository.
    #[must_use]
    pub fn recorder(&self) -> &ActionRecorder {
        &self.recorder
    }

    /// Inserts the entity, then records a `create` action.
    ///
    /// A recording failure is returned after the insert has already happened.
    pub async fn create(
        &self,
        actor: &ActorContext,
        entity: &mut Tracked<E>,
    ) -> AppResult<Option<Action>> {
        self.store.insert(entity.entity()).await?;
        entity.mark_persisted()?;

        self.recorder.after_create(actor, entity).await
    }

    /// Records an `update` action with pending changes, then commits them.
    pub async fn update(
        &self,
        actor: &ActorContext,
        entity: &mut Tracked<E>,
    ) -> AppResult<Option<Action>> {
        let action = self.recorder.before_update(actor, entity).await?;
        self.store.update(entity.entity()).await?;
        entity.mark_persisted()?;

        Ok(action)
    }

    /// Deletes the entity, then records a `destroy` action on a best-effort basis.
    ///
    /// A failed delete is returned and leaves the entity with the caller.
    pub async fn destroy(
        &self,
        actor: &ActorContext,
        entity: &Tracked<E>,
    ) -> AppResult<Option<Action>> {
        self.store.delete(entity.entity()).await?;

        Ok(self.recorder.after_destroy(actor, entity).await)
    }
}
