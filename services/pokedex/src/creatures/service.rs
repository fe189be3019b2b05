//! Creature operations.
//!
//! Every operation returns an [`Envelope`]; none of them fail. Store errors
//! are logged here and reach the caller only as a response code.

use std::sync::Arc;

use tracing::{error, info};

use super::envelope::{translate, Envelope, Locale, ResponseCode};
use super::model::{CreatureDraft, CreaturePatch, NewCreature};
use super::resolver::resolve;
use super::store::{CreatureStore, UpdateOutcome};
use crate::db::{DbError, DuplicateKey};

#[derive(Clone)]
pub struct CreatureService {
    store: Arc<dyn CreatureStore>,
    locale: Locale,
}

impl CreatureService {
    pub fn new(store: Arc<dyn CreatureStore>, locale: Locale) -> Self {
        Self { store, locale }
    }

    pub fn store(&self) -> &Arc<dyn CreatureStore> {
        &self.store
    }

    pub fn locale(&self) -> Locale {
        self.locale
    }

    /// Inserts a creature with its name normalized.
    pub async fn create(&self, draft: CreatureDraft) -> Envelope {
        let new = NewCreature::from(draft);
        match self.store.create(new).await {
            Ok(creature) => {
                info!(creature_id = %creature.id, name = %creature.name, "Creature created");
                Envelope::new(ResponseCode::Created, self.locale).with_record(creature)
            }
            Err(e) => self.fail(&e, ResponseCode::CreateConflict, "create"),
        }
    }

    /// Looks a creature up by number, store id or name.
    pub async fn find_one(&self, identifier: &str) -> Envelope {
        match resolve(self.store.as_ref(), identifier).await {
            Ok(Some(creature)) => {
                Envelope::new(ResponseCode::Found, self.locale).with_record(creature)
            }
            Ok(None) => Envelope::new(ResponseCode::NotFound, self.locale),
            Err(e) => {
                error!(error = %e, %identifier, "Failed to resolve creature");
                Envelope::internal(self.locale)
            }
        }
    }

    /// Applies `patch` to the creature `identifier` resolves to.
    ///
    /// Anything but a `Found` lookup is returned as is and nothing is
    /// written. The write targets the resolved store id and is guarded by
    /// the revision read during lookup.
    pub async fn update(&self, identifier: &str, patch: CreaturePatch) -> Envelope {
        let patch = patch.normalized();

        let current = match self.find_one(identifier).await.into_found() {
            Ok(creature) => creature,
            Err(envelope) => return envelope,
        };

        if patch.is_empty() {
            return Envelope::new(ResponseCode::Updated, self.locale).with_record(current);
        }

        match self
            .store
            .update_one(current.id, current.revision, &patch)
            .await
        {
            Ok(UpdateOutcome::Updated(creature)) => {
                info!(creature_id = %creature.id, revision = creature.revision, "Creature updated");
                Envelope::new(ResponseCode::Updated, self.locale).with_record(creature)
            }
            Ok(UpdateOutcome::RevisionMismatch { current: actual }) => {
                info!(
                    creature_id = %current.id,
                    expected = current.revision,
                    actual,
                    "Creature changed since lookup"
                );
                let duplicate = DuplicateKey {
                    key: "revision".to_string(),
                    value: current.revision.into(),
                };
                Envelope::conflict(ResponseCode::UpdateConflict, &duplicate, self.locale)
            }
            Ok(UpdateOutcome::Missing) => {
                info!(creature_id = %current.id, "Creature deleted since lookup");
                Envelope::new(ResponseCode::NotFound, self.locale)
            }
            Err(e) => self.fail(&e, ResponseCode::UpdateConflict, "update"),
        }
    }

    /// Deletes the creature `identifier` resolves to.
    pub async fn remove(&self, identifier: &str) -> Envelope {
        let creature = match resolve(self.store.as_ref(), identifier).await {
            Ok(Some(creature)) => creature,
            Ok(None) => return Envelope::new(ResponseCode::DeleteNoop, self.locale),
            Err(e) => return self.fail(&e, ResponseCode::DeleteConflict, "resolve for delete"),
        };

        match self.store.delete_one(creature.id).await {
            Ok(0) => Envelope::new(ResponseCode::DeleteNoop, self.locale),
            Ok(_) => {
                info!(creature_id = %creature.id, "Creature deleted");
                Envelope::new(ResponseCode::Deleted, self.locale)
            }
            Err(e) => self.fail(&e, ResponseCode::DeleteConflict, "delete"),
        }
    }

    fn fail(&self, e: &DbError, conflict: ResponseCode, operation: &str) -> Envelope {
        if e.is_unique_violation() {
            info!(error = %e, operation, "Uniqueness conflict");
        } else {
            error!(error = %e, operation, "Store operation failed");
        }
        translate(
            e,
            |duplicate| Envelope::conflict(conflict, duplicate, self.locale),
            self.locale,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::creatures::envelope::Payload;
    use crate::creatures::model::{Creature, NewCreature};
    use crate::creatures::store::CreatureFilter;
    use crate::db::MemoryCreatureStore;
    use async_trait::async_trait;
    use pokedex_id::{CreatureId, SequenceNumber};

    fn service() -> (CreatureService, Arc<MemoryCreatureStore>) {
        let store = Arc::new(MemoryCreatureStore::new());
        (CreatureService::new(store.clone(), Locale::Es), store)
    }

    fn draft(no: Option<i32>, name: &str) -> CreatureDraft {
        CreatureDraft {
            name: name.to_string(),
            no: no.map(|n| SequenceNumber::new(n).unwrap()),
        }
    }

    fn rename(name: &str) -> CreaturePatch {
        CreaturePatch {
            name: Some(name.to_string()),
            no: None,
        }
    }

    #[tokio::test]
    async fn test_pikachu_lifecycle() {
        let (service, _) = service();

        let created = service.create(draft(Some(25), "Pikachu")).await;
        assert!(created.is(ResponseCode::Created));
        let record = created.record().unwrap().clone();
        assert_eq!(record.name, "pikachu");

        let found = service.find_one("25").await;
        assert!(found.is(ResponseCode::Found));
        assert_eq!(found.record().unwrap().name, "pikachu");

        let found = service.find_one("PIKACHU").await;
        assert_eq!(found.record().unwrap().id, record.id);

        let deleted = service.remove(&record.id.to_string()).await;
        assert!(deleted.is(ResponseCode::Deleted));
        assert_eq!(deleted.data, Payload::Omitted);

        let gone = service.find_one(&record.id.to_string()).await;
        assert!(gone.is(ResponseCode::NotFound));
        assert_eq!(gone.data, Payload::Null);

        let gone = service.find_one("25").await;
        assert!(gone.is(ResponseCode::NotFound));
    }

    #[tokio::test]
    async fn test_duplicate_name_conflicts() {
        let (service, store) = service();
        assert!(service.create(draft(Some(1), "Bulbasaur")).await.is(ResponseCode::Created));

        let second = service.create(draft(Some(2), "  BULBASAUR")).await;
        assert!(second.is(ResponseCode::CreateConflict));
        assert_eq!(second.message, r#"not created {"name":"bulbasaur"}"#);
        assert_eq!(second.data, Payload::Null);
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_duplicate_number_conflicts() {
        let (service, _) = service();
        service.create(draft(Some(4), "charmander")).await;
        let second = service.create(draft(Some(4), "charmeleon")).await;
        assert!(second.is(ResponseCode::CreateConflict));
        assert_eq!(second.message, r#"not created {"no":4}"#);
    }

    #[tokio::test]
    async fn test_lookup_miss_is_not_found() {
        let (service, _) = service();
        service.create(draft(Some(25), "pikachu")).await;
        let envelope = service.find_one("missingno").await;
        assert!(envelope.is(ResponseCode::NotFound));
        assert_eq!(envelope.message, "not found");
        assert_eq!(envelope.data, Payload::Null);
    }

    #[tokio::test]
    async fn test_update_missing_returns_lookup_envelope_without_write() {
        let (service, store) = service();
        let envelope = service.update("missingno", rename("ditto")).await;
        assert_eq!(envelope, service.find_one("missingno").await);
        assert_eq!(store.len().await, 0);
    }

    #[tokio::test]
    async fn test_update_renames_and_normalizes() {
        let (service, _) = service();
        service.create(draft(Some(25), "pikachu")).await;

        let envelope = service.update("25", rename("  RAICHU ")).await;
        assert!(envelope.is(ResponseCode::Updated));
        let record = envelope.record().unwrap();
        assert_eq!(record.name, "raichu");
        assert_eq!(record.no, Some(SequenceNumber::new(25).unwrap()));
        assert_eq!(record.revision, 2);

        assert!(service.find_one("raichu").await.is(ResponseCode::Found));
        assert!(service.find_one("pikachu").await.is(ResponseCode::NotFound));
    }

    #[tokio::test]
    async fn test_update_to_taken_name_conflicts_and_keeps_name() {
        let (service, _) = service();
        service.create(draft(Some(1), "bulbasaur")).await;
        service.create(draft(Some(4), "charmander")).await;

        let envelope = service.update("4", rename("Bulbasaur")).await;
        assert!(envelope.is(ResponseCode::UpdateConflict));
        assert_eq!(envelope.message, r#"not updated {"name":"bulbasaur"}"#);
        assert_eq!(envelope.data, Payload::Null);

        let still = service.find_one("4").await;
        assert_eq!(still.record().unwrap().name, "charmander");
    }

    #[tokio::test]
    async fn test_update_targets_resolved_record_when_renaming() {
        let (service, _) = service();
        let first = service.create(draft(Some(1), "bulbasaur")).await;
        let first_id = first.record().unwrap().id;
        service.create(draft(Some(2), "ivysaur")).await;

        let envelope = service.update("bulbasaur", rename("venusaur")).await;
        assert_eq!(envelope.record().unwrap().id, first_id);
        assert_eq!(service.find_one("2").await.record().unwrap().name, "ivysaur");
    }

    #[tokio::test]
    async fn test_empty_patch_returns_current_record() {
        let (service, _) = service();
        service.create(draft(Some(133), "eevee")).await;
        let envelope = service.update("eevee", CreaturePatch::default()).await;
        assert!(envelope.is(ResponseCode::Updated));
        assert_eq!(envelope.record().unwrap().revision, 1);
    }

    #[tokio::test]
    async fn test_delete_missing_is_noop() {
        let (service, _) = service();
        let envelope = service.remove(&CreatureId::new().to_string()).await;
        assert!(envelope.is(ResponseCode::DeleteNoop));
        assert_eq!(envelope.code.code(), 107);
        assert_eq!(envelope.data, Payload::Omitted);
    }

    #[tokio::test]
    async fn test_delete_resolves_names_and_numbers() {
        let (service, store) = service();
        service.create(draft(Some(1), "bulbasaur")).await;
        service.create(draft(Some(4), "charmander")).await;

        assert!(service.remove("Bulbasaur").await.is(ResponseCode::Deleted));
        assert!(service.remove("4").await.is(ResponseCode::Deleted));
        assert_eq!(store.len().await, 0);
    }

    /// Store that fails every call, optionally with a uniqueness violation.
    struct BrokenStore {
        unique: bool,
    }

    impl BrokenStore {
        fn err(&self) -> DbError {
            if self.unique {
                DbError::unique("name", "pikachu")
            } else {
                DbError::Query(sqlx::Error::PoolTimedOut)
            }
        }
    }

    #[async_trait]
    impl CreatureStore for BrokenStore {
        async fn create(&self, _creature: NewCreature) -> Result<Creature, DbError> {
            Err(self.err())
        }

        async fn find_one(&self, _filter: &CreatureFilter) -> Result<Option<Creature>, DbError> {
            Err(self.err())
        }

        async fn find_by_id(&self, _id: CreatureId) -> Result<Option<Creature>, DbError> {
            Err(self.err())
        }

        async fn update_one(
            &self,
            _id: CreatureId,
            _expected_revision: i32,
            _patch: &CreaturePatch,
        ) -> Result<UpdateOutcome, DbError> {
            Err(self.err())
        }

        async fn delete_one(&self, _id: CreatureId) -> Result<u64, DbError> {
            Err(self.err())
        }

        async fn health_check(&self) -> Result<(), DbError> {
            Err(self.err())
        }
    }

    #[tokio::test]
    async fn test_store_outage_is_internal_error_everywhere() {
        let service = CreatureService::new(Arc::new(BrokenStore { unique: false }), Locale::En);

        for envelope in [
            service.create(draft(Some(25), "pikachu")).await,
            service.find_one("25").await,
            service.update("25", rename("raichu")).await,
            service.remove("25").await,
        ] {
            assert!(envelope.is(ResponseCode::InternalError));
            assert_eq!(envelope.code.code(), 500);
            assert_eq!(envelope.message, "Internal Server Error");
            assert!(!envelope.description.to_lowercase().contains("pool"));
            assert_eq!(envelope.data, Payload::Null);
        }
    }

    #[tokio::test]
    async fn test_unique_signal_on_lookup_is_not_a_conflict() {
        let service = CreatureService::new(Arc::new(BrokenStore { unique: true }), Locale::Es);
        assert!(service.find_one("pikachu").await.is(ResponseCode::InternalError));
        assert!(service.remove("pikachu").await.is(ResponseCode::DeleteConflict));
    }

    /// Store whose revision moves between lookup and write.
    struct RacingStore {
        inner: MemoryCreatureStore,
    }

    #[async_trait]
    impl CreatureStore for RacingStore {
        async fn create(&self, creature: NewCreature) -> Result<Creature, DbError> {
            self.inner.create(creature).await
        }

        async fn find_one(&self, filter: &CreatureFilter) -> Result<Option<Creature>, DbError> {
            self.inner.find_one(filter).await
        }

        async fn find_by_id(&self, id: CreatureId) -> Result<Option<Creature>, DbError> {
            self.inner.find_by_id(id).await
        }

        async fn update_one(
            &self,
            id: CreatureId,
            expected_revision: i32,
            patch: &CreaturePatch,
        ) -> Result<UpdateOutcome, DbError> {
            let bump = CreaturePatch {
                name: None,
                no: SequenceNumber::new(999).ok(),
            };
            self.inner.update_one(id, expected_revision, &bump).await?;
            self.inner.update_one(id, expected_revision, patch).await
        }

        async fn delete_one(&self, id: CreatureId) -> Result<u64, DbError> {
            self.inner.delete_one(id).await
        }

        async fn health_check(&self) -> Result<(), DbError> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_concurrent_change_is_update_conflict() {
        let service = CreatureService::new(
            Arc::new(RacingStore {
                inner: MemoryCreatureStore::new(),
            }),
            Locale::Es,
        );
        service.create(draft(Some(25), "pikachu")).await;

        let envelope = service.update("pikachu", rename("raichu")).await;
        assert!(envelope.is(ResponseCode::UpdateConflict));
        assert_eq!(envelope.message, r#"not updated {"revision":1}"#);
        assert!(service.find_one("raichu").await.is(ResponseCode::NotFound));
    }
}
