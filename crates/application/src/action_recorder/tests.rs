use std::sync::Arc;

use chrono::{Duration, NaiveDate, TimeZone, Utc};
use serde::Serialize;
use serde_json::json;

use hound_core::{ActorContext, ActorId};
use hound_domain::{ActionKind, TrackingDefaults, TrackingOptions};

use crate::test_support::FakeActionRepository;
use crate::{Entity, Trackable, Tracked, TrackingRegistry};

use super::ActionRecorder;

#[derive(Debug, Clone, Serialize)]
struct Article {
    id: u64,
    title: String,
    body: String,
}

impl Entity for Article {
    const ACTIONABLE_TYPE: &'static str = "Article";

    fn entity_id(&self) -> String {
        self.id.to_string()
    }
}

#[derive(Debug, Clone, Serialize)]
struct Draft {
    id: u64,
}

impl Entity for Draft {
    const ACTIONABLE_TYPE: &'static str = "Draft";

    fn entity_id(&self) -> String {
        self.id.to_string()
    }
}

fn article(id: u64) -> Tracked<Article> {
    Tracked::new(Article {
        id,
        title: "Draft".to_owned(),
        body: "Hello".to_owned(),
    })
    .unwrap_or_else(|_| unreachable!())
}

fn recorder_with(
    options: TrackingOptions,
) -> (ActionRecorder, Arc<FakeActionRepository>) {
    let registry = TrackingRegistry::builder(TrackingDefaults::default())
        .register::<Article>(options)
        .map(|builder| builder.build())
        .unwrap_or_else(|_| unreachable!());
    let repository = Arc::new(FakeActionRepository::default());
    let recorder = ActionRecorder::new(repository.clone(), Arc::new(registry));

    (recorder, repository)
}

fn alice() -> ActorContext {
    ActorContext::for_user(ActorId::new("alice").unwrap_or_else(|_| unreachable!()))
}

#[tokio::test]
async fn create_records_one_action_without_changeset() {
    let (recorder, repository) = recorder_with(TrackingOptions::default());
    let entity = article(1);

    let recorded = recorder.after_create(&alice(), &entity).await;
    assert!(recorded.is_ok());
    assert!(recorded.unwrap_or_default().is_some());

    let stored = repository.stored().await;
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].action(), ActionKind::Create);
    assert!(stored[0].changeset().is_none());
    assert_eq!(stored[0].actionable().actionable_type(), "Article");
    assert_eq!(stored[0].actionable().actionable_id(), "1");
    assert_eq!(stored[0].user_id().map(ActorId::as_str), Some("alice"));
}

#[tokio::test]
async fn anonymous_actor_records_no_user() {
    let (recorder, repository) = recorder_with(TrackingOptions::default());

    let recorded = recorder
        .after_create(&ActorContext::anonymous(), &article(1))
        .await;
    assert!(recorded.is_ok());

    let stored = repository.stored().await;
    assert_eq!(stored.len(), 1);
    assert!(stored[0].user_id().is_none());
}

#[tokio::test]
async fn update_changeset_holds_exactly_the_changed_fields() {
    let (recorder, repository) = recorder_with(TrackingOptions::default());
    let mut entity = article(1);
    entity.entity_mut().title = "Final".to_owned();

    let recorded = recorder.before_update(&alice(), &entity).await;
    assert!(recorded.is_ok());

    let stored = repository.stored().await;
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].action(), ActionKind::Update);

    let Some(changeset) = stored[0].changeset() else {
        panic!("update action must carry a changeset");
    };
    assert_eq!(changeset.len(), 1);
    assert!(changeset.get("body").is_none());
    let title = changeset.get("title");
    assert_eq!(title.map(|change| change.previous()), Some(&json!("Draft")));
    assert_eq!(title.map(|change| change.current()), Some(&json!("Final")));
}

#[tokio::test]
async fn update_without_changes_still_records_empty_changeset() {
    let (recorder, repository) = recorder_with(TrackingOptions::default());

    let recorded = recorder.before_update(&alice(), &article(1)).await;
    assert!(recorded.is_ok());

    let stored = repository.stored().await;
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].action(), ActionKind::Update);
    assert!(stored[0].changeset().is_some_and(|changes| changes.is_empty()));
}

#[tokio::test]
async fn destroy_captures_identity_of_removed_entity() {
    let (recorder, repository) = recorder_with(TrackingOptions::default());
    let entity = article(42);

    let recorded = recorder.after_destroy(&alice(), &entity).await;
    drop(entity);

    let Some(action) = recorded else {
        panic!("destroy should be recorded");
    };
    assert_eq!(action.action(), ActionKind::Destroy);
    assert!(action.changeset().is_none());
    assert_eq!(action.actionable().actionable_type(), "Article");
    assert_eq!(action.actionable().actionable_id(), "42");
    assert_eq!(repository.stored().await.len(), 1);
}

#[tokio::test]
async fn disabled_instance_records_nothing_and_skips_trim() {
    let (recorder, repository) = recorder_with(TrackingOptions::default().with_limit(1));
    let mut entity = article(1);
    let actionable = entity.actionable().unwrap_or_else(|_| unreachable!());
    for _ in 0..3 {
        repository
            .seed(&actionable, ActionKind::Update, Utc::now())
            .await;
    }
    entity.set_tracking(Some(false));
    entity.entity_mut().title = "Changed".to_owned();

    let created = recorder.after_create(&alice(), &entity).await;
    assert!(matches!(created, Ok(None)));
    let updated = recorder.before_update(&alice(), &entity).await;
    assert!(matches!(updated, Ok(None)));
    assert!(recorder.after_destroy(&alice(), &entity).await.is_none());

    assert_eq!(repository.stored().await.len(), 3);
    assert_eq!(repository.delete_calls(), 0);
}

#[tokio::test]
async fn explicitly_enabled_instance_records() {
    let (recorder, repository) = recorder_with(TrackingOptions::default());
    let mut entity = article(1);
    entity.set_tracking(Some(true));

    let created = recorder.after_create(&alice(), &entity).await;
    assert!(matches!(created, Ok(Some(_))));
    assert_eq!(repository.stored().await.len(), 1);
}

#[tokio::test]
async fn unregistered_type_records_nothing() {
    let (recorder, repository) = recorder_with(TrackingOptions::default());
    let draft = Tracked::new(Draft { id: 1 }).unwrap_or_else(|_| unreachable!());

    let created = recorder.after_create(&alice(), &draft).await;
    assert!(matches!(created, Ok(None)));
    assert!(recorder.after_destroy(&alice(), &draft).await.is_none());
    assert!(repository.stored().await.is_empty());
}

#[tokio::test]
async fn excluded_update_records_nothing_while_destroy_records() {
    let (recorder, repository) = recorder_with(
        TrackingOptions::default().with_actions([ActionKind::Create, ActionKind::Destroy]),
    );
    let mut entity = article(1);
    entity.entity_mut().body = "Edited".to_owned();

    let updated = recorder.before_update(&alice(), &entity).await;
    assert!(matches!(updated, Ok(None)));
    assert!(repository.stored().await.is_empty());

    let destroyed = recorder.after_destroy(&alice(), &entity).await;
    assert!(destroyed.is_some());

    let stored = repository.stored().await;
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].action(), ActionKind::Destroy);
}

#[tokio::test]
async fn trim_keeps_the_limit_most_recent_after_trigger() {
    let (recorder, repository) = recorder_with(TrackingOptions::default().with_limit(3));
    let entity = article(1);
    let actionable = entity.actionable().unwrap_or_else(|_| unreachable!());
    let start = Utc::now() - Duration::hours(1);
    for offset in 0..6 {
        repository
            .seed(&actionable, ActionKind::Update, start + Duration::minutes(offset))
            .await;
    }

    let recorded = recorder.before_update(&alice(), &entity).await;
    let Ok(Some(latest)) = recorded else {
        panic!("update should be recorded");
    };

    let stored = repository.stored().await;
    let ids: Vec<i64> = stored.iter().map(|action| action.id().as_i64()).collect();
    assert_eq!(ids, vec![5, 6, latest.id().as_i64()]);
}

#[tokio::test]
async fn three_updates_with_limit_two_keep_the_last_two() {
    let (recorder, repository) = recorder_with(TrackingOptions::default().with_limit(2));
    let mut entity = article(1);

    let mut recorded_ids = Vec::new();
    for title in ["One", "Two", "Three"] {
        entity.entity_mut().title = title.to_owned();
        let recorded = recorder.before_update(&alice(), &entity).await;
        let Ok(Some(action)) = recorded else {
            panic!("update should be recorded");
        };
        recorded_ids.push(action.id());
        assert!(entity.mark_persisted().is_ok());
    }

    let remaining: Vec<_> = repository
        .stored()
        .await
        .iter()
        .map(|action| action.id())
        .collect();
    assert_eq!(remaining, recorded_ids[1..].to_vec());
}

#[tokio::test]
async fn history_grows_without_limit() {
    let (recorder, repository) = recorder_with(TrackingOptions::default());
    let entity = article(1);

    for _ in 0..25 {
        let recorded = recorder.before_update(&alice(), &entity).await;
        assert!(recorded.is_ok());
    }

    assert_eq!(repository.stored().await.len(), 25);
    assert_eq!(repository.delete_calls(), 0);
}

#[tokio::test]
async fn create_and_update_failures_propagate() {
    let (recorder, repository) = recorder_with(TrackingOptions::default());
    repository.fail_appends(true);
    let entity = article(1);

    assert!(recorder.after_create(&alice(), &entity).await.is_err());
    assert!(recorder.before_update(&alice(), &entity).await.is_err());
}

#[tokio::test]
async fn destroy_failure_is_swallowed() {
    let (recorder, repository) = recorder_with(TrackingOptions::default());
    repository.fail_appends(true);

    let destroyed = recorder.after_destroy(&alice(), &article(1)).await;
    assert!(destroyed.is_none());
    assert!(repository.stored().await.is_empty());
}

#[tokio::test]
async fn failed_destroy_recording_still_trims_history() {
    let (recorder, repository) = recorder_with(TrackingOptions::default().with_limit(1));
    let entity = article(1);
    let actionable = entity.actionable().unwrap_or_else(|_| unreachable!());
    for _ in 0..3 {
        repository
            .seed(&actionable, ActionKind::Update, Utc::now())
            .await;
    }
    repository.fail_appends(true);

    assert!(recorder.after_destroy(&alice(), &entity).await.is_none());
    assert_eq!(repository.delete_calls(), 1);
    assert_eq!(repository.stored().await.len(), 1);
}

#[tokio::test]
async fn trim_failure_does_not_fail_the_recording() {
    let (recorder, repository) = recorder_with(TrackingOptions::default().with_limit(1));
    repository.fail_deletes(true);
    let entity = article(1);

    let first = recorder.after_create(&alice(), &entity).await;
    assert!(matches!(first, Ok(Some(_))));
    let second = recorder.before_update(&alice(), &entity).await;
    assert!(matches!(second, Ok(Some(_))));

    assert_eq!(repository.delete_calls(), 1);
    assert_eq!(repository.stored().await.len(), 2);

    repository.fail_deletes(false);
    let third = recorder.before_update(&alice(), &entity).await;
    assert!(matches!(third, Ok(Some(_))));
    assert_eq!(repository.stored().await.len(), 1);
}

#[tokio::test]
async fn actions_for_date_returns_only_that_day() {
    let (recorder, repository) = recorder_with(TrackingOptions::default());
    let entity = article(1);
    let other = article(2);
    let actionable = entity.actionable().unwrap_or_else(|_| unreachable!());
    let other_actionable = other.actionable().unwrap_or_else(|_| unreachable!());
    let at = |day: u32, hour: u32, minute: u32, second: u32| {
        Utc.with_ymd_and_hms(2024, 5, day, hour, minute, second)
            .single()
            .unwrap_or_else(|| unreachable!())
    };

    repository
        .seed(&actionable, ActionKind::Create, at(9, 23, 59, 59))
        .await;
    let start_of_day = repository
        .seed(&actionable, ActionKind::Update, at(10, 0, 0, 0))
        .await;
    let end_of_day = repository
        .seed(&actionable, ActionKind::Update, at(10, 23, 59, 59))
        .await;
    repository
        .seed(&actionable, ActionKind::Update, at(11, 0, 0, 0))
        .await;
    repository
        .seed(&other_actionable, ActionKind::Update, at(10, 12, 0, 0))
        .await;

    let date = NaiveDate::from_ymd_opt(2024, 5, 10).unwrap_or_else(|| unreachable!());
    let listed = recorder.actions_for_date(&entity, date).await;
    assert!(listed.is_ok());
    let ids: Vec<_> = listed
        .unwrap_or_default()
        .iter()
        .map(|action| action.id())
        .collect();
    assert_eq!(ids, vec![start_of_day.id(), end_of_day.id()]);

    let all = recorder.actions_for(&entity).await.unwrap_or_default();
    assert_eq!(all.len(), 4);
}
