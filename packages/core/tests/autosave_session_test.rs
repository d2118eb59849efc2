//! Autosave Session Tests
//!
//! Drives the save state machine directly with settled values, without any
//! debounce timing, and checks the external calls and status transitions it
//! produces.

mod common;

#[cfg(test)]
mod autosave_session_tests {
    use super::common::{text_doc, RecordingStore, StoreCall, OWNER_ID, SLUG};
    use anyhow::Result;
    use appsdir_core::models::{CanonicalDocuments, ContentKey, SaveStatus};
    use appsdir_core::services::{AutosaveError, AutosaveSession, SettleOutcome};
    use std::sync::Arc;
    use tokio::sync::broadcast;

    fn create_session(max_attempts: u32) -> (AutosaveSession, Arc<RecordingStore>) {
        let store = Arc::new(RecordingStore::new());
        let session = AutosaveSession::new(
            ContentKey::new(OWNER_ID, SLUG),
            store.clone(),
            CanonicalDocuments::default(),
            max_attempts,
        );
        (session, store)
    }

    fn drain(rx: &mut broadcast::Receiver<SaveStatus>) -> Vec<SaveStatus> {
        let mut seen = Vec::new();
        while let Ok(status) = rx.try_recv() {
            seen.push(status);
        }
        seen
    }

    #[tokio::test]
    async fn test_mount_with_content_issues_no_calls() -> Result<()> {
        let (mut session, store) = create_session(3);

        session.mount(&text_doc("Stored intro")).await?;

        assert!(store.calls().is_empty());
        assert_eq!(session.last_committed(), Some(&text_doc("Stored intro")));
        Ok(())
    }

    #[tokio::test]
    async fn test_mount_with_default_template_removes_content() -> Result<()> {
        let (mut session, store) = create_session(3);
        let canon = CanonicalDocuments::default();

        session.mount(&canon.default_template).await?;

        assert_eq!(
            store.calls(),
            vec![StoreCall::Delete {
                owner_id: OWNER_ID.to_string(),
                slug: SLUG.to_string(),
            }]
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_unchanged_value_is_not_written() -> Result<()> {
        let (mut session, store) = create_session(3);
        session.mount(&text_doc("Hello")).await?;

        let outcome = session.settle(text_doc("Hello")).await?;
        assert_eq!(outcome, SettleOutcome::Unchanged);

        let outcome = session.settle(text_doc("Hello world")).await?;
        assert_eq!(outcome, SettleOutcome::Written);

        let outcome = session.settle(text_doc("Hello world")).await?;
        assert_eq!(outcome, SettleOutcome::Unchanged);

        assert_eq!(store.writes(), vec![text_doc("Hello world")]);
        Ok(())
    }

    #[tokio::test]
    async fn test_blank_value_deletes_instead_of_writing() -> Result<()> {
        let (mut session, store) = create_session(3);
        let canon = CanonicalDocuments::default();
        session.mount(&text_doc("Hello")).await?;
        let mut rx = session.subscribe();

        let outcome = session.settle(canon.empty.clone()).await?;

        assert_eq!(outcome, SettleOutcome::Removed);
        assert_eq!(store.delete_count(), 1);
        assert!(store.writes().is_empty());
        assert_eq!(session.status(), SaveStatus::Idle);
        assert!(drain(&mut rx).is_empty(), "Delete path has no save transitions");

        // Already removed; the same blank value settles as unchanged
        let outcome = session.settle(canon.empty.clone()).await?;
        assert_eq!(outcome, SettleOutcome::Unchanged);
        assert_eq!(store.delete_count(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_delete_failure_is_not_fatal() -> Result<()> {
        let (mut session, store) = create_session(3);
        let canon = CanonicalDocuments::default();
        session.mount(&text_doc("Hello")).await?;
        store.fail_deletes(true);

        let outcome = session.settle(canon.empty.clone()).await?;
        assert_eq!(outcome, SettleOutcome::RemovalFailed);

        // Not committed, so the next blank settle tries again
        store.fail_deletes(false);
        let outcome = session.settle(canon.empty.clone()).await?;
        assert_eq!(outcome, SettleOutcome::Removed);
        assert_eq!(store.delete_count(), 2);

        // Editing continues normally
        assert_eq!(
            session.settle(text_doc("Back again")).await?,
            SettleOutcome::Written
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_fail_twice_then_retry_succeeds() -> Result<()> {
        let (mut session, store) = create_session(3);
        session.mount(&text_doc("Hi")).await?;
        let mut rx = session.subscribe();
        store.fail_next_writes(2);

        let err = session.settle(text_doc("Hello")).await.unwrap_err();
        assert!(matches!(
            err,
            AutosaveError::TransientWriteFailure { attempt: 1, .. }
        ));
        assert!(err.is_retryable());

        let err = session.retry().await.unwrap_err();
        assert!(matches!(
            err,
            AutosaveError::TransientWriteFailure { attempt: 2, .. }
        ));

        session.retry().await?;

        assert_eq!(
            drain(&mut rx),
            vec![
                SaveStatus::Saving,
                SaveStatus::Failed,
                SaveStatus::Saving,
                SaveStatus::Failed,
                SaveStatus::Saving,
                SaveStatus::Saved,
            ]
        );
        assert_eq!(store.writes(), vec![text_doc("Hello"); 3]);
        assert_eq!(session.retry_state().attempts, 0);
        Ok(())
    }

    #[tokio::test]
    async fn test_retry_bound_is_terminal() -> Result<()> {
        let (mut session, store) = create_session(3);
        session.mount(&text_doc("Hi")).await?;
        store.fail_next_writes(u32::MAX);

        assert!(session.settle(text_doc("Hello")).await.is_err());
        assert!(session.retry().await.is_err());

        let err = session.retry().await.unwrap_err();
        assert!(matches!(
            err,
            AutosaveError::PermanentWriteFailure { attempts: 3, .. }
        ));
        assert!(!err.is_retryable());

        // Refused without another write
        let err = session.retry().await.unwrap_err();
        assert!(matches!(err, AutosaveError::PermanentWriteFailure { .. }));
        assert_eq!(store.writes().len(), 3);
        assert_eq!(session.status(), SaveStatus::Failed);
        assert!(session.retry_state().exhausted());
        Ok(())
    }

    #[tokio::test]
    async fn test_new_value_resets_attempts() -> Result<()> {
        let (mut session, store) = create_session(2);
        session.mount(&text_doc("Hi")).await?;
        store.fail_next_writes(2);

        assert!(session.settle(text_doc("one")).await.is_err());
        assert!(session.retry().await.is_err());
        assert!(session.retry_state().exhausted());

        session.settle(text_doc("two")).await?;
        assert_eq!(session.status(), SaveStatus::Saved);
        assert_eq!(session.retry_state().attempts, 0);
        Ok(())
    }

    #[tokio::test]
    async fn test_reverting_after_failed_write_abandons_it() -> Result<()> {
        let (mut session, store) = create_session(3);
        session.mount(&text_doc("Original")).await?;
        store.fail_next_writes(1);

        assert!(session.settle(text_doc("Changed")).await.is_err());
        assert_eq!(session.status(), SaveStatus::Failed);

        // Back to what storage already holds
        let outcome = session.settle(text_doc("Original")).await?;
        assert_eq!(outcome, SettleOutcome::Unchanged);
        assert_eq!(session.status(), SaveStatus::Idle);
        assert_eq!(session.retry_state().attempts, 0);

        let err = session.retry().await.unwrap_err();
        assert!(matches!(err, AutosaveError::NothingToRetry { .. }));
        assert_eq!(store.writes(), vec![text_doc("Changed")]);
        Ok(())
    }

    #[tokio::test]
    async fn test_clearing_after_failed_write_deletes_again() -> Result<()> {
        let (mut session, store) = create_session(3);
        let canon = CanonicalDocuments::default();
        session.mount(&canon.empty).await?;
        assert_eq!(store.delete_count(), 1);
        store.fail_next_writes(1);

        assert!(session.settle(text_doc("Typed")).await.is_err());

        let outcome = session.settle(canon.empty.clone()).await?;
        assert_eq!(outcome, SettleOutcome::Removed);
        assert_eq!(store.delete_count(), 2);
        assert_eq!(session.status(), SaveStatus::Idle);

        let err = session.retry().await.unwrap_err();
        assert!(matches!(err, AutosaveError::NothingToRetry { .. }));
        assert_eq!(store.writes(), vec![text_doc("Typed")]);
        Ok(())
    }

    #[tokio::test]
    async fn test_new_value_after_failed_write_replaces_it() -> Result<()> {
        let (mut session, store) = create_session(3);
        session.mount(&text_doc("Hi")).await?;
        store.fail_next_writes(1);

        assert!(session.settle(text_doc("first")).await.is_err());
        assert_eq!(session.settle(text_doc("second")).await?, SettleOutcome::Written);
        assert_eq!(session.status(), SaveStatus::Saved);

        let err = session.retry().await.unwrap_err();
        assert!(matches!(err, AutosaveError::NothingToRetry { .. }));
        assert_eq!(store.writes(), vec![text_doc("first"), text_doc("second")]);
        Ok(())
    }

    #[tokio::test]
    async fn test_in_flight_marks_manual_retries_only() -> Result<()> {
        let (mut session, store) = create_session(3);
        session.mount(&text_doc("Hi")).await?;
        store.observe_snapshots(session.watch());
        store.fail_next_writes(1);

        assert!(session.settle(text_doc("Hello")).await.is_err());
        assert!(!session.retry_state().in_flight);
        session.retry().await?;

        let seen = store.snapshots_at_write();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[0].status, SaveStatus::Saving);
        assert!(!seen[0].retry.in_flight);
        assert_eq!(seen[1].status, SaveStatus::Saving);
        assert!(seen[1].retry.in_flight);
        assert_eq!(seen[1].retry.attempts, 1);

        // Cleared once the retry lands
        assert!(!session.retry_state().in_flight);
        Ok(())
    }

    #[tokio::test]
    async fn test_retry_without_failure_is_rejected() -> Result<()> {
        let (mut session, store) = create_session(3);
        session.mount(&text_doc("Hi")).await?;

        let err = session.retry().await.unwrap_err();
        assert!(matches!(err, AutosaveError::NothingToRetry { .. }));
        assert!(store.calls().is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_edit_after_save_returns_to_idle() -> Result<()> {
        let (mut session, _store) = create_session(3);
        session.mount(&text_doc("Hi")).await?;
        let snapshots = session.watch();

        session.settle(text_doc("Hello")).await?;
        assert_eq!(session.status(), SaveStatus::Saved);

        session.note_edit(&text_doc("Hello!"));
        assert_eq!(session.status(), SaveStatus::Idle);

        let snapshot = *snapshots.borrow();
        assert_eq!(snapshot.status, SaveStatus::Idle);
        assert_eq!(snapshot.char_count, 6);
        assert!(!snapshot.is_empty);
        Ok(())
    }
}
