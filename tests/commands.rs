mod common;

#[cfg(test)]
mod tests {
    use super::common::{FakeApi, server_error};
    use runrun_tracker::commands::options::{validate_reminder_minutes, MAX_REMINDER_MINUTES};
    use runrun_tracker::commands::task::{self, TaskAction};
    use runrun_tracker::libs::context::AppContext;
    use runrun_tracker::libs::state::{Action, Id, Options, Task, User};
    use tempfile::TempDir;
    use test_context::{test_context, AsyncTestContext};
    use tokio::sync::{Mutex, MutexGuard};

    // HOME is process-wide; tests of this file take turns.
    static ENV_LOCK: Mutex<()> = Mutex::const_new(());

    struct CommandTestContext {
        _temp_dir: TempDir,
        _env: MutexGuard<'static, ()>,
    }

    impl AsyncTestContext for CommandTestContext {
        async fn setup() -> Self {
            let env = ENV_LOCK.lock().await;
            let temp_dir = tempfile::tempdir().unwrap();
            std::env::set_var("HOME", temp_dir.path());
            std::env::set_var("LOCALAPPDATA", temp_dir.path());
            CommandTestContext {
                _temp_dir: temp_dir,
                _env: env,
            }
        }
    }

    async fn signed_in() -> AppContext {
        let context = AppContext::open().await.unwrap();
        context
            .store
            .dispatch(Action::UpdateOptions(Options {
                appkey: Some("key".to_string()),
                usertoken: Some("token".to_string()),
                reminder_enabled: true,
                reminder_time_in_minutes: 30,
                auto_pause_resume: true,
            }))
            .await
            .unwrap();
        context
    }

    #[test_context(CommandTestContext)]
    #[tokio::test]
    async fn test_state_survives_reopen(_ctx: &mut CommandTestContext) {
        let context = signed_in().await;
        context.store.dispatch(Action::ToggleTrackingTask(Id::from(8))).await.unwrap();

        let reopened = AppContext::open().await.unwrap();

        let state = reopened.authenticated().unwrap();
        assert_eq!(state.tracked_task, Some(Id::from(8)));
        assert!(state.auto_pause_resume);
    }

    #[test_context(CommandTestContext)]
    #[tokio::test]
    async fn test_unauthenticated_context(_ctx: &mut CommandTestContext) {
        let context = AppContext::open().await.unwrap();
        assert!(context.authenticated().is_none());
    }

    #[test_context(CommandTestContext)]
    #[tokio::test]
    async fn test_pause_stops_tracking(_ctx: &mut CommandTestContext) {
        let context = signed_in().await;
        context.store.dispatch(Action::ToggleTrackingTask(Id::from(5))).await.unwrap();
        let api = FakeApi::new(User::new(1), vec![]);

        task::run(&context, &api, TaskAction::Pause, &Id::from(5)).await.unwrap();

        assert_eq!(api.calls(), vec!["pause 5".to_string()]);
        assert_eq!(context.store.state().tracked_task, None);
    }

    #[test_context(CommandTestContext)]
    #[tokio::test]
    async fn test_actions_reach_the_api(_ctx: &mut CommandTestContext) {
        let context = signed_in().await;
        let api = FakeApi::new(User::new(1), vec![]);
        let id = Id::from(3);

        task::run(&context, &api, TaskAction::Play, &id).await.unwrap();
        task::run(&context, &api, TaskAction::Deliver, &id).await.unwrap();
        task::run(&context, &api, TaskAction::Reopen, &id).await.unwrap();

        assert_eq!(api.calls(), vec!["play 3".to_string(), "deliver 3".to_string(), "reopen 3".to_string()]);
    }

    #[test_context(CommandTestContext)]
    #[tokio::test]
    async fn test_failed_action_is_an_error(_ctx: &mut CommandTestContext) {
        let context = signed_in().await;
        let api = FakeApi::new(User::new(1), vec![]);
        *api.fail_actions.lock() = true;

        let error = task::run(&context, &api, TaskAction::Play, &Id::from(3)).await.unwrap_err();

        assert_eq!(error.to_string(), server_error().to_string());
    }

    #[test_context(CommandTestContext)]
    #[tokio::test]
    async fn test_current_user_is_cached(_ctx: &mut CommandTestContext) {
        let context = signed_in().await;
        let api = FakeApi::new(User::new(77), vec![Task::new(1, "Unused")]);

        let first = context.current_user(&api).await.unwrap();
        let second = context.current_user(&api).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(first.id, Id::from(77));
        assert_eq!(api.user_calls.load(std::sync::atomic::Ordering::SeqCst), 1);
        assert_eq!(context.store.state().user.map(|user| user.id), Some(Id::from(77)));
    }

    #[test_context(CommandTestContext)]
    #[tokio::test]
    async fn test_logout_removes_record(_ctx: &mut CommandTestContext) {
        let context = signed_in().await;

        context.store.remove().await.unwrap();

        let reopened = AppContext::open().await.unwrap();
        assert!(reopened.authenticated().is_none());
    }

    #[test]
    fn test_reminder_interval_bounds() {
        assert!(validate_reminder_minutes(1).is_ok());
        assert!(validate_reminder_minutes(MAX_REMINDER_MINUTES).is_ok());

        assert!(validate_reminder_minutes(0).is_err());
        assert!(validate_reminder_minutes(-5).is_err());
        assert!(validate_reminder_minutes(MAX_REMINDER_MINUTES + 1).is_err());
        let error = validate_reminder_minutes(i64::MAX).unwrap_err();
        assert!(error.to_string().contains("between 1 and 10080 minutes"));
    }
}
