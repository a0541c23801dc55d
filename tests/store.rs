mod common;

#[cfg(test)]
mod tests {
    use super::common::store_over;
    use parking_lot::Mutex;
    use runrun_tracker::libs::context::STATE_KEY;
    use runrun_tracker::libs::reconciler::AppStore;
    use runrun_tracker::libs::state::{reducer, Action, Id, MachineStatus, State};
    use runrun_tracker::libs::storage::{MemoryBackend, StorageArea, StorageBackend, StorageChange};
    use runrun_tracker::libs::store::Store;
    use serde_json::json;
    use std::sync::Arc;
    use std::time::Duration;

    /// Waits until `store` satisfies `check`, or gives up after a second.
    async fn eventually(store: &AppStore, check: impl Fn(&State) -> bool) -> bool {
        for _ in 0..100 {
            if check(&store.state()) {
                return true;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        false
    }

    #[tokio::test]
    async fn test_init_loads_persisted_record() {
        let backend = Arc::new(MemoryBackend::default().with_value(STATE_KEY, json!({ "trackedTask": 42, "autoPauseResume": true })));
        let store = Store::new(reducer, State::default());
        assert!(!store.is_initialized());

        store.init(STATE_KEY, backend).await.unwrap();

        assert!(store.is_initialized());
        let state = store.state();
        assert_eq!(state.tracked_task, Some(Id::from(42)));
        assert!(state.auto_pause_resume);
        assert_eq!(state.reminder_time_in_minutes, 30);
    }

    #[tokio::test]
    async fn test_initialization_waits_for_init() {
        let store = Arc::new(Store::new(reducer, State::default()));

        let waiting = {
            let store = store.clone();
            tokio::spawn(async move { store.initialization().await })
        };
        tokio::task::yield_now().await;
        assert!(!waiting.is_finished());

        store.init(STATE_KEY, Arc::new(MemoryBackend::default())).await.unwrap();
        tokio::time::timeout(Duration::from_secs(1), waiting).await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_init_is_idempotent() {
        let first = Arc::new(MemoryBackend::default().with_value(STATE_KEY, json!({ "trackedTask": 1 })));
        let second = Arc::new(MemoryBackend::default().with_value(STATE_KEY, json!({ "trackedTask": 2 })));
        let store = Store::new(reducer, State::default());

        store.init(STATE_KEY, first.clone()).await.unwrap();
        store.init(STATE_KEY, second.clone()).await.unwrap();
        store.dispatch(Action::StopTrackingTask).await.unwrap();

        assert_eq!(first.get(STATE_KEY).await.unwrap().unwrap()["trackedTask"], json!(null));
        assert_eq!(second.get(STATE_KEY).await.unwrap().unwrap()["trackedTask"], json!(2));
    }

    #[tokio::test]
    async fn test_dispatch_before_init_is_ignored() {
        let store: AppStore = Store::new(reducer, State::default());
        let notified = Arc::new(Mutex::new(0));
        let counter = notified.clone();
        let _listener = store.subscribe(move |_| *counter.lock() += 1);

        store.dispatch(Action::ToggleTrackingTask(Id::from(1))).await.unwrap();

        assert_eq!(store.state().tracked_task, None);
        assert_eq!(*notified.lock(), 0);
    }

    #[tokio::test]
    async fn test_dispatch_persists_and_notifies_in_order() {
        let backend = Arc::new(MemoryBackend::default());
        let store = store_over(backend.clone()).await;
        let seen = Arc::new(Mutex::new(Vec::new()));

        let first = seen.clone();
        let _a = store.subscribe(move |state: &State| first.lock().push(("a", state.tracked_task.clone())));
        let second = seen.clone();
        let _b = store.subscribe(move |state: &State| second.lock().push(("b", state.tracked_task.clone())));

        store.dispatch(Action::ToggleTrackingTask(Id::from(9))).await.unwrap();

        assert_eq!(
            *seen.lock(),
            vec![("a", Some(Id::from(9))), ("b", Some(Id::from(9)))]
        );
        let persisted = backend.get(STATE_KEY).await.unwrap().unwrap();
        assert_eq!(persisted["trackedTask"], json!(9));
    }

    #[tokio::test]
    async fn test_unsubscribe_removes_only_its_listener() {
        let store = store_over(Arc::new(MemoryBackend::default())).await;
        let seen = Arc::new(Mutex::new(Vec::new()));

        let first = seen.clone();
        let a = store.subscribe(move |_: &State| first.lock().push("a"));
        let second = seen.clone();
        let _b = store.subscribe(move |_: &State| second.lock().push("b"));

        a.unsubscribe();
        a.unsubscribe();
        store.dispatch(Action::StopTrackingTask).await.unwrap();

        assert_eq!(*seen.lock(), vec!["b"]);
    }

    #[tokio::test]
    async fn test_remote_change_is_applied_and_announced() {
        let backend = Arc::new(MemoryBackend::default());
        let store = store_over(backend.clone()).await;
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let _listener = store.subscribe(move |state: &State| sink.lock().push(state.last_machine_status));

        backend.emit(StorageChange {
            area: StorageArea::Sync,
            key: STATE_KEY.to_string(),
            new_value: Some(json!({ "lastMachineStatus": "locked" })),
            origin: None,
        });

        assert!(eventually(&store, |state| state.last_machine_status == MachineStatus::Locked).await);
        assert_eq!(*seen.lock(), vec![MachineStatus::Locked]);
    }

    #[tokio::test]
    async fn test_remote_removal_is_ignored() {
        let backend = Arc::new(MemoryBackend::default().with_value(STATE_KEY, json!({ "trackedTask": 3 })));
        let store = store_over(backend.clone()).await;

        backend.emit(StorageChange {
            area: StorageArea::Sync,
            key: STATE_KEY.to_string(),
            new_value: None,
            origin: None,
        });
        tokio::time::sleep(Duration::from_millis(50)).await;

        assert_eq!(store.state().tracked_task, Some(Id::from(3)));
    }

    #[tokio::test]
    async fn test_stores_sharing_a_backend_converge() {
        let backend = Arc::new(MemoryBackend::default());
        let watcher = store_over(backend.clone()).await;
        let popup = store_over(backend.clone()).await;

        popup.dispatch(Action::ToggleTrackingTask(Id::from(5))).await.unwrap();
        assert!(eventually(&watcher, |state| state.tracked_task == Some(Id::from(5))).await);

        watcher.dispatch(Action::SetMachineStatus(MachineStatus::Locked)).await.unwrap();
        assert!(eventually(&popup, |state| state.last_machine_status == MachineStatus::Locked).await);
        assert_eq!(popup.state().tracked_task, Some(Id::from(5)));
    }

    #[tokio::test]
    async fn test_remove_keeps_memory() {
        let backend = Arc::new(MemoryBackend::default());
        let store = store_over(backend.clone()).await;
        store.dispatch(Action::ToggleTrackingTask(Id::from(4))).await.unwrap();

        store.remove().await.unwrap();

        assert_eq!(backend.get(STATE_KEY).await.unwrap(), None);
        assert_eq!(store.state().tracked_task, Some(Id::from(4)));
    }
}
