#[cfg(test)]
mod tests {
    use runrun_tracker::libs::presence::{PresenceConfig, PresenceMonitor};
    use runrun_tracker::libs::state::{IdleState, MachineStatus};
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    fn monitor(locked: Arc<AtomicBool>) -> PresenceMonitor {
        PresenceMonitor::new(PresenceConfig {
            detection_interval: 15,
            ..PresenceConfig::default()
        })
        .with_lock_probe(move || locked.load(Ordering::SeqCst))
    }

    #[tokio::test(start_paused = true)]
    async fn test_active_until_detection_interval() {
        let monitor = monitor(Arc::new(AtomicBool::new(false)));
        assert_eq!(monitor.current_state(), IdleState::Active);

        tokio::time::advance(Duration::from_secs(14)).await;
        assert_eq!(monitor.current_state(), IdleState::Active);

        tokio::time::advance(Duration::from_secs(1)).await;
        assert_eq!(monitor.current_state(), IdleState::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn test_input_makes_machine_active_again() {
        let monitor = monitor(Arc::new(AtomicBool::new(false)));
        tokio::time::advance(Duration::from_secs(60)).await;
        assert_eq!(monitor.current_state(), IdleState::Idle);

        monitor.record_activity();

        assert_eq!(monitor.current_state(), IdleState::Active);
    }

    #[tokio::test(start_paused = true)]
    async fn test_locked_wins_over_idle() {
        let locked = Arc::new(AtomicBool::new(true));
        let monitor = monitor(locked.clone());
        assert_eq!(monitor.current_state(), IdleState::Locked);

        tokio::time::advance(Duration::from_secs(60)).await;
        assert_eq!(monitor.current_state(), IdleState::Locked);

        locked.store(false, Ordering::SeqCst);
        assert_eq!(monitor.current_state(), IdleState::Idle);
    }

    #[test]
    fn test_idle_is_stored_as_active() {
        assert_eq!(MachineStatus::from(IdleState::Idle), MachineStatus::Active);
        assert_eq!(MachineStatus::from(IdleState::Active), MachineStatus::Active);
        assert_eq!(MachineStatus::from(IdleState::Locked), MachineStatus::Locked);
    }
}
