#[cfg(test)]
mod tests {
    use parking_lot::{Mutex, MutexGuard};
    use runrun_tracker::libs::daemon::{self, PID_FILE};
    use runrun_tracker::libs::data_storage::DataStorage;
    use std::process::Command;
    use tempfile::TempDir;
    use test_context::{test_context, TestContext};

    static ENV_LOCK: Mutex<()> = Mutex::new(());

    /// Test context for daemon tests.
    struct DaemonTestContext {
        _temp_dir: TempDir,
        _env: MutexGuard<'static, ()>,
    }

    impl TestContext for DaemonTestContext {
        fn setup() -> Self {
            let env = ENV_LOCK.lock();
            let temp_dir = tempfile::tempdir().unwrap();
            std::env::set_var("HOME", temp_dir.path());
            std::env::set_var("LOCALAPPDATA", temp_dir.path());
            DaemonTestContext {
                _temp_dir: temp_dir,
                _env: env,
            }
        }
    }

    fn pid_path() -> std::path::PathBuf {
        DataStorage::new().get_path(PID_FILE).unwrap()
    }

    #[test_context(DaemonTestContext)]
    #[test]
    fn test_no_pid_file(_ctx: &mut DaemonTestContext) {
        assert_eq!(daemon::running_pid().unwrap(), None);
        daemon::stop().unwrap();
    }

    #[test_context(DaemonTestContext)]
    #[test]
    fn test_running_pid_reads_pid_file(_ctx: &mut DaemonTestContext) {
        std::fs::write(pid_path(), "4242\n").unwrap();
        assert_eq!(daemon::running_pid().unwrap(), Some(4242));

        std::fs::write(pid_path(), "garbage").unwrap();
        assert_eq!(daemon::running_pid().unwrap(), None);
    }

    #[test_context(DaemonTestContext)]
    #[test]
    fn test_stop_rejects_invalid_pid_file(_ctx: &mut DaemonTestContext) {
        std::fs::write(pid_path(), "not-a-pid").unwrap();

        assert!(daemon::stop().is_err());
        assert!(pid_path().exists());
    }

    #[test_context(DaemonTestContext)]
    #[test]
    #[ignore] // Needs the runrun-tracker binary on PATH.
    fn test_watch_replaces_running_watcher(_ctx: &mut DaemonTestContext) {
        let output = Command::new("runrun-tracker").arg("watch").output().unwrap();
        assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
        std::thread::sleep(std::time::Duration::from_millis(1000));
        let first = daemon::running_pid().unwrap();
        assert!(first.is_some());

        let output = Command::new("runrun-tracker").arg("watch").output().unwrap();
        assert!(output.status.success());
        std::thread::sleep(std::time::Duration::from_millis(1000));
        let second = daemon::running_pid().unwrap();
        assert!(second.is_some());
        assert_ne!(first, second);

        let output = Command::new("runrun-tracker").args(["watch", "--stop"]).output().unwrap();
        assert!(output.status.success());
        assert!(!pid_path().exists());
    }
}
