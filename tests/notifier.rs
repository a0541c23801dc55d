#[cfg(test)]
mod tests {
    use runrun_tracker::libs::notifier::{DesktopNotifier, Notification};
    use runrun_tracker::libs::state::Task;

    fn hostile() -> Notification {
        Notification::work(&Task::new(1, "say \"hi\" \\\" & do shell script \"rm -rf ~\""))
    }

    #[test]
    fn test_osascript_script_is_fixed() {
        let notification = hostile();
        let args = DesktopNotifier::osascript_args(&notification);

        let script: Vec<&String> = args.iter().skip(1).step_by(2).take(3).collect();
        assert_eq!(script[0], "on run argv");
        assert_eq!(script[2], "end run");
        assert!(args[..6].iter().all(|arg| !arg.contains("rm -rf")));

        assert_eq!(args[6], notification.title);
        assert_eq!(args[7], notification.message);
        assert_eq!(args[8], "runrun-tracker");
    }

    #[test]
    fn test_notify_send_text_follows_separator() {
        let mut notification = hostile();
        notification.title = "--version".to_string();
        let args = DesktopNotifier::notify_send_args(&notification);

        let separator = args.iter().position(|arg| arg == "--").unwrap();
        assert_eq!(&args[separator + 1..], [notification.title.clone(), notification.message.clone()]);
        assert!(args.contains(&"string:x-canonical-private-synchronous:runrunit_task_notification".to_string()));
    }
}
