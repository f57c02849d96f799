use crate::error::AppError;
use crate::notify::{Notifier, activation_argument, launch_show};
use crate::reminder::Reminder;
use notify_rust::Notification;

pub struct LinuxNotifier;

impl Notifier for LinuxNotifier {
    fn notify(&self, reminder: &Reminder) -> Result<(), AppError> {
        let action = activation_argument(&reminder.entity_id);
        let handle = Notification::new()
            .appname("dayplan")
            .summary(&reminder.title)
            .body(&reminder.body)
            .action(&action, "Open")
            .show()
            .map_err(|err| AppError::io(err.to_string()))?;

        let entity_id = reminder.entity_id.clone();
        std::thread::spawn(move || {
            handle.wait_for_action(|selected| {
                if selected == action || selected == "default" {
                    if let Err(err) = launch_show(&entity_id) {
                        tracing::warn!(entity_id = %entity_id, error = %err, "failed to open reminder");
                    }
                }
            });
        });

        Ok(())
    }
}
