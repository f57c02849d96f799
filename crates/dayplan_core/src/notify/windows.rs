use crate::error::AppError;
use crate::notify::{Notifier, activation_argument, launch_show, parse_activation_argument};
use crate::reminder::Reminder;
use tauri_winrt_notification::Toast;

pub struct WindowsNotifier;

impl Notifier for WindowsNotifier {
    fn notify(&self, reminder: &Reminder) -> Result<(), AppError> {
        let entity_id = reminder.entity_id.clone();
        let action = activation_argument(&reminder.entity_id);

        Toast::new(Toast::POWERSHELL_APP_ID)
            .title(&reminder.title)
            .text1(&reminder.body)
            .text2(&reminder.entity_id)
            .add_button("Open", &action)
            .on_activated(move |args| {
                let target = args
                    .as_deref()
                    .and_then(parse_activation_argument)
                    .unwrap_or_else(|| entity_id.clone());
                if let Err(err) = launch_show(&target) {
                    tracing::warn!(entity_id = %target, error = %err, "failed to open reminder");
                }
                Ok(())
            })
            .show()
            .map_err(|err| AppError::io(err.to_string()))?;
        Ok(())
    }
}
