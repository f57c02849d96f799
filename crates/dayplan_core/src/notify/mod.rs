use crate::error::AppError;
use crate::reminder::Reminder;

#[cfg(target_os = "linux")]
mod linux;
#[cfg(target_os = "linux")]
pub use linux::LinuxNotifier;

#[cfg(windows)]
mod windows;
#[cfg(windows)]
pub use windows::WindowsNotifier;

pub const DISABLE_ENV_VAR: &str = "DAYPLAN_DISABLE_NOTIFICATIONS";

/// Shows a reminder to the user right now.
pub trait Notifier: Send + Sync {
    fn notify(&self, reminder: &Reminder) -> Result<(), AppError>;
}

pub struct NoopNotifier;

impl Notifier for NoopNotifier {
    fn notify(&self, _reminder: &Reminder) -> Result<(), AppError> {
        Ok(())
    }
}

impl<N: Notifier + ?Sized> Notifier for Box<N> {
    fn notify(&self, reminder: &Reminder) -> Result<(), AppError> {
        (**self).notify(reminder)
    }
}

pub fn notifier_from_env() -> Result<Box<dyn Notifier>, AppError> {
    if std::env::var(DISABLE_ENV_VAR).is_ok() {
        return Ok(Box::new(NoopNotifier));
    }

    match platform_notifier() {
        Err(AppError::InvalidData(reason)) => {
            tracing::debug!(%reason, "desktop notifications unavailable");
            Ok(Box::new(NoopNotifier))
        }
        other => other,
    }
}

const ACTION_PREFIX: &str = "show:";

pub fn activation_argument(entity_id: &str) -> String {
    format!("{ACTION_PREFIX}{entity_id}")
}

pub fn parse_activation_argument(argument: &str) -> Option<String> {
    argument
        .strip_prefix(ACTION_PREFIX)
        .filter(|id| !id.trim().is_empty())
        .map(|id| id.to_string())
}

/// Re-launches the current executable as `<exe> show <id>`.
pub fn launch_show(entity_id: &str) -> Result<(), AppError> {
    let exe = std::env::current_exe()?;
    std::process::Command::new(exe)
        .arg("show")
        .arg(entity_id)
        .spawn()?;
    Ok(())
}

#[cfg(target_os = "linux")]
pub fn platform_notifier() -> Result<Box<dyn Notifier>, AppError> {
    Ok(Box::new(LinuxNotifier))
}

#[cfg(windows)]
pub fn platform_notifier() -> Result<Box<dyn Notifier>, AppError> {
    Ok(Box::new(WindowsNotifier))
}

#[cfg(not(any(target_os = "linux", windows)))]
pub fn platform_notifier() -> Result<Box<dyn Notifier>, AppError> {
    Err(AppError::invalid_data(
        "notifications are not supported on this platform",
    ))
}
