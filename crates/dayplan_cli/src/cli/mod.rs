use clap::{Parser, Subcommand};
use dayplan_core::config::{ConfigOverrides, MAX_LEAD_MINUTES, Theme, canonicalize_key};
use dayplan_core::model::EventType;

#[derive(Parser, Debug)]
#[command(name = "dayplan", author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Output JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Override configuration values (format KEY=VALUE)
    #[arg(long = "config-override", value_name = "KEY=VALUE", global = true)]
    pub config_override: Vec<String>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Manage todos
    Todo {
        #[command(subcommand)]
        action: TodoCommand,
    },
    /// Manage events
    Event {
        #[command(subcommand)]
        action: EventCommand,
    },
    /// Show details of a todo or event
    ///
    /// Example: dayplan show event-3
    Show { id: String },
    /// Deliver reminders that came due recently
    ///
    /// Example: dayplan notify --lookback-minutes 30
    Notify {
        #[arg(long, default_value_t = 15)]
        lookback_minutes: u32,
    },
    /// Stay running and deliver every upcoming reminder
    Watch,
}

#[derive(Subcommand, Debug)]
pub enum TodoCommand {
    /// Add a todo
    ///
    /// Example: dayplan todo add "Buy milk" --due "2024-01-02 18:00"
    Add {
        title: Option<String>,
        #[arg(long, value_name = "DATETIME")]
        due: Option<String>,
        #[arg(long, value_name = "DATETIME")]
        remind: Option<String>,
    },
    /// Flip a todo between open and completed
    Toggle { id: String },
    /// Change a todo's fields
    ///
    /// Example: dayplan todo edit todo-1 --title "Buy oat milk" --clear-due
    Edit {
        id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long, value_name = "DATETIME", conflicts_with = "clear_due")]
        due: Option<String>,
        #[arg(long)]
        clear_due: bool,
        #[arg(long, value_name = "DATETIME", conflicts_with = "clear_remind")]
        remind: Option<String>,
        #[arg(long)]
        clear_remind: bool,
    },
    /// Delete a todo
    Delete { id: String },
    /// Set when to be reminded about a todo
    ///
    /// Example: dayplan todo remind todo-1 "2024-01-02 17:30"
    Remind { id: String, datetime: String },
    /// List all todos
    List,
}

#[derive(Subcommand, Debug)]
pub enum EventCommand {
    /// Add an event
    ///
    /// Example: dayplan event add Standup --type routine --due "2024-01-02 09:00" -d "Daily sync"
    Add {
        title: Option<String>,
        #[arg(long = "type", value_name = "TYPE", value_parser = parse_event_type)]
        kind: EventType,
        #[arg(long, value_name = "DATETIME")]
        due: String,
        #[arg(short, long, default_value = "")]
        description: String,
    },
    /// Flip an event between open and completed
    Toggle { id: String },
    /// Change an event's fields
    Edit {
        id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(short, long)]
        description: Option<String>,
        #[arg(long = "type", value_name = "TYPE", value_parser = parse_event_type)]
        kind: Option<EventType>,
        #[arg(long, value_name = "DATETIME")]
        due: Option<String>,
    },
    /// Delete an event
    Delete { id: String },
    /// List the events of one day
    ///
    /// Example: dayplan event list --date 2024-01-02 --type job --type routine
    /// Example: dayplan event list --shift -1
    List {
        #[arg(long, value_name = "YYYY-MM-DD")]
        date: Option<String>,
        /// Days to move from the date, like swiping across days
        #[arg(long, default_value_t = 0, allow_hyphen_values = true)]
        shift: i64,
        #[arg(long = "type", value_name = "TYPE", value_parser = parse_event_type)]
        types: Vec<EventType>,
    },
}

pub fn parse_event_type(raw: &str) -> Result<EventType, String> {
    raw.parse::<EventType>().map_err(|err| err.message().to_string())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigOverrideTarget {
    Theme,
    ReminderLeadMinutes,
    DefaultTypes,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedConfigOverride {
    pub target: ConfigOverrideTarget,
    pub value: String,
}

/// Parse a raw `KEY=VALUE` override string into a structured target.
pub fn parse_config_override(raw: &str) -> Result<ParsedConfigOverride, String> {
    let (key_raw, value_raw) = raw
        .trim()
        .split_once('=')
        .ok_or_else(|| "override must be in KEY=VALUE format".to_string())?;

    let key = canonicalize_key(key_raw);
    if key.is_empty() {
        return Err("override key cannot be empty".to_string());
    }

    let target = match key.as_str() {
        "theme" => ConfigOverrideTarget::Theme,
        "reminder_lead_minutes" | "lead_minutes" | "lead" => {
            ConfigOverrideTarget::ReminderLeadMinutes
        }
        "default_types" | "types" => ConfigOverrideTarget::DefaultTypes,
        other => return Err(format!("unknown config field '{other}'")),
    };

    Ok(ParsedConfigOverride {
        target,
        value: value_raw.trim().to_string(),
    })
}

pub fn collect_overrides(raw: &[String]) -> Result<ConfigOverrides, String> {
    let mut overrides = ConfigOverrides::default();

    for entry in raw {
        let parsed = parse_config_override(entry)?;
        match parsed.target {
            ConfigOverrideTarget::Theme => {
                overrides.theme = Some(Theme::from_name(&parsed.value));
            }
            ConfigOverrideTarget::ReminderLeadMinutes => {
                let minutes = parsed
                    .value
                    .parse::<u32>()
                    .map_err(|_| "reminder_lead_minutes must be a whole number".to_string())?;
                if minutes > MAX_LEAD_MINUTES {
                    return Err(format!(
                        "reminder_lead_minutes must be at most {MAX_LEAD_MINUTES}"
                    ));
                }
                overrides.reminder_lead_minutes = Some(minutes);
            }
            ConfigOverrideTarget::DefaultTypes => {
                let types = parsed
                    .value
                    .split(',')
                    .filter(|part| !part.trim().is_empty())
                    .map(parse_event_type)
                    .collect::<Result<Vec<_>, _>>()?;
                overrides.default_types = Some(types);
            }
        }
    }

    Ok(overrides)
}

#[cfg(test)]
mod tests {
    use super::{
        Cli, Command, ConfigOverrideTarget, EventCommand, collect_overrides, parse_config_override,
    };
    use clap::Parser;
    use dayplan_core::config::Theme;
    use dayplan_core::model::EventType;

    #[test]
    fn parse_config_override_canonicalizes_field_names() {
        let parsed = parse_config_override(" Reminder-Lead-Minutes = 30 ").unwrap();

        assert_eq!(parsed.target, ConfigOverrideTarget::ReminderLeadMinutes);
        assert_eq!(parsed.value, "30");
    }

    #[test]
    fn parse_config_override_rejects_unknown_fields() {
        let err = parse_config_override("unknown.field=value").unwrap_err();
        assert!(err.contains("unknown config field"));
    }

    #[test]
    fn parse_config_override_rejects_missing_equals() {
        let err = parse_config_override("themenoir").unwrap_err();
        assert!(err.contains("KEY=VALUE"));
    }

    #[test]
    fn collect_overrides_parses_values() {
        let overrides = collect_overrides(&[
            "theme=noir".to_string(),
            "default_types=job, free-time".to_string(),
            "lead=5".to_string(),
        ])
        .unwrap();

        assert_eq!(overrides.theme, Some(Theme::Noir));
        assert_eq!(overrides.reminder_lead_minutes, Some(5));
        assert_eq!(
            overrides.default_types,
            Some(vec![EventType::Job, EventType::FreeTime])
        );
    }

    #[test]
    fn collect_overrides_rejects_bad_values() {
        assert!(collect_overrides(&["lead=soon".to_string()]).is_err());
        assert!(collect_overrides(&["types=job,party".to_string()]).is_err());
    }

    #[test]
    fn collect_overrides_rejects_lead_over_a_week() {
        let err = collect_overrides(&["lead=10081".to_string()]).unwrap_err();
        assert!(err.contains("at most 10080"));

        let overrides = collect_overrides(&["lead=10080".to_string()]).unwrap();
        assert_eq!(overrides.reminder_lead_minutes, Some(10080));
    }

    #[test]
    fn event_list_accepts_negative_shift_and_repeated_types() {
        let cli = Cli::try_parse_from([
            "dayplan", "event", "list", "--shift", "-2", "--type", "job", "--type", "free-time",
        ])
        .unwrap();

        match cli.command {
            Command::Event {
                action: EventCommand::List { shift, types, date },
            } => {
                assert_eq!(shift, -2);
                assert_eq!(types, [EventType::Job, EventType::FreeTime]);
                assert!(date.is_none());
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn event_add_requires_type_and_due() {
        assert!(Cli::try_parse_from(["dayplan", "event", "add", "Standup"]).is_err());
        assert!(
            Cli::try_parse_from([
                "dayplan", "event", "add", "Standup", "--type", "nap", "--due", "2024-01-02",
            ])
            .is_err()
        );
    }
}
