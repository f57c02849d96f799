use clap::{CommandFactory, Parser};
use dayplan_cli::cli::{Cli, Command, EventCommand, TodoCommand, collect_overrides};
use dayplan_cli::logging::init_tracing;
use dayplan_core::config::{Config, load_config_with_fallback, merge_overrides};
use dayplan_core::error::AppError;
use dayplan_core::filter::{DayView, TypeFilter};
use dayplan_core::gesture::step_day;
use dayplan_core::model::{Event, EventDraft, Todo, TodoDraft};
use dayplan_core::notify::notifier_from_env;
use dayplan_core::planner_api::{self, Entry, EventEdit, Reminders, TodoEdit};
use dayplan_core::reminder::{NoopScheduler, ReminderScheduler, ThreadScheduler};
use dayplan_core::timefmt::{format_date, local_offset, now_local, parse_date, parse_datetime};
use serde::Serialize;
use std::io::{self, BufRead};
use tabled::settings::Style;
use tabled::{Table, Tabled};
use time::macros::format_description;
use time::{Duration, OffsetDateTime, UtcOffset};

struct Session<'a> {
    config: Config,
    offset: UtcOffset,
    scheduler: &'a dyn ReminderScheduler,
    json: bool,
}

impl Session<'_> {
    fn reminders(&self) -> Reminders<'_> {
        Reminders {
            scheduler: self.scheduler,
            lead_minutes: self.config.reminder_lead_minutes,
        }
    }

    fn datetime(&self, raw: &str) -> Result<OffsetDateTime, AppError> {
        parse_datetime(raw, self.offset)
    }

    fn optional_datetime(&self, raw: Option<&str>) -> Result<Option<OffsetDateTime>, AppError> {
        raw.map(|value| self.datetime(value)).transpose()
    }

    fn display_time(&self, value: OffsetDateTime) -> String {
        value
            .checked_to_offset(self.offset)
            .unwrap_or(value)
            .format(format_description!("[year]-[month]-[day] [hour]:[minute]"))
            .unwrap_or_else(|_| value.to_string())
    }
}

fn status_label(completed: bool) -> &'static str {
    if completed { "done" } else { "open" }
}

#[derive(Tabled)]
struct TodoRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Title")]
    title: String,
    #[tabled(rename = "Status")]
    status: &'static str,
    #[tabled(rename = "Due")]
    due: String,
    #[tabled(rename = "Reminder")]
    reminder: String,
}

#[derive(Tabled)]
struct EventRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Time")]
    time: String,
    #[tabled(rename = "Type")]
    kind: String,
    #[tabled(rename = "Title")]
    title: String,
    #[tabled(rename = "Status")]
    status: &'static str,
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<(), AppError> {
    let rendered =
        serde_json::to_string(value).map_err(|err| AppError::invalid_data(err.to_string()))?;
    println!("{rendered}");
    Ok(())
}

fn print_todos_plain(session: &Session<'_>, todos: &[Todo]) {
    if todos.is_empty() {
        println!("{}", session.config.palette().mutedize("No todos."));
        return;
    }

    let rows = todos.iter().map(|todo| TodoRow {
        id: todo.id.clone(),
        title: todo.title.clone(),
        status: status_label(todo.completed),
        due: todo
            .due_date
            .map(|due| session.display_time(due))
            .unwrap_or_else(|| "-".to_string()),
        reminder: todo
            .reminder_time
            .map(|at| session.display_time(at))
            .unwrap_or_else(|| "-".to_string()),
    });
    let mut table = Table::new(rows);
    table.with(Style::psql());
    println!("{table}");
}

fn print_day_plain(session: &Session<'_>, view: &DayView) -> Result<(), AppError> {
    let palette = session.config.palette();
    let header = format!(
        "{} {} - {} remaining",
        view.day.weekday(),
        format_date(view.day)?,
        view.remaining
    );
    println!("{}", palette.accentize(&header));

    if view.events.is_empty() {
        println!("{}", palette.mutedize("No events."));
        return Ok(());
    }

    let rows = view.events.iter().map(|event| EventRow {
        id: event.id.clone(),
        time: session.display_time(event.due_date),
        kind: event.kind.to_string(),
        title: event.title.clone(),
        status: status_label(event.completed),
    });
    let mut table = Table::new(rows);
    table.with(Style::psql());
    println!("{table}");
    Ok(())
}

fn print_todo_detail(session: &Session<'_>, todo: &Todo) {
    println!("{} ({})", todo.title, todo.id);
    println!("  status:   {}", status_label(todo.completed));
    if let Some(due) = todo.due_date {
        println!("  due:      {}", session.display_time(due));
    }
    if let Some(at) = todo.reminder_time {
        println!("  reminder: {}", session.display_time(at));
    }
}

fn print_event_detail(session: &Session<'_>, event: &Event) {
    println!("{} ({})", event.title, event.id);
    println!("  type:     {}", event.kind);
    println!("  due:      {}", session.display_time(event.due_date));
    println!("  status:   {}", status_label(event.completed));
    if !event.description.is_empty() {
        println!("  notes:    {}", event.description);
    }
}

fn report_todo(session: &Session<'_>, verb: &str, todo: &Todo) -> Result<(), AppError> {
    if session.json {
        print_json(todo)
    } else {
        println!("{verb} todo: {} ({})", todo.title, todo.id);
        Ok(())
    }
}

fn report_event(session: &Session<'_>, verb: &str, event: &Event) -> Result<(), AppError> {
    if session.json {
        print_json(event)
    } else {
        println!(
            "{verb} event: {} ({}) at {}",
            event.title,
            event.id,
            session.display_time(event.due_date)
        );
        Ok(())
    }
}

fn normalize_parse_error(err: clap::Error) -> AppError {
    let rendered = err.to_string();
    let first_line = rendered.lines().next().unwrap_or("invalid command").trim();
    let message = first_line
        .strip_prefix("error: ")
        .unwrap_or(first_line)
        .to_string();
    AppError::invalid_input(message)
}

fn split_command_line(line: &str) -> Result<Vec<String>, AppError> {
    let mut args = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut quoted = false;
    let mut escape = false;

    for ch in line.chars() {
        if escape {
            if ch != '"' && ch != '\\' {
                current.push('\\');
            }
            current.push(ch);
            escape = false;
            continue;
        }

        if in_quotes && ch == '\\' {
            escape = true;
            continue;
        }

        if ch == '"' {
            in_quotes = !in_quotes;
            quoted = true;
            continue;
        }

        if ch.is_whitespace() && !in_quotes {
            if !current.is_empty() || quoted {
                args.push(std::mem::take(&mut current));
                quoted = false;
            }
            continue;
        }

        current.push(ch);
    }

    if in_quotes {
        return Err(AppError::invalid_input("unterminated quote in command"));
    }

    if !current.is_empty() || quoted {
        args.push(current);
    }

    Ok(args)
}

fn print_help() {
    let mut cmd = Cli::command();
    let help = cmd.render_help();
    println!("{help}");
}

fn require_title(title: Option<String>) -> Result<String, AppError> {
    match title {
        Some(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(AppError::invalid_input("title is required")),
    }
}

fn run_todo(session: &Session<'_>, action: TodoCommand) -> Result<(), AppError> {
    match action {
        TodoCommand::Add { title, due, remind } => {
            let mut draft = TodoDraft::new(require_title(title)?);
            draft.due_date = session.optional_datetime(due.as_deref())?;
            draft.reminder_time = session.optional_datetime(remind.as_deref())?;
            let todo = planner_api::add_todo(draft, session.reminders())?;
            report_todo(session, "Added", &todo)
        }
        TodoCommand::Toggle { id } => {
            let todo = planner_api::toggle_todo(&id, session.reminders())?;
            let verb = if todo.completed { "Completed" } else { "Reopened" };
            report_todo(session, verb, &todo)
        }
        TodoCommand::Edit {
            id,
            title,
            due,
            clear_due,
            remind,
            clear_remind,
        } => {
            let edit = TodoEdit {
                title,
                due_date: if clear_due {
                    Some(None)
                } else {
                    session.optional_datetime(due.as_deref())?.map(Some)
                },
                reminder_time: if clear_remind {
                    Some(None)
                } else {
                    session.optional_datetime(remind.as_deref())?.map(Some)
                },
            };
            let todo = planner_api::edit_todo(&id, edit, session.reminders())?;
            report_todo(session, "Updated", &todo)
        }
        TodoCommand::Delete { id } => {
            let todo = planner_api::delete_todo(&id, session.reminders())?;
            report_todo(session, "Deleted", &todo)
        }
        TodoCommand::Remind { id, datetime } => {
            let at = session.datetime(&datetime)?;
            let todo = planner_api::set_todo_reminder(&id, at, session.reminders())?;
            if session.json {
                print_json(&todo)
            } else {
                println!(
                    "Reminder set: {} ({}) at {}",
                    todo.title,
                    todo.id,
                    session.display_time(at)
                );
                Ok(())
            }
        }
        TodoCommand::List => {
            let todos = planner_api::list_todos()?;
            if session.json {
                print_json(&todos)
            } else {
                print_todos_plain(session, &todos);
                Ok(())
            }
        }
    }
}

fn run_event(session: &Session<'_>, action: EventCommand) -> Result<(), AppError> {
    match action {
        EventCommand::Add {
            title,
            kind,
            due,
            description,
        } => {
            let draft = EventDraft::new(require_title(title)?, kind, session.datetime(&due)?)
                .describe(description);
            let event = planner_api::add_event(draft, session.reminders())?;
            report_event(session, "Added", &event)
        }
        EventCommand::Toggle { id } => {
            let event = planner_api::toggle_event(&id, session.reminders())?;
            let verb = if event.completed { "Completed" } else { "Reopened" };
            report_event(session, verb, &event)
        }
        EventCommand::Edit {
            id,
            title,
            description,
            kind,
            due,
        } => {
            let edit = EventEdit {
                title,
                description,
                kind,
                due_date: session.optional_datetime(due.as_deref())?,
            };
            let event = planner_api::edit_event(&id, edit, session.reminders())?;
            report_event(session, "Updated", &event)
        }
        EventCommand::Delete { id } => {
            let event = planner_api::delete_event(&id, session.reminders())?;
            report_event(session, "Deleted", &event)
        }
        EventCommand::List { date, shift, types } => {
            let anchor = match date.as_deref() {
                Some(raw) => parse_date(raw)?,
                None => now_local().date(),
            };
            let day = step_day(anchor, shift);
            let filter = if types.is_empty() {
                session.config.type_filter()
            } else {
                TypeFilter::only(types)
            };

            let view = planner_api::day_view(day, session.offset, &filter)?;
            if session.json {
                print_json(&serde_json::json!({
                    "date": format_date(view.day)?,
                    "types": filter.iter().map(|kind| kind.as_str()).collect::<Vec<_>>(),
                    "remaining": view.remaining,
                    "events": view.events,
                }))
            } else {
                print_day_plain(session, &view)
            }
        }
    }
}

fn run_show(session: &Session<'_>, id: &str) -> Result<(), AppError> {
    match planner_api::find_entity(id)? {
        Entry::Todo(todo) => {
            if session.json {
                print_json(&serde_json::json!({ "kind": "todo", "todo": todo }))
            } else {
                print_todo_detail(session, &todo);
                Ok(())
            }
        }
        Entry::Event(event) => {
            if session.json {
                print_json(&serde_json::json!({ "kind": "event", "event": event }))
            } else {
                print_event_detail(session, &event);
                Ok(())
            }
        }
    }
}

fn run_notify(session: &Session<'_>, lookback_minutes: u32) -> Result<(), AppError> {
    let notifier = notifier_from_env()?;
    let now = OffsetDateTime::now_utc();
    let since = now - Duration::minutes(i64::from(lookback_minutes));
    let outcome = planner_api::notify_due(
        notifier.as_ref(),
        since,
        now,
        session.config.reminder_lead_minutes,
    )?;

    if session.json {
        let delivered: Vec<&str> = outcome
            .delivered
            .iter()
            .map(|reminder| reminder.entity_id.as_str())
            .collect();
        let failures: Vec<serde_json::Value> = outcome
            .failures
            .iter()
            .map(|failure| {
                serde_json::json!({
                    "id": failure.entity_id,
                    "error": failure.error.to_string(),
                })
            })
            .collect();
        print_json(&serde_json::json!({ "delivered": delivered, "failures": failures }))?;
    } else {
        for reminder in &outcome.delivered {
            println!("Reminded: {} ({})", reminder.title, reminder.entity_id);
        }
        if outcome.delivered.is_empty() && outcome.failures.is_empty() {
            println!("No reminders due.");
        }
    }

    if outcome.failures.is_empty() {
        return Ok(());
    }
    for failure in &outcome.failures {
        eprintln!("ERROR: {} ({})", failure.error, failure.entity_id);
    }
    Err(AppError::io(format!(
        "{} reminder(s) could not be delivered",
        outcome.failures.len()
    )))
}

fn run_watch(session: &Session<'_>) -> Result<(), AppError> {
    let upcoming = planner_api::upcoming(
        OffsetDateTime::now_utc(),
        session.config.reminder_lead_minutes,
    )?;
    if upcoming.is_empty() {
        println!("No upcoming reminders.");
        return Ok(());
    }

    let scheduler = ThreadScheduler::new(notifier_from_env()?);
    for reminder in upcoming {
        println!(
            "Waiting for {} at {}",
            reminder.entity_id,
            session.display_time(reminder.fire_at)
        );
        scheduler.schedule(reminder)?;
    }
    scheduler.wait();
    Ok(())
}

fn run_command(cli: Cli, base: &Config, scheduler: &dyn ReminderScheduler) -> Result<(), AppError> {
    let overrides = collect_overrides(&cli.config_override).map_err(AppError::invalid_input)?;
    let session = Session {
        config: merge_overrides(base, &overrides),
        offset: local_offset(),
        scheduler,
        json: cli.json,
    };

    match cli.command {
        Command::Todo { action } => run_todo(&session, action),
        Command::Event { action } => run_event(&session, action),
        Command::Show { id } => run_show(&session, &id),
        Command::Notify { lookback_minutes } => run_notify(&session, lookback_minutes),
        Command::Watch => run_watch(&session),
    }
}

fn run_interactive(base: &Config) -> Result<(), AppError> {
    // Reminders scheduled here fire while the shell stays open.
    let scheduler = ThreadScheduler::new(notifier_from_env()?);
    let mut input = String::new();
    let stdin = io::stdin();
    let mut stdin_lock = stdin.lock();

    loop {
        input.clear();
        let bytes = stdin_lock.read_line(&mut input)?;

        if bytes == 0 {
            break;
        }

        let line = input.trim();
        if line.is_empty() {
            continue;
        }

        if line.eq_ignore_ascii_case("exit") || line.eq_ignore_ascii_case("quit") {
            break;
        }

        if line == "help" || line == "?" {
            print_help();
            continue;
        }

        let args = match split_command_line(line) {
            Ok(args) => args,
            Err(err) => {
                eprintln!("ERROR: {}", err);
                continue;
            }
        };

        if args.is_empty() {
            continue;
        }

        let mut argv = Vec::with_capacity(args.len() + 1);
        argv.push("dayplan".to_string());
        argv.extend(args);

        let cli = match Cli::try_parse_from(argv) {
            Ok(cli) => cli,
            Err(err) if !err.use_stderr() => {
                println!("{err}");
                continue;
            }
            Err(err) => {
                eprintln!("ERROR: {}", normalize_parse_error(err));
                continue;
            }
        };

        if let Err(err) = run_command(cli, base, &scheduler) {
            eprintln!("ERROR: {}", err);
        }
    }

    scheduler.cancel_all()?;
    Ok(())
}

fn load_base_config() -> Config {
    let loaded = load_config_with_fallback();
    if let Some(err) = loaded.error {
        tracing::warn!(error = %err, "using default configuration");
    }
    loaded.config
}

fn main() {
    init_tracing();
    let base = load_base_config();

    let mut args = std::env::args_os();
    args.next();
    if args.next().is_none() {
        if let Err(err) = run_interactive(&base) {
            eprintln!("ERROR: {}", err);
            std::process::exit(1);
        }
        return;
    }

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) if !err.use_stderr() => {
            let _ = err.print();
            return;
        }
        Err(err) => {
            eprintln!("ERROR: {}", normalize_parse_error(err));
            std::process::exit(1);
        }
    };

    if let Err(err) = run_command(cli, &base, &NoopScheduler) {
        eprintln!("ERROR: {}", err);
        std::process::exit(1);
    }
}
