//! `classflow` command-line entry point.
//!
//! # Responsibility
//! - Map subcommands onto `RoomService` use-cases.
//! - Render rooms as text or JSON.

#![forbid(unsafe_code)]

mod commands;
mod render;

use chrono::{DateTime, NaiveDate, Utc};
use clap::Parser;
use classflow_core::db::open_db;
use classflow_core::model::timestamp::parse_iso8601;
use classflow_core::{
    init_logging, CoreConfig, CreateRoomRequest, LogLevel, NewSubTask, RoomId, RoomRepository,
    RoomService, SqliteKeyValueStore, StoredRoomRepository, SubTaskId,
    DEFAULT_REQUIRED_CHARACTERS,
};
use commands::Command;
use log::warn;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "classflow")]
#[command(about = "Classroom rooms and sub-task progress", version)]
#[command(
    after_help = "Environment:\n  CLASSFLOW_DB_PATH    SQLite file holding the rooms\n  CLASSFLOW_LOG_DIR    Absolute directory for rolling logs\n  CLASSFLOW_LOG_LEVEL  trace|debug|info|warn|error"
)]
struct Cli {
    #[arg(long, global = true)]
    db: Option<PathBuf>,
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,
    #[arg(long, global = true, value_parser = parse_log_level)]
    log_level: Option<LogLevel>,
    #[arg(long, global = true, default_value_t = false)]
    json: bool,
    #[command(subcommand)]
    command: Command,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("error: {message}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), String> {
    let config = CoreConfig::from_env()
        .map_err(|e| e.to_string())?
        .with_overrides(cli.db, cli.log_dir, cli.log_level);
    if let Some(log_dir) = &config.log_dir {
        // Logging is best effort; room operations still run without it.
        if let Err(err) = init_logging(config.log_level, log_dir) {
            eprintln!("warning: logging disabled: {err}");
        }
    }

    let conn = open_db(&config.db_path).map_err(|e| {
        format!(
            "failed to open room database `{}`: {e}",
            config.db_path.display()
        )
    })?;
    let service = RoomService::new(StoredRoomRepository::new(SqliteKeyValueStore::new(&conn)));

    execute(&service, cli.command, cli.json)
}

fn execute<R: RoomRepository>(
    service: &RoomService<R>,
    command: Command,
    json: bool,
) -> Result<(), String> {
    match command {
        Command::Create {
            title,
            description,
            deadline,
            tasks,
        } => {
            let deadline = deadline.as_deref().map(parse_deadline).transpose()?;
            let sub_tasks = tasks
                .iter()
                .map(String::as_str)
                .map(parse_new_sub_task)
                .collect::<Result<Vec<_>, _>>()?;
            let room = service
                .create_room(CreateRoomRequest {
                    title,
                    description,
                    deadline,
                    sub_tasks,
                })
                .map_err(|e| e.to_string())?;
            render::room(&room, json, Utc::now())
        }
        Command::List => {
            let rooms = service.list_rooms().map_err(|e| e.to_string())?;
            render::listing(&rooms, json, Utc::now())
        }
        Command::Show { room_id } => {
            match service
                .get_room(&RoomId::from(room_id))
                .map_err(|e| e.to_string())?
            {
                Some(room) => render::room(&room, json, Utc::now()),
                None => {
                    let rooms = service.list_rooms().map_err(|e| e.to_string())?;
                    render::listing(&rooms, json, Utc::now())
                }
            }
        }
        Command::Check {
            room_id,
            task_id,
            uncheck,
        } => {
            let room = service
                .set_sub_task_checked(
                    &RoomId::from(room_id),
                    &SubTaskId::from(task_id),
                    !uncheck,
                )
                .map_err(|e| e.to_string())?;
            render::room(&room, json, Utc::now())
        }
        Command::Write {
            room_id,
            task_id,
            text,
        } => {
            let room = service
                .update_sub_task_text(&RoomId::from(room_id), &SubTaskId::from(task_id), text)
                .map_err(|e| e.to_string())?;
            render::room(&room, json, Utc::now())
        }
        Command::AddTask { room_id, task } => {
            let sub_task = parse_new_sub_task(&task)?;
            let room = service
                .add_sub_task(&RoomId::from(room_id), sub_task)
                .map_err(|e| e.to_string())?;
            render::room(&room, json, Utc::now())
        }
        Command::RemoveTask { room_id, task_id } => {
            let room = service
                .remove_sub_task(&RoomId::from(room_id), &SubTaskId::from(task_id))
                .map_err(|e| e.to_string())?;
            render::room(&room, json, Utc::now())
        }
        Command::SetProgress { room_id, progress } => {
            let room = service
                .override_progress(&RoomId::from(room_id), progress)
                .map_err(|e| e.to_string())?;
            render::room(&room, json, Utc::now())
        }
        Command::Export { room_id, out_dir } => {
            let export = service
                .export_room(&RoomId::from(room_id))
                .map_err(|e| e.to_string())?;
            let path = export_path(&out_dir, &export.file_name)?;
            fs::write(&path, export.contents)
                .map_err(|e| format!("failed to write `{}`: {e}", path.display()))?;
            println!("exported {}", path.display());
            Ok(())
        }
        Command::Import { path } => {
            let payload = fs::read_to_string(&path)
                .map_err(|e| format!("failed to read `{}`: {e}", path.display()))?;
            let imported = service.import_room(&payload).map_err(|e| {
                warn!("event=cli_import module=cli status=error");
                format!("import failed: {e}")
            })?;
            println!(
                "\"{}\" {} ({})",
                imported.room.title(),
                imported.outcome.as_str(),
                imported.room.id()
            );
            Ok(())
        }
        Command::Link { room_id, base_url } => {
            let room_id = RoomId::from(room_id);
            let room = service
                .get_room(&room_id)
                .map_err(|e| e.to_string())?
                .ok_or_else(|| format!("room not found: {room_id}"))?;
            render::links(&room, base_url.as_deref(), json)
        }
    }
}

/// Joins only the final component of `file_name`, keeping the write inside
/// `out_dir`.
fn export_path(out_dir: &Path, file_name: &str) -> Result<PathBuf, String> {
    Path::new(file_name)
        .file_name()
        .map(|name| out_dir.join(name))
        .ok_or_else(|| format!("invalid export file name `{file_name}`"))
}

fn parse_log_level(raw: &str) -> Result<LogLevel, String> {
    raw.parse().map_err(|e: classflow_core::LoggingError| e.to_string())
}

/// Accepts RFC 3339 or a bare calendar date at midnight UTC.
fn parse_deadline(raw: &str) -> Result<DateTime<Utc>, String> {
    if let Ok(date) = NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d") {
        return date
            .and_hms_opt(0, 0, 0)
            .map(|midnight| midnight.and_utc())
            .ok_or_else(|| format!("invalid deadline `{raw}`"));
    }
    parse_iso8601(raw)
}

/// Parses `checkbox:TITLE`, `text:TITLE` or `text@CHARS:TITLE`.
fn parse_new_sub_task(raw: &str) -> Result<NewSubTask, String> {
    let (kind, title) = raw
        .split_once(':')
        .ok_or_else(|| format!("sub-task `{raw}` must look like KIND:TITLE"))?;
    match kind.trim() {
        "checkbox" => Ok(NewSubTask::checkbox(title)),
        "text" => Ok(NewSubTask::text(title, DEFAULT_REQUIRED_CHARACTERS)),
        other => match other.strip_prefix("text@") {
            Some(chars) => {
                let required = chars
                    .parse::<u32>()
                    .map_err(|e| format!("invalid character requirement `{chars}`: {e}"))?;
                Ok(NewSubTask::text(title, required))
            }
            None => Err(format!(
                "unknown sub-task kind `{other}`; expected checkbox|text|text@CHARS"
            )),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::{export_path, parse_deadline, parse_new_sub_task, Cli};
    use clap::CommandFactory;
    use classflow_core::{export_file_name, NewSubTask};
    use std::path::Path;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn sub_task_specs_parse() {
        assert_eq!(
            parse_new_sub_task("checkbox:Pick topic").unwrap(),
            NewSubTask::checkbox("Pick topic")
        );
        assert_eq!(
            parse_new_sub_task("text:Essay: part one").unwrap(),
            NewSubTask::text("Essay: part one", 100)
        );
        assert_eq!(
            parse_new_sub_task("text@250:Report").unwrap(),
            NewSubTask::text("Report", 250)
        );
        assert!(parse_new_sub_task("slider:Nope").is_err());
        assert!(parse_new_sub_task("no separator").is_err());
    }

    #[test]
    fn export_stays_inside_out_dir() {
        let out_dir = Path::new("/exports");
        let path = export_path(out_dir, &export_file_name("../../tmp/Unit 3/4 Review")).unwrap();
        assert_eq!(path.parent(), Some(out_dir));

        let path = export_path(out_dir, "../escape-room.json").unwrap();
        assert_eq!(path, Path::new("/exports/escape-room.json"));
        assert!(export_path(out_dir, "..").is_err());
    }

    #[test]
    fn deadlines_accept_dates_and_timestamps() {
        assert_eq!(
            parse_deadline("2025-12-24").unwrap().to_rfc3339(),
            "2025-12-24T00:00:00+00:00"
        );
        assert_eq!(
            parse_deadline("2025-12-24T15:00:00+01:00")
                .unwrap()
                .to_rfc3339(),
            "2025-12-24T14:00:00+00:00"
        );
        assert!(parse_deadline("tomorrow").is_err());
    }
}
