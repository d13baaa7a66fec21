use chrono::{DateTime, Utc};
use classflow_core::model::timestamp::format_iso8601;
use classflow_core::{Room, SubTaskKind};
use serde_json::json;

pub(crate) fn room(room: &Room, as_json: bool, now: DateTime<Utc>) -> Result<(), String> {
    if as_json {
        return print_json(&room);
    }

    println!("{} ({})", room.title(), room.id());
    if !room.description().is_empty() {
        println!("  {}", room.description());
    }
    println!(
        "  due {} ({} days remaining)",
        format_iso8601(&room.deadline()),
        room.days_remaining(now)
    );
    println!(
        "  progress {}% ({}/{} completed{})",
        room.progress(),
        room.completed_count(),
        room.total_count(),
        if room.progress_is_aggregated() {
            ""
        } else {
            ", manually set"
        }
    );
    for sub_task in room.sub_tasks() {
        let mark = if sub_task.is_completed() { "x" } else { " " };
        match sub_task.kind() {
            SubTaskKind::Checkbox => {
                println!("  [{mark}] {} ({})", sub_task.title(), sub_task.id());
            }
            SubTaskKind::Text {
                required_characters,
                ..
            } => {
                println!(
                    "  [{mark}] {} ({}) {}/{} characters, {}%",
                    sub_task.title(),
                    sub_task.id(),
                    sub_task.text_length().unwrap_or_default(),
                    required_characters,
                    sub_task.text_fill_percent().unwrap_or_default()
                );
            }
        }
    }
    Ok(())
}

pub(crate) fn listing(rooms: &[Room], as_json: bool, now: DateTime<Utc>) -> Result<(), String> {
    if as_json {
        return print_json(&rooms);
    }
    if rooms.is_empty() {
        println!("no rooms yet");
        return Ok(());
    }
    for room in rooms {
        println!(
            "{}  {:>3}%  {}/{}  {:>4}d  {}",
            room.id(),
            room.progress(),
            room.completed_count(),
            room.total_count(),
            room.days_remaining(now),
            room.title()
        );
    }
    Ok(())
}

pub(crate) fn links(room: &Room, base_url: Option<&str>, as_json: bool) -> Result<(), String> {
    let base = base_url.map(|url| url.trim_end_matches('/')).unwrap_or("");
    let teacher = format!("{base}{}", room.teacher_path());
    let student = format!("{base}{}", room.student_view_path());
    if as_json {
        return print_json(&json!({ "teacher": teacher, "student": student }));
    }
    println!("teacher: {teacher}");
    println!("student: {student}");
    Ok(())
}

fn print_json(value: &impl serde::Serialize) -> Result<(), String> {
    let rendered = serde_json::to_string_pretty(value).map_err(|e| e.to_string())?;
    println!("{rendered}");
    Ok(())
}
