use clap::Subcommand;
use std::path::PathBuf;

#[derive(Subcommand)]
pub(crate) enum Command {
    /// Create a room.
    Create {
        #[arg(long)]
        title: String,
        #[arg(long, default_value = "")]
        description: String,
        /// RFC 3339 timestamp or `YYYY-MM-DD` (midnight UTC).
        #[arg(long)]
        deadline: Option<String>,
        /// `checkbox:TITLE`, `text:TITLE` or `text@CHARS:TITLE`; repeatable.
        #[arg(long = "task")]
        tasks: Vec<String>,
    },
    /// List rooms with progress and days remaining.
    List,
    /// Show one room; falls back to the listing when the id is unknown.
    Show { room_id: String },
    /// Mark a checkbox sub-task complete (or incomplete with --uncheck).
    Check {
        room_id: String,
        task_id: String,
        #[arg(long, default_value_t = false)]
        uncheck: bool,
    },
    /// Replace the text of a text sub-task.
    Write {
        room_id: String,
        task_id: String,
        text: String,
    },
    AddTask {
        room_id: String,
        /// Same format as `create --task`.
        task: String,
    },
    RemoveTask {
        room_id: String,
        task_id: String,
    },
    /// Override progress until the next sub-task change.
    SetProgress {
        room_id: String,
        #[arg(value_parser = clap::value_parser!(u8).range(0..=100))]
        progress: u8,
    },
    Export {
        room_id: String,
        #[arg(long, default_value = ".")]
        out_dir: PathBuf,
    },
    Import { path: PathBuf },
    /// Print teacher and student links.
    Link {
        room_id: String,
        #[arg(long)]
        base_url: Option<String>,
    },
}
