//! Interaction Log - per-day record of submitted code and results
//!
//! Appends to `<dir>/log_YYYY-MM-DD.txt`. A failed write is logged and
//! otherwise ignored; it never fails the command.

use chrono::{DateTime, Local, NaiveDate};
use hostbridge_server::ResponseBody;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::PathBuf;
use tracing::warn;

pub struct InteractionLog {
    dir: PathBuf,
}

impl InteractionLog {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Log file for a given day
    pub fn path_for(&self, date: NaiveDate) -> PathBuf {
        self.dir.join(format!("log_{}.txt", date.format("%Y-%m-%d")))
    }

    /// Append one request/response pair
    pub fn record(&self, code: &str, response: &ResponseBody) {
        if let Err(e) = self.append(Local::now(), code, response) {
            warn!(dir = %self.dir.display(), error = %e, "Failed to write interaction log");
        }
    }

    fn append(&self, now: DateTime<Local>, code: &str, response: &ResponseBody) -> std::io::Result<()> {
        fs::create_dir_all(&self.dir)?;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.path_for(now.date_naive()))?;
        file.write_all(format_entry(now, code, response).as_bytes())
    }
}

fn format_entry(now: DateTime<Local>, code: &str, response: &ResponseBody) -> String {
    let rule = "-".repeat(20);
    let mut entry = format!(
        "[{}] Interaction\n{rule} REQUEST {rule}\n{code}\n{rule} RESPONSE {rule}\n",
        now.format("%H:%M:%S")
    );
    if response.is_success() {
        entry.push_str("Status: success\n");
        match (&response.output, &response.image) {
            (Some(output), _) => entry.push_str(&format!("Output: {output}\n")),
            (None, Some(image)) => entry.push_str(&format!("Image: {} base64 chars\n", image.len())),
            (None, None) => {}
        }
    } else {
        entry.push_str("Status: error\n");
        entry.push_str(&format!(
            "Message: {}\n",
            response.message.as_deref().unwrap_or_default()
        ));
    }
    entry.push_str(&"=".repeat(50));
    entry.push_str("\n\n");
    entry
}
