//! CSV export of a user's full check-in history.

use rocket::http::{ContentType, Header};
use rocket::response::Responder;
use std::io::Cursor;

use crate::models::LogWithHabit;

const CSV_HEADER: &str = "Date,Habit,Category,Completed";

/// RFC 4180 quoting: every field is wrapped in double quotes and
/// embedded quotes are doubled.
fn csv_field(value: &str) -> String {
    format!("\"{}\"", value.replace('"', "\"\""))
}

/// Renders one row per log, in the order given (callers pass logs
/// sorted by date ascending). Deleted habits never show up because
/// their logs were cascaded away.
pub fn logs_to_csv(logs: &[LogWithHabit]) -> String {
    let mut csv = String::from(CSV_HEADER);
    csv.push('\n');

    for log in logs {
        let completed = if log.completed { "Yes" } else { "No" };
        let row = [
            csv_field(&log.date),
            csv_field(&log.habit.name),
            csv_field(&log.habit.category),
            csv_field(completed),
        ]
        .join(",");
        csv.push_str(&row);
        csv.push('\n');
    }

    csv
}

/// A `text/csv` response with an attachment disposition.
pub struct CsvAttachment {
    pub filename: &'static str,
    pub body: String,
}

impl<'r> Responder<'r, 'static> for CsvAttachment {
    fn respond_to(self, _req: &'r rocket::Request<'_>) -> rocket::response::Result<'static> {
        rocket::Response::build()
            .header(ContentType::CSV)
            .header(Header::new(
                "Content-Disposition",
                format!("attachment; filename=\"{}\"", self.filename),
            ))
            .sized_body(self.body.len(), Cursor::new(self.body))
            .ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Habit;
    use chrono::Utc;

    fn log(name: &str, category: &str, date: &str, completed: bool) -> LogWithHabit {
        let now = Utc::now();
        LogWithHabit {
            id: 0,
            user_id: 1,
            date: date.to_string(),
            completed,
            created_at: now,
            updated_at: now,
            habit: Habit {
                id: 1,
                user_id: 1,
                name: name.to_string(),
                category: category.to_string(),
                color: "#22c55e".to_string(),
                created_at: now,
            },
        }
    }

    #[test]
    fn header_only_for_no_logs() {
        assert_eq!(logs_to_csv(&[]), "Date,Habit,Category,Completed\n");
    }

    #[test]
    fn renders_yes_no_flags() {
        let csv = logs_to_csv(&[
            log("Run", "Health", "2025-01-02", true),
            log("Run", "Health", "2025-01-03", false),
        ]);

        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines[1], "\"2025-01-02\",\"Run\",\"Health\",\"Yes\"");
        assert_eq!(lines[2], "\"2025-01-03\",\"Run\",\"Health\",\"No\"");
    }

    #[test]
    fn escapes_embedded_quotes_and_commas() {
        let csv = logs_to_csv(&[log(
            "She said \"hi\", then left",
            "General",
            "2025-01-02",
            true,
        )]);

        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(
            lines[1],
            "\"2025-01-02\",\"She said \"\"hi\"\", then left\",\"General\",\"Yes\""
        );
    }
}
