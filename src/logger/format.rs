//! Request log format module
//!
//! One line per request, either human readable (`pretty`) or structured
//! (`json`).

use chrono::{DateTime, Local};
use owo_colors::OwoColorize;
use serde::{Deserialize, Serialize};

/// Output format of request lines
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl LogFormat {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pretty => "pretty",
            Self::Json => "json",
        }
    }
}

/// Everything logged about one request
#[derive(Debug, Clone, Serialize)]
pub struct RequestLogEntry {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time: Option<DateTime<Local>>,
    pub status: u16,
    pub method: String,
    /// Percent-decoded request target
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remote_addr: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
    pub elapsed_ms: f64,
}

impl RequestLogEntry {
    pub fn format(&self, format: LogFormat, colored: bool) -> String {
        match format {
            LogFormat::Pretty => self.format_pretty(colored),
            LogFormat::Json => self.format_json(),
        }
    }

    /// `[HH:MM:SS] (200) 127.0.0.1 GET /path "agent" 0.412ms`
    fn format_pretty(&self, colored: bool) -> String {
        let mut line = String::new();

        if let Some(time) = self.time {
            let stamp = time.format("%H:%M:%S").to_string();
            if colored {
                line.push_str(&format!("[{}] ", stamp.bright_black()));
            } else {
                line.push_str(&format!("[{stamp}] "));
            }
        }

        let status = format!("({})", self.status);
        if colored {
            line.push_str(&color_status(self.status, &status));
        } else {
            line.push_str(&status);
        }

        if let Some(addr) = &self.remote_addr {
            line.push(' ');
            if colored {
                line.push_str(&addr.yellow().to_string());
            } else {
                line.push_str(addr);
            }
        }

        line.push_str(&format!(" {} {}", self.method, self.url));

        if let Some(agent) = &self.user_agent {
            let agent = format!(" \"{agent}\"");
            if colored {
                line.push_str(&agent.blue().to_string());
            } else {
                line.push_str(&agent);
            }
        }

        let elapsed = format!("{:.3}ms", self.elapsed_ms);
        line.push(' ');
        if colored {
            line.push_str(&elapsed.bright_black().to_string());
        } else {
            line.push_str(&elapsed);
        }

        line
    }

    fn format_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|e| {
            format!("{{\"error\":\"failed to serialize log entry: {e}\"}}")
        })
    }
}

/// 5xx cyan, 4xx red, 2xx green, anything else yellow
fn color_status(status: u16, text: &str) -> String {
    match status {
        500..=u16::MAX => text.cyan().to_string(),
        400..=499 => text.red().to_string(),
        200..=299 => text.green().to_string(),
        _ => text.yellow().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn entry() -> RequestLogEntry {
        RequestLogEntry {
            time: None,
            status: 404,
            method: "GET".to_string(),
            url: "/missing file".to_string(),
            remote_addr: None,
            user_agent: None,
            elapsed_ms: 1.23456,
        }
    }

    #[test]
    fn test_pretty_minimal() {
        assert_eq!(
            entry().format(LogFormat::Pretty, false),
            "(404) GET /missing file 1.235ms"
        );
    }

    #[test]
    fn test_pretty_full() {
        let time = Local
            .with_ymd_and_hms(2024, 1, 2, 13, 4, 5)
            .single()
            .expect("time");
        let entry = RequestLogEntry {
            time: Some(time),
            remote_addr: Some("10.0.0.1".to_string()),
            user_agent: Some("curl/8.0".to_string()),
            status: 200,
            ..entry()
        };
        assert_eq!(
            entry.format(LogFormat::Pretty, false),
            "[13:04:05] (200) 10.0.0.1 GET /missing file \"curl/8.0\" 1.235ms"
        );
    }

    #[test]
    fn test_colored_status() {
        assert!(color_status(500, "x").contains("\u{1b}[36m"));
        assert!(color_status(404, "x").contains("\u{1b}[31m"));
        assert!(color_status(200, "x").contains("\u{1b}[32m"));
        assert!(color_status(302, "x").contains("\u{1b}[33m"));
    }

    #[test]
    fn test_json() {
        let line = entry().format(LogFormat::Json, false);
        let value: serde_json::Value = serde_json::from_str(&line).expect("json");
        assert_eq!(value["status"], 404);
        assert_eq!(value["method"], "GET");
        assert_eq!(value["url"], "/missing file");
        assert!(value.get("time").is_none());
        assert!(value.get("remote_addr").is_none());
    }
}
