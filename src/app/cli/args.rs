//! Command line arguments

use clap::{ArgAction, Parser};
use std::path::PathBuf;

/// Message to publish after the listeners are running, as `QUEUE=BODY`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendSpec {
    pub queue: String,
    pub body: String,
}

fn parse_send(value: &str) -> Result<SendSpec, String> {
    match value.split_once('=') {
        Some((queue, body)) if !queue.trim().is_empty() => Ok(SendSpec {
            queue: queue.trim().to_string(),
            body: body.to_string(),
        }),
        _ => Err(format!("expected QUEUE=BODY, got '{}'", value)),
    }
}

#[derive(Parser, Debug, Clone)]
#[command(name = "rabbit-listeners")]
#[command(about = "Host for declarative message listeners")]
#[command(version)]
pub struct Args {
    /// Configuration file path
    #[arg(short = 'c', long = "config-file", value_name = "FILE")]
    pub config_file: Option<PathBuf>,

    /// Log level
    #[arg(short = 'l', long = "log-level", value_name = "LEVEL", value_parser = ["trace", "debug", "info", "warn", "error", "off"])]
    pub log_level: Option<String>,

    /// Log output format
    #[arg(short = 'o', long = "log-format", value_name = "FORMAT", value_parser = ["text", "ext", "json"])]
    pub log_format: Option<String>,

    /// Log file path (use 'none' to disable file logging)
    #[arg(short = 'f', long = "log-file", value_name = "FILE")]
    pub log_file: Option<PathBuf>,

    /// Disable colored output
    #[arg(long = "no-color", action = ArgAction::SetTrue)]
    pub no_color: bool,

    /// Print the endpoints that would be registered and exit
    #[arg(long = "list", action = ArgAction::SetTrue)]
    pub list: bool,

    /// Publish a message once the listeners are running (repeatable)
    #[arg(short = 's', long = "send", value_name = "QUEUE=BODY", value_parser = parse_send, action = ArgAction::Append)]
    pub send: Vec<SendSpec>,
}

impl Args {
    /// Log file to use, with `none` and `-` meaning no file
    pub fn effective_log_file(&self, configured: Option<&PathBuf>) -> Option<PathBuf> {
        match self.log_file.as_ref().or(configured) {
            Some(path) if path.as_os_str() == "-" || path.as_os_str().eq_ignore_ascii_case("none") => {
                None
            }
            other => other.cloned(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_flags() {
        let args = Args::try_parse_from([
            "rabbit-listeners",
            "--config-file",
            "listeners.toml",
            "--log-level",
            "debug",
            "--log-format",
            "ext",
            "--no-color",
            "--list",
        ])
        .unwrap();

        assert_eq!(args.config_file, Some(PathBuf::from("listeners.toml")));
        assert_eq!(args.log_level.as_deref(), Some("debug"));
        assert_eq!(args.log_format.as_deref(), Some("ext"));
        assert!(args.no_color);
        assert!(args.list);
        assert!(args.send.is_empty());
    }

    #[test]
    fn test_send_values() {
        let args = Args::try_parse_from([
            "rabbit-listeners",
            "-s",
            "echo=hello world",
            "--send",
            "orders=a=b",
        ])
        .unwrap();

        assert_eq!(
            args.send,
            vec![
                SendSpec {
                    queue: "echo".to_string(),
                    body: "hello world".to_string()
                },
                SendSpec {
                    queue: "orders".to_string(),
                    body: "a=b".to_string()
                },
            ]
        );
        assert!(Args::try_parse_from(["rabbit-listeners", "--send", "nobody"]).is_err());
        assert!(Args::try_parse_from(["rabbit-listeners", "--send", "=body"]).is_err());
    }

    #[test]
    fn test_invalid_log_format_is_rejected() {
        assert!(Args::try_parse_from(["rabbit-listeners", "--log-format", "xml"]).is_err());
    }

    #[test]
    fn test_log_file_magic_values() {
        let args = Args::try_parse_from(["rabbit-listeners", "--log-file", "none"]).unwrap();
        assert_eq!(args.effective_log_file(Some(&PathBuf::from("x.log"))), None);

        let args = Args::try_parse_from(["rabbit-listeners"]).unwrap();
        assert_eq!(
            args.effective_log_file(Some(&PathBuf::from("x.log"))),
            Some(PathBuf::from("x.log"))
        );
        assert_eq!(args.effective_log_file(None), None);
    }
}
