//! Command-line configuration.

use clap::Parser;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

const BYTES_PER_MB: usize = 1024 * 1024;

#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("Invalid argument '{arg_name}': {reason}")]
    InvalidArgument { arg_name: String, reason: String },
}

/// Command-line arguments for the dashboard server.
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None, next_line_help = true)]
pub struct Arguments {
    /// Address to bind the web server to.
    #[arg(long, default_value = "127.0.0.1")]
    pub host: IpAddr,

    /// Port to listen on.
    #[arg(short, long, default_value_t = 8501)]
    pub port: u16,

    /// Largest accepted upload, in megabytes.
    #[arg(long, value_name = "MB", default_value_t = 200, value_parser = validate_positive)]
    pub max_upload_mb: usize,

    /// Rows shown in the data preview grid.
    #[arg(long, value_name = "ROWS", default_value_t = 1000, value_parser = validate_positive)]
    pub grid_rows: usize,

    /// Idle time after which a session and its report files are discarded.
    #[arg(long, value_name = "SECONDS", default_value_t = 3600, value_parser = validate_positive)]
    pub session_ttl_secs: usize,

    /// Directory for generated report files. [Default: system temp dir]
    #[arg(long, value_name = "DIR")]
    pub report_dir: Option<PathBuf>,
}

impl Arguments {
    pub fn build() -> Arguments {
        Arguments::parse()
    }
}

fn validate_positive(s: &str) -> Result<usize, ConfigError> {
    let invalid = |reason: String| ConfigError::InvalidArgument {
        arg_name: s.to_string(),
        reason,
    };
    let n: usize = s
        .parse()
        .map_err(|e| invalid(format!("not a whole number: {e}")))?;
    if n == 0 {
        return Err(invalid("must be greater than zero".to_string()));
    }
    Ok(n)
}

/// Resolved runtime settings shared with the web layer.
#[derive(Debug, Clone)]
pub struct Config {
    pub addr: SocketAddr,
    pub max_upload_bytes: usize,
    pub grid_rows: usize,
    pub session_ttl: Duration,
    pub reap_interval: Duration,
    pub report_dir: PathBuf,
}

impl Config {
    pub fn from_args(args: &Arguments) -> Result<Self, ConfigError> {
        let report_dir = args.report_dir.clone().unwrap_or_else(std::env::temp_dir);
        if !report_dir.is_dir() {
            return Err(ConfigError::InvalidArgument {
                arg_name: "--report-dir".to_string(),
                reason: format!("'{}' is not a directory", report_dir.display()),
            });
        }

        let session_ttl = Duration::from_secs(args.session_ttl_secs as u64);
        Ok(Self {
            addr: SocketAddr::new(args.host, args.port),
            max_upload_bytes: args.max_upload_mb.saturating_mul(BYTES_PER_MB),
            grid_rows: args.grid_rows,
            session_ttl,
            reap_interval: session_ttl.min(Duration::from_secs(60)),
            report_dir,
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            addr: SocketAddr::from(([127, 0, 0, 1], 8501)),
            max_upload_bytes: 200 * BYTES_PER_MB,
            grid_rows: 1000,
            session_ttl: Duration::from_secs(3600),
            reap_interval: Duration::from_secs(60),
            report_dir: std::env::temp_dir(),
        }
    }
}

#[cfg(test)]
mod tests_args {
    use super::*;

    #[test]
    fn defaults() {
        let args = Arguments::parse_from(["data-insight"]);
        let config = Config::from_args(&args).unwrap();
        assert_eq!(config.addr, SocketAddr::from(([127, 0, 0, 1], 8501)));
        assert_eq!(config.max_upload_bytes, 200 * 1024 * 1024);
        assert_eq!(config.grid_rows, 1000);
        assert_eq!(config.session_ttl, Duration::from_secs(3600));
        assert_eq!(config.reap_interval, Duration::from_secs(60));
    }

    #[test]
    fn explicit_values() {
        let dir = tempfile::tempdir().unwrap();
        let args = Arguments::parse_from([
            "data-insight",
            "--host",
            "0.0.0.0",
            "-p",
            "9000",
            "--max-upload-mb",
            "5",
            "--session-ttl-secs",
            "30",
            "--report-dir",
            dir.path().to_str().unwrap(),
        ]);
        let config = Config::from_args(&args).unwrap();
        assert_eq!(config.addr.port(), 9000);
        assert!(config.addr.ip().is_unspecified());
        assert_eq!(config.max_upload_bytes, 5 * 1024 * 1024);
        assert_eq!(config.reap_interval, Duration::from_secs(30));
        assert_eq!(config.report_dir, dir.path());
    }

    #[test]
    fn zero_limits_are_rejected() {
        let result = Arguments::try_parse_from(["data-insight", "--max-upload-mb", "0"]);
        assert!(result.is_err());
    }

    #[test]
    fn missing_report_dir_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope");
        let args = Arguments::parse_from([
            "data-insight",
            "--report-dir",
            missing.to_str().unwrap(),
        ]);
        assert!(matches!(
            Config::from_args(&args),
            Err(ConfigError::InvalidArgument { .. })
        ));
    }
}
