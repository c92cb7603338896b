//! Configuration and CLI argument handling

use std::{path::PathBuf, time::Duration};
use clap::Parser;

use crate::{
    state::ResendPolicy,
    timer::{DisplayFormat, TimerOptions},
};

/// CLI argument parsing structure
#[derive(Debug, Parser)]
#[command(name = "resumable-countdown")]
#[command(about = "A resumable countdown timer served over HTTP")]
#[command(version)]
pub struct Config {
    /// Port to bind the server to
    #[arg(short, long, default_value = "20554")]
    pub port: u16,

    /// Host address to bind to
    #[arg(long, default_value = "0.0.0.0")]
    pub host: String,

    /// Countdown duration in seconds
    #[arg(short, long, default_value = "60", value_parser = clap::value_parser!(u64).range(1..))]
    pub seconds: u64,

    /// Store key under which the deadline is persisted
    #[arg(long, default_value = "otp-timer")]
    pub persist_key: String,

    /// JSON file backing the durable store
    #[arg(long, default_value = "countdown-store.json")]
    pub store_path: PathBuf,

    /// Display format of the remaining time (mm:ss or seconds)
    #[arg(long, default_value = "mm:ss")]
    pub format: DisplayFormat,

    /// Do not start counting until POST /timer/start
    #[arg(long)]
    pub no_auto_start: bool,

    /// Interval between scheduling frames in milliseconds
    #[arg(long, default_value = "100", value_parser = clap::value_parser!(u64).range(1..))]
    pub frame_interval_ms: u64,

    /// Maximum number of resends, 0 for unlimited
    #[arg(long, default_value = "3")]
    pub max_retries: u32,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Config {
    /// Parse configuration from command line arguments
    pub fn parse() -> Self {
        Parser::parse()
    }

    /// Get the server address as a formatted string
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Get the appropriate log level based on verbose flag
    pub fn log_level(&self) -> &'static str {
        if self.verbose { "debug" } else { "info" }
    }

    pub fn frame_interval(&self) -> Duration {
        Duration::from_millis(self.frame_interval_ms)
    }

    pub fn timer_options(&self) -> TimerOptions {
        TimerOptions::new(self.seconds)
            .auto_start(!self.no_auto_start)
            .persist_key(self.persist_key.clone())
            .format(self.format)
    }

    pub fn resend_policy(&self) -> ResendPolicy {
        ResendPolicy {
            window_seconds: self.seconds,
            max_retries: (self.max_retries > 0).then_some(self.max_retries),
        }
    }
}
