use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use clap::{Args, Parser};
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};
use tracing::{error, info};

use crate::client::exec::{CommandOutcome, run_command};
use crate::protocol::TrapperData;
use crate::transport::Sender;

/// Format accepted by `--time`, always read as UTC.
pub const METRIC_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

#[derive(Args, Debug, Clone)]
pub struct ServerArgs {
    /// Trapper server address in host[:port] format (default port 10051)
    #[arg(long)]
    pub server: String,

    /// Timeout for the whole round trip, in milliseconds
    #[arg(long, default_value_t = 5000)]
    pub timeout_ms: u64,
}

impl ServerArgs {
    pub fn sender(&self) -> Sender {
        Sender::new(&self.server).with_timeout(Duration::from_millis(self.timeout_ms))
    }
}

#[derive(Parser, Debug)]
pub struct SendArgs {
    /// Hostname for the metric
    #[arg(long)]
    pub host: String,

    /// Metric item key
    #[arg(long)]
    pub key: String,

    /// Metric value
    #[arg(long)]
    pub value: String,

    /// Time for the metric, yyyy-mm-ddTHH:MM:SS(.sssssssss)?; server time if omitted
    #[arg(long, value_parser = parse_metric_time)]
    pub time: Option<DateTime<Utc>>,

    #[command(flatten)]
    pub server: ServerArgs,
}

#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Hostname for the metrics
    #[arg(long)]
    pub host: String,

    /// Metric item key prefix
    #[arg(long)]
    pub prefix: String,

    /// Metric item key suffix for start time
    #[arg(long, default_value = "_start_time")]
    pub start_time_suffix: String,

    /// Metric item key suffix for elapsed time
    #[arg(long, default_value = "_elapsed_time")]
    pub elapsed_time_suffix: String,

    /// Metric item key suffix for exit code
    #[arg(long, default_value = "_exit_code")]
    pub exit_code_suffix: String,

    #[command(flatten)]
    pub server: ServerArgs,

    /// Path to the command to be executed
    pub command: String,

    /// Arguments for the command
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    pub args: Vec<String>,
}

pub fn parse_metric_time(s: &str) -> Result<DateTime<Utc>, String> {
    NaiveDateTime::parse_from_str(s, METRIC_TIME_FORMAT)
        .map(|naive| Utc.from_utc_datetime(&naive))
        .map_err(|e| format!("invalid time {:?}: {}", s, e))
}

/// Sends a single metric
pub async fn run_send(args: SendArgs) -> anyhow::Result<()> {
    let mut sample = TrapperData::new(args.host, args.key, args.value);
    if let Some(time) = args.time {
        sample = sample.at(time);
    }

    let resp = args.server.sender().send(&[sample]).await?;
    info!(response = %resp, "sent metrics");
    Ok(())
}

/// Runs a command between a start time metric and exit code / elapsed time metrics
///
/// Metric send failures are logged only. The returned outcome carries the
/// command's own result; see [`CommandOutcome::process_exit_code`].
pub async fn run_wrapped(args: RunArgs) -> CommandOutcome {
    let sender = args.server.sender();
    let start_time = SystemTime::now();
    let started = Instant::now();

    let pre_run = [TrapperData::new(
        &args.host,
        format!("{}{}", args.prefix, args.start_time_suffix),
        format_seconds_from_epoch(start_time),
    )];
    match sender.send(&pre_run).await {
        Ok(resp) => info!(response = %resp, "sent pre-run metric"),
        Err(e) => error!(key_prefix = %args.prefix, error = %e, "failed to send pre-run metric"),
    }

    let outcome = run_command(&args.command, &args.args).await;
    if let Err(e) = &outcome.result {
        error!(error = %e, "command failed");
    }

    let elapsed = started.elapsed();
    let post_run = [
        TrapperData::new(
            &args.host,
            format!("{}{}", args.prefix, args.exit_code_suffix),
            outcome.exit_code.to_string(),
        ),
        TrapperData::new(
            &args.host,
            format!("{}{}", args.prefix, args.elapsed_time_suffix),
            format_elapsed_seconds(elapsed),
        ),
    ];
    match sender.send(&post_run).await {
        Ok(resp) => info!(response = %resp, "sent post-run metrics"),
        Err(e) => error!(key_prefix = %args.prefix, error = %e, "failed to send post-run metrics"),
    }

    outcome
}

/// Whole seconds since the Unix epoch; times before the epoch are negative.
pub fn format_seconds_from_epoch(time: SystemTime) -> String {
    match time.duration_since(UNIX_EPOCH) {
        Ok(d) => d.as_secs().to_string(),
        Err(e) => {
            let before = e.duration();
            let mut secs = before.as_secs() as i64;
            if before.subsec_nanos() > 0 {
                secs += 1;
            }
            (-secs).to_string()
        }
    }
}

/// Elapsed time as fractional seconds in shortest form, e.g. `1.5`.
pub fn format_elapsed_seconds(elapsed: Duration) -> String {
    elapsed.as_secs_f64().to_string()
}
