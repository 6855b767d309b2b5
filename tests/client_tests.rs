use chrono::{TimeZone, Utc};
use clap::Parser;
use serde_json::{Value, json};
use std::time::{Duration, UNIX_EPOCH};
use tokio::net::TcpListener;
use trapper_sender::client::client::{
    format_elapsed_seconds, format_seconds_from_epoch, parse_metric_time,
};
use trapper_sender::client::{RunArgs, SendArgs, run_send};
use trapper_sender::transport::FrameCodec;

#[test]
fn test_parse_metric_time() {
    let t = parse_metric_time("2024-03-01T12:00:00").unwrap();
    assert_eq!(t, Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap());

    let t = parse_metric_time("2024-03-01T12:00:00.123456789").unwrap();
    assert_eq!(t.timestamp(), 1_709_294_400);
    assert_eq!(t.timestamp_subsec_nanos(), 123_456_789);

    assert!(parse_metric_time("2024-03-01 12:00:00").is_err());
    assert!(parse_metric_time("yesterday").is_err());
}

#[test]
fn test_format_seconds_from_epoch() {
    let t = UNIX_EPOCH + Duration::from_millis(1_709_294_400_750);
    assert_eq!(format_seconds_from_epoch(t), "1709294400");

    let before = UNIX_EPOCH - Duration::from_millis(1_500);
    assert_eq!(format_seconds_from_epoch(before), "-2");
}

#[test]
fn test_format_elapsed_seconds() {
    assert_eq!(format_elapsed_seconds(Duration::from_millis(1_500)), "1.5");
    assert_eq!(format_elapsed_seconds(Duration::from_secs(3)), "3");
    assert_eq!(format_elapsed_seconds(Duration::from_micros(250)), "0.00025");
}

#[test]
fn test_send_args() {
    let args = SendArgs::try_parse_from([
        "send",
        "--host",
        "web-01",
        "--key",
        "backup.status",
        "--value",
        "0",
        "--time",
        "2024-03-01T12:00:00.5",
        "--server",
        "zabbix.example.com",
    ])
    .unwrap();

    assert_eq!(args.host, "web-01");
    assert_eq!(args.server.timeout_ms, 5000);
    assert_eq!(args.time.unwrap().timestamp_subsec_nanos(), 500_000_000);

    let sender = args.server.sender();
    assert_eq!(sender.server_address, "zabbix.example.com");
    assert_eq!(sender.timeout, Duration::from_secs(5));
}

#[test]
fn test_send_args_require_server() {
    let result = SendArgs::try_parse_from(["send", "--host", "h", "--key", "k", "--value", "v"]);
    assert!(result.is_err());
}

#[test]
fn test_run_args() {
    let args = RunArgs::try_parse_from([
        "run",
        "--host",
        "web-01",
        "--prefix",
        "backup",
        "--server",
        "127.0.0.1:10051",
        "--timeout-ms",
        "250",
        "rsync",
        "-a",
        "--delete",
        "/src",
        "/dst",
    ])
    .unwrap();

    assert_eq!(args.start_time_suffix, "_start_time");
    assert_eq!(args.elapsed_time_suffix, "_elapsed_time");
    assert_eq!(args.exit_code_suffix, "_exit_code");
    assert_eq!(args.server.timeout_ms, 250);
    assert_eq!(args.command, "rsync");
    assert_eq!(args.args, vec!["-a", "--delete", "/src", "/dst"]);
}

#[tokio::test]
async fn test_run_send() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap().to_string();

    let server = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let request: Value =
            serde_json::from_slice(&FrameCodec::read_frame(&mut socket).await.unwrap()).unwrap();
        let reply = json!({
            "response": "success",
            "info": "processed: 1; failed: 0; total: 1; seconds spent: 0.000040"
        });
        FrameCodec::write_frame(&mut socket, &serde_json::to_vec(&reply).unwrap())
            .await
            .unwrap();
        request
    });

    let args = SendArgs::try_parse_from([
        "send",
        "--host",
        "web-01",
        "--key",
        "backup.status",
        "--value",
        "done",
        "--time",
        "2024-03-01T12:00:00.25",
        "--server",
        addr.as_str(),
    ])
    .unwrap();
    run_send(args).await.unwrap();

    let request = server.await.unwrap();
    let sample = &request["data"][0];
    assert_eq!(sample["value"], "done");
    assert_eq!(sample["clock"], 1_709_294_400);
    assert_eq!(sample["ns"], 250_000_000);
}

#[tokio::test]
async fn test_run_send_connection_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap().to_string();
    drop(listener);

    let args = SendArgs::try_parse_from([
        "send", "--host", "h", "--key", "k", "--value", "v", "--server", addr.as_str(),
    ])
    .unwrap();
    assert!(run_send(args).await.is_err());
}
