use tokio::io::BufReader;
use tokio_test::io::Builder;
use trapper_sender::TrapperError;
use trapper_sender::protocol::{Response, parse_info, parse_response};

const SUCCESS_JSON: &str =
    r#"{"response":"success","info":"processed: 1; failed: 0; total: 1; seconds spent: 0.060753"}"#;

fn frame(json: &str) -> Vec<u8> {
    let mut packet = b"ZBXD\x01".to_vec();
    packet.extend_from_slice(&(json.len() as u32).to_le_bytes());
    packet.extend_from_slice(&[0, 0, 0, 0]);
    packet.extend_from_slice(json.as_bytes());
    packet
}

#[tokio::test]
async fn test_parse_response() {
    let packet = frame(SUCCESS_JSON);
    assert_eq!(&packet[5..9], b"\x5A\x00\x00\x00");

    let mut reader = BufReader::new(&packet[..]);
    let resp = parse_response(&mut reader).await.unwrap();

    assert!(resp.is_success());
    assert_eq!(resp.response, "success");
    assert_eq!(resp.processed, 1);
    assert_eq!(resp.failed, 0);
    assert_eq!(resp.total, 1);
    assert_eq!(resp.seconds_spent, 0.060753);
}

#[tokio::test]
async fn test_parse_response_split_across_reads() {
    let packet = frame(SUCCESS_JSON);
    let mut stream = Builder::new()
        .read(&packet[..4])
        .read(&packet[4..13])
        .read(&packet[13..40])
        .read(&packet[40..])
        .build();

    let resp = parse_response(&mut stream).await.unwrap();
    assert_eq!(resp.total, 1);
}

#[tokio::test]
async fn test_parse_response_io_error() {
    let mut stream = Builder::new()
        .read(b"ZBXD\x01")
        .read_error(std::io::Error::new(std::io::ErrorKind::ConnectionReset, "reset"))
        .build();

    let err = parse_response(&mut stream).await.unwrap_err();
    assert!(matches!(err, TrapperError::ReadHeader(_)));
}

#[tokio::test]
async fn test_failure_status_is_not_an_error() {
    let json = r#"{"response":"success","info":"processed: 1; failed: 2; total: 3; seconds spent: 0.000071"}"#;
    let packet = frame(json);
    let mut reader = BufReader::new(&packet[..]);

    let resp = parse_response(&mut reader).await.unwrap();
    assert!(!resp.is_success());
    assert_eq!(resp.failed, 2);
    assert_eq!(resp.total, 3);
}

#[tokio::test]
async fn test_malformed_json() {
    let packet = frame(r#"{"response":"success","info":"#);
    let mut reader = BufReader::new(&packet[..]);

    let err = parse_response(&mut reader).await.unwrap_err();
    assert!(matches!(err, TrapperError::Unmarshal(_)));
}

#[test]
fn test_non_success_status() {
    let resp = Response::from_payload(
        br#"{"response":"failed","info":"processed: 0; failed: 0; total: 0; seconds spent: 0.000010"}"#,
    )
    .unwrap();
    assert!(!resp.is_success());
}

#[test]
fn test_parse_info() {
    let counters = parse_info("processed: 1; failed: 0; total: 1; seconds spent: 0.060753").unwrap();
    assert_eq!(counters.processed, 1);
    assert_eq!(counters.failed, 0);
    assert_eq!(counters.total, 1);
    assert_eq!(counters.seconds_spent, 0.060753);
}

#[test]
fn test_parse_info_large_batch() {
    let counters =
        parse_info("processed: 2500; failed: 13; total: 2513; seconds spent: 12.5").unwrap();
    assert_eq!(counters.processed, 2500);
    assert_eq!(counters.failed, 13);
    assert_eq!(counters.total, 2513);
    assert_eq!(counters.seconds_spent, 12.5);
}

#[test]
fn test_parse_info_tolerates_extra_spaces() {
    let counters =
        parse_info("processed:  3;  failed: 0; total:   3; seconds spent:\t0.5").unwrap();
    assert_eq!(counters.total, 3);
    assert_eq!(counters.seconds_spent, 0.5);
}

#[test]
fn test_parse_info_missing_field() {
    let info = "processed: 1; failed: 0; total: 1";
    match parse_info(info).unwrap_err() {
        TrapperError::ParseInfo { info: raw, reason } => {
            assert_eq!(raw, info);
            assert!(reason.contains("scanned 3 of 4"), "reason: {}", reason);
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[test]
fn test_parse_info_non_numeric() {
    let err = parse_info("processed: one; failed: 0; total: 1; seconds spent: 0.1").unwrap_err();
    assert!(matches!(err, TrapperError::ParseInfo { .. }));
}

#[test]
fn test_parse_info_reordered_fields() {
    let err = parse_info("failed: 0; processed: 1; total: 1; seconds spent: 0.1").unwrap_err();
    assert!(matches!(err, TrapperError::ParseInfo { .. }));
}

#[test]
fn test_parse_info_empty() {
    let err = parse_info("").unwrap_err();
    assert!(matches!(err, TrapperError::ParseInfo { .. }));
}

#[test]
fn test_bad_info_fails_whole_response() {
    let err = Response::from_payload(br#"{"response":"success","info":"processed: 1; failed: 0"}"#)
        .unwrap_err();
    assert!(err.to_string().contains("processed: 1; failed: 0"));
}
