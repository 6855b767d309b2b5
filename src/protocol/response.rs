use serde::Deserialize;
use std::fmt;
use tokio::io::AsyncReadExt;

use crate::error::{Result, TrapperError};
use crate::transport::framing::FrameCodec;

/// Status the server reports when it accepted the request.
pub const SUCCESS_STATUS: &str = "success";

/// Server acknowledgement for one request
///
/// Only `response` and `info` travel on the wire. The counters are scanned
/// out of `info`, which looks like
/// `processed: 1; failed: 0; total: 1; seconds spent: 0.060753`.
/// `total == processed + failed` is taken on trust from the server.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Response {
    pub response: String,
    pub info: String,
    #[serde(skip)]
    pub processed: i64,
    #[serde(skip)]
    pub failed: i64,
    #[serde(skip)]
    pub total: i64,
    #[serde(skip)]
    pub seconds_spent: f64,
}

impl Response {
    /// Decodes a response payload and fills the counters from its info text.
    pub fn from_payload(payload: &[u8]) -> Result<Self> {
        let mut resp: Response = serde_json::from_slice(payload).map_err(TrapperError::Unmarshal)?;

        let counters = parse_info(&resp.info)?;
        resp.processed = counters.processed;
        resp.failed = counters.failed;
        resp.total = counters.total;
        resp.seconds_spent = counters.seconds_spent;

        Ok(resp)
    }

    pub fn is_success(&self) -> bool {
        self.response == SUCCESS_STATUS && self.failed == 0
    }
}

impl fmt::Display for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} (processed: {}, failed: {}, total: {}, seconds spent: {})",
            self.response, self.processed, self.failed, self.total, self.seconds_spent
        )
    }
}

/// Reads one framed response from the stream and decodes it.
pub async fn parse_response<R>(reader: &mut R) -> Result<Response>
where
    R: AsyncReadExt + Unpin,
{
    let payload = FrameCodec::read_frame(reader).await?;
    Response::from_payload(&payload)
}

/// Counters carried in the response info text.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InfoCounters {
    pub processed: i64,
    pub failed: i64,
    pub total: i64,
    pub seconds_spent: f64,
}

enum Token {
    Literal(&'static str),
    Int,
    Float,
}

/// `processed: %d; failed: %d; total: %d; seconds spent: %f`
const INFO_TEMPLATE: &[Token] = &[
    Token::Literal("processed: "),
    Token::Int,
    Token::Literal("; failed: "),
    Token::Int,
    Token::Literal("; total: "),
    Token::Int,
    Token::Literal("; seconds spent: "),
    Token::Float,
];

const INFO_VALUE_COUNT: usize = 4;

/// Scans the info text against the fixed counters template
///
/// Literals must match exactly, except that a space in the template matches
/// any run of whitespace (including none). Numbers may have leading
/// whitespace. Anything after the last number is ignored. Any deviation
/// fails with the raw text attached; there are no defaults.
pub fn parse_info(info: &str) -> Result<InfoCounters> {
    let mut scanner = Scanner::new(info);
    let mut ints = Vec::with_capacity(3);
    let mut floats = Vec::with_capacity(1);

    for token in INFO_TEMPLATE {
        let step = match token {
            Token::Literal(lit) => scanner.literal(lit),
            Token::Int => scanner.int().map(|n| ints.push(n)),
            Token::Float => scanner.float().map(|x| floats.push(x)),
        };
        if let Err(reason) = step {
            let scanned = ints.len() + floats.len();
            return Err(info_error(
                info,
                format!("{} (scanned {} of {} values)", reason, scanned, INFO_VALUE_COUNT),
            ));
        }
    }

    match (ints.as_slice(), floats.as_slice()) {
        (&[processed, failed, total], &[seconds_spent]) => Ok(InfoCounters {
            processed,
            failed,
            total,
            seconds_spent,
        }),
        _ => Err(info_error(
            info,
            format!(
                "expected {} values, scanned {}",
                INFO_VALUE_COUNT,
                ints.len() + floats.len()
            ),
        )),
    }
}

fn info_error(info: &str, reason: String) -> TrapperError {
    TrapperError::ParseInfo {
        info: info.to_string(),
        reason,
    }
}

/// Positional cursor over the info text.
struct Scanner<'a> {
    rest: &'a str,
}

impl<'a> Scanner<'a> {
    fn new(input: &'a str) -> Self {
        Self { rest: input }
    }

    fn skip_whitespace(&mut self) {
        self.rest = self.rest.trim_start();
    }

    fn literal(&mut self, lit: &str) -> std::result::Result<(), String> {
        for expected in lit.chars() {
            if expected == ' ' {
                self.skip_whitespace();
                continue;
            }
            match self.rest.chars().next() {
                Some(c) if c == expected => self.rest = &self.rest[c.len_utf8()..],
                Some(c) => return Err(format!("expected {:?}, found {:?}", expected, c)),
                None => return Err(format!("expected {:?}, found end of input", expected)),
            }
        }
        Ok(())
    }

    /// Takes the longest prefix whose chars satisfy `accept`, given the index.
    fn take_while(&mut self, mut accept: impl FnMut(usize, char) -> bool) -> &'a str {
        let end = self
            .rest
            .char_indices()
            .find(|&(i, c)| !accept(i, c))
            .map(|(i, _)| i)
            .unwrap_or(self.rest.len());
        let (taken, rest) = self.rest.split_at(end);
        self.rest = rest;
        taken
    }

    fn int(&mut self) -> std::result::Result<i64, String> {
        self.skip_whitespace();
        let token = self.take_while(|i, c| c.is_ascii_digit() || (i == 0 && (c == '+' || c == '-')));
        token
            .parse::<i64>()
            .map_err(|e| format!("invalid integer {:?}: {}", token, e))
    }

    fn float(&mut self) -> std::result::Result<f64, String> {
        self.skip_whitespace();
        let mut prev = None;
        let token = self.take_while(|i, c| {
            let ok = c.is_ascii_digit()
                || c == '.'
                || c == 'e'
                || c == 'E'
                || ((c == '+' || c == '-') && (i == 0 || matches!(prev, Some('e') | Some('E'))));
            prev = Some(c);
            ok
        });
        token
            .parse::<f64>()
            .map_err(|e| format!("invalid float {:?}: {}", token, e))
    }
}
