//! snmptrapd traphandle input parser
//!
//! snmptrapd writes one notification per handler invocation to stdin:
//!
//! ```text
//! router1
//! UDP: [10.0.0.5]:161->[10.0.0.1]:162
//! 1.3.6.1.2.1.1.3.0 12345
//! 1.3.6.1.6.3.1.1.4.1.0 1.3.6.1.4.1.9.9.41.1.2.3.1.5
//! ```
//!
//! Lines are classified by position only: hostname, address, then bindings.

use crate::notification::{AddressInfo, Notification, Varbind};
use std::io::BufRead;
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("malformed varbind {input:?}: expected \"<oid> <value>\"")]
    MalformedBinding { input: String },

    #[error("malformed address {input:?}: {reason}")]
    MalformedAddress { input: String, reason: &'static str },

    #[error("failed to read notification: {0}")]
    Io(#[from] std::io::Error),
}

/// Parse a varbind line. The value keeps every token after the OID, joined
/// by single spaces.
pub fn parse_varbind(line: &str) -> Result<Varbind, ParseError> {
    let mut tokens = line.split_whitespace();
    let oid = tokens.next().ok_or_else(|| ParseError::MalformedBinding {
        input: line.to_string(),
    })?;
    let value = tokens.collect::<Vec<_>>().join(" ");

    Ok(Varbind::new(oid, value))
}

/// Parse the address line, e.g. `UDP: [127.0.0.1]:57099->[127.0.0.1]:162`.
///
/// Hosts are read from between the brackets and ports from the text after
/// `]:`, so bracketed IPv6 literals decode correctly. An unbracketed endpoint
/// is split on its last colon.
pub fn parse_address(line: &str) -> Result<AddressInfo, ParseError> {
    let malformed = |reason| ParseError::MalformedAddress {
        input: line.to_string(),
        reason,
    };

    let mut tokens = line.split_whitespace();
    let (protocol, pair) = match (tokens.next(), tokens.next()) {
        (Some(protocol), Some(pair)) => (protocol, pair),
        _ => return Err(malformed("expected \"<protocol> <source>-><target>\"")),
    };

    let (source, target) = pair
        .split_once("->")
        .ok_or_else(|| malformed("missing \"->\" separator"))?;
    let (source_host, source_port) =
        split_endpoint(source).ok_or_else(|| malformed("source endpoint has no port"))?;
    let (target_host, target_port) =
        split_endpoint(target).ok_or_else(|| malformed("target endpoint has no port"))?;

    Ok(AddressInfo {
        protocol: protocol.to_string(),
        source_host: source_host.to_string(),
        source_port: source_port.to_string(),
        target_host: target_host.to_string(),
        target_port: target_port.to_string(),
    })
}

fn split_endpoint(endpoint: &str) -> Option<(&str, &str)> {
    match endpoint.split_once(']') {
        Some((host, rest)) => {
            let port = rest.strip_prefix(':')?;
            Some((host.trim_start_matches('['), port))
        }
        None => endpoint.rsplit_once(':'),
    }
}

/// Read a full notification until end of input.
///
/// Lines are decoded lossily: OCTET STRING values may carry non-UTF-8 bytes
/// (Latin-1 `ifAlias`, binary `sysLocation`, ...), which become U+FFFD.
pub fn parse_notification<R: BufRead>(reader: R) -> Result<Notification, ParseError> {
    let mut hostname = None;
    let mut address = None;
    let mut bindings = Vec::new();

    for (row, raw) in reader.split(b'\n').enumerate() {
        let line = decode_line(&raw?);
        match row {
            0 => {
                info!("Parsing notification HOSTNAME: {}", line);
                hostname = Some(line);
            }
            1 => {
                info!("Parsing notification IPADDRESS: {}", line);
                address = Some(parse_address(&line)?);
            }
            _ => {
                info!("Parsing notification VARBIND({}): {}", row - 1, line);
                let varbind = parse_varbind(&line).inspect_err(|_| {
                    warn!("Varbind on input line {} has no tokens", row + 1);
                })?;
                bindings.push(varbind);
            }
        }
    }

    let (hostname, address) = match (hostname, address) {
        (Some(hostname), Some(address)) => (hostname, address),
        (hostname, _) => {
            return Err(ParseError::MalformedAddress {
                input: String::new(),
                reason: if hostname.is_some() {
                    "notification ended before the address line"
                } else {
                    "notification is empty"
                },
            })
        }
    };

    let notification = Notification {
        hostname,
        address,
        bindings,
    };
    debug!(
        "Parsed notification with {} varbind(s):\n{}",
        notification.bindings.len(),
        notification
    );
    Ok(notification)
}

fn decode_line(raw: &[u8]) -> String {
    let raw = raw.strip_suffix(b"\r").unwrap_or(raw);
    String::from_utf8_lossy(raw).into_owned()
}
