//! Certificate expiry lookup
//!
//! The peer certificate comes from reqwest's `TlsInfo` extension. Only the
//! validity window is read, so a minimal DER walk is enough.

use crate::site::{PROBE_TIMEOUT, USER_AGENT};
use chrono::{DateTime, NaiveDateTime, Utc};
use reqwest::Client;
use reqwest::tls::TlsInfo;
use tracing::debug;

const TAG_SEQUENCE: u8 = 0x30;
const TAG_VERSION: u8 = 0xa0;
const TAG_UTC_TIME: u8 = 0x17;
const TAG_GENERALIZED_TIME: u8 = 0x18;

/// Days until the certificate served for `host` on port 443 expires.
///
/// `None` when the handshake fails or the certificate cannot be read.
pub async fn certificate_days_remaining(host: &str) -> Option<i64> {
    let client = Client::builder()
        .user_agent(USER_AGENT)
        .timeout(PROBE_TIMEOUT)
        .tls_info(true)
        .build()
        .ok()?;

    let response = match client.head(format!("https://{}/", host)).send().await {
        Ok(response) => response,
        Err(e) => {
            debug!(host, error = %e, "TLS probe failed");
            return None;
        }
    };
    let der = response
        .extensions()
        .get::<TlsInfo>()?
        .peer_certificate()?
        .to_vec();

    let not_after = certificate_not_after(&der)?;
    Some((not_after - Utc::now()).num_days())
}

/// `notAfter` of an X.509 certificate in DER form
pub fn certificate_not_after(der: &[u8]) -> Option<DateTime<Utc>> {
    let (certificate, _) = read_tlv(der, TAG_SEQUENCE)?;
    let (mut tbs, _) = read_tlv(certificate, TAG_SEQUENCE)?;

    if tbs.first() == Some(&TAG_VERSION) {
        tbs = skip_tlv(tbs)?;
    }
    // serialNumber, signature, issuer
    for _ in 0..3 {
        tbs = skip_tlv(tbs)?;
    }
    let (validity, _) = read_tlv(tbs, TAG_SEQUENCE)?;

    let not_before_rest = skip_tlv(validity)?;
    let (&tag, _) = not_before_rest.split_first()?;
    let (not_after, _) = read_tlv(not_before_rest, tag)?;
    parse_asn1_time(tag, not_after)
}

/// Parse an ASN.1 UTCTime or GeneralizedTime value
pub fn parse_asn1_time(tag: u8, value: &[u8]) -> Option<DateTime<Utc>> {
    let text = std::str::from_utf8(value).ok()?;
    let full = match tag {
        TAG_UTC_TIME => {
            let year: u32 = text.get(..2)?.parse().ok()?;
            let century = if year >= 50 { "19" } else { "20" };
            format!("{}{}", century, text)
        }
        TAG_GENERALIZED_TIME => text.to_string(),
        _ => return None,
    };
    NaiveDateTime::parse_from_str(&full, "%Y%m%d%H%M%SZ")
        .ok()
        .map(|naive| naive.and_utc())
}

/// Read one TLV with the expected tag; returns (contents, rest)
fn read_tlv(input: &[u8], tag: u8) -> Option<(&[u8], &[u8])> {
    let (&actual, rest) = input.split_first()?;
    if actual != tag {
        return None;
    }
    let (len, rest) = read_length(rest)?;
    if rest.len() < len {
        return None;
    }
    Some(rest.split_at(len))
}

fn skip_tlv(input: &[u8]) -> Option<&[u8]> {
    let (_, rest) = input.split_first()?;
    let (len, rest) = read_length(rest)?;
    rest.get(len..)
}

fn read_length(input: &[u8]) -> Option<(usize, &[u8])> {
    let (&first, rest) = input.split_first()?;
    if first & 0x80 == 0 {
        return Some((first as usize, rest));
    }
    let count = (first & 0x7f) as usize;
    if count == 0 || count > std::mem::size_of::<usize>() || rest.len() < count {
        return None;
    }
    let (bytes, rest) = rest.split_at(count);
    let len = bytes.iter().fold(0usize, |acc, &b| (acc << 8) | b as usize);
    Some((len, rest))
}
