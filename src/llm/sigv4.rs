//! Minimal AWS Signature Version 4 signing for Bedrock invoke requests.
//! Only what Bedrock needs: POST, empty query string, JSON payload, and the
//! content-type/host/x-amz-date header set.

use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};

use crate::domain::OrganizerError;

type HmacSha256 = Hmac<Sha256>;

const ALGORITHM: &str = "AWS4-HMAC-SHA256";
const SIGNED_HEADERS: &str = "content-type;host;x-amz-date";

pub(crate) struct SigningInput<'a> {
    pub access_key_id: &'a str,
    pub secret_access_key: &'a str,
    pub region: &'a str,
    pub service: &'a str,
    /// Host exactly as the Host request header will carry it (port included
    /// when non-default).
    pub host: &'a str,
    /// Canonical, percent-encoded request path.
    pub path: &'a str,
    pub payload: &'a [u8],
    pub timestamp: DateTime<Utc>,
}

pub(crate) struct SignedHeaders {
    pub amz_date: String,
    pub authorization: String,
}

pub(crate) fn sign(input: &SigningInput<'_>) -> Result<SignedHeaders, OrganizerError> {
    let amz_date = input.timestamp.format("%Y%m%dT%H%M%SZ").to_string();
    let date = input.timestamp.format("%Y%m%d").to_string();

    let canonical_headers = format!(
        "content-type:application/json\nhost:{}\nx-amz-date:{amz_date}\n",
        input.host
    );
    let canonical_request = format!(
        "POST\n{path}\n\n{canonical_headers}\n{SIGNED_HEADERS}\n{payload_hash}",
        path = input.path,
        payload_hash = hex_sha256(input.payload),
    );

    let scope = format!(
        "{date}/{region}/{service}/aws4_request",
        region = input.region,
        service = input.service,
    );
    let string_to_sign = format!(
        "{ALGORITHM}\n{amz_date}\n{scope}\n{}",
        hex_sha256(canonical_request.as_bytes())
    );

    let secret = format!("AWS4{}", input.secret_access_key);
    let k_date = hmac(secret.as_bytes(), &date)?;
    let k_region = hmac(&k_date, input.region)?;
    let k_service = hmac(&k_region, input.service)?;
    let k_signing = hmac(&k_service, "aws4_request")?;
    let signature = hex::encode(hmac(&k_signing, &string_to_sign)?);

    let authorization = format!(
        "{ALGORITHM} Credential={access_key}/{scope}, SignedHeaders={SIGNED_HEADERS}, Signature={signature}",
        access_key = input.access_key_id,
    );

    Ok(SignedHeaders {
        amz_date,
        authorization,
    })
}

/// Percent-encodes a single path segment the way the canonical request
/// expects (everything but unreserved characters, so Bedrock model IDs with
/// ':' sign correctly).
pub(crate) fn encode_path_segment(segment: &str) -> String {
    let mut encoded = String::with_capacity(segment.len());
    for byte in segment.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                encoded.push(byte as char);
            }
            _ => {
                encoded.push('%');
                encoded.push_str(&format!("{byte:02X}"));
            }
        }
    }
    encoded
}

fn hmac(key: &[u8], data: &str) -> Result<Vec<u8>, OrganizerError> {
    let mut mac = HmacSha256::new_from_slice(key)
        .map_err(|err| OrganizerError::internal(format!("HMAC key setup failed: {err}")))?;
    mac.update(data.as_bytes());
    Ok(mac.finalize().into_bytes().to_vec())
}

fn hex_sha256(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}
