//! GitHub webhook signature verification.
//!
//! GitHub signs every delivery with an HMAC of the raw body keyed by the
//! webhook secret. Two headers carry the signature:
//!
//! - `X-Hub-Signature: sha1=<hex>` (HMAC-SHA1, the original scheme)
//! - `X-Hub-Signature-256: sha256=<hex>` (HMAC-SHA256)
//!
//! Verification must happen before the payload is parsed or acted upon.

use hmac::{Hmac, Mac};
use sha1::Sha1;
use sha2::Sha256;

type HmacSha1 = Hmac<Sha1>;
type HmacSha256 = Hmac<Sha256>;

/// Header carrying the HMAC-SHA1 signature.
pub const SHA1_HEADER: &str = "x-hub-signature";
/// Header carrying the HMAC-SHA256 signature.
pub const SHA256_HEADER: &str = "x-hub-signature-256";

/// The digest a signature header was computed with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignatureAlgorithm {
    Sha1,
    Sha256,
}

impl SignatureAlgorithm {
    /// The `<algorithm>=` prefix of the header value.
    pub fn prefix(self) -> &'static str {
        match self {
            SignatureAlgorithm::Sha1 => "sha1=",
            SignatureAlgorithm::Sha256 => "sha256=",
        }
    }
}

/// Parses a signature header value (e.g. `"sha1=abc123..."`) into its
/// algorithm and raw digest bytes.
///
/// Returns `None` for malformed values: unknown prefix, value shorter than the
/// prefix, or a non-hex digest. Never panics.
///
/// # Examples
///
/// ```
/// use r_plus::webhooks::{SignatureAlgorithm, parse_signature_header};
///
/// let (alg, bytes) = parse_signature_header("sha1=abcd1234").unwrap();
/// assert_eq!(alg, SignatureAlgorithm::Sha1);
/// assert_eq!(bytes, vec![0xab, 0xcd, 0x12, 0x34]);
///
/// assert!(parse_signature_header("abcd1234").is_none());
/// assert!(parse_signature_header("md5=abcd1234").is_none());
/// assert!(parse_signature_header("sha1=xyz").is_none());
/// ```
pub fn parse_signature_header(header: &str) -> Option<(SignatureAlgorithm, Vec<u8>)> {
    let (algorithm, hex_sig) = if let Some(rest) = header.strip_prefix("sha1=") {
        (SignatureAlgorithm::Sha1, rest)
    } else if let Some(rest) = header.strip_prefix("sha256=") {
        (SignatureAlgorithm::Sha256, rest)
    } else {
        return None;
    };

    hex::decode(hex_sig).ok().map(|bytes| (algorithm, bytes))
}

/// Computes the HMAC of a payload with the given algorithm and secret.
///
/// Used to produce signatures in tests and tooling.
pub fn compute_signature(algorithm: SignatureAlgorithm, payload: &[u8], secret: &[u8]) -> Vec<u8> {
    match algorithm {
        SignatureAlgorithm::Sha1 => {
            let mut mac = HmacSha1::new_from_slice(secret).expect("HMAC can take key of any size");
            mac.update(payload);
            mac.finalize().into_bytes().to_vec()
        }
        SignatureAlgorithm::Sha256 => {
            let mut mac =
                HmacSha256::new_from_slice(secret).expect("HMAC can take key of any size");
            mac.update(payload);
            mac.finalize().into_bytes().to_vec()
        }
    }
}

/// Formats a signature as a GitHub-style header value, `<algorithm>=<hex>`.
pub fn format_signature_header(algorithm: SignatureAlgorithm, signature: &[u8]) -> String {
    format!("{}{}", algorithm.prefix(), hex::encode(signature))
}

/// Verifies a webhook signature header against the payload and secret.
///
/// Returns `true` only if the header is well formed and its digest matches
/// the HMAC of `payload` under `secret`. The digest comparison is
/// constant-time. An empty secret never verifies.
///
/// # Examples
///
/// ```
/// use r_plus::webhooks::{
///     SignatureAlgorithm, compute_signature, format_signature_header, verify_signature,
/// };
///
/// let payload = b"hi thar!";
/// let secret = b"secret";
///
/// let sig = compute_signature(SignatureAlgorithm::Sha1, payload, secret);
/// let header = format_signature_header(SignatureAlgorithm::Sha1, &sig);
///
/// assert!(verify_signature(payload, &header, secret));
/// assert!(!verify_signature(payload, &header, b"wrong-secret"));
/// ```
pub fn verify_signature(payload: &[u8], signature_header: &str, secret: &[u8]) -> bool {
    if secret.is_empty() {
        return false;
    }

    let Some((algorithm, expected)) = parse_signature_header(signature_header) else {
        return false;
    };

    // verify_slice compares in constant time.
    match algorithm {
        SignatureAlgorithm::Sha1 => match HmacSha1::new_from_slice(secret) {
            Ok(mut mac) => {
                mac.update(payload);
                mac.verify_slice(&expected).is_ok()
            }
            Err(_) => false,
        },
        SignatureAlgorithm::Sha256 => match HmacSha256::new_from_slice(secret) {
            Ok(mut mac) => {
                mac.update(payload);
                mac.verify_slice(&expected).is_ok()
            }
            Err(_) => false,
        },
    }
}
