//! Signed-source tokens for generated files.
//!
//! A file is generated with [`signing_token`] on its first line. Signing
//! replaces the token's placeholder with a digest of the whole body, computed
//! while the placeholder is still in place, so any later hand edit makes
//! [`verify`] report [`SignatureStatus::Invalid`].

use anyhow::{bail, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use sha2::{Digest, Sha256};

const PLACEHOLDER: &str = "<<SignedSource::*O*zOeWoEQle#+L!plEphiEmie@IsG>>";

// Split so this source file is not itself treated as generated.
const GENERATED_TAG: &str = concat!("@", "generated");

static SIGNATURE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"SignedSource<<([a-f0-9]{64})>>").expect("signature pattern"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignatureStatus {
    Valid,
    /// Signed, but the body changed after signing.
    Invalid,
    /// No signature present.
    Unsigned,
}

/// Token to place in a body before calling [`sign`].
pub fn signing_token() -> String {
    format!("{GENERATED_TAG} {PLACEHOLDER}")
}

/// Sign a body that contains [`signing_token`].
pub fn sign(body: &str) -> Result<String> {
    if SIGNATURE_RE.is_match(body) {
        bail!("content is already signed");
    }
    if !body.contains(PLACEHOLDER) {
        bail!("content has no signing token; cannot sign");
    }
    let signature = format!("SignedSource<<{}>>", digest(body));
    Ok(body.replacen(PLACEHOLDER, &signature, 1))
}

pub fn verify(text: &str) -> SignatureStatus {
    let Some(caps) = SIGNATURE_RE.captures(text) else {
        return SignatureStatus::Unsigned;
    };
    let (Some(whole), Some(recorded)) = (caps.get(0), caps.get(1)) else {
        return SignatureStatus::Unsigned;
    };

    let mut unsigned = String::with_capacity(text.len());
    unsigned.push_str(&text[..whole.start()]);
    unsigned.push_str(PLACEHOLDER);
    unsigned.push_str(&text[whole.end()..]);

    if digest(&unsigned) == recorded.as_str() {
        SignatureStatus::Valid
    } else {
        SignatureStatus::Invalid
    }
}

fn digest(text: &str) -> String {
    format!("{:x}", Sha256::digest(text.as_bytes()))
}
