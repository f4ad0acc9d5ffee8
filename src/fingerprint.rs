/*
 * Copyright (C) 2024 The Android Open Source Project
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 * You may obtain a copy of the License at
 *
 *      http://www.apache.org/licenses/LICENSE-2.0
 *
 * Unless required by applicable law or agreed to in writing, software
 * distributed under the License is distributed on an "AS IS" BASIS,
 * WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 * See the License for the specific language governing permissions and
 * limitations under the License.
 */

//! Certificate fingerprints in the `AB:CD:..` notation shown by `keytool` and `apksigner`.

use log::debug;
use openssl::hash::{hash, MessageDigest};
use openssl::x509::X509;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::verifier::VerificationError;

/// A digest rendered as colon-separated uppercase hex byte pairs.
///
/// The empty fingerprint stands for "could not be computed" and never matches a real one.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Fingerprint(String);

/// The string was not a well-formed `HH:HH:..` fingerprint.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("Malformed fingerprint {input:?}: {reason}")]
pub struct FingerprintParseError {
    input: String,
    reason: &'static str,
}

impl Fingerprint {
    /// Returns the empty fingerprint.
    pub fn empty() -> Self {
        Self(String::new())
    }

    /// Wraps a string already in `HH:HH:..` uppercase form.
    pub(crate) fn from_formatted(formatted: &str) -> Self {
        Self(formatted.to_owned())
    }

    /// Returns the fingerprint of raw digest bytes.
    pub fn from_digest(digest: &[u8]) -> Self {
        Self(to_hex_formatted(digest))
    }

    /// Computes the SHA-1 fingerprint of a DER-encoded X.509 certificate.
    ///
    /// The certificate is parsed and re-encoded before hashing, so trailing garbage after the
    /// certificate structure is not part of the digest.
    pub fn of_certificate(der: &[u8]) -> Result<Self, VerificationError> {
        let cert = X509::from_der(der).map_err(VerificationError::CertificateParseFailed)?;
        let encoded = cert.to_der().map_err(VerificationError::EncodingFailed)?;
        let digest =
            hash(MessageDigest::sha1(), &encoded).map_err(VerificationError::DigestUnavailable)?;
        let fingerprint = Self::from_digest(&digest);
        debug!("Certificate SHA-1 fingerprint: {}", fingerprint);
        Ok(fingerprint)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Fingerprint {
    type Err = FingerprintParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Ok(Self::empty());
        }
        let error = |reason| FingerprintParseError { input: s.to_owned(), reason };
        for pair in s.split(':') {
            if pair.len() != 2 {
                return Err(error("each byte must be exactly two hex digits"));
            }
            if !pair.chars().all(|c| c.is_ascii_hexdigit()) {
                return Err(error("non-hex character"));
            }
        }
        Ok(Self(s.to_ascii_uppercase()))
    }
}

impl TryFrom<String> for Fingerprint {
    type Error = FingerprintParseError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<Fingerprint> for String {
    fn from(fingerprint: Fingerprint) -> Self {
        fingerprint.0
    }
}

/// Formats bytes as two-digit uppercase hex pairs joined by `:`, e.g. `00:FF:1A`.
pub fn to_hex_formatted(bytes: &[u8]) -> String {
    let mut s = String::with_capacity(bytes.len() * 3);
    for (i, b) in bytes.iter().enumerate() {
        if i > 0 {
            s.push(':');
        }
        s.push_str(&format!("{:02X}", b));
    }
    s
}

/// Same as [`to_hex_formatted`] for signed byte buffers. Only the low eight bits of each value
/// are printed, so `-1` becomes `FF`.
pub fn to_hex_formatted_signed(bytes: &[i8]) -> String {
    let unsigned: Vec<u8> = bytes.iter().map(|&b| b as u8).collect();
    to_hex_formatted(&unsigned)
}
