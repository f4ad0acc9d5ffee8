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

//! JSON configuration of the release checks.

use anyhow::{ensure, Context, Result};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::io::{Read, Write};

use crate::expiry::{ExpiryFormatError, ExpiryWindow};
use crate::fingerprint::Fingerprint;
use crate::package::PackageInfoProvider;
use crate::report::Reporter;
use crate::verifier::{ReleaseVerifier, RELEASE_CERT_SHA1};

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct Config {
    /// Fingerprint of the release signing certificate. Defaults to [`RELEASE_CERT_SHA1`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release_fingerprint: Option<Fingerprint>,
    /// Bounds of the next update check.
    #[serde(default)]
    pub expiry_window: ExpiryWindow,
}

impl Config {
    pub fn from_reader(reader: impl Read) -> Result<Self> {
        let config: Config =
            serde_json::from_reader(reader).context("Failed to parse release check config JSON")?;
        if let Some(fingerprint) = &config.release_fingerprint {
            ensure!(!fingerprint.is_empty(), "release_fingerprint must not be empty");
        }
        config.expiry_window.validate().context("Invalid expiry_window")?;
        Ok(config)
    }

    pub fn write_json(&self, writer: impl Write) -> Result<()> {
        serde_json::to_writer(writer, self).context("Failed to write release check config JSON")
    }

    /// The fingerprint release builds are expected to have.
    pub fn release_fingerprint(&self) -> Fingerprint {
        self.release_fingerprint
            .clone()
            .unwrap_or_else(|| Fingerprint::from_formatted(RELEASE_CERT_SHA1))
    }

    /// Builds a verifier that expects the configured release fingerprint.
    pub fn verifier<P: PackageInfoProvider, R: Reporter>(
        &self,
        provider: P,
        reporter: R,
    ) -> ReleaseVerifier<P, R> {
        ReleaseVerifier::new(provider, reporter)
            .with_expected_fingerprint(self.release_fingerprint())
    }

    /// Coerces an expiry hint into the configured window, relative to the current time.
    pub fn coerce_update_check_expiry(&self, hint: Option<&str>) -> Result<i64, ExpiryFormatError> {
        self.expiry_window.coerce(hint, Utc::now())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::assert_contains;

    #[test]
    fn empty_document_uses_defaults() {
        let config = Config::from_reader(&b"{}"[..]).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.release_fingerprint().as_str(), RELEASE_CERT_SHA1);
        assert_eq!(config.expiry_window, ExpiryWindow::default());
    }

    #[test]
    fn partial_window_keeps_other_default() {
        let config = Config::from_reader(&br#"{"expiry_window": {"max_hours": 24}}"#[..]).unwrap();
        assert_eq!(config.expiry_window, ExpiryWindow::new(6, 24).unwrap());
    }

    #[test]
    fn fingerprint_is_normalised() {
        let config = Config::from_reader(&br#"{"release_fingerprint": "ab:cd:ef"}"#[..]).unwrap();
        assert_eq!(config.release_fingerprint().as_str(), "AB:CD:EF");
    }

    #[test]
    fn malformed_fingerprint_is_rejected() {
        let err = Config::from_reader(&br#"{"release_fingerprint": "ABCDEF"}"#[..]).unwrap_err();
        assert_contains(&format!("{:#}", err), "Malformed fingerprint");
    }

    #[test]
    fn empty_fingerprint_is_rejected() {
        let err = Config::from_reader(&br#"{"release_fingerprint": ""}"#[..]).unwrap_err();
        assert_contains(&err.to_string(), "must not be empty");
    }

    #[test]
    fn empty_window_is_rejected() {
        let json = br#"{"expiry_window": {"min_hours": 48, "max_hours": 12}}"#;
        let err = Config::from_reader(&json[..]).unwrap_err();
        assert_contains(&format!("{:#}", err), "min_hours 48 > max_hours 12");
    }

    #[test]
    fn write_then_read_preserves_config() {
        let config = Config {
            release_fingerprint: Some("01:02:03".parse().unwrap()),
            expiry_window: ExpiryWindow::new(1, 3).unwrap(),
        };
        let mut json = Vec::new();
        config.write_json(&mut json).unwrap();
        assert_eq!(Config::from_reader(&json[..]).unwrap(), config);
    }
}
