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

//! Decides whether the running package is an official release build.

use log::warn;
use openssl::error::ErrorStack;
use thiserror::Error;

use crate::fingerprint::Fingerprint;
use crate::package::{PackageInfoProvider, PackageLookupError};
use crate::report::{ErrorInfo, Reporter, UserAction};

/// SHA-1 fingerprint of the certificate that signs release builds.
pub const RELEASE_CERT_SHA1: &str = "7F:46:0D:D0:6A:2D:A0:6B:57:B5:2C:ED:73:06:B7:87:43:90:66:A9";

/// Errors from computing the signing certificate fingerprint.
#[derive(Debug, Error)]
pub enum VerificationError {
    /// The package manager doesn't know the running package.
    #[error("Package lookup failed")]
    PackageLookupFailed(#[from] PackageLookupError),
    /// The first signature is not a valid X.509 certificate.
    #[error("Cannot parse signing certificate")]
    CertificateParseFailed(#[source] ErrorStack),
    /// SHA-1 is not available from the crypto library.
    #[error("SHA-1 digest unavailable")]
    DigestUnavailable(#[source] ErrorStack),
    /// The certificate could not be encoded back to DER.
    #[error("Cannot encode signing certificate")]
    EncodingFailed(#[source] ErrorStack),
}

impl VerificationError {
    /// Short description of the failed request, as shown to the user.
    pub fn reason(&self) -> &'static str {
        match self {
            VerificationError::PackageLookupFailed(_) => "Could not find package info",
            VerificationError::CertificateParseFailed(_) => "Certificate error",
            VerificationError::DigestUnavailable(_) | VerificationError::EncodingFailed(_) => {
                "Could not retrieve SHA1 key"
            }
        }
    }
}

/// Compares the running package's signing certificate with the release certificate.
pub struct ReleaseVerifier<P, R> {
    provider: P,
    reporter: R,
    expected: Fingerprint,
}

impl<P: PackageInfoProvider, R: Reporter> ReleaseVerifier<P, R> {
    /// Creates a verifier expecting [`RELEASE_CERT_SHA1`].
    pub fn new(provider: P, reporter: R) -> Self {
        Self { provider, reporter, expected: Fingerprint::from_formatted(RELEASE_CERT_SHA1) }
    }

    /// Replaces the expected fingerprint.
    pub fn with_expected_fingerprint(mut self, expected: Fingerprint) -> Self {
        self.expected = expected;
        self
    }

    pub fn expected_fingerprint(&self) -> &Fingerprint {
        &self.expected
    }

    /// Returns true if the first signing certificate of the running package has the expected
    /// fingerprint.
    ///
    /// Failures are reported and count as "not a release build"; they are never returned.
    pub fn is_release_apk(&self) -> bool {
        let fingerprint = self.certificate_fingerprint().unwrap_or_else(|e| {
            warn!("Cannot compute signing certificate fingerprint: {:?}", e);
            let request = e.reason();
            self.reporter.report(ErrorInfo::new(e, UserAction::CheckForNewAppVersion, request));
            Fingerprint::empty()
        });
        !fingerprint.is_empty() && fingerprint == self.expected
    }

    /// Computes the SHA-1 fingerprint of the running package's first signing certificate.
    ///
    /// A package without signatures has the empty fingerprint.
    pub fn certificate_fingerprint(&self) -> Result<Fingerprint, VerificationError> {
        let signatures = self.provider.signatures(self.provider.package_name())?;
        match signatures.first() {
            Some(signature) => Fingerprint::of_certificate(signature.to_bytes()),
            None => Ok(Fingerprint::empty()),
        }
    }
}
