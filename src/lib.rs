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

//! Checks used by the "check for new version" flow: whether the installed package is signed
//! with the release key, and when the next update check is due.

mod config;
mod expiry;
mod fingerprint;
mod package;
mod report;
#[allow(dead_code)]
pub mod testing;
mod verifier;

pub use config::Config;
pub use expiry::{
    coerce_update_check_expiry, is_last_update_check_expired, is_last_update_check_expired_at,
    ExpiryFormatError, ExpiryWindow, DEFAULT_MAX_HOURS, DEFAULT_MIN_HOURS,
};
pub use fingerprint::{
    to_hex_formatted, to_hex_formatted_signed, Fingerprint, FingerprintParseError,
};
pub use package::{InstalledPackages, PackageInfoProvider, PackageLookupError, Signature};
pub use report::{ErrorInfo, LogReporter, Reporter, UserAction};
pub use verifier::{ReleaseVerifier, VerificationError, RELEASE_CERT_SHA1};
