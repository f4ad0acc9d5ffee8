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

//! Side channel for diagnostics that must not interrupt the caller.

use log::error;
use std::fmt;

/// What the user was doing when an error happened.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum UserAction {
    CheckForNewAppVersion,
}

impl fmt::Display for UserAction {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            UserAction::CheckForNewAppVersion => f.write_str("check for new app version"),
        }
    }
}

/// A structured error record handed to a [`Reporter`].
#[derive(Debug)]
pub struct ErrorInfo {
    /// The underlying failure.
    pub cause: anyhow::Error,
    /// The context the failure happened in.
    pub user_action: UserAction,
    /// Short human-readable description of the failed request.
    pub request: String,
}

impl ErrorInfo {
    pub fn new(
        cause: impl Into<anyhow::Error>,
        user_action: UserAction,
        request: impl Into<String>,
    ) -> Self {
        Self { cause: cause.into(), user_action, request: request.into() }
    }
}

impl fmt::Display for ErrorInfo {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} while trying to {}: {:#}", self.request, self.user_action, self.cause)
    }
}

/// Receives error records. Reporting is fire-and-forget.
pub trait Reporter {
    fn report(&self, info: ErrorInfo);
}

impl<F: Fn(ErrorInfo)> Reporter for F {
    fn report(&self, info: ErrorInfo) {
        self(info)
    }
}

/// Writes error records to the log.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogReporter;

impl Reporter for LogReporter {
    fn report(&self, info: ErrorInfo) {
        error!("{}", info);
    }
}
