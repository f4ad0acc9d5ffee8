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

//! Access to the installed package's signing certificates.

use std::collections::HashMap;
use thiserror::Error;

/// One signing certificate of a package, as reported by the package manager.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Signature(Box<[u8]>);

impl Signature {
    pub fn new(der: impl Into<Box<[u8]>>) -> Self {
        Self(der.into())
    }

    /// Returns the DER-encoded certificate bytes.
    pub fn to_bytes(&self) -> &[u8] {
        &self.0
    }
}

/// Errors from querying package metadata.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PackageLookupError {
    /// No package with the given name is installed.
    #[error("Package not found: {0}")]
    NameNotFound(String),
}

/// Source of package metadata, usually backed by the platform package manager.
pub trait PackageInfoProvider {
    /// Name of the package this code is running in.
    fn package_name(&self) -> &str;

    /// Signing certificates of `package_name`, in the order the platform lists them.
    fn signatures(&self, package_name: &str) -> Result<Vec<Signature>, PackageLookupError>;
}

/// In-memory package table.
#[derive(Clone, Debug, Default)]
pub struct InstalledPackages {
    current: String,
    packages: HashMap<String, Vec<Signature>>,
}

impl InstalledPackages {
    /// Creates an empty table whose running package is `current`. `current` is not installed
    /// until [`InstalledPackages::install`] is called for it.
    pub fn new(current: impl Into<String>) -> Self {
        Self { current: current.into(), packages: HashMap::new() }
    }

    /// Adds or replaces a package and its signing certificates.
    pub fn install(&mut self, name: impl Into<String>, signatures: Vec<Signature>) -> &mut Self {
        self.packages.insert(name.into(), signatures);
        self
    }
}

impl PackageInfoProvider for InstalledPackages {
    fn package_name(&self) -> &str {
        &self.current
    }

    fn signatures(&self, package_name: &str) -> Result<Vec<Signature>, PackageLookupError> {
        self.packages
            .get(package_name)
            .cloned()
            .ok_or_else(|| PackageLookupError::NameNotFound(package_name.to_owned()))
    }
}
