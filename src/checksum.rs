//! Datastream checksums in the algorithms Fedora supports.
//!
//! Digests are lowercase hex, which is what Fedora reports in
//! `dsChecksum`. Files and readers are hashed in chunks so large managed
//! content never has to sit in memory.

use crate::utils::error::{FedoraError, Result};
use md5::Md5;
use sha1::Sha1;
use sha2::{Digest, Sha256, Sha384, Sha512};
use std::fmt;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::str::FromStr;

const BUF_SIZE: usize = 64 * 1024;

/// Fedora 用來表示「沒有 checksum」的值
pub const NO_CHECKSUM: &str = "none";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ChecksumType {
    #[default]
    Md5,
    Sha1,
    Sha256,
    Sha384,
    Sha512,
    Disabled,
}

impl ChecksumType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChecksumType::Md5 => "MD5",
            ChecksumType::Sha1 => "SHA-1",
            ChecksumType::Sha256 => "SHA-256",
            ChecksumType::Sha384 => "SHA-384",
            ChecksumType::Sha512 => "SHA-512",
            ChecksumType::Disabled => "DISABLED",
        }
    }

    pub fn is_enabled(&self) -> bool {
        !matches!(self, ChecksumType::Disabled)
    }

    pub fn hasher(&self) -> Option<ChecksumHasher> {
        let hasher = match self {
            ChecksumType::Md5 => ChecksumHasher::Md5(Md5::new()),
            ChecksumType::Sha1 => ChecksumHasher::Sha1(Sha1::new()),
            ChecksumType::Sha256 => ChecksumHasher::Sha256(Sha256::new()),
            ChecksumType::Sha384 => ChecksumHasher::Sha384(Sha384::new()),
            ChecksumType::Sha512 => ChecksumHasher::Sha512(Sha512::new()),
            ChecksumType::Disabled => return None,
        };
        Some(hasher)
    }
}

impl fmt::Display for ChecksumType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChecksumType {
    type Err = FedoraError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "MD5" => Ok(ChecksumType::Md5),
            "SHA-1" | "SHA1" => Ok(ChecksumType::Sha1),
            "SHA-256" | "SHA256" => Ok(ChecksumType::Sha256),
            "SHA-384" | "SHA384" => Ok(ChecksumType::Sha384),
            "SHA-512" | "SHA512" => Ok(ChecksumType::Sha512),
            "DISABLED" | "" => Ok(ChecksumType::Disabled),
            other => Err(FedoraError::InvalidConfigValueError {
                field: "checksum_type".to_string(),
                value: other.to_string(),
                reason: "Expected one of MD5, SHA-1, SHA-256, SHA-384, SHA-512, DISABLED"
                    .to_string(),
            }),
        }
    }
}

/// Incremental hasher for one of the supported algorithms.
pub enum ChecksumHasher {
    Md5(Md5),
    Sha1(Sha1),
    Sha256(Sha256),
    Sha384(Sha384),
    Sha512(Sha512),
}

impl ChecksumHasher {
    pub fn update(&mut self, data: &[u8]) {
        match self {
            ChecksumHasher::Md5(h) => h.update(data),
            ChecksumHasher::Sha1(h) => h.update(data),
            ChecksumHasher::Sha256(h) => h.update(data),
            ChecksumHasher::Sha384(h) => h.update(data),
            ChecksumHasher::Sha512(h) => h.update(data),
        }
    }

    pub fn finalize_hex(self) -> String {
        match self {
            ChecksumHasher::Md5(h) => hex::encode(h.finalize()),
            ChecksumHasher::Sha1(h) => hex::encode(h.finalize()),
            ChecksumHasher::Sha256(h) => hex::encode(h.finalize()),
            ChecksumHasher::Sha384(h) => hex::encode(h.finalize()),
            ChecksumHasher::Sha512(h) => hex::encode(h.finalize()),
        }
    }
}

/// Digest of an in-memory buffer; `None` when checksums are disabled.
pub fn digest_bytes(kind: ChecksumType, data: &[u8]) -> Option<String> {
    let mut hasher = kind.hasher()?;
    hasher.update(data);
    Some(hasher.finalize_hex())
}

pub fn digest_reader<R: Read>(kind: ChecksumType, mut reader: R) -> Result<Option<String>> {
    let Some(mut hasher) = kind.hasher() else {
        return Ok(None);
    };
    let mut buf = vec![0u8; BUF_SIZE];
    loop {
        let n = reader.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(Some(hasher.finalize_hex()))
}

pub fn digest_path(kind: ChecksumType, path: &Path) -> Result<Option<String>> {
    let file = File::open(path)?;
    digest_reader(kind, file)
}

/// True when a recorded checksum value actually carries a digest.
pub fn has_checksum(value: Option<&str>) -> bool {
    match value {
        Some(v) => {
            let v = v.trim();
            !v.is_empty() && !v.eq_ignore_ascii_case(NO_CHECKSUM)
        }
        None => false,
    }
}

/// Case-insensitive comparison of two hex digests.
pub fn checksums_match(expected: &str, actual: &str) -> bool {
    expected.trim().eq_ignore_ascii_case(actual.trim())
}
