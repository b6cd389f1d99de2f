use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Length of a backend-issued content hash, in characters.
pub const HASH_LEN: usize = 128;

/// Opaque identifier the backend assigns to a stored EQ definition.
///
/// The hash is the sole lookup key for every subsequent request; the only
/// client-side validity check is its length.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct ContentHash(String);

impl ContentHash {
    pub fn parse(raw: &str) -> Result<Self, HashError> {
        let len = raw.chars().count();
        if len != HASH_LEN {
            return Err(HashError { len });
        }
        Ok(Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for ContentHash {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        ContentHash::parse(&raw).map_err(serde::de::Error::custom)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HashError {
    pub len: usize,
}

impl fmt::Display for HashError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "content hash length is {} (expected {})", self.len, HASH_LEN)
    }
}

impl std::error::Error for HashError {}

/// What the body of an `/eq/target/*` response looks like.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseShape {
    /// A single JSON string.
    Text,
    /// A two-element sequence `[marker, text]`; the marker is opaque to the
    /// client and only the text is used.
    MarkedText,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MimeCategory {
    Plain,
    Xml,
}

impl MimeCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            MimeCategory::Plain => "plain",
            MimeCategory::Xml => "xml",
        }
    }
}

/// A conversion target supported by the backend.
///
/// Each variant knows its endpoint suffix, response shape, download
/// extension and how many content hashes a request carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetFormat {
    Apo,
    Aupreset,
    RmeTotalmixChannel,
    RmeTotalmixRoom,
}

impl TargetFormat {
    pub const ALL: [TargetFormat; 4] = [
        TargetFormat::Apo,
        TargetFormat::Aupreset,
        TargetFormat::RmeTotalmixChannel,
        TargetFormat::RmeTotalmixRoom,
    ];

    pub fn endpoint(&self) -> &'static str {
        match self {
            TargetFormat::Apo => "apo",
            TargetFormat::Aupreset => "aupreset",
            TargetFormat::RmeTotalmixChannel => "rme_totalmix_channel",
            TargetFormat::RmeTotalmixRoom => "rme_totalmix_room",
        }
    }

    pub fn response_shape(&self) -> ResponseShape {
        match self {
            TargetFormat::Aupreset => ResponseShape::MarkedText,
            _ => ResponseShape::Text,
        }
    }

    /// Download extension, dot included. APO downloads keep the source
    /// filename untouched.
    pub fn extension(&self) -> Option<&'static str> {
        match self {
            TargetFormat::Apo => None,
            TargetFormat::Aupreset => Some(".aupreset"),
            TargetFormat::RmeTotalmixChannel => Some(".tmeq"),
            TargetFormat::RmeTotalmixRoom => Some(".tmreq"),
        }
    }

    pub fn mime(&self) -> MimeCategory {
        match self {
            TargetFormat::Apo => MimeCategory::Plain,
            _ => MimeCategory::Xml,
        }
    }

    /// Room correction is built from a left and a right channel EQ.
    pub fn needs_pair(&self) -> bool {
        matches!(self, TargetFormat::RmeTotalmixRoom)
    }
}

impl FromStr for TargetFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "apo" => Ok(TargetFormat::Apo),
            "aupreset" => Ok(TargetFormat::Aupreset),
            "rme_totalmix_channel" | "rme-totalmix-channel" | "tmeq" => {
                Ok(TargetFormat::RmeTotalmixChannel)
            }
            "rme_totalmix_room" | "rme-totalmix-room" | "tmreq" => {
                Ok(TargetFormat::RmeTotalmixRoom)
            }
            other => Err(format!("unknown target format {other:?}")),
        }
    }
}

impl fmt::Display for TargetFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.endpoint())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UploadStatus {
    Ok,
    Failed,
}

/// Per-file element of the `/eq/upload` response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadOutcome {
    pub status: UploadStatus,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub hash: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

/// One EQ offered for a speaker by `/speaker/{name}/eqdata`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpeakerEq {
    pub name: String,
    pub hash: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub eq: Option<String>,
}

/// Combined frequency response of an EQ, from `/eq/graph_spl`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphSpl {
    pub freq: Vec<f64>,
    pub spl: Vec<f64>,
}

/// Per-stage breakdown of an EQ, from `/eq/graph_spl_details`.
///
/// The backend keys the stage map by stringified stage index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphSplDetails {
    pub freq: Vec<f64>,
    pub spl: BTreeMap<String, Vec<f64>>,
}

impl GraphSplDetails {
    pub fn stage(&self, index: usize) -> Option<&[f64]> {
        self.spl.get(&index.to_string()).map(Vec::as_slice)
    }
}
