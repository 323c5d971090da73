//! GitHub "latest release" metadata.
//!
//! The update source downloads `releases/latest` as JSON and hands the body
//! here.  Only `tag_name` and the `assets` list are read; everything else
//! in the document is ignored.

use core::cmp::Ordering;

use serde::Deserialize;

use crate::app::ports::{ReleaseInfo, UpdateError, VersionTag};

#[derive(Debug, Deserialize)]
struct ReleaseDoc {
    tag_name: String,
    #[serde(default)]
    assets: Vec<AssetDoc>,
}

#[derive(Debug, Deserialize)]
struct AssetDoc {
    name: String,
    browser_download_url: String,
    #[serde(default)]
    size: u64,
}

/// Numeric `major.minor.patch`, with an optional leading `v`.
///
/// Missing components count as zero and a `-suffix` or `+build` tail is
/// ignored, so `v1.2` and `1.2.0-rc1` both read as `1.2.0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Version(pub u32, pub u32, pub u32);

impl Version {
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        let raw = raw.strip_prefix(['v', 'V']).unwrap_or(raw);
        let core = raw.split(['-', '+']).next()?;
        if core.is_empty() {
            return None;
        }
        let mut parts = [0u32; 3];
        for (i, piece) in core.split('.').enumerate() {
            if i >= parts.len() {
                return None;
            }
            parts[i] = piece.parse().ok()?;
        }
        Some(Self(parts[0], parts[1], parts[2]))
    }
}

/// `Some(Greater)` when `candidate` is newer than `running`.
pub fn compare(candidate: &str, running: &str) -> Option<Ordering> {
    Some(Version::parse(candidate)?.cmp(&Version::parse(running)?))
}

/// Pick the asset named `asset_name` out of a release document.
///
/// `Ok(None)` when the published tag is not strictly newer than
/// `running_version`.  A newer release without our asset is
/// [`UpdateError::AssetMissing`].
pub fn select(
    body: &[u8],
    asset_name: &str,
    running_version: &str,
) -> Result<Option<ReleaseInfo>, UpdateError> {
    let doc: ReleaseDoc = serde_json::from_slice(body).map_err(|_| UpdateError::Parse)?;

    match compare(&doc.tag_name, running_version) {
        Some(Ordering::Greater) => {}
        Some(_) => return Ok(None),
        None => return Err(UpdateError::Parse),
    }

    let asset = doc
        .assets
        .into_iter()
        .find(|a| a.name == asset_name)
        .ok_or(UpdateError::AssetMissing)?;

    let mut version = VersionTag::new();
    version
        .push_str(doc.tag_name.trim())
        .map_err(|_| UpdateError::Parse)?;

    Ok(Some(ReleaseInfo {
        version,
        url: asset.browser_download_url,
        size: u32::try_from(asset.size).map_err(|_| UpdateError::BadSize)?,
    }))
}
