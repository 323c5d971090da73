//! Firmware update source backed by GitHub releases.
//!
//! Implements [`UpdateSourcePort`]:
//!
//! - `latest` fetches the `releases/latest` document over HTTPS and picks
//!   this image's asset out of it (see [`release::select`]).
//! - `install` streams the asset into the inactive OTA slot in 4 KiB chunks
//!   with the `esp-ota` crate, verifies it and switches the boot partition.
//!   Nothing is made bootable unless every byte was written and
//!   `finalize()` accepted the image.
//!
//! On host targets the source is scripted: tests stage a release document
//! and choose whether the install succeeds.

use log::info;
#[cfg(target_os = "espidf")]
use log::warn;

use crate::app::ports::{ReleaseInfo, UpdateError, UpdateSourcePort};

use super::release;

/// Release endpoint baked in at build time.
pub const DEFAULT_RELEASES_URL: &str = match option_env!("LIGHTWORKS_RELEASES_URL") {
    Some(url) => url,
    None => "https://api.github.com/repos/metar-lightworks/firmware/releases/latest",
};

/// Download buffer for the OTA stream.
pub const OTA_CHUNK_SIZE: usize = 4096;

/// Release documents larger than this are rejected.
pub const MAX_RELEASE_DOC: usize = 64 * 1024;

/// Largest image that fits one OTA slot of the default 4 MB layout.
pub const MAX_IMAGE_SIZE: u32 = 0x1E_0000;

#[cfg(target_os = "espidf")]
const HTTP_TIMEOUT_SECS: u64 = 30;

pub struct GithubUpdateSource {
    releases_url: String,
    running_version: &'static str,
    #[cfg(not(target_os = "espidf"))]
    sim: SimState,
}

#[cfg(not(target_os = "espidf"))]
#[derive(Debug, Default)]
struct SimState {
    body: Option<Vec<u8>>,
    install_error: Option<UpdateError>,
    installed: Vec<ReleaseInfo>,
}

impl GithubUpdateSource {
    pub fn new(releases_url: impl Into<String>, running_version: &'static str) -> Self {
        Self {
            releases_url: releases_url.into(),
            running_version,
            #[cfg(not(target_os = "espidf"))]
            sim: SimState::default(),
        }
    }

    pub fn releases_url(&self) -> &str {
        &self.releases_url
    }

    // ── Simulation controls ───────────────────────────────────

    /// Serve `body` as the release document (simulation only).
    #[cfg(not(target_os = "espidf"))]
    pub fn stage_release_doc(&mut self, body: &[u8]) {
        self.sim.body = Some(body.to_vec());
    }

    /// Make the next installs fail with `err` (simulation only).
    #[cfg(not(target_os = "espidf"))]
    pub fn fail_install(&mut self, err: UpdateError) {
        self.sim.install_error = Some(err);
    }

    /// Releases "written to flash" so far (simulation only).
    #[cfg(not(target_os = "espidf"))]
    pub fn installed(&self) -> &[ReleaseInfo] {
        &self.sim.installed
    }

    // ── ESP-IDF transport ─────────────────────────────────────

    /// Run `f` over the body of a GET to `url`.
    #[cfg(target_os = "espidf")]
    fn fetch_with<T>(
        url: &str,
        f: impl FnOnce(&mut dyn FnMut(&mut [u8]) -> Result<usize, UpdateError>, Option<u64>) -> Result<T, UpdateError>,
    ) -> Result<T, UpdateError> {
        use core::time::Duration;
        use embedded_svc::http::client::Client as HttpClient;
        use embedded_svc::http::{Headers, Method, Status};
        use embedded_svc::io::Read;
        use esp_idf_svc::http::client::{Configuration as HttpClientConfiguration, EspHttpConnection};

        let conf = HttpClientConfiguration {
            timeout: Some(Duration::from_secs(HTTP_TIMEOUT_SECS)),
            crt_bundle_attach: Some(esp_idf_svc::sys::esp_crt_bundle_attach),
            buffer_size: Some(2048),
            follow_redirects_policy: esp_idf_svc::http::client::FollowRedirectsPolicy::FollowGetHead,
            ..Default::default()
        };
        let conn = EspHttpConnection::new(&conf).map_err(|e| {
            warn!("OTA: http client init failed: {:?}", e);
            UpdateError::Network
        })?;
        let mut client = HttpClient::wrap(conn);
        let headers = [
            ("User-Agent", "metar-lightworks"),
            ("Accept", "application/vnd.github+json"),
        ];
        let request = client
            .request(Method::Get, url, &headers)
            .map_err(|_| UpdateError::Network)?;
        let mut response = request.submit().map_err(|e| {
            warn!("OTA: GET {} failed: {:?}", url, e);
            UpdateError::Network
        })?;

        let status = response.status();
        if !(200..300).contains(&status) {
            return Err(UpdateError::HttpStatus(status));
        }
        let length = response
            .header("Content-Length")
            .and_then(|v| v.parse::<u64>().ok());

        let mut read = |buf: &mut [u8]| response.read(buf).map_err(|_| UpdateError::Network);
        f(&mut read, length)
    }
}

#[cfg(target_os = "espidf")]
impl UpdateSourcePort for GithubUpdateSource {
    fn latest(&mut self, asset_name: &str) -> Result<Option<ReleaseInfo>, UpdateError> {
        info!("OTA: fetching {}", self.releases_url);
        let body = Self::fetch_with(&self.releases_url, |read, _| {
            let mut body = Vec::new();
            let mut chunk = [0u8; 1024];
            loop {
                let n = read(&mut chunk)?;
                if n == 0 {
                    break;
                }
                if body.len() + n > MAX_RELEASE_DOC {
                    return Err(UpdateError::BadSize);
                }
                body.extend_from_slice(&chunk[..n]);
            }
            Ok(body)
        })?;
        release::select(&body, asset_name, self.running_version)
    }

    fn install(&mut self, release: &ReleaseInfo) -> Result<(), UpdateError> {
        if release.size > MAX_IMAGE_SIZE {
            return Err(UpdateError::BadSize);
        }
        info!("OTA: downloading {}", release.url);

        Self::fetch_with(&release.url, |read, length| {
            if length.is_some_and(|len| len == 0 || len > u64::from(MAX_IMAGE_SIZE)) {
                return Err(UpdateError::BadSize);
            }

            let mut update = esp_ota::OtaUpdate::begin().map_err(|e| {
                warn!("esp-ota begin failed: {:?}", e);
                UpdateError::Write
            })?;

            // Dropping `update` before finalize aborts the session.
            let mut chunk = [0u8; OTA_CHUNK_SIZE];
            let mut written: u64 = 0;
            loop {
                let n = read(&mut chunk)?;
                if n == 0 {
                    break;
                }
                written += n as u64;
                if written > u64::from(MAX_IMAGE_SIZE) {
                    return Err(UpdateError::BadSize);
                }
                update.write(&chunk[..n]).map_err(|e| {
                    warn!("esp-ota write failed: {:?}", e);
                    UpdateError::Write
                })?;
            }
            if written == 0 || length.is_some_and(|len| len != written) {
                warn!("OTA: short download ({} bytes)", written);
                return Err(UpdateError::Network);
            }

            let mut completed = update.finalize().map_err(|e| {
                warn!("esp-ota finalize failed: {:?}", e);
                UpdateError::Verify
            })?;
            completed.set_as_boot_partition().map_err(|e| {
                warn!("esp-ota set_as_boot_partition failed: {:?}", e);
                UpdateError::BootPartition
            })?;
            info!("OTA: {} bytes written, boot partition switched", written);
            Ok(())
        })
    }
}

#[cfg(not(target_os = "espidf"))]
impl UpdateSourcePort for GithubUpdateSource {
    fn latest(&mut self, asset_name: &str) -> Result<Option<ReleaseInfo>, UpdateError> {
        info!("OTA(sim): latest from {}", self.releases_url);
        match &self.sim.body {
            Some(body) => release::select(body, asset_name, self.running_version),
            None => Ok(None),
        }
    }

    fn install(&mut self, release: &ReleaseInfo) -> Result<(), UpdateError> {
        if release.size > MAX_IMAGE_SIZE {
            return Err(UpdateError::BadSize);
        }
        if let Some(err) = self.sim.install_error {
            return Err(err);
        }
        info!("OTA(sim): installed {}", release.version);
        self.sim.installed.push(release.clone());
        Ok(())
    }
}
