//! Makes sure a pandoc executable is available before conversion.
//!
//! Tries the configured executable, then a previously installed copy, and
//! finally downloads a pinned pandoc release into the install directory.

use slides_core::{Config, Error, Result};
use std::ffi::OsStr;
use std::fs::{self, File};
use std::io::{self, Cursor, Read};
use std::path::{Path, PathBuf};
use std::process::Command;

/// Pandoc release downloaded when none is installed.
pub const PANDOC_VERSION: &str = "3.1.11";

/// Where pandoc release archives are published.
pub const RELEASE_BASE_URL: &str = "https://github.com/jgm/pandoc/releases/download";

/// Name of the pandoc executable on this platform.
#[cfg(windows)]
const BINARY_NAME: &str = "pandoc.exe";
#[cfg(not(windows))]
const BINARY_NAME: &str = "pandoc";

/// Run `<binary> --version` and return the first output line.
pub fn pandoc_version(binary: &Path) -> Result<String> {
    let output = Command::new(binary)
        .arg("--version")
        .output()
        .map_err(|e| Error::Conversion(format!("failed to run {}: {}", binary.display(), e)))?;

    if !output.status.success() {
        return Err(Error::Conversion(format!(
            "{} --version exited with {}",
            binary.display(),
            output.status
        )));
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    Ok(stdout.lines().next().unwrap_or_default().trim().to_string())
}

/// Archive format of a release asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveKind {
    /// Gzip-compressed tarball (Linux).
    TarGz,
    /// Zip archive (macOS, Windows).
    Zip,
}

/// A downloadable pandoc release.
#[derive(Debug, Clone)]
pub struct PandocRelease {
    version: String,
    base_url: String,
}

impl Default for PandocRelease {
    fn default() -> Self {
        Self {
            version: PANDOC_VERSION.to_string(),
            base_url: RELEASE_BASE_URL.to_string(),
        }
    }
}

impl PandocRelease {
    /// Create a release descriptor for `version` served from `base_url`.
    pub fn new(version: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            version: version.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Asset file name and archive kind for an OS/architecture pair.
    ///
    /// Uses the names of `std::env::consts::{OS, ARCH}`.
    pub fn asset_for(&self, os: &str, arch: &str) -> Option<(String, ArchiveKind)> {
        let v = &self.version;
        let asset = match (os, arch) {
            ("linux", "x86_64") => (format!("pandoc-{v}-linux-amd64.tar.gz"), ArchiveKind::TarGz),
            ("linux", "aarch64") => (format!("pandoc-{v}-linux-arm64.tar.gz"), ArchiveKind::TarGz),
            ("macos", "x86_64") => (format!("pandoc-{v}-x86_64-macOS.zip"), ArchiveKind::Zip),
            ("macos", "aarch64") => (format!("pandoc-{v}-arm64-macOS.zip"), ArchiveKind::Zip),
            ("windows", "x86_64") => (format!("pandoc-{v}-windows-x86_64.zip"), ArchiveKind::Zip),
            _ => return None,
        };
        Some(asset)
    }

    /// Download URL of an asset.
    pub fn url(&self, asset: &str) -> String {
        format!("{}/{}/{}", self.base_url, self.version, asset)
    }
}

/// Precondition check that locates or installs pandoc.
#[derive(Debug, Clone)]
pub struct PandocBootstrap {
    configured: PathBuf,
    install_dir: PathBuf,
    release: PandocRelease,
}

impl PandocBootstrap {
    /// Create a bootstrap for the configured executable and install directory.
    pub fn new(configured: impl Into<PathBuf>, install_dir: impl Into<PathBuf>) -> Self {
        Self {
            configured: configured.into(),
            install_dir: install_dir.into(),
            release: PandocRelease::default(),
        }
    }

    /// Create a bootstrap from the process configuration.
    ///
    /// Without an explicit install directory, pandoc goes under the
    /// platform's local data directory.
    pub fn from_config(config: &Config) -> Result<Self> {
        let install_dir = match &config.pandoc_install_dir {
            Some(dir) => dir.clone(),
            None => dirs::data_local_dir()
                .map(|d| d.join("slidesgpt").join("pandoc").join("bin"))
                .ok_or_else(|| {
                    Error::Bootstrap("Could not determine a directory to install pandoc".into())
                })?,
        };
        Ok(Self::new(&config.pandoc, install_dir))
    }

    /// Download from a different release.
    pub fn with_release(mut self, release: PandocRelease) -> Self {
        self.release = release;
        self
    }

    /// Path a downloaded pandoc is installed to.
    pub fn installed_path(&self) -> PathBuf {
        self.install_dir.join(BINARY_NAME)
    }

    /// Return a working pandoc executable, installing one if needed.
    pub fn ensure_available(&self) -> Result<PathBuf> {
        if let Ok(version) = pandoc_version(&self.configured) {
            log::info!("Using {} ({})", self.configured.display(), version);
            return Ok(self.configured.clone());
        }

        let installed = self.installed_path();
        if installed.is_file() {
            if let Ok(version) = pandoc_version(&installed) {
                log::info!("Using {} ({})", installed.display(), version);
                return Ok(installed);
            }
        }

        log::info!("Pandoc not found. Downloading pandoc...");
        match self.install() {
            Ok(path) => {
                log::info!("Successfully downloaded pandoc to {}", path.display());
                Ok(path)
            }
            Err(e) => {
                let reason = match e {
                    Error::Bootstrap(reason) => reason,
                    other => other.to_string(),
                };
                log::error!("Failed to download pandoc: {}", reason);
                Err(Error::Bootstrap(format!("Failed to download pandoc: {}", reason)))
            }
        }
    }

    /// Download the release for this platform and install its executable.
    fn install(&self) -> Result<PathBuf> {
        let (os, arch) = (std::env::consts::OS, std::env::consts::ARCH);
        let (asset, kind) = self
            .release
            .asset_for(os, arch)
            .ok_or_else(|| Error::Bootstrap(format!("no pandoc release for {}/{}", os, arch)))?;

        let url = self.release.url(&asset);
        log::info!("Fetching {}", url);
        // No request timeout: release archives are tens of MB.
        let http = reqwest::blocking::Client::builder()
            .timeout(None)
            .build()
            .map_err(|e| Error::Bootstrap(format!("failed to build HTTP client: {}", e)))?;
        let bytes = http
            .get(&url)
            .send()
            .and_then(|r| r.error_for_status())
            .and_then(|r| r.bytes())
            .map_err(|e| Error::Bootstrap(format!("download of {} failed: {}", url, e)))?;

        fs::create_dir_all(&self.install_dir)?;
        let dest = self.installed_path();
        extract_binary(&bytes, kind, &dest)?;
        make_executable(&dest)?;

        pandoc_version(&dest)?;
        Ok(dest)
    }
}

/// Copy the pandoc executable out of a release archive to `dest`.
fn extract_binary(bytes: &[u8], kind: ArchiveKind, dest: &Path) -> Result<()> {
    let found = match kind {
        ArchiveKind::TarGz => extract_from_tar_gz(bytes, dest)?,
        ArchiveKind::Zip => extract_from_zip(bytes, dest)?,
    };

    if found {
        Ok(())
    } else {
        Err(Error::Bootstrap(format!(
            "{} not found in release archive",
            BINARY_NAME
        )))
    }
}

fn extract_from_tar_gz(bytes: &[u8], dest: &Path) -> Result<bool> {
    let mut archive = tar::Archive::new(flate2::read::GzDecoder::new(Cursor::new(bytes)));

    for entry in archive.entries()? {
        let mut entry = entry?;
        if !entry.header().entry_type().is_file() {
            continue;
        }
        let path = entry.path()?.into_owned();
        if path.file_name() == Some(OsStr::new(BINARY_NAME)) {
            write_entry(&mut entry, dest)?;
            return Ok(true);
        }
    }

    Ok(false)
}

fn extract_from_zip(bytes: &[u8], dest: &Path) -> Result<bool> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes))
        .map_err(|e| Error::Bootstrap(format!("invalid zip archive: {}", e)))?;

    for i in 0..archive.len() {
        let mut file = archive
            .by_index(i)
            .map_err(|e| Error::Bootstrap(format!("invalid zip entry: {}", e)))?;
        if file.is_dir() {
            continue;
        }
        if Path::new(file.name()).file_name() == Some(OsStr::new(BINARY_NAME)) {
            write_entry(&mut file, dest)?;
            return Ok(true);
        }
    }

    Ok(false)
}

fn write_entry<R: Read>(reader: &mut R, dest: &Path) -> Result<()> {
    let mut out = File::create(dest)?;
    io::copy(reader, &mut out)?;
    Ok(())
}

#[cfg(unix)]
fn make_executable(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o755))?;
    Ok(())
}

#[cfg(not(unix))]
fn make_executable(_path: &Path) -> Result<()> {
    Ok(())
}
