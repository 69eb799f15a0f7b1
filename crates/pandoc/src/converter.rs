//! Markdown to PPTX conversion through the pandoc executable.

use slides_core::{DocumentConverter, Error, Result};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Heading level that starts a new slide.
const SLIDE_LEVEL: u8 = 2;

/// Converter that shells out to pandoc.
#[derive(Debug, Clone)]
pub struct PandocConverter {
    binary: PathBuf,
    template: Option<PathBuf>,
}

impl PandocConverter {
    /// Create a converter using the given pandoc executable.
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
            template: None,
        }
    }

    /// Use `template` as the style reference when it exists at conversion time.
    pub fn with_template(mut self, template: impl Into<PathBuf>) -> Self {
        self.template = Some(template.into());
        self
    }

    /// The pandoc executable.
    pub fn binary(&self) -> &Path {
        &self.binary
    }

    /// Build the pandoc argument list for one conversion.
    pub fn build_args(&self, markdown_file: &Path, output_file: &Path) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec![
            "--from=markdown".into(),
            "--to=pptx".into(),
            format!("--slide-level={}", SLIDE_LEVEL).into(),
            prefixed("--output=", output_file),
        ];

        if let Some(template) = self.template.as_deref().filter(|t| t.is_file()) {
            args.push(prefixed("--reference-doc=", template));
        }

        args.push(positional(markdown_file));
        args
    }
}

impl DocumentConverter for PandocConverter {
    fn convert(&self, markdown_file: &Path, output_file: &Path) -> Result<()> {
        let args = self.build_args(markdown_file, output_file);
        log::debug!("Running {} {:?}", self.binary.display(), args);

        let output = Command::new(&self.binary)
            .args(&args)
            .output()
            .map_err(|e| {
                Error::Conversion(format!("failed to run {}: {}", self.binary.display(), e))
            })?;

        let stderr = String::from_utf8_lossy(&output.stderr);
        if !output.status.success() {
            return Err(Error::Conversion(format!(
                "pandoc exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }

        if !stderr.trim().is_empty() {
            log::warn!("pandoc: {}", stderr.trim());
        }

        Ok(())
    }
}

/// A path argument that pandoc cannot mistake for an option.
fn positional(path: &Path) -> OsString {
    if path.is_relative() && path.as_os_str().to_string_lossy().starts_with('-') {
        Path::new(".").join(path).into_os_string()
    } else {
        path.into()
    }
}

fn prefixed(flag: &str, path: &Path) -> OsString {
    let mut arg = OsString::from(flag);
    arg.push(path);
    arg
}
