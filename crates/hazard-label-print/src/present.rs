//! Opening generated documents for the user.

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use hazard_label::LabelError;

/// What a presented document is for.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DocumentKind {
    /// Self-printing page for the desktop print dialog.
    DesktopPrint,
    /// Stand-in for a thermal print when no agent is reachable.
    ThermalSimulation,
}

/// Generated HTML document ready to show.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Document {
    pub kind: DocumentKind,
    pub file_name: String,
    pub html: String,
}

/// Surface that shows documents to the user.
///
/// A presenter that cannot open a surface reports
/// [`LabelError::PopupBlocked`] with a remediation hint.
pub trait Presenter {
    fn present(&self, document: &Document) -> Result<(), LabelError>;
}

/// Writes documents under a directory and opens them with the platform
/// browser launcher.
#[derive(Clone, Debug)]
pub struct SystemPresenter {
    dir: PathBuf,
    open: bool,
    launcher: Vec<String>,
}

impl Default for SystemPresenter {
    fn default() -> Self {
        Self::new(std::env::temp_dir().join("hazard-label"))
    }
}

impl SystemPresenter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            open: true,
            launcher: platform_launcher()
                .iter()
                .map(|part| part.to_string())
                .collect(),
        }
    }

    /// Replace the platform launcher. The document path is appended to `command`.
    pub fn with_launcher<I, S>(mut self, command: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.launcher = command.into_iter().map(Into::into).collect();
        self
    }

    /// Write documents without launching a browser.
    pub fn write_only(mut self) -> Self {
        self.open = false;
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn write(&self, document: &Document) -> Result<PathBuf, LabelError> {
        std::fs::create_dir_all(&self.dir).map_err(|e| LabelError::Io {
            context: "present",
            message: format!("{}: {}", self.dir.display(), e),
        })?;
        let path = self.dir.join(&document.file_name);
        std::fs::write(&path, &document.html).map_err(|e| LabelError::Io {
            context: "present",
            message: format!("{}: {}", path.display(), e),
        })?;
        Ok(path)
    }
}

impl Presenter for SystemPresenter {
    fn present(&self, document: &Document) -> Result<(), LabelError> {
        let path = self.write(document)?;
        if !self.open {
            return Ok(());
        }
        match self.launch(&path) {
            Ok(()) => {
                log::debug!("opened {:?} document {}", document.kind, path.display());
                Ok(())
            }
            Err(err) => Err(LabelError::PopupBlocked {
                hint: format!(
                    "no browser could be launched ({}); open {} manually",
                    err,
                    path.display()
                ),
            }),
        }
    }
}

impl SystemPresenter {
    // Spawned, never waited on.
    fn launch(&self, path: &Path) -> Result<(), String> {
        let (program, args) = self
            .launcher
            .split_first()
            .ok_or_else(|| "no launcher configured".to_string())?;
        Command::new(program)
            .args(args)
            .arg(path)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map(|_child| ())
            .map_err(|e| format!("{}: {}", program, e))
    }
}

fn platform_launcher() -> &'static [&'static str] {
    if cfg!(target_os = "macos") {
        &["open"]
    } else if cfg!(target_os = "windows") {
        &["cmd", "/C", "start", ""]
    } else {
        &["xdg-open"]
    }
}
