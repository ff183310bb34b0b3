//! Run request model

use std::path::{Path, PathBuf};

/// One parameterized run of a suite, fixed at the time it is requested
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RunRequest {
    argument: String,
    suite_file: PathBuf,
    data_file: Option<PathBuf>,
}

impl RunRequest {
    pub fn new(argument: impl Into<String>, suite_file: impl Into<PathBuf>) -> Self {
        Self {
            argument: argument.into(),
            suite_file: suite_file.into(),
            data_file: None,
        }
    }

    pub fn with_data_file(mut self, data_file: Option<PathBuf>) -> Self {
        self.data_file = data_file;
        self
    }

    pub fn argument(&self) -> &str {
        &self.argument
    }

    pub fn suite_file(&self) -> &Path {
        &self.suite_file
    }

    pub fn data_file(&self) -> Option<&Path> {
        self.data_file.as_deref()
    }

    /// File name of the suite, used to label its summary line
    pub fn suite_label(&self) -> String {
        suite_label(&self.suite_file)
    }
}

/// Basename of a suite path, falling back to the full path
pub fn suite_label(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
