use std::path::{Path, PathBuf};

use crate::error::{PipelineError, Result};

/// Locations of the external collaborators
///
/// Injected rather than hard-coded so the pipeline can run against a portable
/// bundle layout, a system install, or a test fixture.
#[derive(Debug, Clone)]
pub struct ToolPaths {
    /// Interpreter that runs the generator's inference script
    pub generator_python: PathBuf,

    /// Generator checkout; must contain `inference.py` and is used as the
    /// working directory for the run
    pub generator_dir: PathBuf,

    /// ffmpeg binary; a bare name resolves via PATH
    pub ffmpeg: PathBuf,

    /// Directory receiving final and intermediate outputs
    pub output_dir: PathBuf,
}

impl ToolPaths {
    pub fn new(
        generator_python: impl Into<PathBuf>,
        generator_dir: impl Into<PathBuf>,
        ffmpeg: impl Into<PathBuf>,
        output_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            generator_python: generator_python.into(),
            generator_dir: generator_dir.into(),
            ffmpeg: ffmpeg.into(),
            output_dir: output_dir.into(),
        }
    }

    /// Path to the generator's entry script
    pub fn inference_script(&self) -> PathBuf {
        self.generator_dir.join("inference.py")
    }

    /// Verify every tool exists and create the output directory
    pub fn ensure(&self) -> Result<()> {
        if !self.generator_python.exists() {
            return Err(missing("generator python", &self.generator_python));
        }
        if !self.inference_script().exists() {
            return Err(missing("generator inference.py", &self.inference_script()));
        }
        // A bare binary name is resolved through PATH at spawn time
        if self.ffmpeg.components().count() > 1 && !self.ffmpeg.exists() {
            return Err(missing("ffmpeg", &self.ffmpeg));
        }

        std::fs::create_dir_all(&self.output_dir)?;
        Ok(())
    }
}

fn missing(name: &str, path: &Path) -> crate::error::HeadswayError {
    PipelineError::ToolMissing {
        name: name.to_string(),
        path: path.display().to_string(),
    }
    .into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_ensure_accepts_complete_layout() {
        let dir = tempdir().unwrap();
        let python = dir.path().join("python");
        let gen_dir = dir.path().join("generator");
        std::fs::write(&python, "").unwrap();
        std::fs::create_dir(&gen_dir).unwrap();
        std::fs::write(gen_dir.join("inference.py"), "").unwrap();

        let tools = ToolPaths {
            generator_python: python,
            generator_dir: gen_dir,
            ffmpeg: PathBuf::from("ffmpeg"),
            output_dir: dir.path().join("out"),
        };

        tools.ensure().unwrap();
        assert!(tools.output_dir.is_dir());
    }

    #[test]
    fn test_ensure_reports_missing_python() {
        let dir = tempdir().unwrap();
        let tools = ToolPaths {
            generator_python: dir.path().join("nope"),
            generator_dir: dir.path().to_path_buf(),
            ffmpeg: PathBuf::from("ffmpeg"),
            output_dir: dir.path().join("out"),
        };

        let err = tools.ensure().unwrap_err();
        assert!(err.to_string().contains("generator python"));
    }

    #[test]
    fn test_ensure_reports_missing_explicit_ffmpeg() {
        let dir = tempdir().unwrap();
        let python = dir.path().join("python");
        std::fs::write(&python, "").unwrap();
        std::fs::write(dir.path().join("inference.py"), "").unwrap();

        let tools = ToolPaths {
            generator_python: python,
            generator_dir: dir.path().to_path_buf(),
            ffmpeg: dir.path().join("bin/ffmpeg"),
            output_dir: dir.path().join("out"),
        };

        assert!(tools.ensure().is_err());
    }
}
