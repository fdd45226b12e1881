//! GenProject - writes generated sources to an output directory.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, trace};

use crate::driver::Generated;

/// Output location of the generated sources.
pub struct GenProject {
    pub output_dir: PathBuf,
    pub base_name: String,
}

impl GenProject {
    #[must_use]
    pub fn new(output_dir: impl AsRef<Path>, base_name: impl Into<String>) -> Self {
        Self {
            output_dir: output_dir.as_ref().to_path_buf(),
            base_name: base_name.into(),
        }
    }

    /// Path to the lifter source.
    #[must_use]
    pub fn lifter_path(&self) -> PathBuf {
        self.output_dir.join(format!("{}_il.cc", self.base_name))
    }

    /// Path to the tokenizer source.
    #[must_use]
    pub fn text_path(&self) -> PathBuf {
        self.output_dir.join(format!("{}_text.cc", self.base_name))
    }

    /// Write every source present in `generated`; returns the written paths.
    ///
    /// # Errors
    ///
    /// Returns the first IO error from creating the directory or writing a file.
    pub fn write(&self, generated: &Generated) -> std::io::Result<Vec<PathBuf>> {
        fs::create_dir_all(&self.output_dir)?;
        let mut written = Vec::new();
        for (path, content) in [
            (self.lifter_path(), generated.lifter.as_deref()),
            (self.text_path(), generated.text.as_deref()),
        ] {
            let Some(content) = content else { continue };
            trace!(path = %path.display(), bytes = content.len(), "writing source");
            fs::write(&path, content)?;
            written.push(path);
        }
        debug!(dir = %self.output_dir.display(), files = written.len(), "wrote sources");
        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_paths() {
        let project = GenProject::new("/tmp/out", "hexagon");
        assert_eq!(project.lifter_path(), PathBuf::from("/tmp/out/hexagon_il.cc"));
        assert_eq!(project.text_path(), PathBuf::from("/tmp/out/hexagon_text.cc"));
    }

    #[test]
    fn test_write_present_sources() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("gen");
        let project = GenProject::new(&out, "hex");
        let generated = Generated {
            text: Some("// text\n".to_string()),
            ..Generated::default()
        };
        let written = project.write(&generated).unwrap();
        assert_eq!(written, [out.join("hex_text.cc")]);
        assert_eq!(fs::read_to_string(out.join("hex_text.cc")).unwrap(), "// text\n");
        assert!(!out.join("hex_il.cc").exists());
    }
}
