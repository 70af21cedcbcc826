//! File source element.

use crate::element::{ElementContext, ElementImpl, PadTemplate, PropertySpec};
use crate::error::{Error, Result};
use crate::pipeline::StateChange;
use std::fs::File;
use std::path::PathBuf;

/// A source element that reads from a file.
///
/// The file named by the required `location` property is opened when the
/// element enters Ready and released when it returns to Null.
///
/// # Example
///
/// ```rust
/// use mediagraph::runtime::Runtime;
///
/// let runtime = Runtime::new();
/// let mut src = runtime.make_element("filesrc", "source").unwrap();
/// src.set_property("location", "/tmp/input.ogg").unwrap();
/// assert_eq!(src.properties().get_str("location"), Some("/tmp/input.ogg"));
/// ```
#[derive(Debug, Default)]
pub struct FileSrc {
    path: Option<PathBuf>,
    file: Option<File>,
    size: u64,
}

impl FileSrc {
    /// Create a new file source.
    pub fn new() -> Self {
        Self::default()
    }

    /// Path of the open file.
    pub fn path(&self) -> Option<&PathBuf> {
        self.path.as_ref()
    }

    /// Size in bytes of the open file.
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Whether the file is currently held open.
    pub fn is_open(&self) -> bool {
        self.file.is_some()
    }

    fn open(&mut self, ctx: &ElementContext<'_>) -> Result<()> {
        let location = ctx
            .properties()
            .get_str("location")
            .ok_or_else(|| Error::Element("no location set".to_string()))?;
        let path = PathBuf::from(location);
        let file = File::open(&path)?;
        self.size = file.metadata()?.len();
        tracing::debug!(element = ctx.name(), path = %path.display(), size = self.size, "opened file");
        self.file = Some(file);
        self.path = Some(path);
        Ok(())
    }
}

impl ElementImpl for FileSrc {
    fn pad_templates(&self) -> Vec<PadTemplate> {
        vec![PadTemplate::src("src")]
    }

    fn properties(&self) -> Vec<PropertySpec> {
        vec![PropertySpec::string("location", "Path of the file to read").required()]
    }

    fn change_state(&mut self, transition: StateChange, ctx: &ElementContext<'_>) -> Result<()> {
        match transition {
            StateChange::NullToReady => self.open(ctx),
            StateChange::ReadyToNull => {
                self.file = None;
                self.path = None;
                self.size = 0;
                Ok(())
            }
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::Properties;
    use crate::pipeline::Bus;
    use std::io::Write;

    #[test]
    fn test_open_and_release() {
        let mut tmp = tempfile::NamedTempFile::new().unwrap();
        tmp.write_all(b"OggS0123").unwrap();

        let mut src = FileSrc::new();
        let mut props = Properties::new(src.properties());
        props
            .set("src", "location", tmp.path().into())
            .unwrap();
        let bus = Bus::new();
        let ctx = ElementContext::new("src", &props, &bus);

        src.change_state(StateChange::NullToReady, &ctx).unwrap();
        assert!(src.is_open());
        assert_eq!(src.size(), 8);

        src.change_state(StateChange::ReadyToNull, &ctx).unwrap();
        assert!(!src.is_open());
    }

    #[test]
    fn test_missing_file_refused() {
        let dir = tempfile::tempdir().unwrap();
        let mut src = FileSrc::new();
        let mut props = Properties::new(src.properties());
        props
            .set("src", "location", dir.path().join("absent.ogg").as_path().into())
            .unwrap();
        let bus = Bus::new();
        let ctx = ElementContext::new("src", &props, &bus);

        let err = src.change_state(StateChange::NullToReady, &ctx).unwrap_err();
        assert!(matches!(err, Error::Io(_)));
        assert!(!src.is_open());
    }
}
