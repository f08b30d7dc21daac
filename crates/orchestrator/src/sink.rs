//! DirectorySink - writes frame payloads to disk

use std::fs;
use std::path::PathBuf;

use contracts::{FrameSink, SensorFrame};
use tracing::trace;

/// Sink that writes each payload under a fixed output directory
///
/// Files are named by the zero-padded 6-digit frame number; the content is
/// the payload verbatim, never interpreted.
pub struct DirectorySink {
    dir: PathBuf,
}

impl DirectorySink {
    /// Create a sink, creating the directory if needed
    pub fn new(dir: impl Into<PathBuf>) -> std::io::Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }
}

impl FrameSink for DirectorySink {
    fn persist(&self, frame: &SensorFrame) -> std::io::Result<()> {
        let path = self.dir.join(format!("{:06}.png", frame.frame_id));
        fs::write(&path, &frame.payload)?;
        trace!(path = %path.display(), "frame persisted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;
    use tempfile::tempdir;

    use super::*;

    #[test]
    fn writes_zero_padded_filenames() {
        let dir = tempdir().unwrap();
        let sink = DirectorySink::new(dir.path().join("_out")).unwrap();

        sink.persist(&SensorFrame {
            frame_id: 42,
            sensor_name: "camera".to_string(),
            payload: Bytes::from_static(b"pixels"),
        })
        .unwrap();

        let path = dir.path().join("_out").join("000042.png");
        assert_eq!(fs::read(path).unwrap(), b"pixels");
    }
}
