use std::collections::VecDeque;
use std::io::{BufRead, BufReader};
use std::path::Path;

use super::{DetectorError, HandFrame, LandmarkDetector};

/// Plays back recorded frames, one per call, then reports exhaustion.
///
/// Recordings are JSON Lines files with one [`HandFrame`] per line.
#[derive(Debug, Clone, Default)]
pub struct ReplayDetector {
    frames: VecDeque<HandFrame>,
}

impl ReplayDetector {
    pub fn from_frames(frames: Vec<HandFrame>) -> Self {
        Self {
            frames: frames.into(),
        }
    }

    pub fn from_path(path: &Path) -> Result<Self, DetectorError> {
        let file = std::fs::File::open(path).map_err(|source| DetectorError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut frames = VecDeque::new();
        for (idx, line) in BufReader::new(file).lines().enumerate() {
            let line = line.map_err(|source| DetectorError::Io {
                path: path.to_path_buf(),
                source,
            })?;
            if line.trim().is_empty() {
                continue;
            }
            let frame: HandFrame = serde_json::from_str(&line)
                .map_err(|source| DetectorError::Parse {
                    line: idx + 1,
                    source,
                })?;
            frames.push_back(frame);
        }
        Ok(Self { frames })
    }

    pub fn remaining(&self) -> usize {
        self.frames.len()
    }
}

impl LandmarkDetector for ReplayDetector {
    fn next_frame(&mut self) -> Result<Option<HandFrame>, DetectorError> {
        Ok(self.frames.pop_front())
    }

    fn is_exhausted(&self) -> bool {
        self.frames.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn reads_jsonl_and_skips_blank_lines() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("frames.jsonl");
        std::fs::write(
            &path,
            "{\"timestampMs\": 1.0, \"landmarks\": []}\n\n{\"timestampMs\": 2.0}\n",
        )
        .unwrap();

        let mut detector = ReplayDetector::from_path(&path).unwrap();
        assert_eq!(detector.remaining(), 2);
        assert_eq!(detector.next_frame().unwrap().unwrap().timestamp_ms, 1.0);
        assert_eq!(detector.next_frame().unwrap().unwrap().timestamp_ms, 2.0);
        assert!(detector.next_frame().unwrap().is_none());
        assert!(detector.is_exhausted());
    }

    #[test]
    fn bad_line_reports_line_number() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("frames.jsonl");
        std::fs::write(&path, "{\"timestampMs\": 1.0}\nnot json\n").unwrap();
        let err = ReplayDetector::from_path(&path).unwrap_err();
        assert!(matches!(err, DetectorError::Parse { line: 2, .. }));
    }
}
