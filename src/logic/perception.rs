//! Perception Feed
//!
//! Reads detector/tracker output as JSON Lines, one frame per line.
//! Frames are yielded lazily so memory stays bounded whatever the input size.
//!
//! ```text
//! {"frame": 12, "width": 1920, "height": 1080, "detections": [
//!     {"track_id": 7, "class_label": "light", "confidence": 0.81, "bbox": [100, 100, 140, 150]}]}
//! ```

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use super::detection::Frame;

#[derive(Debug, thiserror::Error)]
pub enum PerceptionError {
    #[error("cannot open perception feed {path:?}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("read error at line {line}: {source}")]
    Read {
        line: usize,
        #[source]
        source: std::io::Error,
    },
}

/// Parse a single feed line
pub fn parse_frame(line: &str) -> Result<Frame, serde_json::Error> {
    serde_json::from_str(line)
}

pub struct FeedReader<R: BufRead> {
    lines: std::io::Lines<R>,
    line_no: usize,
    skipped: usize,
}

impl FeedReader<BufReader<File>> {
    pub fn open(path: &Path) -> Result<Self, PerceptionError> {
        let file = File::open(path).map_err(|source| PerceptionError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        log::info!("Reading perception feed: {:?}", path);
        Ok(Self::from_reader(BufReader::new(file)))
    }
}

impl<R: BufRead> FeedReader<R> {
    pub fn from_reader(reader: R) -> Self {
        Self {
            lines: reader.lines(),
            line_no: 0,
            skipped: 0,
        }
    }

    /// Malformed lines dropped so far
    pub fn skipped(&self) -> usize {
        self.skipped
    }
}

impl<R: BufRead> Iterator for FeedReader<R> {
    type Item = Result<Frame, PerceptionError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let line = match self.lines.next()? {
                Ok(line) => line,
                Err(source) => {
                    return Some(Err(PerceptionError::Read {
                        line: self.line_no + 1,
                        source,
                    }))
                }
            };
            self.line_no += 1;

            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }

            match parse_frame(trimmed) {
                Ok(frame) => return Some(Ok(frame)),
                Err(e) => {
                    self.skipped += 1;
                    log::warn!("Skipping malformed feed line {}: {}", self.line_no, e);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_reads_frames_in_order() {
        let feed = concat!(
            r#"{"frame": 1, "detections": [{"track_id": 7, "class_label": "light", "confidence": 0.8, "bbox": [100, 100, 140, 150]}]}"#,
            "\n",
            r#"{"frame": 2, "detections": []}"#,
            "\n",
        );
        let frames: Vec<Frame> = FeedReader::from_reader(Cursor::new(feed))
            .collect::<Result<_, _>>()
            .unwrap();

        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0].detections[0].track_id, Some(7));
        assert_eq!(frames[1].frame, 2);
    }

    #[test]
    fn test_skips_blank_and_malformed_lines() {
        let feed = "\n{\"frame\": 1}\nnot json\n   \n{\"frame\": 2, \"detections\": [{\"bbox\": 1}]}\n{\"frame\": 3}\n";
        let mut reader = FeedReader::from_reader(Cursor::new(feed));
        let frames: Vec<Frame> = reader.by_ref().map(|f| f.unwrap()).collect();

        assert_eq!(frames.iter().map(|f| f.frame).collect::<Vec<_>>(), vec![1, 3]);
        assert_eq!(reader.skipped(), 2);
    }

    #[test]
    fn test_open_missing_file() {
        let err = FeedReader::open(Path::new("/nonexistent/feed.jsonl")).err().unwrap();
        assert!(matches!(err, PerceptionError::Open { .. }));
    }
}
