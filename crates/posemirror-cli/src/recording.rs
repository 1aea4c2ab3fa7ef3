//! Pose recordings on disk.
//!
//! A single pose is a JSON object:
//!
//! ```json
//! {"keypoints":[{"part":"leftKnee","position":{"x":120.0,"y":220.0},"score":0.93}]}
//! ```
//!
//! A recording is JSON lines, one pose per line. A `null` line is a frame
//! where detection failed. Blank lines are ignored.

use std::path::Path;

use anyhow::{Context, Result};
use posemirror_core::Pose;

/// One recorded frame; `None` where detection failed.
pub type Frame = Option<Pose>;

/// Parses a JSON-lines recording.
pub fn parse_recording(text: &str) -> Result<Vec<Frame>> {
    text.lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(i, line)| {
            serde_json::from_str::<Frame>(line)
                .with_context(|| format!("Invalid pose on line {}", i + 1))
        })
        .collect()
}

/// Reads and parses a JSON-lines recording.
pub async fn load_recording(path: &Path) -> Result<Vec<Frame>> {
    let text = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read recording {}", path.display()))?;
    let frames = parse_recording(&text)
        .with_context(|| format!("Failed to parse recording {}", path.display()))?;
    if frames.is_empty() {
        anyhow::bail!("Recording {} contains no frames", path.display());
    }
    Ok(frames)
}

/// Reads a single pose from a JSON file.
pub async fn load_pose(path: &Path) -> Result<Pose> {
    let text = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read pose {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("Failed to parse pose {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use posemirror_core::BodyPart;

    const POSE_LINE: &str =
        r#"{"keypoints":[{"part":"leftKnee","position":{"x":1.0,"y":2.0},"score":0.9}]}"#;

    #[test]
    fn test_parse_recording_with_gaps() {
        let text = format!("{POSE_LINE}\nnull\n\n{POSE_LINE}\n");
        let frames = parse_recording(&text).unwrap();
        assert_eq!(frames.len(), 3);
        assert!(frames[1].is_none());
        assert_eq!(
            frames[0].as_ref().unwrap().keypoints[0].part,
            BodyPart::LeftKnee
        );
    }

    #[test]
    fn test_parse_recording_reports_line() {
        let text = format!("{POSE_LINE}\n{{oops\n");
        let err = parse_recording(&text).unwrap_err();
        assert!(err.to_string().contains("line 2"));
    }

    #[tokio::test]
    async fn test_load_recording_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("live.jsonl");
        std::fs::write(&path, format!("{POSE_LINE}\nnull\n")).unwrap();
        assert_eq!(load_recording(&path).await.unwrap().len(), 2);

        let empty = dir.path().join("empty.jsonl");
        std::fs::write(&empty, "\n").unwrap();
        assert!(load_recording(&empty).await.is_err());
    }

    #[tokio::test]
    async fn test_load_pose() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pose.json");
        std::fs::write(&path, POSE_LINE).unwrap();
        assert_eq!(load_pose(&path).await.unwrap().len(), 1);
        assert!(load_pose(&dir.path().join("missing.json")).await.is_err());
    }
}
