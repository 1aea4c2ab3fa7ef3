//! Replayed pose sources.
//!
//! Each recording is published by its own task into a `watch` channel at
//! the recording's frame rate. The channel holds only the latest completed
//! frame, so the tick consumer reads whatever is newest without waiting and
//! tolerates frames that are one or more ticks stale.

use std::sync::Arc;
use std::time::Duration;

use posemirror_core::Pose;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::debug;

use crate::recording::Frame;

/// Latest published frame. `None` before the first frame and on failed detections.
pub type LatestPose = watch::Receiver<Option<Arc<Pose>>>;

/// A running producer task and its channel.
pub struct PoseFeed {
    /// Receiver side read by the tick consumer
    pub latest: LatestPose,
    /// Completes when the recording is exhausted
    pub task: JoinHandle<()>,
}

/// Spawns a task publishing `frames` every `frame_interval`.
///
/// With `looping` set the recording restarts after its last frame and the
/// task runs until every receiver is dropped.
pub fn spawn_feed(
    name: &'static str,
    frames: Vec<Frame>,
    frame_interval: Duration,
    looping: bool,
) -> PoseFeed {
    let (tx, latest) = watch::channel(None);
    let frames: Vec<Option<Arc<Pose>>> = frames.into_iter().map(|f| f.map(Arc::new)).collect();

    let task = tokio::spawn(async move {
        let mut interval = tokio::time::interval(frame_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            for (index, frame) in frames.iter().enumerate() {
                interval.tick().await;
                if tx.is_closed() {
                    debug!(feed = name, "all readers gone, stopping");
                    return;
                }
                tx.send_replace(frame.clone());
                if index % 100 == 0 {
                    debug!(feed = name, index, "frame published");
                }
            }
            if !looping {
                break;
            }
            debug!(feed = name, "recording restarted");
        }
        // Let the last frame be seen for one more period.
        interval.tick().await;
    });

    PoseFeed { latest, task }
}

/// Shortest frame period handed to the feed ticker.
pub const MIN_FRAME_INTERVAL: Duration = Duration::from_micros(100);

/// Longest frame period handed to the feed ticker.
pub const MAX_FRAME_INTERVAL: Duration = Duration::from_secs(3600);

/// Frame period for a recording played at `fps` times `rate`.
///
/// Clamped to [`MIN_FRAME_INTERVAL`]..=[`MAX_FRAME_INTERVAL`]. Callers
/// reject non-positive rates before they get here.
pub fn frame_interval(fps: f64, rate: f64) -> Duration {
    let effective = fps * rate;
    if !effective.is_finite() || effective <= 0.0 {
        return MIN_FRAME_INTERVAL;
    }
    Duration::try_from_secs_f64(1.0 / effective)
        .unwrap_or(MAX_FRAME_INTERVAL)
        .clamp(MIN_FRAME_INTERVAL, MAX_FRAME_INTERVAL)
}

#[cfg(test)]
mod tests {
    use super::*;
    use posemirror_core::{BodyPart, Keypoint};

    fn pose(x: f32) -> Pose {
        Pose::new(vec![Keypoint::new(BodyPart::Nose, x, 0.0, 0.9)])
    }

    #[test]
    fn test_frame_interval() {
        assert_eq!(frame_interval(10.0, 1.0), Duration::from_millis(100));
        assert_eq!(frame_interval(10.0, 0.5), Duration::from_millis(200));
    }

    #[test]
    fn test_frame_interval_is_never_zero() {
        assert_eq!(frame_interval(1e12, 1.0), MIN_FRAME_INTERVAL);
        assert_eq!(frame_interval(f64::INFINITY, 1.0), MIN_FRAME_INTERVAL);
        assert_eq!(frame_interval(30.0, f64::NAN), MIN_FRAME_INTERVAL);
        assert!(frame_interval(30.0, 0.0) > Duration::ZERO);
        assert_eq!(frame_interval(1e-300, 1.0), MAX_FRAME_INTERVAL);
    }

    #[tokio::test(start_paused = true)]
    async fn test_feed_publishes_latest_frame() {
        let frames = vec![Some(pose(1.0)), None, Some(pose(3.0))];
        let mut feed = spawn_feed("test", frames, Duration::from_millis(100), false);

        // First frame is published immediately.
        feed.latest.changed().await.unwrap();
        assert_eq!(feed.latest.borrow().as_ref().unwrap().keypoints[0].position.x, 1.0);

        tokio::time::sleep(Duration::from_millis(150)).await;
        assert!(feed.latest.borrow().is_none());

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(feed.latest.borrow().as_ref().unwrap().keypoints[0].position.x, 3.0);

        feed.task.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_looping_feed_stops_when_reader_dropped() {
        let feed = spawn_feed("loop", vec![Some(pose(1.0))], Duration::from_millis(10), true);
        tokio::time::sleep(Duration::from_millis(55)).await;
        drop(feed.latest);
        feed.task.await.unwrap();
    }
}
