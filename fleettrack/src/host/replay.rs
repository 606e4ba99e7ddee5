//! Positioning from a recorded track.
//!
//! Reads a plain text track, one `lat,lng[,accuracy]` fix per line (blank
//! lines and `#` comments are ignored), and hands the fixes out in order to
//! both one-shot requests and the position watch. Lets a tracking session be
//! driven from a terminal without a GPS receiver.

use std::collections::VecDeque;
use std::io::BufRead;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use super::positioning::{
    PositionError, PositionObservation, PositionOptions, PositionSource, PositionWatch,
};

/// Default delay between fixes on the replayed watch.
pub const DEFAULT_REPLAY_STEP: Duration = Duration::from_secs(1);

/// Errors loading a recorded track.
#[derive(Debug, thiserror::Error)]
pub enum ReplayError {
    #[error("Failed to read track: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid fix on line {line}: '{content}'")]
    Parse { line: usize, content: String },

    #[error("Track contains no fixes")]
    Empty,
}

/// Position source that replays a recorded track.
#[derive(Debug, Clone)]
pub struct ReplaySource {
    fixes: Arc<Mutex<VecDeque<(f64, f64, Option<f64>)>>>,
    step: Duration,
}

impl ReplaySource {
    /// Build from already-parsed fixes.
    pub fn from_fixes(fixes: Vec<(f64, f64)>, step: Duration) -> Self {
        Self {
            fixes: Arc::new(Mutex::new(
                fixes.into_iter().map(|(lat, lng)| (lat, lng, None)).collect(),
            )),
            step,
        }
    }

    /// Parse a track from any reader.
    pub fn from_reader(reader: impl BufRead, step: Duration) -> Result<Self, ReplayError> {
        let mut fixes = VecDeque::new();

        for (index, line) in reader.lines().enumerate() {
            let line = line?;
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }
            let fix = parse_fix(trimmed).ok_or_else(|| ReplayError::Parse {
                line: index + 1,
                content: trimmed.to_string(),
            })?;
            fixes.push_back(fix);
        }

        if fixes.is_empty() {
            return Err(ReplayError::Empty);
        }

        Ok(Self {
            fixes: Arc::new(Mutex::new(fixes)),
            step,
        })
    }

    /// Load a track file.
    pub fn from_file(path: &Path, step: Duration) -> Result<Self, ReplayError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(std::io::BufReader::new(file), step)
    }

    /// Fixes not yet handed out.
    pub fn remaining(&self) -> usize {
        self.fixes.lock().len()
    }

    pub fn is_exhausted(&self) -> bool {
        self.remaining() == 0
    }

    fn next_fix(&self) -> Option<PositionObservation> {
        self.fixes.lock().pop_front().map(|(lat, lng, accuracy)| {
            let observation = PositionObservation::new(lat, lng);
            match accuracy {
                Some(accuracy) => observation.with_accuracy(accuracy),
                None => observation,
            }
        })
    }
}

fn parse_fix(line: &str) -> Option<(f64, f64, Option<f64>)> {
    let mut parts = line.split(',').map(str::trim);
    let lat: f64 = parts.next()?.parse().ok()?;
    let lng: f64 = parts.next()?.parse().ok()?;
    let accuracy = match parts.next() {
        Some(v) => Some(v.parse().ok()?),
        None => None,
    };
    if parts.next().is_some() {
        return None;
    }
    if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lng) {
        return None;
    }
    Some((lat, lng, accuracy))
}

impl PositionSource for ReplaySource {
    async fn current_position(
        &self,
        _options: PositionOptions,
    ) -> Result<PositionObservation, PositionError> {
        self.next_fix().ok_or(PositionError::Unavailable)
    }

    fn watch_position(&self, _options: PositionOptions) -> Result<PositionWatch, PositionError> {
        let (tx, watch) = PositionWatch::channel(16);
        let source = self.clone();

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(source.step.max(Duration::from_millis(1)));
            ticker.tick().await;

            loop {
                tokio::select! {
                    _ = tx.closed() => break,
                    _ = ticker.tick() => {
                        let Some(fix) = source.next_fix() else {
                            tracing::debug!("Replay track exhausted, ending watch");
                            break;
                        };
                        if tx.send(Ok(fix)).await.is_err() {
                            break;
                        }
                    }
                }
            }
        });

        Ok(watch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_parse_track() {
        let track = "# depot run\n-34.0,-58.0\n\n -34.1 , -58.1 , 12.5\n";
        let source = ReplaySource::from_reader(Cursor::new(track), DEFAULT_REPLAY_STEP).unwrap();
        assert_eq!(source.remaining(), 2);

        let first = source.next_fix().unwrap();
        assert_eq!(first.position(), (-34.0, -58.0));
        assert_eq!(first.accuracy_m, None);

        let second = source.next_fix().unwrap();
        assert_eq!(second.position(), (-34.1, -58.1));
        assert_eq!(second.accuracy_m, Some(12.5));
        assert!(source.is_exhausted());
    }

    #[test]
    fn test_parse_error_reports_line() {
        let track = "-34.0,-58.0\nnot a fix\n";
        let err = ReplaySource::from_reader(Cursor::new(track), DEFAULT_REPLAY_STEP).unwrap_err();
        match err {
            ReplayError::Parse { line, content } => {
                assert_eq!(line, 2);
                assert_eq!(content, "not a fix");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_out_of_range_rejected() {
        assert!(parse_fix("91.0,0.0").is_none());
        assert!(parse_fix("0.0,181.0").is_none());
        assert!(parse_fix("1.0,2.0,3.0,4.0").is_none());
    }

    #[test]
    fn test_empty_track() {
        let err = ReplaySource::from_reader(Cursor::new("# nothing\n"), DEFAULT_REPLAY_STEP)
            .unwrap_err();
        assert!(matches!(err, ReplayError::Empty));
    }

    #[tokio::test]
    async fn test_current_position_drains_then_unavailable() {
        let source = ReplaySource::from_fixes(vec![(1.0, 2.0)], DEFAULT_REPLAY_STEP);
        let options = PositionOptions::fresh(Duration::from_secs(1));

        assert!(source.current_position(options).await.is_ok());
        assert_eq!(
            source.current_position(options).await,
            Err(PositionError::Unavailable)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_watch_replays_then_ends() {
        let source =
            ReplaySource::from_fixes(vec![(1.0, 2.0), (3.0, 4.0)], Duration::from_secs(1));
        let mut watch = source
            .watch_position(PositionOptions::fresh(Duration::from_secs(1)))
            .unwrap();

        assert_eq!(watch.next().await.unwrap().unwrap().position(), (1.0, 2.0));
        assert_eq!(watch.next().await.unwrap().unwrap().position(), (3.0, 4.0));
        assert!(watch.next().await.is_none());
    }
}
