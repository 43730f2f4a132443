//! Startup replay of a journal file

use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use bytes::{Buf, Bytes};
use tracing::{info, warn};

use super::error::{JournalError, Result};
use super::record;
use crate::counter::Event;

/// How a replay stopped
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplayEnd {
    /// Every byte decoded into a record
    Clean,
    /// A record starting at `offset` could not be decoded; everything from
    /// there on was ignored
    Damaged { offset: u64, reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Replay {
    pub events: Vec<Event>,
    pub end: ReplayEnd,
}

impl Replay {
    pub fn is_clean(&self) -> bool {
        self.end == ReplayEnd::Clean
    }

    /// Turn a damaged tail into an error
    pub fn into_strict(self, path: &Path) -> Result<Vec<Event>> {
        match self.end {
            ReplayEnd::Clean => Ok(self.events),
            ReplayEnd::Damaged { offset, reason } => Err(JournalError::Damaged {
                path: path.to_path_buf(),
                offset,
                reason,
            }),
        }
    }
}

/// Decode every record in `path`, in file order
///
/// A missing file replays as empty. Decoding stops at the first record that
/// fails; the records before it are returned and the failure is reported in
/// [`Replay::end`] rather than as an error. The file itself is not modified.
pub fn replay(path: &Path) -> Result<Replay> {
    let contents = match fs::read(path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            info!(path = %path.display(), "No journal to replay");
            return Ok(Replay {
                events: Vec::new(),
                end: ReplayEnd::Clean,
            });
        }
        Err(e) => return Err(e.into()),
    };

    let total = contents.len() as u64;
    let replay = replay_bytes(Bytes::from(contents));

    match &replay.end {
        ReplayEnd::Clean => info!(
            path = %path.display(),
            events = replay.events.len(),
            bytes = total,
            "Journal replayed"
        ),
        ReplayEnd::Damaged { offset, reason } => warn!(
            path = %path.display(),
            events = replay.events.len(),
            offset,
            discarded_bytes = total - offset,
            %reason,
            "Journal has a damaged tail, replay stopped early"
        ),
    }

    Ok(replay)
}

pub fn replay_bytes(mut buf: Bytes) -> Replay {
    let total = buf.len() as u64;
    let mut events = Vec::new();

    while buf.has_remaining() {
        let offset = total - buf.remaining() as u64;
        match record::decode(&mut buf) {
            Ok(at) => events.push(at),
            Err(e) => {
                return Replay {
                    events,
                    end: ReplayEnd::Damaged {
                        offset,
                        reason: e.to_string(),
                    },
                };
            }
        }
    }

    Replay {
        events,
        end: ReplayEnd::Clean,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use tempfile::TempDir;

    fn events(n: i64) -> Vec<Event> {
        (0..n)
            .map(|i| Utc.timestamp_opt(1_604_188_800 + i, 0).unwrap())
            .collect()
    }

    fn encode_all(events: &[Event]) -> Vec<u8> {
        let mut buf = Vec::new();
        for at in events {
            record::encode(at, &mut buf).unwrap();
        }
        buf
    }

    #[test]
    fn test_missing_file_replays_empty() {
        let dir = TempDir::new().unwrap();
        let replay = replay(&dir.path().join("absent.journal")).unwrap();
        assert!(replay.events.is_empty());
        assert!(replay.is_clean());
    }

    #[test]
    fn test_replay_in_file_order() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("hits.journal");
        let expected = events(5);
        fs::write(&path, encode_all(&expected)).unwrap();

        let replay = replay(&path).unwrap();
        assert_eq!(replay.events, expected);
        assert!(replay.is_clean());
    }

    #[test]
    fn test_damaged_tail_keeps_valid_prefix() {
        let expected = events(3);
        let mut bytes = encode_all(&expected);
        let valid_len = bytes.len() as u64;
        // Half of a fourth record: a length prefix promising more than is there
        bytes.extend_from_slice(&[0x0a, 0x08, 0x80]);

        let replay = replay_bytes(Bytes::from(bytes));
        assert_eq!(replay.events, expected);
        match &replay.end {
            ReplayEnd::Damaged { offset, .. } => assert_eq!(*offset, valid_len),
            ReplayEnd::Clean => panic!("expected damaged tail"),
        }
    }

    #[test]
    fn test_strict_replay_rejects_damage() {
        let mut bytes = encode_all(&events(2));
        bytes.push(0xff);

        let replay = replay_bytes(Bytes::from(bytes));
        let err = replay.into_strict(Path::new("hits.journal")).unwrap_err();
        assert!(matches!(err, JournalError::Damaged { .. }));
    }

    #[test]
    fn test_replay_does_not_modify_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("hits.journal");
        let bytes = encode_all(&events(4));
        fs::write(&path, &bytes).unwrap();

        replay(&path).unwrap();
        assert_eq!(fs::read(&path).unwrap(), bytes);
    }
}
