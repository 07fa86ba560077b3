//! ## Crash recovery of the local queue
//!
//! The local queue is written to a small text file after every change, so a restarted process
//! can pick up the calls it had promised to serve.
//!
//! ## Format
//! One character per cell of the [LocalQueue], row-major `[call_type][floor]`, `'1'` for a
//! pending call and `'0'` for none. Trailing whitespace is ignored when reading. A file of any
//! other length, or with any other character, is treated as corrupt.

use anyhow::{bail, Context};
use std::fs;
use std::path::Path;

use crate::config;
use crate::print;
use crate::world_view::{LocalQueue, EMPTY_QUEUE};


/// Encodes a queue as the backup text
pub fn encode(queue: &LocalQueue) -> String {
    queue
        .iter()
        .flat_map(|row| row.iter())
        .map(|pending| if *pending { '1' } else { '0' })
        .collect()
}

/// Decodes the backup text into a queue
pub fn decode(text: &str) -> anyhow::Result<LocalQueue> {
    let text = text.trim_end();
    let expected = config::NUM_BUTTON_TYPES * config::NUM_FLOORS;
    if text.len() != expected {
        bail!("Backup has {} cells, expected {}", text.len(), expected);
    }

    let mut queue = EMPTY_QUEUE;
    for (i, c) in text.chars().enumerate() {
        queue[i / config::NUM_FLOORS][i % config::NUM_FLOORS] = match c {
            '1' => true,
            '0' => false,
            other => bail!("Backup contains invalid character {:?}", other),
        };
    }
    Ok(queue)
}

/// Reads the queue stored at `path`
pub fn read_backup(path: &Path) -> anyhow::Result<LocalQueue> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Could not read backup {}", path.display()))?;
    decode(&text)
}

/// Overwrites the backup at `path` with `queue`
pub fn write_backup(path: &Path, queue: &LocalQueue) -> anyhow::Result<()> {
    fs::write(path, encode(queue))
        .with_context(|| format!("Could not write backup {}", path.display()))
}

/// Reads the backup, falling back to an empty queue on any failure
pub fn restore_or_empty(path: &Path) -> LocalQueue {
    match read_backup(path) {
        Ok(queue) => {
            print::ok(format!("Restored local queue from {}", path.display()));
            queue
        }
        Err(e) => {
            print::warn(format!("No usable backup, starting empty: {:#}", e));
            EMPTY_QUEUE
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn encodes_row_major() {
        let mut queue = EMPTY_QUEUE;
        queue[0][1] = true;
        queue[2][3] = true;
        assert_eq!(encode(&queue), "010000000001");
    }

    #[test]
    fn decode_ignores_trailing_newline() {
        let queue = decode("000100000010\n").unwrap();
        assert!(queue[0][3]);
        assert!(queue[2][2]);
        assert_eq!(queue.iter().flatten().filter(|c| **c).count(), 2);
    }

    #[test]
    fn decode_rejects_wrong_length_or_character() {
        assert!(decode("0101").is_err());
        assert!(decode("0000000000000").is_err());
        assert!(decode("00000x000000").is_err());
        assert!(decode("").is_err());
    }

    #[test]
    fn file_survives_restart() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("order_backup.txt");
        let mut queue = EMPTY_QUEUE;
        queue[1][2] = true;
        write_backup(&path, &queue).unwrap();
        assert_eq!(read_backup(&path).unwrap(), queue);
    }

    #[test]
    fn missing_or_corrupt_file_gives_empty_queue() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(restore_or_empty(&dir.path().join("missing.txt")), EMPTY_QUEUE);

        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "garbage").unwrap();
        assert_eq!(restore_or_empty(file.path()), EMPTY_QUEUE);
    }
}
