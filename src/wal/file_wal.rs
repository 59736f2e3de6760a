//! Memory-mapped, append-only file implementation of [`Wal`].
//!
//! Frames are written at `[len:u32 LE][crc32:u32 LE][payload:len bytes]`.
//! The backing file is pre-allocated and zero-filled; an all-zero length
//! prefix at the write cursor marks the end of durable data, so a crash
//! mid-write naturally looks like a truncated (torn) tail on the next open.

use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

use memmap2::MmapMut;
use tracing::{debug, instrument, warn};

use super::error::WalError;
use super::record::{WalPayload, WalRecord};
use super::wal_trait::Wal;

const HEADER_SIZE: usize = 4 + 4;
const DEFAULT_INITIAL_SIZE: usize = 16 * 1024 * 1024;

/// A single-file, memory-mapped WAL with an exclusive-open lock file.
pub struct FileWal {
    mmap: MmapMut,
    file: File,
    write_pos: usize,
    capacity: usize,
    last_lsn: u64,
    path: PathBuf,
    _lock: File,
}

impl FileWal {
    /// Open (creating if absent) the WAL at `dir/wal.log`, verify its
    /// integrity, and truncate a torn tail if one is found. Takes an
    /// exclusive lock at `dir/wal.lock` for the lifetime of the handle,
    /// enforcing the single-engine-process rule.
    #[instrument(skip_all, fields(dir = %dir.display()))]
    pub fn open(dir: &Path) -> Result<Self, WalError> {
        std::fs::create_dir_all(dir)?;
        let lock_path = dir.join("wal.lock");
        let lock = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(&lock_path)
            .map_err(|e| WalError::Lock(e.to_string()))?;

        let path = dir.join("wal.log");
        let existed = path.exists();
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .open(&path)?;

        let capacity = if existed {
            file.metadata()?.len() as usize
        } else {
            file.set_len(DEFAULT_INITIAL_SIZE as u64)?;
            DEFAULT_INITIAL_SIZE
        };

        // SAFETY: the lock file above prevents any other process from
        // opening this WAL concurrently, and we hold the only mapping.
        let mmap = unsafe { MmapMut::map_mut(&file)? };

        let mut wal = Self {
            mmap,
            file,
            write_pos: 0,
            capacity,
            last_lsn: 0,
            path,
            _lock: lock,
        };
        wal.recover_cursor()?;
        Ok(wal)
    }

    /// Scan from the start of the mapped region, verifying every frame,
    /// and set `write_pos`/`last_lsn` to the end of the last intact record.
    fn recover_cursor(&mut self) -> Result<(), WalError> {
        let mut pos = 0usize;
        let mut last_lsn = 0u64;
        loop {
            match self.read_frame_at(pos) {
                FrameRead::Valid { record, frame_len } => {
                    last_lsn = record.lsn;
                    pos += frame_len;
                }
                FrameRead::EndOfData => break,
                FrameRead::TornTail => {
                    warn!(at = pos, "torn WAL tail detected, truncating on recovery");
                    break;
                }
                FrameRead::Corrupt => {
                    return Err(WalError::Corrupt { lsn: None });
                }
            }
        }
        self.write_pos = pos;
        self.last_lsn = last_lsn;
        debug!(write_pos = pos, last_lsn, "WAL cursor recovered");
        Ok(())
    }

    fn remaining(&self) -> usize {
        self.capacity.saturating_sub(self.write_pos)
    }

    fn ensure_capacity(&mut self, additional: usize) -> Result<(), WalError> {
        if self.remaining() >= additional {
            return Ok(());
        }
        let mut new_capacity = self.capacity.max(DEFAULT_INITIAL_SIZE);
        while new_capacity - self.write_pos < additional {
            new_capacity *= 2;
        }
        self.file.set_len(new_capacity as u64)?;
        // SAFETY: growing a file underneath an existing mapping and then
        // remapping is safe as long as the old mapping is dropped first,
        // which the reassignment below does.
        self.mmap = unsafe { MmapMut::map_mut(&self.file)? };
        self.capacity = new_capacity;
        Ok(())
    }

    fn write_frame(&mut self, payload: &[u8]) -> Result<(), WalError> {
        let frame_len = HEADER_SIZE + payload.len();
        self.ensure_capacity(frame_len)?;
        let crc = crc32fast::hash(payload);
        let pos = self.write_pos;
        self.mmap[pos..pos + 4].copy_from_slice(&(payload.len() as u32).to_le_bytes());
        self.mmap[pos + 4..pos + 8].copy_from_slice(&crc.to_le_bytes());
        self.mmap[pos + 8..pos + 8 + payload.len()].copy_from_slice(payload);
        self.mmap
            .flush_range(pos, frame_len)
            .map_err(|e| WalError::Io {
                message: e.to_string(),
            })?;
        self.write_pos += frame_len;
        Ok(())
    }

    fn read_frame_at(&self, pos: usize) -> FrameRead {
        if pos + HEADER_SIZE > self.capacity {
            return FrameRead::EndOfData;
        }
        let len_bytes = &self.mmap[pos..pos + 4];
        if len_bytes.iter().all(|&b| b == 0) {
            return FrameRead::EndOfData;
        }
        let len = u32::from_le_bytes(len_bytes.try_into().unwrap()) as usize;
        let frame_len = HEADER_SIZE + len;
        if pos + frame_len > self.capacity {
            return FrameRead::TornTail;
        }
        let stored_crc =
            u32::from_le_bytes(self.mmap[pos + 4..pos + 8].try_into().unwrap());
        let payload = &self.mmap[pos + 8..pos + 8 + len];
        let computed_crc = crc32fast::hash(payload);
        if computed_crc != stored_crc {
            return if self.rest_is_zero(pos + frame_len) {
                FrameRead::TornTail
            } else {
                FrameRead::Corrupt
            };
        }
        match WalRecord::decode_payload(payload) {
            Ok(record) => FrameRead::Valid { record, frame_len },
            Err(_) => {
                if self.rest_is_zero(pos + frame_len) {
                    FrameRead::TornTail
                } else {
                    FrameRead::Corrupt
                }
            }
        }
    }

    fn rest_is_zero(&self, from: usize) -> bool {
        self.mmap[from.min(self.capacity)..self.capacity]
            .iter()
            .all(|&b| b == 0)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

enum FrameRead {
    Valid { record: WalRecord, frame_len: usize },
    EndOfData,
    TornTail,
    Corrupt,
}

impl Wal for FileWal {
    #[instrument(skip_all)]
    fn append(&mut self, payload: WalPayload) -> Result<u64, WalError> {
        let lsns = self.append_batch(vec![payload])?;
        Ok(lsns[0])
    }

    fn append_batch(&mut self, payloads: Vec<WalPayload>) -> Result<Vec<u64>, WalError> {
        let mut lsns = Vec::with_capacity(payloads.len());
        for payload in payloads {
            let lsn = self.last_lsn + 1;
            let record = WalRecord {
                lsn,
                timestamp: chrono::Utc::now(),
                payload,
            };
            let encoded = record.encode_payload()?;
            self.write_frame(&encoded)?;
            self.last_lsn = lsn;
            lsns.push(lsn);
        }
        Ok(lsns)
    }

    fn replay(&self, from_lsn: u64) -> Result<Vec<(u64, WalPayload)>, WalError> {
        let mut out = Vec::new();
        let mut pos = 0usize;
        loop {
            match self.read_frame_at(pos) {
                FrameRead::Valid { record, frame_len } => {
                    if record.lsn >= from_lsn {
                        out.push((record.lsn, record.payload));
                    }
                    pos += frame_len;
                }
                FrameRead::EndOfData | FrameRead::TornTail => break,
                FrameRead::Corrupt => return Err(WalError::Corrupt { lsn: None }),
            }
        }
        Ok(out)
    }

    fn last_lsn(&self) -> u64 {
        self.last_lsn
    }
}
