//! The `.debug_line` section and its per-offset program cache.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, OnceLock, PoisonError};

use gimli::{EndianSlice, RunTimeEndian};
use log::{debug, warn};

use super::header::LineNumberProgramHeader;
use super::program::LineNumberProgram;
use crate::error::{Error, Result};

/// Anything that can hand out line-number programs by section offset.
#[cfg_attr(test, mockall::automock)]
pub trait LineProgramSource {
    /// The program at `offset`, or `None` when there is no usable program.
    fn line_number_program(&self, offset: u64) -> Option<Arc<LineNumberProgram>>;
}

type ProgramCell = Arc<OnceLock<Option<Arc<LineNumberProgram>>>>;

/// Raw `.debug_line` bytes plus the programs decoded from them so far.
pub struct DebugLine {
    /// Section contents
    data: Vec<u8>,
    /// Byte order of the target
    endian: RunTimeEndian,
    /// One cell per requested offset
    programs: Mutex<HashMap<u64, ProgramCell>>,
}

impl DebugLine {
    /// Wrap section bytes
    pub fn new(data: impl Into<Vec<u8>>, endian: RunTimeEndian) -> Self {
        Self {
            data: data.into(),
            endian,
            programs: Mutex::new(HashMap::new()),
        }
    }

    /// Get the section size in bytes
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Check if the section is empty
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Get the byte order
    pub fn endian(&self) -> RunTimeEndian {
        self.endian
    }

    fn contains(&self, offset: u64) -> bool {
        usize::try_from(offset).is_ok_and(|offset| offset < self.data.len())
    }

    /// Number of offsets held in the cache, decoded or in flight.
    pub fn cached_count(&self) -> usize {
        self.programs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Decode the program at `offset` without consulting the cache.
    pub fn decode(&self, offset: u64) -> Result<LineNumberProgram> {
        let data = usize::try_from(offset)
            .ok()
            .and_then(|start| self.data.get(start..))
            .filter(|data| !data.is_empty())
            .ok_or(Error::OffsetOutOfRange {
                offset,
                size: self.data.len(),
            })?;

        let input = EndianSlice::new(data, self.endian);
        let (header, instructions) = LineNumberProgramHeader::parse(input, offset)?;
        LineNumberProgram::build(header, instructions)
    }

    /// Get the program at `offset`, decoding it on first use.
    ///
    /// Each offset is decoded at most once, even under concurrent callers. A
    /// program that fails to decode stays absent. Offsets outside the section
    /// are rejected without touching the cache.
    pub fn line_number_program(&self, offset: u64) -> Option<Arc<LineNumberProgram>> {
        if !self.contains(offset) {
            warn!(
                "No line program at {:#x}: outside .debug_line ({} bytes)",
                offset,
                self.data.len()
            );
            return None;
        }

        let cell = {
            let mut programs = self.programs.lock().unwrap_or_else(PoisonError::into_inner);
            Arc::clone(programs.entry(offset).or_default())
        };

        cell.get_or_init(|| match self.decode(offset) {
            Ok(program) => Some(Arc::new(program)),
            Err(err) => {
                warn!("No line program at {:#x}: {}", offset, err);
                None
            }
        })
        .clone()
    }

    /// Number of offsets whose decode has completed (successfully or not).
    pub fn decoded_count(&self) -> usize {
        let programs = self.programs.lock().unwrap_or_else(PoisonError::into_inner);
        programs.values().filter(|cell| cell.get().is_some()).count()
    }

    /// Drop every cached program.
    pub fn clear_cache(&mut self) {
        debug!("Clearing {} cached line programs", self.decoded_count());
        self.programs
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

impl LineProgramSource for DebugLine {
    fn line_number_program(&self, offset: u64) -> Option<Arc<LineNumberProgram>> {
        DebugLine::line_number_program(self, offset)
    }
}

impl std::fmt::Debug for DebugLine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DebugLine")
            .field("len", &self.data.len())
            .field("endian", &self.endian)
            .field("decoded", &self.decoded_count())
            .finish()
    }
}
