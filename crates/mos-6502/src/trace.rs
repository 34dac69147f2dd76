//! Instruction trace ring.
//!
//! One fixed-size record per decoded instruction, holding the machine state
//! just before it executed. Records are plain bytes so a host can dump the
//! ring to a file and read it back without a schema.

use bytemuck::{Pod, Zeroable};
use ringbuf::HeapRb;
use ringbuf::traits::{Consumer, Observer, RingBuffer};

/// Trace record: program counter, the opcode and the two bytes after it,
/// then the registers as they were before the instruction ran.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Pod, Zeroable)]
pub struct TraceEntry {
    pub pcl: u8,
    pub pch: u8,
    pub opcode: u8,
    pub operand1: u8,
    pub operand2: u8,
    pub a: u8,
    pub x: u8,
    pub y: u8,
    pub s: u8,
    pub p: u8,
}

impl TraceEntry {
    /// Size of one record in bytes.
    pub const SIZE: usize = size_of::<Self>();

    /// Address the instruction was fetched from.
    #[must_use]
    pub fn pc(&self) -> u16 {
        u16::from_le_bytes([self.pcl, self.pch])
    }

    /// Operand word, meaningful for three-byte instructions.
    #[must_use]
    pub fn operand_word(&self) -> u16 {
        u16::from_le_bytes([self.operand1, self.operand2])
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::bytes_of(self)
    }

    #[must_use]
    pub fn from_bytes(bytes: [u8; Self::SIZE]) -> Self {
        bytemuck::cast(bytes)
    }
}

/// Fixed-capacity ring of trace records. The oldest record is dropped when
/// a new one arrives at capacity.
pub struct TraceLog {
    ring: HeapRb<TraceEntry>,
}

impl TraceLog {
    /// Create a log holding at most `capacity` records (at least one).
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            ring: HeapRb::new(capacity.max(1)),
        }
    }

    pub fn record(&mut self, entry: TraceEntry) {
        self.ring.push_overwrite(entry);
    }

    /// Records, oldest first.
    pub fn entries(&self) -> impl Iterator<Item = &TraceEntry> {
        self.ring.iter()
    }

    /// Most recent record.
    #[must_use]
    pub fn last(&self) -> Option<&TraceEntry> {
        self.ring.iter().last()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.ring.occupied_len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ring.is_empty()
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.ring.capacity().get()
    }

    pub fn clear(&mut self) {
        self.ring.clear();
    }

    /// All records concatenated, oldest first.
    #[must_use]
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(self.len() * TraceEntry::SIZE);
        for entry in self.ring.iter() {
            bytes.extend_from_slice(entry.as_bytes());
        }
        bytes
    }
}

impl std::fmt::Debug for TraceLog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TraceLog")
            .field("len", &self.len())
            .field("capacity", &self.capacity())
            .finish()
    }
}
