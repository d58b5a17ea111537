//! The TLB entry-low word: the 32-bit unit of currency between the page
//! table and the hardware TLB.
//!
//! ```text
//! 31                  12 11 10 9 8 7            0
//! |  frame number (20)  | N | D | V | G | rsv (0) |
//! ```
//!
//! Bit positions match OS-161's `TLBLO_*` constants: `TLBLO_GLOBAL` (bit 8),
//! `TLBLO_VALID` (bit 9), `TLBLO_DIRTY` (bit 10), `TLBLO_NOCACHE` (bit 11),
//! `TLBLO_PPAGE` (bits 12..31), with the low 8 bits reserved (always zero in
//! this core; no cache-coherency hinting is used).

use bitfield_struct::bitfield;
use vm_addresses::FrameNumber;

/// A TLB entry-low word. `EntryLo::INVALID` (all bits zero) is the "no
/// mapping" sentinel used throughout the page table: a present entry
/// always has [`valid`](Self::valid) set.
#[bitfield(u32)]
pub struct EntryLo {
    #[bits(8)]
    __: u8,
    /// Global bit: TLB entry ignores the address-space ID on lookup.
    /// Unused by this core; always clear.
    pub global: bool,
    /// Valid bit: the frame number is meaningful.
    pub valid: bool,
    /// Dirty bit: doubles as the write-permission gate on this
    /// architecture. Clear means "read-only"; a write through a
    /// non-dirty entry traps as `VM_FAULT_READONLY`.
    pub dirty: bool,
    /// NoCache bit. Unused by this core; always clear.
    pub nocache: bool,
    #[bits(20)]
    frame_bits: u32,
}

impl EntryLo {
    /// The "no mapping" sentinel: every bit zero.
    pub const INVALID: Self = Self::new();

    /// Build a present, valid entry mapping `frame`, with the Dirty bit
    /// clear. Callers set it with [`with_dirty`](Self::with_dirty) when
    /// the containing region is currently writable.
    #[inline]
    #[must_use]
    pub fn for_frame(frame: FrameNumber) -> Self {
        Self::new().with_frame_bits(frame.as_u32()).with_valid(true)
    }

    /// Whether this entry carries a mapping at all (non-zero raw bits).
    #[inline]
    #[must_use]
    pub const fn is_present(self) -> bool {
        self.into_bits() != 0
    }

    /// The mapped physical frame. Meaningless if [`is_present`](Self::is_present) is false.
    #[inline]
    #[must_use]
    pub const fn frame(self) -> FrameNumber {
        FrameNumber::new(self.frame_bits())
    }
}
