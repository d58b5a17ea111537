//! Fakes for the collaborator traits, shared by this crate's unit tests.

use crate::entrylo::EntryLo;
use crate::tlb::Tlb;
use crate::{FrameAllocator, FrameMapper, Interrupts};
use alloc::vec::Vec;
use vm_addresses::{FrameNumber, VirtAddr, PAGE_SIZE};

type Page = [u8; PAGE_SIZE as usize];

/// Bump allocator over an in-memory page pool. Frees are counted but the
/// backing slot is not reused, which is fine for the reclaim-count
/// invariants these tests check.
#[derive(Default)]
pub(crate) struct FakeFrames {
    next: u32,
    pub(crate) outstanding: i64,
    pages: Vec<Page>,
}

impl FakeFrames {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn write_byte(&mut self, frame: FrameNumber, offset: usize, value: u8) {
        self.pages[frame.as_u32() as usize][offset] = value;
    }

    pub(crate) fn read_byte(&mut self, frame: FrameNumber, offset: usize) -> u8 {
        self.pages[frame.as_u32() as usize][offset]
    }
}

impl FrameAllocator for FakeFrames {
    fn alloc_frame(&mut self) -> Option<FrameNumber> {
        let frame = FrameNumber::new(self.next);
        self.next += 1;
        self.outstanding += 1;
        self.pages.push([0; PAGE_SIZE as usize]);
        Some(frame)
    }

    fn free_frame(&mut self, _frame: FrameNumber) {
        self.outstanding -= 1;
    }
}

impl FrameMapper for FakeFrames {
    fn copy_frame(&mut self, dst: FrameNumber, src: FrameNumber) {
        let data = self.pages[src.as_u32() as usize];
        self.pages[dst.as_u32() as usize] = data;
    }
}

/// A [`FrameAllocator`] that always reports exhaustion, for exercising
/// `OUT_OF_MEMORY` paths.
pub(crate) struct ExhaustedFrames;

impl FrameAllocator for ExhaustedFrames {
    fn alloc_frame(&mut self) -> Option<FrameNumber> {
        None
    }

    fn free_frame(&mut self, _frame: FrameNumber) {}
}

impl FrameMapper for ExhaustedFrames {
    fn copy_frame(&mut self, _dst: FrameNumber, _src: FrameNumber) {
        unreachable!("allocation always fails before a copy would be attempted")
    }
}

#[derive(Default)]
pub(crate) struct FakeTlb {
    pub(crate) writes: Vec<(VirtAddr, EntryLo)>,
    pub(crate) random_writes: Vec<(VirtAddr, EntryLo)>,
}

impl Tlb for FakeTlb {
    fn write(&mut self, _index: usize, entry_hi: VirtAddr, entry_lo: EntryLo) {
        self.writes.push((entry_hi, entry_lo));
    }

    fn write_random(&mut self, entry_hi: VirtAddr, entry_lo: EntryLo) {
        self.random_writes.push((entry_hi, entry_lo));
    }
}

pub(crate) struct FakeInterrupts;

impl Interrupts for FakeInterrupts {
    type Mark = u32;

    fn splhigh(&self) -> u32 {
        0
    }

    fn splx(&self, _mark: u32) {}
}
