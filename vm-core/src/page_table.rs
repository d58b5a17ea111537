//! Two-level sparse page table keyed by virtual page number.
//!
//! ```text
//! virtual address (32 bits)
//! | 31..21 top (11 bits) | 20..12 bot (9 bits) | 11..0 offset |
//! ```
//!
//! The top level has 2048 slots, each either absent or pointing at a
//! 512-entry leaf array. A top-level slot is allocated lazily on the first
//! [`install`](PageTable::install) that targets it; once allocated, all 512
//! leaf entries exist and default to [`EntryLo::INVALID`].

use crate::entrylo::EntryLo;
use crate::error::{InstallError, VmError};
use crate::FrameAllocator;
use alloc::vec::Vec;
use vm_addresses::{VirtAddr, BOT_ENTRIES, TOP_ENTRIES};

type Leaf = Vec<EntryLo>;

/// Owns every physical frame referenced by its leaf entries; see
/// [`destroy`](PageTable::destroy).
#[derive(Default)]
pub struct PageTable {
    top: Vec<Option<Leaf>>,
}

impl PageTable {
    /// Allocate the 2048-slot top level, every slot initially absent.
    ///
    /// # Errors
    /// Returns [`VmError::OutOfMemory`] if the top level cannot be allocated.
    pub fn create() -> Result<Self, VmError> {
        let mut top = Vec::new();
        top.try_reserve_exact(TOP_ENTRIES)
            .map_err(|_| VmError::OutOfMemory)?;
        top.resize_with(TOP_ENTRIES, || None);
        Ok(Self { top })
    }

    /// Translate `va` to its leaf entry, or `None` if unmapped.
    ///
    /// `va` need not be page-aligned; only the page-table index bits are
    /// consulted.
    #[must_use]
    pub fn lookup(&self, va: VirtAddr) -> Option<EntryLo> {
        let leaf = self.top[va.top_index()].as_ref()?;
        let entry = leaf[va.bot_index()];
        entry.is_present().then_some(entry)
    }

    /// Install `entry` at `va`, allocating the leaf array on demand.
    ///
    /// # Errors
    /// - [`InstallError::AlreadyMapped`] if a present entry already occupies the slot.
    /// - [`InstallError::OutOfMemory`] if leaf-array allocation fails.
    pub(crate) fn install(&mut self, va: VirtAddr, entry: EntryLo) -> Result<(), InstallError> {
        let top_i = va.top_index();
        if self.top[top_i].is_none() {
            let mut leaf = Vec::new();
            leaf.try_reserve_exact(BOT_ENTRIES)
                .map_err(|_| InstallError::OutOfMemory)?;
            leaf.resize(BOT_ENTRIES, EntryLo::INVALID);
            self.top[top_i] = Some(leaf);
        }
        let leaf = self.top[top_i].as_mut().expect("leaf just allocated");
        let slot = &mut leaf[va.bot_index()];
        if slot.is_present() {
            return Err(InstallError::AlreadyMapped);
        }
        *slot = entry;
        Ok(())
    }

    /// Visit every present `(virtual page address, entry)` pair, allowing
    /// the entry to be rewritten in place.
    pub fn for_each_present_mut(&mut self, mut f: impl FnMut(VirtAddr, &mut EntryLo)) {
        for (top_i, leaf) in self.top.iter_mut().enumerate() {
            let Some(leaf) = leaf else { continue };
            for (bot_i, entry) in leaf.iter_mut().enumerate() {
                if entry.is_present() {
                    f(VirtAddr::from_parts(top_i, bot_i), entry);
                }
            }
        }
    }

    /// Visit every present `(virtual page address, entry)` pair, stopping
    /// at the first error the visitor returns.
    pub fn try_for_each_present<E>(
        &self,
        mut f: impl FnMut(VirtAddr, EntryLo) -> Result<(), E>,
    ) -> Result<(), E> {
        for (top_i, leaf) in self.top.iter().enumerate() {
            let Some(leaf) = leaf else { continue };
            for (bot_i, entry) in leaf.iter().enumerate() {
                if entry.is_present() {
                    f(VirtAddr::from_parts(top_i, bot_i), *entry)?;
                }
            }
        }
        Ok(())
    }

    /// Free every referenced physical frame through `frame_alloc`. The
    /// leaf arrays and the top level are reclaimed by ordinary drop once
    /// this method returns.
    pub fn destroy(self, frame_alloc: &mut impl FrameAllocator) {
        for leaf in self.top.iter().flatten() {
            for entry in leaf.iter().copied().filter(|e| e.is_present()) {
                frame_alloc.free_frame(entry.frame());
            }
        }
    }
}
