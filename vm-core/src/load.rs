//! Load-phase hooks bracketing the ELF loader's writes into a
//! not-yet-writable address space.

use crate::address_space::AddressSpace;
use crate::entrylo::EntryLo;
use crate::region::Permissions;
use crate::tlb::{invalidate_all, Tlb};
use crate::Interrupts;

impl AddressSpace {
    /// Save every region's current permission set and grant it `{R, W,
    /// X}`, letting the loader write into segments (e.g. text) that are
    /// not normally writable.
    pub fn prepare_load(&mut self) {
        for region in self.regions.iter_mut() {
            region.saved_perm = region.perm;
            region.perm = Permissions::READ | Permissions::WRITE | Permissions::EXEC;
        }
    }

    /// Restore every region's saved permission set, then harden every
    /// resident page-table entry to match: the Dirty bit is set iff the
    /// restored permissions include Write. Finally invalidate the TLB so
    /// no stale, temporarily-writable translation can leak.
    ///
    /// A present entry whose virtual address falls in no region is left
    /// untouched, matching the source.
    pub fn complete_load<T: Tlb, I: Interrupts>(&mut self, tlb: &mut T, irq: &I) {
        for region in self.regions.iter_mut() {
            region.perm = region.saved_perm;
        }

        let regions = &self.regions;
        self.page_table.for_each_present_mut(|va, entry| {
            if let Some(region) = regions.lookup(va) {
                let mut rebuilt = EntryLo::for_frame(entry.frame());
                if region.perm.contains(Permissions::WRITE) {
                    rebuilt = rebuilt.with_dirty(true);
                }
                *entry = rebuilt;
            }
        });

        invalidate_all(tlb, irq);
    }
}
