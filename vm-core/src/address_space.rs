//! Address space: aggregates one page table and one region list.

use crate::entrylo::EntryLo;
use crate::error::VmError;
use crate::page_table::PageTable;
use crate::region::{Permissions, RegionList};
use crate::tlb::{invalidate_all, Tlb};
use crate::{FrameAllocator, FrameMapper, Interrupts};
use vm_addresses::VirtAddr;

/// Owns exactly one page table and one region list, plus a cached
/// stack-top pointer. Destroying an address space destroys both in one
/// unit; forking deep-copies both.
///
/// Fields are `pub(crate)` rather than accessed only through this module:
/// [`crate::load`] and [`crate::fault`] both need to borrow `regions` and
/// `page_table` independently and simultaneously, which a same-crate field
/// borrow supports but a pair of accessor methods taking `&self`/`&mut
/// self` would not.
pub struct AddressSpace {
    pub(crate) page_table: PageTable,
    pub(crate) regions: RegionList,
    stack_top: Option<VirtAddr>,
}

impl AddressSpace {
    /// Allocate the struct, install an empty page table, no regions defined.
    ///
    /// # Errors
    /// Returns [`VmError::OutOfMemory`] if the page table's top level
    /// cannot be allocated. The source leaks the outer struct on this
    /// path (`kmalloc`s `as` before `create_pagetable` can fail, and never
    /// frees it); here there is nothing heap-allocated yet to leak, since
    /// the struct itself is returned by value.
    pub fn create() -> Result<Self, VmError> {
        Ok(Self {
            page_table: PageTable::create()?,
            regions: RegionList::new(),
            stack_top: None,
        })
    }

    #[must_use]
    pub fn regions(&self) -> &RegionList {
        &self.regions
    }

    #[must_use]
    pub fn page_table(&self) -> &PageTable {
        &self.page_table
    }

    #[must_use]
    pub fn stack_top(&self) -> Option<VirtAddr> {
        self.stack_top
    }

    /// Append a new region. See [`RegionList::define_region`].
    pub fn define_region(
        &mut self,
        base: VirtAddr,
        size: u32,
        perm: Permissions,
    ) -> Result<(), VmError> {
        self.regions.define_region(base, size, perm)
    }

    /// Define the fixed-size user stack region. See [`RegionList::define_stack`].
    pub fn define_stack(&mut self) -> Result<VirtAddr, VmError> {
        let top = self.regions.define_stack()?;
        self.stack_top = Some(top);
        Ok(top)
    }

    /// Destroy the page table, releasing every physical frame it
    /// references through `frame_alloc`. Regions are dropped along with
    /// `self`; they own no external resources.
    pub fn destroy(self, frame_alloc: &mut impl FrameAllocator) {
        self.page_table.destroy(frame_alloc);
    }

    /// Deep-copy: clone every region, and physically duplicate every
    /// resident page into a freshly allocated frame.
    ///
    /// Transactional: on any failure, every frame and structure already
    /// allocated for the new address space is released before the error
    /// is returned. The source leaks all of it on this path; this is the
    /// fix required to make fork safe to retry after `OUT_OF_MEMORY`.
    ///
    /// # Errors
    /// Returns [`VmError::OutOfMemory`] if any allocation along the way fails.
    pub fn copy<M>(&self, mem: &mut M) -> Result<Self, VmError>
    where
        M: FrameAllocator + FrameMapper,
    {
        let mut new_as = Self::create()?;

        for region in self.regions.iter() {
            if let Err(err) = new_as.regions.push(*region) {
                new_as.destroy(mem);
                return Err(err);
            }
        }
        new_as.stack_top = self.stack_top;

        let result = self.page_table.try_for_each_present(|va, entry| {
            let new_frame = mem.alloc_frame().ok_or(VmError::OutOfMemory)?;
            mem.copy_frame(new_frame, entry.frame());

            let mut new_entry = EntryLo::for_frame(new_frame);
            if entry.dirty() {
                new_entry = new_entry.with_dirty(true);
            }

            new_as.page_table.install(va, new_entry).map_err(|_| {
                mem.free_frame(new_frame);
                VmError::OutOfMemory
            })
        });

        if let Err(err) = result {
            new_as.destroy(mem);
            return Err(err);
        }

        Ok(new_as)
    }

    /// Invalidate the whole TLB under raised interrupt priority. Does
    /// nothing if `current` is `None` (a kernel thread with no address
    /// space in place).
    pub fn activate(current: Option<&Self>, tlb: &mut impl Tlb, irq: &impl Interrupts) {
        if current.is_none() {
            return;
        }
        invalidate_all(tlb, irq);
    }

    /// Identical to [`activate`](Self::activate). The source gives the two
    /// entry points the same body; kept distinct here because the host
    /// kernel calls them from different sites (context switch vs. the end
    /// of [`crate::load::complete_load`]).
    pub fn deactivate(current: Option<&Self>, tlb: &mut impl Tlb, irq: &impl Interrupts) {
        Self::activate(current, tlb, irq);
    }
}
