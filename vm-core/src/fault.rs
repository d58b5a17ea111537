//! TLB-miss / protection-violation entry point.

use crate::address_space::AddressSpace;
use crate::entrylo::EntryLo;
use crate::error::VmError;
use crate::region::Permissions;
use crate::tlb::{refill, Tlb};
use crate::{FrameAllocator, Interrupts};
use log::{trace, warn};
use vm_addresses::VirtAddr;

/// The kind of access that trapped into the fault handler.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum FaultKind {
    /// A write reached a page whose Dirty bit is clear: this core does not
    /// support writing through a read-only mapping.
    ReadOnly,
    Read,
    Write,
}

/// Resolve a TLB miss or protection violation.
///
/// `current` mirrors `proc_getas()`: `None` means no address space is set
/// up (a kernel thread, or an early-boot fault), which is always reported
/// as [`VmError::InvalidAddress`].
///
/// # Errors
/// - [`VmError::InvalidAddress`] for a null-page trap, a `ReadOnly` fault,
///   a miss outside every region, or a missing address space.
/// - [`VmError::OutOfMemory`] if demand-allocating a frame fails.
pub fn vm_fault(
    current: Option<&mut AddressSpace>,
    frame_alloc: &mut impl FrameAllocator,
    tlb: &mut impl Tlb,
    irq: &impl Interrupts,
    kind: FaultKind,
    fault_addr: VirtAddr,
) -> Result<(), VmError> {
    if fault_addr.as_u32() == 0 {
        return Err(VmError::InvalidAddress);
    }
    if kind == FaultKind::ReadOnly {
        return Err(VmError::InvalidAddress);
    }

    let Some(as_) = current else {
        return Err(VmError::InvalidAddress);
    };

    let fault_page = fault_addr.page_floor();
    let region_ok = as_.regions.lookup(fault_addr).is_some();

    if let Some(entry) = as_.page_table.lookup(fault_page) {
        if !region_ok {
            // A mapping survives outside every region: a region was torn
            // down while a stale page-table entry remained. Drop through
            // to the same fault the miss path would give.
            warn!("stale page-table entry at {fault_page} outside any region");
            return Err(VmError::InvalidAddress);
        }
        trace!("TLB refill (hit) for {fault_page}");
        refill(tlb, irq, fault_page, entry);
        return Ok(());
    }

    if !region_ok {
        return Err(VmError::InvalidAddress);
    }
    let region = as_
        .regions
        .lookup(fault_addr)
        .expect("region_ok was true for this address");

    let frame = frame_alloc.alloc_frame().ok_or(VmError::OutOfMemory)?;
    let mut entry = EntryLo::for_frame(frame);
    if region.perm.contains(Permissions::WRITE) {
        entry = entry.with_dirty(true);
    }

    if let Err(err) = as_.page_table.install(fault_page, entry) {
        frame_alloc.free_frame(frame);
        return Err(err.into());
    }

    trace!("first-touch map {fault_page} -> frame {:?}", entry.frame());
    refill(tlb, irq, fault_page, entry);
    Ok(())
}
