//! # MIPS R3000 Virtual-Memory Core
//!
//! Per-process address-space bookkeeping and demand-paged translation for a
//! teaching kernel targeting the MIPS R3000: a two-level software page
//! table, a region list with permission tracking, a fault handler that
//! lazily allocates frames and refills the TLB, and the load-phase hooks
//! that bracket the ELF loader's writes into freshly created address
//! spaces.
//!
//! ## Architecture
//!
//! | Component | Module | Responsibility |
//! |---|---|---|
//! | Page table | [`page_table`] | Two-level translation map, virtual page → [`entrylo::EntryLo`] |
//! | Region list | [`region`] | Ordered set of defined virtual ranges with protection flags |
//! | Address space | [`address_space`] | Aggregates a page table and a region list |
//! | Load-phase hooks | [`load`] | Temporary write relaxation around program loading |
//! | Fault handler | [`fault`] | TLB-miss / protection-violation entry point |
//!
//! ## Collaborators
//!
//! This crate owns none of the physical-frame allocator, the TLB hardware
//! interface, or the interrupt-priority primitive. It consumes them through
//! the [`FrameAllocator`], [`FrameMapper`], [`tlb::Tlb`] and [`Interrupts`]
//! traits, so a host kernel supplies concrete implementations and this
//! crate stays free of any assumption about how frames are tracked or how
//! the TLB is wired.

#![cfg_attr(not(test), no_std)]

extern crate alloc;

pub mod address_space;
pub mod entrylo;
pub mod error;
pub mod fault;
pub mod load;
pub mod page_table;
pub mod region;
pub mod tlb;

#[cfg(test)]
pub(crate) mod test_support;

use vm_addresses::FrameNumber;

pub use address_space::AddressSpace;
pub use error::VmError;
pub use fault::{vm_fault, FaultKind};
pub use tlb::Tlb;

/// The physical-frame allocator consumed by this core.
///
/// Mirrors `alloc_kpages(1)`/`free_kpages`: frames are always allocated and
/// freed one at a time, zero-filled by the allocator before being handed
/// out.
pub trait FrameAllocator {
    /// Allocate one zero-filled physical frame, or `None` on exhaustion.
    fn alloc_frame(&mut self) -> Option<FrameNumber>;

    /// Release a frame previously returned by [`alloc_frame`](Self::alloc_frame).
    fn free_frame(&mut self, frame: FrameNumber);
}

/// Byte-level access to physical frames through the kernel's direct-mapped
/// segment, used only by [`AddressSpace::copy`] to duplicate page
/// contents during fork.
///
/// Mirrors `PADDR_TO_KVADDR` plus `memmove`.
pub trait FrameMapper {
    /// Copy the full contents of `src` into `dst`. Both frames must be
    /// backed by real storage; the core never calls this with an
    /// unallocated frame number.
    fn copy_frame(&mut self, dst: FrameNumber, src: FrameNumber);
}

/// Interrupt-priority control, mirroring `splhigh`/`splx`.
///
/// Implementations must nest correctly: [`raise_high`](Self::raise_high)
/// returns a guard that restores the previous priority level on drop,
/// regardless of the path taken out of the bracketed block.
pub trait Interrupts {
    /// Opaque previous priority level, passed back to the restore call.
    type Mark: Copy;

    /// Raise to the highest interrupt priority, returning the previous level.
    fn splhigh(&self) -> Self::Mark;

    /// Restore a previously saved priority level.
    fn splx(&self, mark: Self::Mark);

    /// RAII bracket: raise on construction, restore on drop.
    fn raise_high(&self) -> SplGuard<'_, Self>
    where
        Self: Sized,
    {
        let mark = self.splhigh();
        SplGuard {
            irq: self,
            mark: Some(mark),
        }
    }
}

/// Guard returned by [`Interrupts::raise_high`]; restores the saved
/// priority level when dropped.
pub struct SplGuard<'a, I: Interrupts + ?Sized> {
    irq: &'a I,
    mark: Option<I::Mark>,
}

impl<I: Interrupts + ?Sized> Drop for SplGuard<'_, I> {
    fn drop(&mut self) {
        if let Some(mark) = self.mark.take() {
            self.irq.splx(mark);
        }
    }
}
