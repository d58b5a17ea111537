//! TLB refill and invalidation, bracketed by raised interrupt priority.

use crate::entrylo::EntryLo;
use crate::Interrupts;
use vm_addresses::{VirtAddr, NUM_TLB, PAGE_SIZE};

/// Hardware TLB interface consumed by this core: install one entry at a
/// fixed index, or let the hardware pick a random slot.
///
/// Mirrors `tlb_write`/`tlb_random`.
pub trait Tlb {
    fn write(&mut self, index: usize, entry_hi: VirtAddr, entry_lo: EntryLo);
    fn write_random(&mut self, entry_hi: VirtAddr, entry_lo: EntryLo);
}

/// Refill the TLB with `(page, entry)` at a hardware-chosen slot,
/// atomically with respect to interrupt handlers that might also touch
/// the TLB (e.g. a context switch).
pub(crate) fn refill<T: Tlb, I: Interrupts>(tlb: &mut T, irq: &I, page: VirtAddr, entry: EntryLo) {
    let _guard = irq.raise_high();
    tlb.write_random(page, entry);
}

/// Invalidate every TLB slot in one atomic sweep. Each invalidated slot's
/// virtual half is set to a distinct, unmappable sentinel address so a
/// stale hit can never alias a real translation.
pub(crate) fn invalidate_all<T: Tlb, I: Interrupts>(tlb: &mut T, irq: &I) {
    let _guard = irq.raise_high();
    for index in 0..NUM_TLB {
        let entry_hi = VirtAddr::new(0x8000_0000_u32.wrapping_add((index as u32) * PAGE_SIZE));
        tlb.write(index, entry_hi, EntryLo::INVALID);
    }
}
