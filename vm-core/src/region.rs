//! Ordered set of defined virtual ranges with protection flags.

use crate::error::VmError;
use alloc::vec::Vec;
use bitflags::bitflags;
use vm_addresses::{VirtAddr, PAGE_SIZE, STACK_PAGES, USERSTACK};

bitflags! {
    /// Permissions a [`Region`] grants to the virtual pages it covers.
    ///
    /// The source ORs readable/writeable/executable into a single
    /// `valid_p` byte without distinguishing the individual bits; this
    /// core keeps them addressable so [`crate::load`] can test writability
    /// directly instead of re-deriving it from a combined mask.
    #[derive(Copy, Clone, Debug, Eq, PartialEq)]
    pub struct Permissions: u8 {
        const READ = 1 << 0;
        const WRITE = 1 << 1;
        const EXEC = 1 << 2;
    }
}

/// A half-open virtual range `[base, base+size)` with a currently enforced
/// and a saved permission set.
///
/// `saved_perm` mirrors `perm` outside of a load phase; the two diverge
/// only between [`AddressSpace::prepare_load`](crate::address_space::AddressSpace::prepare_load)
/// and [`AddressSpace::complete_load`](crate::address_space::AddressSpace::complete_load).
#[derive(Debug, Clone, Copy)]
pub struct Region {
    base: VirtAddr,
    size: u32,
    pub perm: Permissions,
    pub saved_perm: Permissions,
}

impl Region {
    #[inline]
    #[must_use]
    pub const fn base(&self) -> VirtAddr {
        self.base
    }

    #[inline]
    #[must_use]
    pub const fn size(&self) -> u32 {
        self.size
    }

    #[inline]
    #[must_use]
    pub fn end(&self) -> VirtAddr {
        self.base + self.size
    }

    /// Whether `addr` (not necessarily page-aligned) falls in `[base, end)`.
    #[inline]
    #[must_use]
    pub fn contains(&self, addr: VirtAddr) -> bool {
        addr.as_u32() >= self.base.as_u32() && addr.as_u32() < self.end().as_u32()
    }
}

/// Ordered set of [`Region`]s belonging to one address space.
///
/// No overlap check is performed between regions: overlap is undefined by
/// design, and well-behaved callers (the loader, stack setup) never
/// produce it.
#[derive(Debug, Default)]
pub struct RegionList {
    regions: Vec<Region>,
}

impl RegionList {
    #[must_use]
    pub fn new() -> Self {
        Self {
            regions: Vec::new(),
        }
    }

    /// Append a new region with `perm = saved_perm = perm`.
    pub fn define_region(
        &mut self,
        base: VirtAddr,
        size: u32,
        perm: Permissions,
    ) -> Result<(), VmError> {
        self.push(Region {
            base,
            size,
            perm,
            saved_perm: perm,
        })
    }

    pub(crate) fn push(&mut self, region: Region) -> Result<(), VmError> {
        self.regions
            .try_reserve(1)
            .map_err(|_| VmError::OutOfMemory)?;
        self.regions.push(region);
        Ok(())
    }

    /// Define the 16-page user stack region ending at `USERSTACK` with
    /// Read+Write permission, returning the initial stack pointer.
    pub fn define_stack(&mut self) -> Result<VirtAddr, VmError> {
        let size = STACK_PAGES * PAGE_SIZE;
        let base = VirtAddr::new(USERSTACK - size);
        self.define_region(base, size, Permissions::READ | Permissions::WRITE)?;
        Ok(VirtAddr::new(USERSTACK))
    }

    /// First region whose half-open range contains `addr`. `O(n)` over the
    /// defined regions.
    #[must_use]
    pub fn lookup(&self, addr: VirtAddr) -> Option<&Region> {
        self.regions.iter().find(|r| r.contains(addr))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Region> {
        self.regions.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Region> {
        self.regions.iter_mut()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.regions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn define_region_sets_equal_perm_and_saved_perm() {
        let mut regions = RegionList::new();
        regions
            .define_region(VirtAddr::new(0x1000), 0x1000, Permissions::READ)
            .unwrap();
        let r = regions.lookup(VirtAddr::new(0x1000)).unwrap();
        assert_eq!(r.perm, Permissions::READ);
        assert_eq!(r.saved_perm, Permissions::READ);
    }

    #[test]
    fn lookup_is_half_open() {
        let mut regions = RegionList::new();
        regions
            .define_region(VirtAddr::new(0x0040_0000), 0x1000, Permissions::READ)
            .unwrap();
        assert!(regions.lookup(VirtAddr::new(0x0040_0000)).is_some());
        assert!(regions.lookup(VirtAddr::new(0x0040_0fff)).is_some());
        assert!(regions.lookup(VirtAddr::new(0x0040_1000)).is_none());
    }

    #[test]
    fn define_stack_returns_userstack_top() {
        let mut regions = RegionList::new();
        let sp = regions.define_stack().unwrap();
        assert_eq!(sp, VirtAddr::new(USERSTACK));
        let region = regions.lookup(VirtAddr::new(USERSTACK - 1)).unwrap();
        assert_eq!(region.size(), STACK_PAGES * PAGE_SIZE);
        assert!(region.perm.contains(Permissions::READ | Permissions::WRITE));
        assert!(!region.perm.contains(Permissions::EXEC));
    }

    #[test]
    fn out_of_region_lookup_returns_none() {
        let regions = RegionList::new();
        assert!(regions.lookup(VirtAddr::new(0x1000)).is_none());
    }
}
