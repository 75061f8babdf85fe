//! Volatile window over an already-mapped hardware region
//!
//! The mapping itself (`ioremap_nocache`, `mmap` of `/dev/mem`, an identity
//! map on bare metal) belongs to the platform layer. This type only wraps the
//! resulting virtual address and length.

use super::window::{check_access, RegisterWindow, WindowError};

pub struct MmioWindow {
    base: *mut u8,
    len: usize,
}

impl MmioWindow {
    /// Wrap a mapped region
    ///
    /// # Safety
    /// `base` must point to `len` bytes that stay mapped, readable and
    /// writable for the lifetime of the window, with no other writer.
    pub unsafe fn new(base: *mut u8, len: usize) -> Self {
        Self { base, len }
    }

    /// Virtual address of the window
    pub fn base(&self) -> *mut u8 {
        self.base
    }
}

impl RegisterWindow for MmioWindow {
    fn len(&self) -> usize {
        self.len
    }

    #[inline]
    fn read_u8(&self, offset: usize) -> Result<u8, WindowError> {
        check_access(offset, 1, self.len)?;
        unsafe { Ok(core::ptr::read_volatile(self.base.add(offset))) }
    }

    #[inline]
    fn write_u8(&mut self, offset: usize, value: u8) -> Result<(), WindowError> {
        check_access(offset, 1, self.len)?;
        unsafe { core::ptr::write_volatile(self.base.add(offset), value) };
        Ok(())
    }

    #[inline]
    fn read_u16(&self, offset: usize) -> Result<u16, WindowError> {
        check_access(offset, 2, self.len)?;
        unsafe { Ok(core::ptr::read_volatile(self.base.add(offset) as *const u16)) }
    }

    #[inline]
    fn write_u16(&mut self, offset: usize, value: u16) -> Result<(), WindowError> {
        check_access(offset, 2, self.len)?;
        unsafe { core::ptr::write_volatile(self.base.add(offset) as *mut u16, value) };
        Ok(())
    }

    #[inline]
    fn read_u32(&self, offset: usize) -> Result<u32, WindowError> {
        check_access(offset, 4, self.len)?;
        unsafe { Ok(core::ptr::read_volatile(self.base.add(offset) as *const u32)) }
    }

    #[inline]
    fn write_u32(&mut self, offset: usize, value: u32) -> Result<(), WindowError> {
        check_access(offset, 4, self.len)?;
        unsafe { core::ptr::write_volatile(self.base.add(offset) as *mut u32, value) };
        Ok(())
    }
}
