//! Routes 14-bit PPU addresses through a 16-slot table of either
//! directly-mapped 1 KiB pages or handler callbacks, and keeps the
//! pattern-tile cache in sync with CHR-RAM writes.
//!
//! Page slots are `Rc<RefCell<_>>` rather than raw pointers: the mapper can
//! rewrite a bank between any two CPU instructions and the bus must see the
//! new contents on its very next access, but safe Rust has no sound way to
//! stash a pointer with that lifetime. Shared ownership sidesteps the
//! problem entirely and costs nothing extra in a single-threaded core.

use std::cell::RefCell;
use std::rc::Rc;

use crate::diagnostics::{DiagnosticSink, IoChannel, TracingSink};
use crate::error::PpuBusError;
use crate::mem_block::ppu::Page;
use crate::memory::ppu as ppu_mem;
use crate::pattern_cache::{self, TileRows};

pub type SharedPage = Rc<RefCell<Page>>;
pub type SharedCachePage = Rc<RefCell<Vec<TileRows>>>;

type ReadHandler = Box<dyn FnMut(u16) -> u8>;
type WriteHandler = Box<dyn FnMut(u16, u8)>;
type ReadIntercept = Box<dyn FnMut(&mut PpuBus, u16) -> u8>;
type WriteIntercept = Box<dyn FnMut(&mut PpuBus, u16, u8)>;

const TILES_PER_PAGE: usize = ppu_mem::PAGE_SIZE / ppu_mem::TILE_SIZE as usize;

#[derive(Default)]
enum ReadSlot {
    #[default]
    Unmapped,
    Mapped(SharedPage),
    Handler(ReadHandler),
}

#[derive(Default)]
enum WriteSlot {
    #[default]
    Unmapped,
    Mapped(SharedPage),
    Handler(WriteHandler),
}

/// 14-bit-addressed PPU memory bus: pattern tables, nametables and whatever
/// else a mapper chooses to map below `$3F00` (the palette lives in
/// [`crate::palette::PaletteStore`] and is not routed through here).
pub struct PpuBus {
    read_pages: [ReadSlot; ppu_mem::PAGE_COUNT],
    write_pages: [WriteSlot; ppu_mem::PAGE_COUNT],
    cache_pages: [Option<(SharedCachePage, SharedCachePage)>; ppu_mem::PAGE_COUNT],
    read_intercept: Option<ReadIntercept>,
    write_intercept: Option<WriteIntercept>,
    sink: Box<dyn DiagnosticSink>,
}

impl Default for PpuBus {
    fn default() -> Self {
        Self {
            read_pages: std::array::from_fn(|_| ReadSlot::Unmapped),
            write_pages: std::array::from_fn(|_| WriteSlot::Unmapped),
            cache_pages: std::array::from_fn(|_| None),
            read_intercept: None,
            write_intercept: None,
            sink: Box::new(TracingSink),
        }
    }
}

impl PpuBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_diagnostic_sink(&mut self, sink: Box<dyn DiagnosticSink>) {
        self.sink = sink;
    }

    fn page_index(addr: u16) -> usize {
        usize::from((addr & ppu_mem::ADDR_MASK) >> 10 & 0xF)
    }

    fn offset_in_page(addr: u16) -> usize {
        usize::from(addr & 0x3FF)
    }

    fn check_page(page: u8) -> Result<usize, PpuBusError> {
        let page = usize::from(page);
        if page < ppu_mem::PAGE_COUNT {
            Ok(page)
        } else {
            Err(PpuBusError::PageOutOfRange(page as u8))
        }
    }

    pub fn install_read_page(&mut self, page: u8, memory: Option<SharedPage>) -> Result<(), PpuBusError> {
        let page = Self::check_page(page)?;
        self.read_pages[page] = match memory {
            Some(mem) => ReadSlot::Mapped(mem),
            None => ReadSlot::Unmapped,
        };
        Ok(())
    }

    pub fn install_write_page(&mut self, page: u8, memory: Option<SharedPage>) -> Result<(), PpuBusError> {
        let page = Self::check_page(page)?;
        self.write_pages[page] = match memory {
            Some(mem) => WriteSlot::Mapped(mem),
            None => WriteSlot::Unmapped,
        };
        Ok(())
    }

    pub fn install_read_handler(&mut self, page: u8, handler: Option<ReadHandler>) -> Result<(), PpuBusError> {
        let page = Self::check_page(page)?;
        self.read_pages[page] = match handler {
            Some(f) => ReadSlot::Handler(f),
            None => ReadSlot::Unmapped,
        };
        Ok(())
    }

    pub fn install_write_handler(&mut self, page: u8, handler: Option<WriteHandler>) -> Result<(), PpuBusError> {
        let page = Self::check_page(page)?;
        self.write_pages[page] = match handler {
            Some(f) => WriteSlot::Handler(f),
            None => WriteSlot::Unmapped,
        };
        Ok(())
    }

    /// Installs the two pre-decoded cache buffers (normal, horizontally
    /// flipped) backing a pattern-table page. Passing `None` drops caching
    /// for that page; writes through it will no longer recompute tiles.
    pub fn install_cache_pages(
        &mut self,
        page: u8,
        cache: Option<(SharedCachePage, SharedCachePage)>,
    ) -> Result<(), PpuBusError> {
        let page = Self::check_page(page)?;
        self.cache_pages[page] = cache;
        Ok(())
    }

    pub fn set_read_interceptor(&mut self, f: Option<ReadIntercept>) {
        self.read_intercept = f;
    }

    pub fn set_write_interceptor(&mut self, f: Option<WriteIntercept>) {
        self.write_intercept = f;
    }

    /// Reads through the installed interceptor, falling back to
    /// [`Self::read_direct`] when none is installed.
    pub fn read(&mut self, addr: u16) -> u8 {
        if let Some(mut f) = self.read_intercept.take() {
            let value = f(self, addr);
            self.read_intercept = Some(f);
            value
        } else {
            self.read_direct(addr)
        }
    }

    /// Writes through the installed interceptor, falling back to
    /// [`Self::write_direct`] when none is installed.
    pub fn write(&mut self, addr: u16, data: u8) {
        if let Some(mut f) = self.write_intercept.take() {
            f(self, addr, data);
            self.write_intercept = Some(f);
        } else {
            self.write_direct(addr, data);
        }
    }

    /// Built-in page-table routing, bypassing any installed interceptor.
    pub fn read_direct(&mut self, addr: u16) -> u8 {
        let page = Self::page_index(addr);
        let offset = Self::offset_in_page(addr);
        match &mut self.read_pages[page] {
            ReadSlot::Mapped(mem) => mem.borrow()[offset],
            ReadSlot::Handler(f) => f(addr),
            ReadSlot::Unmapped => {
                self.sink.log(IoChannel::UnmappedRead, addr, None);
                0
            }
        }
    }

    /// Built-in page-table routing, bypassing any installed interceptor.
    pub fn write_direct(&mut self, addr: u16, data: u8) {
        let page = Self::page_index(addr);
        let offset = Self::offset_in_page(addr);
        match &mut self.write_pages[page] {
            WriteSlot::Mapped(mem) => {
                mem.borrow_mut()[offset] = data;
                if addr < ppu_mem::PATTERN_TABLE_END {
                    self.refresh_tile_cache(page, offset);
                }
            }
            WriteSlot::Handler(f) => f(addr, data),
            WriteSlot::Unmapped => {
                self.sink.log(IoChannel::UnmappedWrite, addr, Some(data));
            }
        }
    }

    fn refresh_tile_cache(&mut self, page: usize, offset: usize) {
        let Some((normal, hflip)) = &self.cache_pages[page] else {
            return;
        };
        let ReadSlot::Mapped(source) = &self.read_pages[page] else {
            return;
        };
        let tile_index = offset / ppu_mem::TILE_SIZE as usize;
        if tile_index >= TILES_PER_PAGE {
            return;
        }
        let tile_start = tile_index * ppu_mem::TILE_SIZE as usize;
        let source = source.borrow();
        let tile_bytes = &source[tile_start..tile_start + ppu_mem::TILE_SIZE as usize];
        let normal_rows = pattern_cache::cache_tile(tile_bytes);
        let hflip_rows = pattern_cache::cache_tile_hflip(tile_bytes);
        drop(source);
        normal.borrow_mut()[tile_index] = normal_rows;
        hflip.borrow_mut()[tile_index] = hflip_rows;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shared_page() -> SharedPage {
        Rc::new(RefCell::new(Page::new()))
    }

    #[test]
    fn read_after_write_on_mapped_page() {
        let mut bus = PpuBus::new();
        let page = shared_page();
        bus.install_read_page(8, Some(page.clone())).unwrap();
        bus.install_write_page(8, Some(page)).unwrap();
        bus.write(0x2000, 0xA5);
        assert_eq!(bus.read(0x2000), 0xA5);
    }

    #[test]
    fn unmapped_read_returns_zero() {
        let mut bus = PpuBus::new();
        assert_eq!(bus.read(0x1000), 0);
    }

    #[test]
    fn handler_page_bypasses_cache_recompute() {
        let mut bus = PpuBus::new();
        bus.install_write_handler(0, Some(Box::new(|_addr, _data| {})))
            .unwrap();
        bus.install_read_handler(0, Some(Box::new(|_addr| 0x42)))
            .unwrap();
        bus.write(0x0000, 0xFF);
        assert_eq!(bus.read(0x0000), 0x42);
    }

    #[test]
    fn write_to_chr_ram_refreshes_tile_cache() {
        let mut bus = PpuBus::new();
        let page = shared_page();
        bus.install_read_page(0, Some(page.clone())).unwrap();
        bus.install_write_page(0, Some(page)).unwrap();
        let normal: SharedCachePage = Rc::new(RefCell::new(vec![[[0u8; 8]; 8]; TILES_PER_PAGE]));
        let hflip: SharedCachePage = Rc::new(RefCell::new(vec![[[0u8; 8]; 8]; TILES_PER_PAGE]));
        bus.install_cache_pages(0, Some((normal.clone(), hflip.clone())))
            .unwrap();
        bus.write(0x0000, 0xFF);
        assert_eq!(normal.borrow()[0][0], [1, 1, 1, 1, 1, 1, 1, 1]);
        assert_eq!(hflip.borrow()[0][0], [1, 1, 1, 1, 1, 1, 1, 1]);
    }

    #[test]
    fn read_interceptor_overrides_bus_result() {
        let mut bus = PpuBus::new();
        let page = shared_page();
        bus.install_read_page(0, Some(page)).unwrap();
        bus.set_read_interceptor(Some(Box::new(|bus, addr| bus.read_direct(addr).wrapping_add(1))));
        assert_eq!(bus.read(0x0000), 1);
        bus.set_read_interceptor(None);
        assert_eq!(bus.read(0x0000), 0);
    }

    #[test]
    fn install_rejects_out_of_range_page() {
        let mut bus = PpuBus::new();
        assert_eq!(
            bus.install_read_page(16, None),
            Err(PpuBusError::PageOutOfRange(16))
        );
    }
}
