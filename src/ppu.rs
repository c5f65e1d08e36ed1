//! Top-level aggregate combining the bus, palette and register subsystems
//! behind the small surface a CPU core and a mapper actually need.

use crate::bus::{PpuBus, SharedCachePage, SharedPage};
use crate::diagnostics::DiagnosticSink;
use crate::error::PpuBusError;
use crate::frame_timer::FrameTimerSignals;
use crate::nmi::NmiScheduler;
use crate::palette::PaletteStore;
use crate::registers::PpuRegisters;
use crate::renderer::PaletteObserver;
use crate::reset_kind::ResetKind;

/// Region/power-on knobs a host can tune without forking the core.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PpuConfig {
    /// Whether unmapped-bus diagnostics are emitted at all. Hosts that embed
    /// this core in a fuzzer typically want this off.
    pub log_unmapped_io: bool,
}

impl Default for PpuConfig {
    fn default() -> Self {
        Self {
            log_unmapped_io: true,
        }
    }
}

pub struct Ppu {
    bus: PpuBus,
    palette: PaletteStore,
    registers: PpuRegisters,
    config: PpuConfig,
}

impl Default for Ppu {
    fn default() -> Self {
        Self::new(PpuConfig::default())
    }
}

impl Ppu {
    pub fn new(config: PpuConfig) -> Self {
        let mut bus = PpuBus::new();
        if !config.log_unmapped_io {
            bus.set_diagnostic_sink(Box::new(crate::diagnostics::NullSink));
        }
        Self {
            bus,
            palette: PaletteStore::new(),
            registers: PpuRegisters::new(),
            config,
        }
    }

    pub fn config(&self) -> PpuConfig {
        self.config
    }

    pub fn registers(&self) -> &PpuRegisters {
        &self.registers
    }

    pub fn palette(&self) -> &PaletteStore {
        &self.palette
    }

    // -- Register window -------------------------------------------------

    pub fn reg_read(
        &mut self,
        offset: u8,
        nmi: &mut dyn NmiScheduler,
        timing: FrameTimerSignals,
    ) -> u8 {
        self.registers
            .read(offset, &mut self.bus, &self.palette, nmi, timing)
    }

    pub fn reg_write(
        &mut self,
        offset: u8,
        data: u8,
        nmi: &mut dyn NmiScheduler,
        timing: FrameTimerSignals,
        renderer: &mut dyn PaletteObserver,
    ) {
        let touched = self
            .registers
            .write(offset, data, &mut self.bus, &mut self.palette, nmi, timing);
        for index in touched {
            renderer.video_update_palette(index, self.palette.read(index));
        }
    }

    /// Called by the host once per frame on entering scanline 241.
    pub fn enter_vblank(&mut self, nmi: &mut dyn NmiScheduler) {
        self.registers.enter_vblank(nmi);
    }

    // -- Bus passthrough ---------------------------------------------------

    pub fn bus_read(&mut self, addr: u16) -> u8 {
        self.bus.read(addr)
    }

    pub fn bus_write(&mut self, addr: u16, data: u8) {
        self.bus.write(addr, data);
    }

    pub fn install_read_page(&mut self, page: u8, memory: Option<SharedPage>) -> Result<(), PpuBusError> {
        self.bus.install_read_page(page, memory)
    }

    pub fn install_write_page(&mut self, page: u8, memory: Option<SharedPage>) -> Result<(), PpuBusError> {
        self.bus.install_write_page(page, memory)
    }

    pub fn install_read_handler(
        &mut self,
        page: u8,
        handler: Option<Box<dyn FnMut(u16) -> u8>>,
    ) -> Result<(), PpuBusError> {
        self.bus.install_read_handler(page, handler)
    }

    pub fn install_write_handler(
        &mut self,
        page: u8,
        handler: Option<Box<dyn FnMut(u16, u8)>>,
    ) -> Result<(), PpuBusError> {
        self.bus.install_write_handler(page, handler)
    }

    pub fn install_cache_pages(
        &mut self,
        page: u8,
        cache: Option<(SharedCachePage, SharedCachePage)>,
    ) -> Result<(), PpuBusError> {
        self.bus.install_cache_pages(page, cache)
    }

    pub fn set_bus_read_interceptor(&mut self, f: Option<Box<dyn FnMut(&mut PpuBus, u16) -> u8>>) {
        self.bus.set_read_interceptor(f);
    }

    pub fn set_bus_write_interceptor(&mut self, f: Option<Box<dyn FnMut(&mut PpuBus, u16, u8)>>) {
        self.bus.set_write_interceptor(f);
    }

    pub fn set_diagnostic_sink(&mut self, sink: Box<dyn DiagnosticSink>) {
        self.bus.set_diagnostic_sink(sink);
    }

    // -- Lifecycle -----------------------------------------------------

    pub fn reset(&mut self, kind: ResetKind) {
        let hard = kind == ResetKind::Hard;
        self.registers.reset(hard);
        if hard {
            self.palette.clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::SharedPage;
    use crate::mem_block::ppu::Page;
    use crate::nmi::NullNmiScheduler;
    use crate::renderer::NullPaletteObserver;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn timing() -> FrameTimerSignals {
        FrameTimerSignals::new(0, 0, 0)
    }

    #[test]
    fn read_after_write_vram_round_trips() {
        let mut ppu = Ppu::default();
        let mut nmi = NullNmiScheduler;
        let page: SharedPage = Rc::new(RefCell::new(Page::new()));
        ppu.install_read_page(8, Some(page.clone())).unwrap();
        ppu.install_write_page(8, Some(page)).unwrap();

        ppu.reg_write(6, 0x20, &mut nmi, timing(), &mut NullPaletteObserver);
        ppu.reg_write(6, 0x00, &mut nmi, timing(), &mut NullPaletteObserver);
        ppu.reg_write(7, 0xA5, &mut nmi, timing(), &mut NullPaletteObserver);

        ppu.reg_write(6, 0x20, &mut nmi, timing(), &mut NullPaletteObserver);
        ppu.reg_write(6, 0x00, &mut nmi, timing(), &mut NullPaletteObserver);
        let _buffered = ppu.reg_read(7, &mut nmi, timing());
        let value = ppu.reg_read(7, &mut nmi, timing());
        assert_eq!(value, 0xA5);
    }

    #[test]
    fn universal_background_write_notifies_all_eight_indices() {
        struct Recorder(Vec<(u8, u8)>);
        impl PaletteObserver for Recorder {
            fn video_update_palette(&mut self, index: u8, raw_byte: u8) {
                self.0.push((index, raw_byte));
            }
        }

        let mut ppu = Ppu::default();
        let mut nmi = NullNmiScheduler;
        let mut recorder = Recorder(Vec::new());
        ppu.reg_write(6, 0x3F, &mut nmi, timing(), &mut recorder);
        ppu.reg_write(6, 0x00, &mut nmi, timing(), &mut recorder);
        ppu.reg_write(7, 0x30, &mut nmi, timing(), &mut recorder);
        assert_eq!(recorder.0.len(), 8);
        assert!(recorder.0.iter().all(|(_, raw)| *raw == 0x30));
    }

    #[test]
    fn hard_reset_clears_palette_and_soft_reset_does_not() {
        let mut ppu = Ppu::default();
        let mut nmi = NullNmiScheduler;
        ppu.reg_write(6, 0x3F, &mut nmi, timing(), &mut NullPaletteObserver);
        ppu.reg_write(6, 0x00, &mut nmi, timing(), &mut NullPaletteObserver);
        ppu.reg_write(7, 0x11, &mut nmi, timing(), &mut NullPaletteObserver);

        ppu.reset(ResetKind::Soft);
        assert_eq!(ppu.palette().read(0), 0x11);

        ppu.reset(ResetKind::Hard);
        assert_eq!(ppu.palette().read(0), 0);
    }
}
