//! The eight CPU-visible PPU registers (`$2000-$2007`) and the internal
//! scroll/address latches behind them.

pub mod control;
pub mod mask;
pub mod status;
pub mod vram_addr;

pub use control::Control;
pub use mask::Mask;
pub use status::Status;
pub use vram_addr::VramAddr;

use crate::bus::PpuBus;
use crate::frame_timer::FrameTimerSignals;
use crate::mem_block::ppu::OamRam;
use crate::memory::ppu::Register;
use crate::nmi::NmiScheduler;
use crate::palette::PaletteStore;

/// State machine behind the register window: control/mask/status flags, the
/// scroll/address latches (`v`, `t`, fine-x, write toggle), the OAM address
/// pointer and memory, and the open-bus data buffer.
#[cfg_attr(feature = "savestate-serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone)]
pub struct PpuRegisters {
    control: Control,
    mask: Mask,
    status: Status,
    oam_addr: u8,
    oam: OamRam,
    v: VramAddr,
    t: VramAddr,
    fine_x: u8,
    write_toggle: bool,
    data_buffer: u8,
}

impl Default for PpuRegisters {
    fn default() -> Self {
        Self {
            control: Control::empty(),
            mask: Mask::empty(),
            status: Status::empty(),
            oam_addr: 0,
            oam: OamRam::new(),
            v: VramAddr::default(),
            t: VramAddr::default(),
            fine_x: 0,
            write_toggle: false,
            data_buffer: 0,
        }
    }
}

impl PpuRegisters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn control(&self) -> Control {
        self.control
    }

    pub fn mask(&self) -> Mask {
        self.mask
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn vram_addr(&self) -> VramAddr {
        self.v
    }

    pub fn fine_x(&self) -> u8 {
        self.fine_x
    }

    pub fn oam(&self) -> &[u8] {
        &self.oam
    }

    pub fn oam_mut(&mut self) -> &mut [u8] {
        &mut self.oam
    }

    /// Raises the VBlank flag and, if NMI generation is enabled, asks the
    /// scheduler to assert the line. Called once per frame by the host when
    /// the rasterizer enters scanline 241.
    pub fn enter_vblank(&mut self, nmi: &mut dyn NmiScheduler) {
        self.status.insert(Status::VERTICAL_BLANK);
        if self.control.nmi_enabled() {
            nmi.cpu_set_nmi();
        }
    }

    pub fn set_sprite_zero_hit(&mut self, hit: bool) {
        self.status.set(Status::SPRITE_ZERO_HIT, hit);
    }

    pub fn set_sprite_overflow(&mut self, overflow: bool) {
        self.status.set(Status::SPRITE_OVERFLOW, overflow);
    }

    /// Applies a hard or soft reset. Hard resets zero everything except OAM
    /// (left to the caller); soft resets preserve `STATUS`, `OAMADDR`, `v`,
    /// `t` and the palette/OAM contents while clearing `CONTROL`, `MASK`,
    /// the write toggle and the data buffer.
    pub fn reset(&mut self, hard: bool) {
        self.control = Control::empty();
        self.mask = Mask::empty();
        self.write_toggle = false;
        self.data_buffer = 0;
        if hard {
            self.status = Status::empty();
            self.oam_addr = 0;
            self.v = VramAddr::default();
            self.t = VramAddr::default();
            self.fine_x = 0;
        }
    }

    pub fn read(
        &mut self,
        offset: u8,
        bus: &mut PpuBus,
        palette: &PaletteStore,
        nmi: &mut dyn NmiScheduler,
        timing: FrameTimerSignals,
    ) -> u8 {
        match Register::from_offset(offset) {
            Register::Status => self.read_status(nmi, timing),
            Register::OamData => self.read_oam_data(),
            Register::Data => self.read_vram_data(bus, palette),
            _ => self.data_buffer,
        }
    }

    fn read_status(&mut self, nmi: &mut dyn NmiScheduler, timing: FrameTimerSignals) -> u8 {
        let mut result = (self.status.bits() & 0xE0) | (self.data_buffer & 0x1F);

        if result & 0x80 != 0 {
            // Historical `status &= 0x60` rather than the hardware-canonical
            // `&0x7F`: preserves only bits 5-6, clearing VBlank (bit 7) same
            // as hardware. Kept bug-for-bug; see DESIGN.md. Ordered before
            // the suppression-window mask below, matching the original's
            // `status &= 0x60` on the composed `ret` preceding `ret &= 0x7F`.
            self.status = Status::from_bits_truncate(self.status.bits() & Status::READ_CLEAR_MASK);
        }

        if timing.is_nmi_suppression_dot() {
            result &= 0x7F;
            nmi.cpu_clear_nmi();
        } else if timing.is_nmi_late_clear_window() {
            nmi.cpu_clear_nmi();
        }

        self.write_toggle = false;
        self.data_buffer = result;
        result
    }

    fn read_oam_data(&mut self) -> u8 {
        self.data_buffer = self.oam[usize::from(self.oam_addr)];
        self.data_buffer
    }

    fn read_vram_data(&mut self, bus: &mut PpuBus, palette: &PaletteStore) -> u8 {
        let buffered = self.data_buffer;
        let addr = self.v.raw() & 0x7FFF;
        self.data_buffer = bus.read(addr);
        let result = if addr & 0x3F00 == 0x3F00 {
            // Palette reads appear unbuffered: the returned byte is the
            // current palette content, but `dataBuffer` keeps the nametable
            // mirror byte underneath the palette window, not the palette
            // byte, so the next open-bus or non-palette read still sees it.
            palette.read(PaletteStore::index_of(addr))
        } else {
            buffered
        };
        self.v.increment(self.control.vram_increment());
        result
    }

    /// Writes `data` through one of the eight registers. Returns the set of
    /// absolute palette indices touched, if any, so the caller can forward a
    /// palette-change notification to the renderer.
    pub fn write(
        &mut self,
        offset: u8,
        data: u8,
        bus: &mut PpuBus,
        palette: &mut PaletteStore,
        nmi: &mut dyn NmiScheduler,
        timing: FrameTimerSignals,
    ) -> Vec<u8> {
        self.data_buffer = data;
        match Register::from_offset(offset) {
            Register::Control => self.write_control(data, nmi, timing),
            Register::Mask => self.mask = Mask::from_bits_truncate(data),
            Register::OamAddr => self.oam_addr = data,
            Register::OamData => self.write_oam_data(data),
            Register::Scroll => self.write_scroll(data),
            Register::Addr => self.write_addr(data),
            Register::Data => return self.write_vram_data(data, bus, palette),
            Register::Status => {}
        }
        Vec::new()
    }

    fn write_control(&mut self, data: u8, nmi: &mut dyn NmiScheduler, timing: FrameTimerSignals) {
        let new = Control::from_bits_truncate(data);
        let was_generating = self.control.nmi_enabled();

        if self.status.contains(Status::VERTICAL_BLANK) && new.nmi_enabled() && !was_generating {
            nmi.cpu_set_nmi();
        }
        if !new.nmi_enabled() && timing.is_nmi_disable_window() {
            nmi.cpu_clear_nmi();
        }

        self.control = new;
        self.t.set_nametable(data & 0b11);
    }

    fn write_oam_data(&mut self, data: u8) {
        self.oam[usize::from(self.oam_addr)] = data;
        self.oam_addr = self.oam_addr.wrapping_add(1);
    }

    fn write_scroll(&mut self, data: u8) {
        if !self.write_toggle {
            self.t.set_low5(data >> 3);
            self.fine_x = data & 0x07;
            self.write_toggle = true;
        } else {
            self.t.set_coarse_y_and_fine_y(data);
            self.write_toggle = false;
        }
    }

    fn write_addr(&mut self, data: u8) {
        if !self.write_toggle {
            self.t.set_high_byte(data);
            self.write_toggle = true;
        } else {
            self.t.set_low_byte(data);
            self.v = self.t;
            self.write_toggle = false;
        }
    }

    fn write_vram_data(&mut self, data: u8, bus: &mut PpuBus, palette: &mut PaletteStore) -> Vec<u8> {
        let addr = self.v.raw() & 0x7FFF;
        let touched = if addr < 0x3F00 {
            bus.write(addr, data);
            Vec::new()
        } else {
            palette.write(PaletteStore::index_of(addr), data)
        };
        self.v.increment(self.control.vram_increment());
        touched
    }
}
