use bitflags::bitflags;

bitflags! {
    /// PPU control register (`$2000`, write-only from the CPU's view).
    ///
    /// ```text
    /// 7 6 5 4 3 2 1 0
    /// N M S B s I n n
    /// ```
    /// - `n n`: base nametable select (mirrored into the `T` scroll latch)
    /// - `I`: VRAM address increment (0 = +1, 1 = +32)
    /// - `s`/`B`: sprite/background pattern table select
    /// - `S`: sprite size (0 = 8x8, 1 = 8x16)
    /// - `M`: master/slave select
    /// - `N`: generate NMI at VBlank start
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Control: u8 {
        const NAMETABLE = 0b0000_0011;
        const INCREMENT_32 = 0b0000_0100;
        const SPRITE_TABLE = 0b0000_1000;
        const BACKGROUND_TABLE = 0b0001_0000;
        const SPRITE_SIZE_16 = 0b0010_0000;
        const MASTER_SLAVE = 0b0100_0000;
        const GENERATE_NMI = 0b1000_0000;
    }
}

impl Default for Control {
    fn default() -> Self {
        Self::empty()
    }
}

impl Control {
    #[inline]
    pub fn vram_increment(self) -> u16 {
        if self.contains(Control::INCREMENT_32) { 32 } else { 1 }
    }

    #[inline]
    pub fn nmi_enabled(self) -> bool {
        self.contains(Control::GENERATE_NMI)
    }
}
