use bitflags::bitflags;

bitflags! {
    /// PPU status register (`$2002`).
    ///
    /// ```text
    /// 7 6 5 4 3 2 1 0
    /// V S O . . . . .
    /// ```
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Status: u8 {
        const SPRITE_OVERFLOW = 0b0010_0000;
        const SPRITE_ZERO_HIT = 0b0100_0000;
        const VERTICAL_BLANK = 0b1000_0000;
    }
}

impl Default for Status {
    fn default() -> Self {
        Self::empty()
    }
}

impl Status {
    /// Mask applied to `STATUS` itself on every register-2 read, matching
    /// the historical `status &= 0x60` of the reference this core tracks:
    /// it clears the VBlank flag (bit 7) as hardware does, and preserves
    /// only bits 5-6 (sprite overflow, sprite-zero-hit) rather than the
    /// hardware-canonical `&0x7F`. Preserved bug-for-bug; see DESIGN.md.
    pub const READ_CLEAR_MASK: u8 = 0b0110_0000;
}
