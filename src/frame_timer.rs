/// Timing signals the rasterizer supplies on every register access. Only the
/// first few line-cycles of scanline 241 change register behavior (the VBlank
/// NMI suppression window), but the whole triple is threaded through so a
/// future rule has somewhere to live.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FrameTimerSignals {
    pub scanline: i16,
    pub line_cycle: u16,
    pub frame: u64,
}

impl FrameTimerSignals {
    pub const VBLANK_START_SCANLINE: i16 = 241;

    pub fn new(scanline: i16, line_cycle: u16, frame: u64) -> Self {
        Self {
            scanline,
            line_cycle,
            frame,
        }
    }

    /// True at the exact dot where a STATUS read must report VBlank cleared
    /// and must clear the NMI line itself.
    pub fn is_nmi_suppression_dot(self) -> bool {
        self.scanline == Self::VBLANK_START_SCANLINE && self.line_cycle == 1
    }

    /// True for the two dots following the suppression dot, where the NMI
    /// line is still cleared on STATUS read but the reported bit is left
    /// alone.
    pub fn is_nmi_late_clear_window(self) -> bool {
        self.scanline == Self::VBLANK_START_SCANLINE
            && (self.line_cycle == 2 || self.line_cycle == 3)
    }

    /// True for the `CONTROL0`-disable race: disabling NMI generation in the
    /// first four dots of scanline 241 still cancels an NMI that was about
    /// to fire.
    pub fn is_nmi_disable_window(self) -> bool {
        self.scanline == Self::VBLANK_START_SCANLINE && self.line_cycle < 4
    }
}
