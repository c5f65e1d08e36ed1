/// Outbound contract towards the rasterizer/host for state the palette RAM
/// affects outside this core (the renderer usually keeps its own
/// emphasis/tint-expanded copy of the palette so it doesn't have to redo the
/// expansion every pixel).
pub trait PaletteObserver {
    /// Called once per absolute palette index (`0..32`) that a register-7
    /// write actually changed, after mirroring has been applied.
    fn video_update_palette(&mut self, index: u8, raw_byte: u8);
}

/// Drops every notification. Used by callers that read the palette lazily
/// instead of caching a derived copy.
#[derive(Debug, Default)]
pub struct NullPaletteObserver;

impl PaletteObserver for NullPaletteObserver {
    fn video_update_palette(&mut self, _index: u8, _raw_byte: u8) {}
}
