pub mod bus;
pub mod diagnostics;
pub mod error;
pub mod frame_timer;
pub mod mem_block;
pub mod memory;
pub mod nmi;
pub mod palette;
pub mod pattern_cache;
pub mod ppu;
pub mod registers;
pub mod renderer;
pub mod reset_kind;

pub use error::PpuBusError;
pub use frame_timer::FrameTimerSignals;
pub use nmi::NmiScheduler;
pub use ppu::{Ppu, PpuConfig};
pub use renderer::PaletteObserver;
pub use reset_kind::ResetKind;
