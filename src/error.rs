use std::fmt;

/// Errors raised by the bus configuration surface (mapper-facing `install_*`
/// calls). Every in-loop emulation operation (register/bus reads and writes)
/// stays infallible; only page installation can be asked to do something
/// nonsensical by a misbehaving mapper.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PpuBusError {
    /// `page` is outside the 0..16 range a 14-bit address can decode to.
    PageOutOfRange(u8),
}

impl fmt::Display for PpuBusError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PageOutOfRange(page) => {
                write!(f, "page index {page} is out of range (expected 0..16)")
            }
        }
    }
}

impl std::error::Error for PpuBusError {}
