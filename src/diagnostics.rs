/// Which direction an unmapped bus access came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IoChannel {
    UnmappedRead,
    UnmappedWrite,
}

/// Swappable sink for the bus's "this page isn't mapped" diagnostics. The
/// default forwards to `tracing`; a host chasing a corrupted ROM can install
/// a counting sink, and a fuzzer can install a no-op one.
pub trait DiagnosticSink {
    fn log(&mut self, channel: IoChannel, addr: u16, data: Option<u8>);
}

/// Forwards every unmapped access to `tracing::debug!`.
#[derive(Debug, Default)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn log(&mut self, channel: IoChannel, addr: u16, data: Option<u8>) {
        match (channel, data) {
            (IoChannel::UnmappedRead, _) => {
                tracing::debug!(addr = format_args!("{addr:#06X}"), "unmapped ppu bus read")
            }
            (IoChannel::UnmappedWrite, Some(data)) => tracing::debug!(
                addr = format_args!("{addr:#06X}"),
                data = format_args!("{data:#04X}"),
                "unmapped ppu bus write"
            ),
            (IoChannel::UnmappedWrite, None) => {
                tracing::debug!(addr = format_args!("{addr:#06X}"), "unmapped ppu bus write")
            }
        }
    }
}

/// Drops every diagnostic. Useful for headless fuzzing where the logging
/// itself would dominate the profile.
#[derive(Debug, Default)]
pub struct NullSink;

impl DiagnosticSink for NullSink {
    fn log(&mut self, _channel: IoChannel, _addr: u16, _data: Option<u8>) {}
}
