#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResetKind {
    Hard, // power-on / cold boot
    Soft, // reset line pulsed while powered
}
