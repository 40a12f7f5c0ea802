//! PPU thread state
//!
//! Minimal register file for the calling guest thread. The event calls
//! only touch the general-purpose registers: a received event is
//! delivered in GPR 4 through 7 rather than through guest memory.

/// General-purpose register file of one emulated PPU thread.
#[derive(Debug, Clone)]
pub struct PpuThread {
    pub gpr: [u64; 32],
}

impl PpuThread {
    pub fn new() -> Self {
        Self { gpr: [0; 32] }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registers_start_clear() {
        let ppu = PpuThread::new();
        assert!(ppu.gpr.iter().all(|&r| r == 0));
    }
}
