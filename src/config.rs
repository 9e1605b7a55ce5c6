//! Session configuration and NTSC clock constants.

/// PPU dots per CPU cycle (NTSC 2C02 vs 2A03).
pub const PPU_DOTS_PER_CPU_CYCLE: u32 = 3;
/// Dots per scanline, 0–340.
pub const DOTS_PER_SCANLINE: u16 = 341;
/// Scanlines per frame including vblank and pre-render, 0–261.
pub const SCANLINES_PER_FRAME: u16 = 262;
/// CPU cycles stolen by OAM DMA, plus one when it starts on an odd cycle.
pub const OAM_DMA_CYCLES: u32 = 513;

/// Register state loaded by `Cpu::reset`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PowerUpState {
    /// Start address; `None` reads the reset vector at $FFFC.
    pub pc: Option<u16>,
    pub sp: u8,
    pub status: u8,
    /// Cycle counter value after reset (the reset sequence itself takes 7).
    pub cycles: u64,
}

impl Default for PowerUpState {
    fn default() -> Self {
        PowerUpState {
            pc: None,
            sp: 0xFD,
            status: 0x24,
            cycles: 7,
        }
    }
}

impl PowerUpState {
    /// Automation entry point of the nestest ROM.
    #[must_use]
    pub fn nestest() -> Self {
        PowerUpState {
            pc: Some(0xC000),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct EmulatorConfig {
    pub power_up: PowerUpState,
    pub read_watches: Vec<u16>,
    pub write_watches: Vec<u16>,
    /// Print a trace line before every instruction.
    pub trace: bool,
    pub max_instructions: Option<u64>,
    /// Run without opening a window.
    pub headless: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_power_up_matches_reference_state() {
        let state = PowerUpState::default();
        assert_eq!(state.pc, None);
        assert_eq!(state.sp, 0xFD);
        assert_eq!(state.status, 0x24);
        assert_eq!(state.cycles, 7);
        assert_eq!(PowerUpState::nestest().pc, Some(0xC000));
    }

    #[test]
    fn frame_is_341_by_262_dots() {
        assert_eq!(
            DOTS_PER_SCANLINE as u32 * SCANLINES_PER_FRAME as u32,
            89_342
        );
    }
}
