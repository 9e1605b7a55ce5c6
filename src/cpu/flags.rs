//! 6502 processor status register (P) bits, high to low `NV-BDIZC`.

pub const FLAG_CARRY: u8 = 1 << 0;
pub const FLAG_ZERO: u8 = 1 << 1;
pub const FLAG_INTERRUPT_DISABLE: u8 = 1 << 2;
pub const FLAG_DECIMAL: u8 = 1 << 3; // Tracked, never alters ADC/SBC on the 2A03
pub const FLAG_BREAK: u8 = 1 << 4; // Only exists in pushed copies
pub const FLAG_UNUSED: u8 = 1 << 5; // Always reads 1
pub const FLAG_OVERFLOW: u8 = 1 << 6;
pub const FLAG_NEGATIVE: u8 = 1 << 7;

/// `NV-BDIZC` with clear bits lowercased, e.g. `nVUbdIzc`.
pub fn describe(status: u8) -> String {
    b"NVUBDIZC"
        .iter()
        .enumerate()
        .map(|(i, &c)| {
            if status & (0x80 >> i) != 0 {
                c as char
            } else {
                c.to_ascii_lowercase() as char
            }
        })
        .collect()
}
