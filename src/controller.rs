//! NES controller input handling.
//!
//! Implements the standard NES controller shift register protocol: while bit 0 of $4016 is held
//! high the pad keeps reloading and every read returns button A; once it drops, each read of
//! $4016/$4017 returns the next button in D0 (A, B, Select, Start, Up, Down, Left, Right), then 1s.

/// Standard pad buttons, valued as their bit in the report byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Button {
    A = 0x01,
    B = 0x02,
    Select = 0x04,
    Start = 0x08,
    Up = 0x10,
    Down = 0x20,
    Left = 0x40,
    Right = 0x80,
}

impl Button {
    /// Report order.
    pub const ALL: [Button; 8] = [
        Button::A,
        Button::B,
        Button::Select,
        Button::Start,
        Button::Up,
        Button::Down,
        Button::Left,
        Button::Right,
    ];
}

/// A single pad on one of the two ports.
#[derive(Debug, Clone, Default)]
pub struct Controller {
    /// Current button states: bit 0 = A, 1 = B, 2 = Select, 3 = Start, 4 = Up, 5 = Down, 6 = Left, 7 = Right.
    state: u8,
    /// Next button to report.
    index: u8,
    strobe: bool,
}

impl Controller {
    /// Create a new controller with no buttons pressed.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_button(&mut self, button: Button, pressed: bool) {
        if pressed {
            self.state |= button as u8;
        } else {
            self.state &= !(button as u8);
        }
    }

    /// Replace every button at once (bit layout as [`Button`]).
    pub fn set_state(&mut self, state: u8) {
        self.state = state;
    }

    pub fn state(&self) -> u8 {
        self.state
    }

    pub fn is_pressed(&self, button: Button) -> bool {
        self.state & button as u8 != 0
    }

    /// One bit per read, in D0. Official pads report 1 after the eighth read.
    pub fn read(&mut self) -> u8 {
        if self.strobe {
            return self.state & 1;
        }
        if self.index >= 8 {
            return 1;
        }
        let bit = (self.state >> self.index) & 1;
        self.index += 1;
        bit
    }

    /// Write to $4016. Bit 0 is the strobe; the sequence restarts from A.
    pub fn write(&mut self, data: u8) {
        self.strobe = data & 1 != 0;
        if self.strobe {
            self.index = 0;
        }
    }
}
