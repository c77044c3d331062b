//! The status bit-vector embedded in every response header.
//!
//! Fifteen predicates packed at fixed bit positions of a u32, serialized
//! little-endian into the first four of the header's ten reserved bytes.
//! The remaining six bytes stay zero. The server recomputes the vector from
//! live backend state for every response, error frames included.

/// Width of the header's reserved field.
pub const STATUS_LEN: usize = 10;

pub mod bits {
    pub const RUNNING: u32 = 1 << 0;
    pub const READY: u32 = 1 << 1;
    pub const EMERGENCY: u32 = 1 << 2;
    pub const COLLIDED: u32 = 1 << 3;
    pub const ERRORED: u32 = 1 << 4;
    pub const BUSY: u32 = 1 << 5;
    pub const MOVE_FINISHED: u32 = 1 << 6;
    pub const HOME: u32 = 1 << 7;
    pub const ZERO: u32 = 1 << 8;
    pub const RESETTING: u32 = 1 << 9;
    pub const TEACHING: u32 = 1 << 10;
    pub const DIRECT_TEACHING: u32 = 1 << 11;
    pub const PROGRAM_RUNNING: u32 = 1 << 12;
    pub const PROGRAM_PAUSED: u32 = 1 << 13;
    pub const PENDANT_CONNECTED: u32 = 1 << 14;
}

/// Decoded form of the reserved field.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatusBits {
    pub running: bool,
    pub ready: bool,
    pub emergency: bool,
    pub collided: bool,
    pub errored: bool,
    pub busy: bool,
    pub move_finished: bool,
    pub home: bool,
    pub zero: bool,
    pub resetting: bool,
    pub teaching: bool,
    pub direct_teaching: bool,
    pub program_running: bool,
    pub program_paused: bool,
    pub pendant_connected: bool,
}

impl StatusBits {
    pub fn to_u32(self) -> u32 {
        let mut word = 0u32;
        let mut set = |on: bool, bit: u32| {
            if on {
                word |= bit;
            }
        };
        set(self.running, bits::RUNNING);
        set(self.ready, bits::READY);
        set(self.emergency, bits::EMERGENCY);
        set(self.collided, bits::COLLIDED);
        set(self.errored, bits::ERRORED);
        set(self.busy, bits::BUSY);
        set(self.move_finished, bits::MOVE_FINISHED);
        set(self.home, bits::HOME);
        set(self.zero, bits::ZERO);
        set(self.resetting, bits::RESETTING);
        set(self.teaching, bits::TEACHING);
        set(self.direct_teaching, bits::DIRECT_TEACHING);
        set(self.program_running, bits::PROGRAM_RUNNING);
        set(self.program_paused, bits::PROGRAM_PAUSED);
        set(self.pendant_connected, bits::PENDANT_CONNECTED);
        word
    }

    pub fn from_u32(word: u32) -> StatusBits {
        StatusBits {
            running: word & bits::RUNNING != 0,
            ready: word & bits::READY != 0,
            emergency: word & bits::EMERGENCY != 0,
            collided: word & bits::COLLIDED != 0,
            errored: word & bits::ERRORED != 0,
            busy: word & bits::BUSY != 0,
            move_finished: word & bits::MOVE_FINISHED != 0,
            home: word & bits::HOME != 0,
            zero: word & bits::ZERO != 0,
            resetting: word & bits::RESETTING != 0,
            teaching: word & bits::TEACHING != 0,
            direct_teaching: word & bits::DIRECT_TEACHING != 0,
            program_running: word & bits::PROGRAM_RUNNING != 0,
            program_paused: word & bits::PROGRAM_PAUSED != 0,
            pendant_connected: word & bits::PENDANT_CONNECTED != 0,
        }
    }

    /// Packs into the wire form of the reserved field.
    pub fn pack(self) -> [u8; STATUS_LEN] {
        let mut out = [0u8; STATUS_LEN];
        out[..4].copy_from_slice(&self.to_u32().to_le_bytes());
        out
    }

    pub fn unpack(field: &[u8; STATUS_LEN]) -> StatusBits {
        StatusBits::from_u32(u32::from_le_bytes([field[0], field[1], field[2], field[3]]))
    }
}
