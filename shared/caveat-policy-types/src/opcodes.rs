//! The EVM instruction subset the enforcer compiler emits.
//!
//! `PUSH1..PUSH32` are not listed as variants: their byte depends on the immediate width, see
//! [`push_opcode`] and [`push_width`].

/// First push opcode (`PUSH1`).
pub const PUSH1: u8 = 0x60;
/// Last push opcode (`PUSH32`).
pub const PUSH32: u8 = 0x7f;

/// Fixed (non-push) opcodes known to the assembler.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Opcode {
    Stop = 0x00,
    Add = 0x01,
    Mul = 0x02,
    Sub = 0x03,

    Lt = 0x10,
    Gt = 0x11,
    Eq = 0x14,
    IsZero = 0x15,
    Shr = 0x1c,

    CallDataLoad = 0x35,
    CallDataSize = 0x36,
    CodeCopy = 0x39,

    Pop = 0x50,
    MLoad = 0x51,
    MStore = 0x52,
    Jump = 0x56,
    JumpI = 0x57,
    JumpDest = 0x5b,

    Dup1 = 0x80,
    Dup2 = 0x81,
    Dup3 = 0x82,
    Dup4 = 0x83,
    Dup5 = 0x84,
    Dup6 = 0x85,
    Dup7 = 0x86,
    Dup8 = 0x87,

    Swap1 = 0x90,
    Swap2 = 0x91,
    Swap3 = 0x92,
    Swap4 = 0x93,

    Return = 0xf3,
    Revert = 0xfd,
}

impl Opcode {
    pub const ALL: [Opcode; 32] = [
        Opcode::Stop,
        Opcode::Add,
        Opcode::Mul,
        Opcode::Sub,
        Opcode::Lt,
        Opcode::Gt,
        Opcode::Eq,
        Opcode::IsZero,
        Opcode::Shr,
        Opcode::CallDataLoad,
        Opcode::CallDataSize,
        Opcode::CodeCopy,
        Opcode::Pop,
        Opcode::MLoad,
        Opcode::MStore,
        Opcode::Jump,
        Opcode::JumpI,
        Opcode::JumpDest,
        Opcode::Dup1,
        Opcode::Dup2,
        Opcode::Dup3,
        Opcode::Dup4,
        Opcode::Dup5,
        Opcode::Dup6,
        Opcode::Dup7,
        Opcode::Dup8,
        Opcode::Swap1,
        Opcode::Swap2,
        Opcode::Swap3,
        Opcode::Swap4,
        Opcode::Return,
        Opcode::Revert,
    ];

    pub const fn byte(self) -> u8 {
        self as u8
    }
}

impl TryFrom<u8> for Opcode {
    type Error = ();

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::ALL
            .iter()
            .copied()
            .find(|op| op.byte() == value)
            .ok_or(())
    }
}

/// Push opcode carrying an immediate of `width` bytes (1..=32).
pub const fn push_opcode(width: usize) -> Option<u8> {
    if width == 0 || width > 32 {
        return None;
    }
    Some(PUSH1 + (width as u8 - 1))
}

/// Immediate width of a push opcode byte, `None` for anything else.
pub const fn push_width(byte: u8) -> Option<usize> {
    if byte >= PUSH1 && byte <= PUSH32 {
        Some((byte - PUSH1) as usize + 1)
    } else {
        None
    }
}
