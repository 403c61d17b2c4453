//! Minimal stack machine for running compiled enforcers in tests.
//!
//! Covers the opcodes the compiler emits plus the push family. Gas is not metered; a step bound
//! stops runaway loops instead.

use alloy_primitives::U256;
use caveat_policy_types::{opcodes::push_width, Opcode};

const MAX_STEPS: usize = 100_000;
const MAX_STACK: usize = 1024;
const MAX_MEMORY: usize = 1 << 20;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Outcome {
    Returned(Vec<u8>),
    Reverted(Vec<u8>),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Fault {
    InvalidOpcode { pc: usize, byte: u8 },
    InvalidJump { pc: usize, dest: U256 },
    StackUnderflow { pc: usize },
    StackOverflow { pc: usize },
    MemoryLimit { pc: usize },
    StepLimit,
}

impl Outcome {
    pub fn accepted(&self) -> bool {
        matches!(self, Outcome::Returned(data) if data.is_empty())
    }
}

/// Execute `code` as a message call with `call_data`.
pub fn call(code: &[u8], call_data: &[u8]) -> Result<Outcome, Fault> {
    Machine::new(code, call_data).run()
}

/// Run `init_code` as a contract creation and return the deployed runtime.
pub fn deploy(init_code: &[u8]) -> Result<Vec<u8>, Fault> {
    match call(init_code, &[])? {
        Outcome::Returned(runtime) => Ok(runtime),
        Outcome::Reverted(_) => Ok(Vec::new()),
    }
}

struct Machine<'a> {
    code: &'a [u8],
    call_data: &'a [u8],
    jump_dests: Vec<bool>,
    stack: Vec<U256>,
    memory: Vec<u8>,
    pc: usize,
}

impl<'a> Machine<'a> {
    fn new(code: &'a [u8], call_data: &'a [u8]) -> Self {
        Self {
            code,
            call_data,
            jump_dests: jump_dest_map(code),
            stack: Vec::new(),
            memory: Vec::new(),
            pc: 0,
        }
    }

    fn run(mut self) -> Result<Outcome, Fault> {
        for _ in 0..MAX_STEPS {
            let Some(&byte) = self.code.get(self.pc) else {
                return Ok(Outcome::Returned(Vec::new()));
            };
            if let Some(width) = push_width(byte) {
                let mut word = [0u8; 32];
                for i in 0..width {
                    word[32 - width + i] = self.code.get(self.pc + 1 + i).copied().unwrap_or(0);
                }
                self.push(U256::from_be_bytes(word))?;
                self.pc += 1 + width;
                continue;
            }

            let op = Opcode::try_from(byte).map_err(|_| Fault::InvalidOpcode { pc: self.pc, byte })?;
            let mut next = self.pc + 1;
            match op {
                Opcode::Stop => return Ok(Outcome::Returned(Vec::new())),
                Opcode::Add => self.binary(|a, b| a.wrapping_add(b))?,
                Opcode::Mul => self.binary(|a, b| a.wrapping_mul(b))?,
                Opcode::Sub => self.binary(|a, b| a.wrapping_sub(b))?,
                Opcode::Lt => self.binary(|a, b| U256::from(a < b))?,
                Opcode::Gt => self.binary(|a, b| U256::from(a > b))?,
                Opcode::Eq => self.binary(|a, b| U256::from(a == b))?,
                Opcode::IsZero => {
                    let a = self.pop()?;
                    self.push(U256::from(a.is_zero()))?;
                }
                Opcode::Shr => self.binary(|shift, value| {
                    if shift >= U256::from(256u64) {
                        U256::ZERO
                    } else {
                        value >> shift.to::<usize>()
                    }
                })?,
                Opcode::CallDataLoad => {
                    let offset = self.pop()?;
                    let word = read_padded(self.call_data, offset);
                    self.push(U256::from_be_bytes(word))?;
                }
                Opcode::CallDataSize => self.push(U256::from(self.call_data.len()))?,
                Opcode::CodeCopy => {
                    let dest = self.pop()?;
                    let offset = self.pop()?;
                    let size = self.pop()?;
                    let size = self.index(size)?;
                    let dest = self.index(dest)?;
                    self.expand(dest, size)?;
                    for i in 0..size {
                        let src = offset
                            .checked_add(U256::from(i))
                            .and_then(|at| usize::try_from(at).ok())
                            .and_then(|at| self.code.get(at).copied())
                            .unwrap_or(0);
                        self.memory[dest + i] = src;
                    }
                }
                Opcode::Pop => {
                    self.pop()?;
                }
                Opcode::MLoad => {
                    let offset = self.pop()?;
                    let offset = self.index(offset)?;
                    self.expand(offset, 32)?;
                    let mut word = [0u8; 32];
                    word.copy_from_slice(&self.memory[offset..offset + 32]);
                    self.push(U256::from_be_bytes(word))?;
                }
                Opcode::MStore => {
                    let offset = self.pop()?;
                    let value = self.pop()?;
                    let offset = self.index(offset)?;
                    self.expand(offset, 32)?;
                    self.memory[offset..offset + 32].copy_from_slice(&value.to_be_bytes::<32>());
                }
                Opcode::Jump => {
                    let dest = self.pop()?;
                    next = self.jump_target(dest)?;
                }
                Opcode::JumpI => {
                    let dest = self.pop()?;
                    let condition = self.pop()?;
                    if !condition.is_zero() {
                        next = self.jump_target(dest)?;
                    }
                }
                Opcode::JumpDest => {}
                Opcode::Dup1
                | Opcode::Dup2
                | Opcode::Dup3
                | Opcode::Dup4
                | Opcode::Dup5
                | Opcode::Dup6
                | Opcode::Dup7
                | Opcode::Dup8 => {
                    let depth = (byte - Opcode::Dup1.byte()) as usize + 1;
                    let value = self.peek(depth)?;
                    self.push(value)?;
                }
                Opcode::Swap1 | Opcode::Swap2 | Opcode::Swap3 | Opcode::Swap4 => {
                    let depth = (byte - Opcode::Swap1.byte()) as usize + 1;
                    let len = self.stack.len();
                    if len < depth + 1 {
                        return Err(Fault::StackUnderflow { pc: self.pc });
                    }
                    self.stack.swap(len - 1, len - 1 - depth);
                }
                Opcode::Return | Opcode::Revert => {
                    let offset = self.pop()?;
                    let size = self.pop()?;
                    let size = self.index(size)?;
                    let offset = if size == 0 { 0 } else { self.index(offset)? };
                    self.expand(offset, size)?;
                    let data = self.memory[offset..offset + size].to_vec();
                    return Ok(if op == Opcode::Return {
                        Outcome::Returned(data)
                    } else {
                        Outcome::Reverted(data)
                    });
                }
            }
            self.pc = next;
        }
        Err(Fault::StepLimit)
    }

    fn push(&mut self, value: U256) -> Result<(), Fault> {
        if self.stack.len() >= MAX_STACK {
            return Err(Fault::StackOverflow { pc: self.pc });
        }
        self.stack.push(value);
        Ok(())
    }

    fn pop(&mut self) -> Result<U256, Fault> {
        self.stack.pop().ok_or(Fault::StackUnderflow { pc: self.pc })
    }

    fn peek(&self, depth: usize) -> Result<U256, Fault> {
        self.stack
            .len()
            .checked_sub(depth)
            .map(|i| self.stack[i])
            .ok_or(Fault::StackUnderflow { pc: self.pc })
    }

    /// Pop `a` (top) then `b`, push `f(a, b)`.
    fn binary(&mut self, f: impl Fn(U256, U256) -> U256) -> Result<(), Fault> {
        let a = self.pop()?;
        let b = self.pop()?;
        self.push(f(a, b))
    }

    fn index(&self, value: U256) -> Result<usize, Fault> {
        usize::try_from(value)
            .ok()
            .filter(|v| *v <= MAX_MEMORY)
            .ok_or(Fault::MemoryLimit { pc: self.pc })
    }

    fn expand(&mut self, offset: usize, size: usize) -> Result<(), Fault> {
        if size == 0 {
            return Ok(());
        }
        let end = offset + size;
        if end > MAX_MEMORY {
            return Err(Fault::MemoryLimit { pc: self.pc });
        }
        let rounded = end.div_ceil(32) * 32;
        if self.memory.len() < rounded {
            self.memory.resize(rounded, 0);
        }
        Ok(())
    }

    fn jump_target(&self, dest: U256) -> Result<usize, Fault> {
        usize::try_from(dest)
            .ok()
            .filter(|d| self.jump_dests.get(*d).copied().unwrap_or(false))
            .ok_or(Fault::InvalidJump { pc: self.pc, dest })
    }
}

/// Valid jump destinations: `JUMPDEST` bytes that are not push immediates.
fn jump_dest_map(code: &[u8]) -> Vec<bool> {
    let mut map = vec![false; code.len()];
    let mut pc = 0;
    while pc < code.len() {
        let byte = code[pc];
        if byte == Opcode::JumpDest.byte() {
            map[pc] = true;
        }
        pc += 1 + push_width(byte).unwrap_or(0);
    }
    map
}

fn read_padded(data: &[u8], offset: U256) -> [u8; 32] {
    let mut word = [0u8; 32];
    if let Ok(start) = usize::try_from(offset) {
        for (i, slot) in word.iter_mut().enumerate() {
            if let Some(byte) = start.checked_add(i).and_then(|at| data.get(at)) {
                *slot = *byte;
            }
        }
    }
    word
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_add_return() {
        // PUSH1 2 PUSH1 3 ADD PUSH1 0 MSTORE PUSH1 32 PUSH1 0 RETURN
        let code = [
            0x60, 0x02, 0x60, 0x03, 0x01, 0x60, 0x00, 0x52, 0x60, 0x20, 0x60, 0x00, 0xf3,
        ];
        let Outcome::Returned(data) = call(&code, &[]).unwrap() else {
            panic!("expected return");
        };
        assert_eq!(U256::from_be_slice(&data), U256::from(5u64));
    }

    #[test]
    fn test_jump_into_push_data_faults() {
        // PUSH1 4 JUMP PUSH1 0x5b
        let code = [0x60, 0x04, 0x56, 0x60, 0x5b];
        assert!(matches!(call(&code, &[]), Err(Fault::InvalidJump { .. })));
    }

    #[test]
    fn test_calldataload_pads_past_end() {
        // PUSH1 2 CALLDATALOAD PUSH1 0 MSTORE PUSH1 32 PUSH1 0 RETURN
        let code = [
            0x60, 0x02, 0x35, 0x60, 0x00, 0x52, 0x60, 0x20, 0x60, 0x00, 0xf3,
        ];
        let Outcome::Returned(data) = call(&code, &[0xaa, 0xbb, 0xcc]).unwrap() else {
            panic!("expected return");
        };
        assert_eq!(data[0], 0xcc);
        assert!(data[1..].iter().all(|b| *b == 0));
    }

    #[test]
    fn test_infinite_loop_hits_step_limit() {
        // JUMPDEST PUSH1 0 JUMP
        assert_eq!(call(&[0x5b, 0x60, 0x00, 0x56], &[]), Err(Fault::StepLimit));
    }
}
