//! Two-pass EVM assembler.
//!
//! The first pass lays out every instruction at its final length and records where each label
//! lands. Label pushes use a fixed immediate width chosen up front, so layout never depends on
//! the offsets being resolved. The second pass patches those immediates. Offsets that do not fit
//! the chosen width are an error, never truncated.

use std::collections::BTreeMap;

use alloy_primitives::{ruint::UintTryFrom, U256};
use caveat_policy_types::{
    opcodes::{push_opcode, PUSH1},
    Opcode,
};

use crate::errors::AssemblerError;

/// Widest immediate a push can carry.
pub const MAX_PUSH_WIDTH: usize = 32;

/// Handle to a jump target or data position, issued by [`Assembler::new_label`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Label(usize);

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Instruction {
    Op(Opcode),
    /// Push with the narrowest immediate that holds the value (at least one byte).
    Push(U256),
    /// Push with an explicit immediate width.
    PushN { width: usize, value: U256 },
    /// Push the resolved offset of a label at the assembler's label width.
    PushLabel(Label),
    /// `JUMPDEST`, defining the label at its own offset.
    JumpDest(Label),
    /// Define a label at the current offset without emitting anything.
    Mark(Label),
    /// Bytes copied verbatim.
    Raw(Vec<u8>),
}

impl From<Opcode> for Instruction {
    fn from(op: Opcode) -> Self {
        Instruction::Op(op)
    }
}

/// Output of [`Assembler::resolve`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AssembledProgram {
    pub bytes: Vec<u8>,
    pub labels: BTreeMap<String, usize>,
}

impl AssembledProgram {
    pub fn label_offset(&self, name: &str) -> Option<usize> {
        self.labels.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

#[derive(Clone, Debug)]
pub struct Assembler {
    label_names: Vec<String>,
    instructions: Vec<Instruction>,
    label_width: usize,
}

impl Default for Assembler {
    fn default() -> Self {
        Self::new()
    }
}

impl Assembler {
    /// Assembler with single-byte label immediates.
    pub fn new() -> Self {
        Self::with_label_width(1)
    }

    /// Assembler whose label pushes carry `width`-byte immediates (clamped to 1..=32).
    pub fn with_label_width(width: usize) -> Self {
        Self {
            label_names: Vec::new(),
            instructions: Vec::new(),
            label_width: width.clamp(1, MAX_PUSH_WIDTH),
        }
    }

    pub fn label_width(&self) -> usize {
        self.label_width
    }

    pub fn new_label(&mut self, name: impl Into<String>) -> Label {
        self.label_names.push(name.into());
        Label(self.label_names.len() - 1)
    }

    pub fn emit(&mut self, instruction: impl Into<Instruction>) -> &mut Self {
        self.instructions.push(instruction.into());
        self
    }

    pub fn op(&mut self, op: Opcode) -> &mut Self {
        self.emit(Instruction::Op(op))
    }

    /// Push a constant at the narrowest width that holds it.
    pub fn push<T>(&mut self, value: T) -> &mut Self
    where
        U256: UintTryFrom<T>,
    {
        self.emit(Instruction::Push(U256::from(value)))
    }

    pub fn push_label(&mut self, label: Label) -> &mut Self {
        self.emit(Instruction::PushLabel(label))
    }

    pub fn jump_dest(&mut self, label: Label) -> &mut Self {
        self.emit(Instruction::JumpDest(label))
    }

    pub fn resolve(&self) -> Result<AssembledProgram, AssemblerError> {
        let mut bytes = Vec::new();
        let mut offsets: Vec<Option<usize>> = vec![None; self.label_names.len()];
        let mut patches: Vec<(usize, Label)> = Vec::new();

        // Pass 1: layout.
        for instruction in &self.instructions {
            match instruction {
                Instruction::Op(op) => bytes.push(op.byte()),
                Instruction::Push(value) => {
                    let width = value.byte_len().max(1);
                    emit_push(&mut bytes, width, *value)?;
                }
                Instruction::PushN { width, value } => emit_push(&mut bytes, *width, *value)?,
                Instruction::PushLabel(label) => {
                    bytes.push(PUSH1 + (self.label_width - 1) as u8);
                    patches.push((bytes.len(), *label));
                    bytes.resize(bytes.len() + self.label_width, 0);
                }
                Instruction::JumpDest(label) => {
                    self.define(&mut offsets, *label, bytes.len())?;
                    bytes.push(Opcode::JumpDest.byte());
                }
                Instruction::Mark(label) => self.define(&mut offsets, *label, bytes.len())?,
                Instruction::Raw(raw) => bytes.extend_from_slice(raw),
            }
        }

        // Pass 2: patch label immediates.
        for (position, label) in patches {
            let offset = offsets
                .get(label.0)
                .copied()
                .flatten()
                .ok_or_else(|| AssemblerError::UnresolvedLabel(self.name(label)))?;
            let value = U256::from(offset);
            if value.byte_len() > self.label_width {
                return Err(AssemblerError::LabelOutOfRange {
                    label: self.name(label),
                    offset,
                    width: self.label_width,
                });
            }
            let word = value.to_be_bytes::<32>();
            bytes[position..position + self.label_width]
                .copy_from_slice(&word[32 - self.label_width..]);
        }

        let mut labels = BTreeMap::new();
        for (index, offset) in offsets.into_iter().enumerate() {
            if let Some(offset) = offset {
                if labels.insert(self.label_names[index].clone(), offset).is_some() {
                    return Err(AssemblerError::DuplicateLabel(self.label_names[index].clone()));
                }
            }
        }

        Ok(AssembledProgram { bytes, labels })
    }

    fn define(
        &self,
        offsets: &mut [Option<usize>],
        label: Label,
        offset: usize,
    ) -> Result<(), AssemblerError> {
        let slot = offsets
            .get_mut(label.0)
            .ok_or_else(|| AssemblerError::UnresolvedLabel(self.name(label)))?;
        if slot.is_some() {
            return Err(AssemblerError::DuplicateLabel(self.name(label)));
        }
        *slot = Some(offset);
        Ok(())
    }

    fn name(&self, label: Label) -> String {
        self.label_names
            .get(label.0)
            .cloned()
            .unwrap_or_else(|| format!("#{}", label.0))
    }
}

fn emit_push(bytes: &mut Vec<u8>, width: usize, value: U256) -> Result<(), AssemblerError> {
    let opcode = push_opcode(width).ok_or(AssemblerError::ImmediateTooWide { value, width })?;
    if value.byte_len() > width {
        return Err(AssemblerError::ImmediateTooWide { value, width });
    }
    let word = value.to_be_bytes::<32>();
    bytes.push(opcode);
    bytes.extend_from_slice(&word[32 - width..]);
    Ok(())
}
