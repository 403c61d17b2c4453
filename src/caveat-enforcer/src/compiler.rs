//! On-chain enforcer compiler.
//!
//! Each enforcer is a tiny contract with one entry point. The runtime checks the call's selector,
//! runs the kind-specific body, and either returns empty data (accept) or reverts (reject). The
//! programs are stateless: cumulative spend is not tracked on-chain.

use alloy_primitives::{Selector, U256};
use caveat_policy_types::{EnforcerKind, Opcode};

use crate::{
    abi::{argument_offset, selector_of, SELECTOR_LEN, WORD},
    assembler::{AssembledProgram, Assembler, Instruction, Label},
    errors::AssemblerError,
};

/// Label immediates start at one byte and widen up to this many bytes.
pub const MAX_LABEL_WIDTH: usize = 4;

/// Byte offset of the first call argument word.
const FIRST_ARGUMENT: usize = argument_offset(0);
/// Byte offset of the second call argument word (the array offset, or the cap).
const SECOND_ARGUMENT: usize = argument_offset(1);

/// Compiled bytecode for one enforcer kind.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EnforcerArtifact {
    pub kind: EnforcerKind,
    pub selector: Selector,
    pub runtime: Vec<u8>,
    pub init_code: Vec<u8>,
}

impl EnforcerArtifact {
    /// Contract-creation payload: init code followed by the runtime it returns.
    pub fn deploy_data(&self) -> Vec<u8> {
        let mut data = Vec::with_capacity(self.init_code.len() + self.runtime.len());
        data.extend_from_slice(&self.init_code);
        data.extend_from_slice(&self.runtime);
        data
    }
}

pub fn entry_selector(kind: EnforcerKind) -> Selector {
    selector_of(kind.signature())
}

pub fn compile(kind: EnforcerKind) -> EnforcerArtifact {
    let runtime = runtime_code(kind);
    EnforcerArtifact {
        kind,
        selector: entry_selector(kind),
        init_code: init_code(&runtime),
        runtime,
    }
}

pub fn compile_all() -> Vec<EnforcerArtifact> {
    EnforcerKind::ALL.into_iter().map(compile).collect()
}

pub fn runtime_code(kind: EnforcerKind) -> Vec<u8> {
    assemble_widening(|asm| build_runtime(asm, kind)).bytes
}

pub fn deployable_code(kind: EnforcerKind) -> Vec<u8> {
    compile(kind).deploy_data()
}

/// Deployment prologue that copies `runtime` (appended after it) into memory and returns it.
///
/// The returned bytes are the prologue only; the runtime itself follows in [`deploy_data`].
///
/// [`deploy_data`]: EnforcerArtifact::deploy_data
pub fn init_code(runtime: &[u8]) -> Vec<u8> {
    let program = assemble_widening(|asm| {
        let start = asm.new_label("runtime");
        let len = U256::from(runtime.len());
        asm.push(len)
            .push_label(start)
            .push(0u64)
            .op(Opcode::CodeCopy)
            .push(len)
            .push(0u64)
            .op(Opcode::Return)
            .emit(Instruction::Mark(start));
    });
    program.bytes
}

/// Assemble with one-byte label immediates, widening while a label does not fit.
///
/// Other assembler failures are bugs in the program builders and abort.
fn assemble_widening(build: impl Fn(&mut Assembler)) -> AssembledProgram {
    let mut width = 1;
    loop {
        let mut asm = Assembler::with_label_width(width);
        build(&mut asm);
        match asm.resolve() {
            Ok(program) => return program,
            Err(AssemblerError::LabelOutOfRange { .. }) if width < MAX_LABEL_WIDTH => width += 1,
            Err(err) => panic!("enforcer program failed to assemble: {err}"),
        }
    }
}

fn build_runtime(asm: &mut Assembler, kind: EnforcerKind) {
    let fail = asm.new_label("fail");
    dispatch(asm, entry_selector(kind), fail);
    match kind {
        // Selectors arrive right-padded, like the array entries, so both lists share one body.
        EnforcerKind::AllowedTargets | EnforcerKind::AllowedMethods => allow_list_body(asm, fail),
        EnforcerKind::ValueLimit => value_limit_body(asm, fail),
    }
    asm.jump_dest(fail).push(0u64).op(Opcode::Dup1).op(Opcode::Revert);
}

/// Jump to `fail` unless the first four bytes of call data equal `selector`.
fn dispatch(asm: &mut Assembler, selector: Selector, fail: Label) {
    asm.push(0u64)
        .op(Opcode::CallDataLoad)
        .push(U256::from((WORD - SELECTOR_LEN) * 8))
        .op(Opcode::Shr)
        .emit(Instruction::PushN {
            width: SELECTOR_LEN,
            value: U256::from_be_slice(selector.as_slice()),
        })
        .op(Opcode::Eq)
        .op(Opcode::IsZero)
        .push_label(fail)
        .op(Opcode::JumpI);
}

/// `enforce(x, list)`: accept iff `x` equals some `list[i]`.
fn allow_list_body(asm: &mut Assembler, fail: Label) {
    let looped = asm.new_label("loop");
    let found = asm.new_label("found");

    // [needle]
    asm.push(FIRST_ARGUMENT as u64).op(Opcode::CallDataLoad);
    // [needle, length_position]
    asm.push(SECOND_ARGUMENT as u64)
        .op(Opcode::CallDataLoad)
        .push(SELECTOR_LEN as u64)
        .op(Opcode::Add);
    // [needle, length, base]
    asm.op(Opcode::Dup1)
        .op(Opcode::CallDataLoad)
        .op(Opcode::Swap1)
        .push(WORD as u64)
        .op(Opcode::Add);
    // [needle, length, base, i]
    asm.push(0u64);

    asm.jump_dest(looped)
        .op(Opcode::Dup3)
        .op(Opcode::Dup2)
        .op(Opcode::Lt)
        .op(Opcode::IsZero)
        .push_label(fail)
        .op(Opcode::JumpI);
    // position = base + 32 * i
    asm.op(Opcode::Dup1)
        .push(WORD as u64)
        .op(Opcode::Mul)
        .op(Opcode::Dup3)
        .op(Opcode::Add);
    // Entries past the end of call data are never read as zero words.
    asm.op(Opcode::Dup1)
        .op(Opcode::CallDataSize)
        .op(Opcode::Gt)
        .op(Opcode::IsZero)
        .push_label(fail)
        .op(Opcode::JumpI);
    asm.op(Opcode::Dup1)
        .op(Opcode::CallDataSize)
        .op(Opcode::Sub)
        .push(WORD as u64)
        .op(Opcode::Gt)
        .push_label(fail)
        .op(Opcode::JumpI);
    // list[i]
    asm.op(Opcode::CallDataLoad)
        .op(Opcode::Dup5)
        .op(Opcode::Eq)
        .push_label(found)
        .op(Opcode::JumpI);
    asm.push(1u64).op(Opcode::Add).push_label(looped).op(Opcode::Jump);

    asm.jump_dest(found)
        .op(Opcode::Pop)
        .op(Opcode::Pop)
        .op(Opcode::Pop)
        .op(Opcode::Pop);
    return_empty(asm);
}

/// `enforce(amount, cap)`: accept iff `amount <= cap`.
fn value_limit_body(asm: &mut Assembler, fail: Label) {
    asm.push(SECOND_ARGUMENT as u64)
        .op(Opcode::CallDataLoad)
        .push(FIRST_ARGUMENT as u64)
        .op(Opcode::CallDataLoad)
        .op(Opcode::Gt)
        .push_label(fail)
        .op(Opcode::JumpI);
    return_empty(asm);
}

fn return_empty(asm: &mut Assembler) {
    asm.push(0u64).op(Opcode::Dup1).op(Opcode::Return);
}
