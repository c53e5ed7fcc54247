//! Cryptographic operations for the Neo Virtual Machine.
//!
//! CHECKSIG and CHECKMULTISIG verify against the script container's message;
//! VERIFY takes the message from the stack.

use crate::error::{VmError, VmResult};
use crate::execution_engine::ExecutionEngine;
use crate::instruction::Instruction;
use crate::jump_table::JumpTable;
use crate::op_code::OpCode;
use crate::stack_item::StackItem;
use num_traits::ToPrimitive;
use std::rc::Rc;

/// Registers the cryptographic operation handlers.
pub fn register_handlers(jump_table: &mut JumpTable) {
    jump_table.register(OpCode::SHA1, sha1);
    jump_table.register(OpCode::SHA256, sha256);
    jump_table.register(OpCode::HASH160, hash160);
    jump_table.register(OpCode::HASH256, hash256);
    jump_table.register(OpCode::CHECKSIG, check_sig);
    jump_table.register(OpCode::VERIFY, verify);
    jump_table.register(OpCode::CHECKMULTISIG, check_multisig);
}

fn sha1(engine: &mut ExecutionEngine, _instruction: &Instruction) -> VmResult<()> {
    let x = engine.pop_bytes()?;
    engine.push(StackItem::from(neo_cryptography::sha1(&x).to_vec()))
}

fn sha256(engine: &mut ExecutionEngine, _instruction: &Instruction) -> VmResult<()> {
    let x = engine.pop_bytes()?;
    engine.push(StackItem::from(neo_cryptography::sha256(&x).to_vec()))
}

fn hash160(engine: &mut ExecutionEngine, _instruction: &Instruction) -> VmResult<()> {
    let x = engine.pop_bytes()?;
    let hash = engine.crypto().hash160(&x);
    engine.push(StackItem::from(hash.to_vec()))
}

fn hash256(engine: &mut ExecutionEngine, _instruction: &Instruction) -> VmResult<()> {
    let x = engine.pop_bytes()?;
    let hash = engine.crypto().hash256(&x);
    engine.push(StackItem::from(hash.to_vec()))
}

fn container_message(engine: &ExecutionEngine) -> VmResult<Vec<u8>> {
    engine
        .script_container()
        .map(|container| container.get_message())
        .ok_or_else(|| VmError::invalid_operation_msg("no script container to verify against"))
}

fn check_sig(engine: &mut ExecutionEngine, _instruction: &Instruction) -> VmResult<()> {
    let pubkey = engine.pop_bytes()?;
    let signature = engine.pop_bytes()?;
    let message = container_message(engine)?;
    let valid = engine
        .crypto()
        .verify_signature(&message, &signature, &pubkey);
    engine.push(StackItem::from(valid))
}

fn verify(engine: &mut ExecutionEngine, _instruction: &Instruction) -> VmResult<()> {
    let pubkey = engine.pop_bytes()?;
    let signature = engine.pop_bytes()?;
    let message = engine.pop_bytes()?;
    let valid = engine
        .crypto()
        .verify_signature(&message, &signature, &pubkey);
    engine.push(StackItem::from(valid))
}

/// Pops a list of byte strings given either as one array item or as a count
/// followed by that many items. `max` bounds the count.
fn pop_byte_list(engine: &mut ExecutionEngine, max: usize) -> VmResult<Vec<Rc<[u8]>>> {
    let item = engine.pop()?;
    let list = match &item {
        StackItem::Array(list) | StackItem::Struct(list) => list
            .borrow()
            .iter()
            .map(StackItem::as_bytes)
            .collect::<VmResult<Vec<_>>>()?,
        other => {
            let depth = engine.context()?.evaluation_stack().len();
            let count = other
                .as_int()?
                .to_usize()
                .filter(|n| *n >= 1 && *n <= depth && *n <= max)
                .ok_or_else(|| VmError::invalid_operation_msg("invalid CHECKMULTISIG count"))?;
            (0..count)
                .map(|_| engine.pop_bytes())
                .collect::<VmResult<Vec<_>>>()?
        }
    };
    if list.is_empty() || list.len() > max {
        return Err(VmError::invalid_operation_msg(
            "invalid CHECKMULTISIG count",
        ));
    }
    Ok(list)
}

/// Signatures must match keys in order: each key is tried at most once and
/// the check fails as soon as the remaining keys cannot cover the remaining
/// signatures.
fn check_multisig(engine: &mut ExecutionEngine, _instruction: &Instruction) -> VmResult<()> {
    let pubkeys = pop_byte_list(engine, usize::MAX)?;
    let signatures = pop_byte_list(engine, pubkeys.len())?;
    let message = container_message(engine)?;

    let crypto = Rc::clone(engine.crypto());
    let (m, n) = (signatures.len(), pubkeys.len());
    let (mut i, mut j) = (0, 0);
    let mut success = true;
    while success && i < m && j < n {
        if crypto.verify_signature(&message, &signatures[i], &pubkeys[j]) {
            i += 1;
        }
        j += 1;
        if m - i > n - j {
            success = false;
        }
    }
    engine.push(StackItem::from(success))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::{Crypto, NeoCrypto};
    use crate::VMState;

    #[test]
    fn hashes_match_the_crypto_crate() {
        let mut engine = ExecutionEngine::new();
        engine
            .load_script(&[0x03, b'a', b'b', b'c', OpCode::HASH160 as u8][..])
            .unwrap();
        assert_eq!(engine.execute(), VMState::HALT);
        assert_eq!(
            engine.result_stack().peek(0).unwrap(),
            &StackItem::from(NeoCrypto.hash160(b"abc").to_vec())
        );
    }

    #[test]
    fn checksig_without_container_faults() {
        let mut engine = ExecutionEngine::new();
        engine
            .load_script(&[0x00, 0x00, OpCode::CHECKSIG as u8][..])
            .unwrap();
        assert_eq!(engine.execute(), VMState::FAULT);
    }

    #[test]
    fn verify_rejects_garbage() {
        let mut engine = ExecutionEngine::new();
        engine
            .load_script(&[0x01, 0x01, 0x01, 0x02, 0x01, 0x03, OpCode::VERIFY as u8][..])
            .unwrap();
        assert_eq!(engine.execute(), VMState::HALT);
        assert_eq!(engine.result_stack().peek(0).unwrap(), &StackItem::from(false));
    }
}
