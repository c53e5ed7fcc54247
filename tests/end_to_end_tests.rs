use neo2_rs::crypto::{derive_public_key, hash160, sign};
use neo2_rs::prelude::*;
use neo2_rs::smart_contract::ledger::Transaction;
use neo2_rs::vm::ScriptContainer;
use std::rc::Rc;

const PRIVATE_KEY: [u8; 32] = [0x2a; 32];

fn signature_contract(public_key: &[u8]) -> Vec<u8> {
    let mut sb = ScriptBuilder::new();
    sb.emit_push_bytes(public_key).emit_opcode(OpCode::CHECKSIG);
    sb.to_array()
}

fn verify(tx: Rc<Transaction>, invocation: Vec<u8>, verification: Vec<u8>) -> ApplicationEngine {
    let container: Rc<dyn ScriptContainer> = tx;
    let mut engine = ApplicationEngine::new(
        TriggerType::Verification,
        Some(container),
        Rc::new(MemorySnapshot::new()),
        0,
        false,
    );
    engine.load_script(verification).unwrap();
    engine.load_script(invocation).unwrap();
    engine.execute();
    engine
}

#[test]
fn signature_witness_verifies() {
    let public_key = derive_public_key(&PRIVATE_KEY).unwrap();
    let verification = signature_contract(&public_key);
    let tx = Rc::new(Transaction {
        witness_hashes: vec![UInt160::from(hash160(&verification))],
        ..Default::default()
    });
    let signature = sign(&tx.unsigned_data(), &PRIVATE_KEY).unwrap();

    let mut invocation = ScriptBuilder::new();
    invocation.emit_push_bytes(&signature);
    let engine = verify(Rc::clone(&tx), invocation.to_array(), verification.clone());
    assert_eq!(engine.state(), VMState::HALT, "{:?}", engine.fault_reason());
    assert_eq!(engine.result_stack().peek(0).unwrap(), &StackItem::from(true));

    let mut forged = signature;
    forged[0] ^= 1;
    let mut invocation = ScriptBuilder::new();
    invocation.emit_push_bytes(&forged);
    let engine = verify(tx, invocation.to_array(), verification);
    assert_eq!(engine.result_stack().peek(0).unwrap(), &StackItem::from(false));
}

#[test]
fn called_contracts_write_their_own_storage() {
    let snapshot = Rc::new(MemorySnapshot::new());
    let mut callee = ScriptBuilder::new();
    callee
        .emit_push_string("counted")
        .emit_push_string("counter")
        .emit_syscall("Neo.Storage.GetContext")
        .unwrap()
        .emit_syscall("Neo.Storage.Put")
        .unwrap()
        .emit_push_int(7);
    let callee_hash = snapshot.add_contract(ContractState::new(
        callee.to_array(),
        ContractPropertyState::HAS_STORAGE,
    ));

    let mut caller = ScriptBuilder::new();
    caller.emit_app_call(&callee_hash, false);
    let engine = ApplicationEngine::run(caller.to_array(), snapshot.clone(), None, false).unwrap();
    assert_eq!(engine.state(), VMState::HALT, "{:?}", engine.fault_reason());
    assert_eq!(engine.result_stack().peek(0).unwrap(), &StackItem::from(7));

    let entries = snapshot.storage_entries();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].0.script_hash, callee_hash);
    assert_eq!(entries[0].1.value, b"counted".to_vec());
}

#[test]
fn settings_from_toml_govern_execution() {
    let settings = VmSettings::from_toml_str("[limits]\nmax_array_size = 2\n").unwrap();
    let mut engine = ApplicationEngine::with_settings(
        TriggerType::Application,
        None,
        Rc::new(MemorySnapshot::new()),
        0,
        false,
        &settings,
    )
    .unwrap();
    engine
        .load_script(vec![OpCode::PUSH3 as u8, OpCode::NEWARRAY as u8])
        .unwrap();
    assert_eq!(engine.execute(), VMState::FAULT);
    assert_eq!(
        engine.fault_reason(),
        Some(&VmError::limit_exceeded("array size"))
    );
}
