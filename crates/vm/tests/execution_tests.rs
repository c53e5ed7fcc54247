use neo_core::UInt160;
use neo_vm::{
    ExecutionEngine, OpCode, Script, ScriptBuilder, ScriptTable, StackItem, VMState, VmError,
};
use std::collections::HashMap;
use std::rc::Rc;

#[derive(Default)]
struct Contracts(HashMap<UInt160, Vec<u8>>);

impl Contracts {
    fn deploy(&mut self, script: Vec<u8>) -> UInt160 {
        let hash = Script::new(script.clone()).hash();
        self.0.insert(hash, script);
        hash
    }
}

impl ScriptTable for Contracts {
    fn get_script(&self, script_hash: &UInt160) -> Option<Vec<u8>> {
        self.0.get(script_hash).cloned()
    }
}

fn run(script: &[u8]) -> ExecutionEngine {
    let mut engine = ExecutionEngine::new();
    engine.load_script(script).unwrap();
    engine.execute();
    engine
}

fn results(engine: &ExecutionEngine) -> Vec<StackItem> {
    engine.result_stack().iter().cloned().collect()
}

#[test]
fn adds_two_small_integers() {
    let engine = run(&[0x52, 0x53, OpCode::ADD as u8]);
    assert_eq!(engine.state(), VMState::HALT);
    assert_eq!(results(&engine), vec![StackItem::from(5)]);
}

#[test]
fn division_truncates_toward_zero() {
    let mut sb = ScriptBuilder::new();
    sb.emit_push_int(7)
        .emit_push_int(-2)
        .emit_opcode(OpCode::DIV)
        .emit_push_int(7)
        .emit_push_int(-2)
        .emit_opcode(OpCode::MOD);
    let engine = run(&sb.to_array());
    assert_eq!(engine.state(), VMState::HALT);
    assert_eq!(results(&engine), vec![StackItem::from(-3), StackItem::from(1)]);
}

#[test]
fn pack_with_too_large_count_faults_without_popping() {
    let engine = run(&[0x55, 0x53, OpCode::PACK as u8]);
    assert_eq!(engine.state(), VMState::FAULT);
    let context = engine.current_context().unwrap();
    assert_eq!(context.evaluation_stack().len(), 2);
    assert_eq!(context.peek(1).unwrap(), &StackItem::from(5));
}

#[test]
fn unknown_syscall_faults() {
    let mut sb = ScriptBuilder::new();
    sb.emit_syscall("Neo.Nothing.Here").unwrap();
    let engine = run(&sb.to_array());
    assert_eq!(engine.state(), VMState::FAULT);
    assert_eq!(
        engine.fault_reason(),
        Some(&VmError::UnknownSyscall("Neo.Nothing.Here".to_string()))
    );
}

#[test]
fn app_call_to_missing_contract_faults() {
    let missing = UInt160::from([0x11; 20]);
    let mut sb = ScriptBuilder::new();
    sb.emit_app_call(&missing, false);

    let mut engine =
        ExecutionEngine::new().with_script_table(Rc::new(Contracts::default()));
    engine.load_script(sb.to_array()).unwrap();
    assert_eq!(engine.execute(), VMState::FAULT);
    assert_eq!(engine.fault_reason(), Some(&VmError::ScriptNotFound(missing)));
}

#[test]
fn app_call_shares_the_evaluation_stack() {
    let mut contracts = Contracts::default();
    let callee = contracts.deploy(vec![0x53, OpCode::MUL as u8]);

    let mut sb = ScriptBuilder::new();
    sb.emit_push_int(4).emit_app_call(&callee, false).emit_push_int(1);
    sb.emit_opcode(OpCode::ADD);

    let mut engine = ExecutionEngine::new().with_script_table(Rc::new(contracts));
    engine.load_script(sb.to_array()).unwrap();
    assert_eq!(engine.execute(), VMState::HALT);
    assert_eq!(results(&engine), vec![StackItem::from(13)]);
    assert!(engine.executed_script_hashes().contains(&callee));
}

#[test]
fn tail_call_chain_keeps_invocation_depth_flat() {
    let mut contracts = Contracts::default();
    let last = contracts.deploy(vec![OpCode::INC as u8]);
    let mut middle = ScriptBuilder::new();
    middle.emit_opcode(OpCode::INC).emit_app_call(&last, true);
    let middle = contracts.deploy(middle.to_array());

    let mut entry = ScriptBuilder::new();
    entry.emit_push_int(1).emit_app_call(&middle, true);

    let mut engine = ExecutionEngine::new().with_script_table(Rc::new(contracts));
    engine.load_script(entry.to_array()).unwrap();
    let mut deepest = 0;
    let state = engine.execute_with(|engine, _| {
        deepest = deepest.max(engine.invocation_stack().len());
        Ok(())
    });
    assert_eq!(state, VMState::HALT);
    assert_eq!(deepest, 1);
    assert_eq!(results(&engine), vec![StackItem::from(3)]);
}

#[test]
fn calling_script_hash_is_visible_to_callee() {
    let mut contracts = Contracts::default();
    let mut callee = ScriptBuilder::new();
    callee
        .emit_syscall("System.ExecutionEngine.GetCallingScriptHash")
        .unwrap();
    let callee = contracts.deploy(callee.to_array());

    let mut entry = ScriptBuilder::new();
    entry.emit_app_call(&callee, false);
    let entry_hash = entry.to_script().hash();

    let mut engine = ExecutionEngine::new().with_script_table(Rc::new(contracts));
    engine.load_script(entry.to_array()).unwrap();
    assert_eq!(engine.execute(), VMState::HALT);
    assert_eq!(results(&engine), vec![StackItem::from(entry_hash.to_vec())]);
}

#[test]
fn identical_runs_are_identical() {
    let mut sb = ScriptBuilder::new();
    sb.emit_push_int(3)
        .emit_opcode(OpCode::NEWARRAY)
        .emit_opcode(OpCode::DUP)
        .emit_push_int(0)
        .emit_push_string("neo")
        .emit_opcode(OpCode::SETITEM)
        .emit_opcode(OpCode::DUP)
        .emit_opcode(OpCode::ARRAYSIZE)
        .emit_opcode(OpCode::SWAP)
        .emit_push_int(0)
        .emit_opcode(OpCode::PICKITEM)
        .emit_opcode(OpCode::SHA256);
    let script = sb.to_array();

    let first = run(&script);
    let second = run(&script);
    assert_eq!(first.state(), VMState::HALT);
    assert_eq!(first.state(), second.state());
    assert_eq!(results(&first), results(&second));
}
