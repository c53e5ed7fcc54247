//! The execution engine used for contracts and witness verification.
//!
//! [`ApplicationEngine`] wraps a [`neo_vm::ExecutionEngine`] with chain
//! access and a [`Governor`] that charges gas and enforces the structural
//! limits before every instruction. A limit breach faults the engine before
//! the instruction has any effect.

pub mod gas;
pub mod limits;

pub use gas::{get_price, get_price_for_syscall, storage_put_price, GasMeter};
pub use limits::{count_stack_items, StackSizeTracker};

use crate::interop::{LogEventArgs, NotifyEventArgs, StateReader};
use crate::ledger::Block;
use crate::snapshot::{Snapshot, SnapshotScriptTable};
use crate::trigger_type::TriggerType;
use crate::Result;
use neo_config::{VmLimits, VmSettings};
use neo_vm::{
    ExecutionEngine, Instruction, RandomAccessStack, Script, ScriptContainer, StackItem, VMState,
    VmError, VmResult,
};
use std::cell::Ref;
use std::rc::Rc;

/// Per-instruction resource checks.
pub struct Governor {
    gas: GasMeter,
    stack: StackSizeTracker,
    limits: VmLimits,
    snapshot: Rc<dyn Snapshot>,
}

impl Governor {
    pub fn new(gas: GasMeter, limits: VmLimits, snapshot: Rc<dyn Snapshot>) -> Self {
        Self {
            gas,
            stack: StackSizeTracker::new(),
            limits,
            snapshot,
        }
    }

    pub fn gas(&self) -> &GasMeter {
        &self.gas
    }

    pub fn stack_size(&self) -> &StackSizeTracker {
        &self.stack
    }

    /// Runs every check in order; the first failure wins.
    pub fn pre_execute(&mut self, engine: &ExecutionEngine, instruction: &Instruction) -> VmResult<()> {
        // The implicit RET at the end of a script is free and unchecked.
        if engine.current_context().map_or(true, |context| context.is_at_end()) {
            return Ok(());
        }
        let price = get_price(engine, instruction, self.gas.ratio())?;
        self.gas.charge(price)?;
        limits::check_item_size(engine, instruction, &self.limits)?;
        self.stack.check(engine, instruction, &self.limits)?;
        limits::check_array_size(engine, instruction, &self.limits)?;
        limits::check_invocation_stack(engine, instruction, &self.limits)?;
        limits::check_big_integers(engine, instruction, &self.limits)?;
        limits::check_dynamic_invoke(engine, instruction, self.snapshot.as_ref())
    }
}

/// Runs scripts against a snapshot under gas and size limits.
pub struct ApplicationEngine {
    engine: ExecutionEngine,
    governor: Governor,
    trigger: TriggerType,
    state_reader: Rc<StateReader>,
}

impl ApplicationEngine {
    /// An engine with MainNet limits. `gas` is paid on top of the free
    /// allowance; `test_mode` lifts the budget but caps the instruction count.
    pub fn new(
        trigger: TriggerType,
        container: Option<Rc<dyn ScriptContainer>>,
        snapshot: Rc<dyn Snapshot>,
        gas: i64,
        test_mode: bool,
    ) -> Self {
        Self::build(trigger, container, snapshot, gas, test_mode, &VmSettings::default())
    }

    /// Like [`new`](Self::new) with explicit settings, which are validated.
    pub fn with_settings(
        trigger: TriggerType,
        container: Option<Rc<dyn ScriptContainer>>,
        snapshot: Rc<dyn Snapshot>,
        gas: i64,
        test_mode: bool,
        settings: &VmSettings,
    ) -> Result<Self> {
        settings.validate()?;
        Ok(Self::build(trigger, container, snapshot, gas, test_mode, settings))
    }

    fn build(
        trigger: TriggerType,
        container: Option<Rc<dyn ScriptContainer>>,
        snapshot: Rc<dyn Snapshot>,
        gas: i64,
        test_mode: bool,
        settings: &VmSettings,
    ) -> Self {
        let state_reader = Rc::new(StateReader::new(Rc::clone(&snapshot), trigger));
        let service = StateReader::interop_service(&state_reader);
        let mut engine = ExecutionEngine::new()
            .with_limits(settings.limits)
            .with_script_table(Rc::new(SnapshotScriptTable::new(Rc::clone(&snapshot))))
            .with_interop_service(Rc::new(service));
        if let Some(container) = container {
            engine = engine.with_script_container(container);
        }
        let meter = GasMeter::new(gas, test_mode, &settings.gas);
        Self {
            engine,
            governor: Governor::new(meter, settings.limits, snapshot),
            trigger,
            state_reader,
        }
    }

    /// Executes as part of persisting `block`.
    pub fn with_persisting_block(self, block: Rc<Block>) -> Self {
        self.state_reader.set_persisting_block(block);
        self
    }

    pub fn load_script(&mut self, script: impl Into<Script>) -> VmResult<()> {
        self.engine.load_script(script)
    }

    /// Runs to HALT, FAULT or BREAK.
    pub fn execute(&mut self) -> VMState {
        let Self { engine, governor, .. } = self;
        let state = engine.execute_with(|engine, instruction| governor.pre_execute(engine, instruction));
        self.trace_outcome();
        state
    }

    pub fn step_into(&mut self) -> VMState {
        let Self { engine, governor, .. } = self;
        let state = engine.step_into_with(|engine, instruction| governor.pre_execute(engine, instruction));
        self.trace_outcome();
        state
    }

    pub fn step_over(&mut self) -> VMState {
        let Self { engine, governor, .. } = self;
        let state = engine.step_over_with(|engine, instruction| governor.pre_execute(engine, instruction));
        self.trace_outcome();
        state
    }

    pub fn step_out(&mut self) -> VMState {
        let Self { engine, governor, .. } = self;
        let state = engine.step_out_with(|engine, instruction| governor.pre_execute(engine, instruction));
        self.trace_outcome();
        state
    }

    fn trace_outcome(&self) {
        if let Some(reason) = self.engine.fault_reason() {
            tracing::debug!(
                trigger = %self.trigger,
                gas = self.gas_consumed(),
                %reason,
                "execution faulted"
            );
        }
    }

    pub fn state(&self) -> VMState {
        self.engine.state()
    }

    pub fn fault_reason(&self) -> Option<&VmError> {
        self.engine.fault_reason()
    }

    /// Gas consumed so far, in the smallest unit.
    pub fn gas_consumed(&self) -> i64 {
        self.governor.gas().consumed()
    }

    pub fn result_stack(&self) -> &RandomAccessStack<StackItem> {
        self.engine.result_stack()
    }

    pub fn trigger(&self) -> TriggerType {
        self.trigger
    }

    pub fn engine(&self) -> &ExecutionEngine {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut ExecutionEngine {
        &mut self.engine
    }

    pub fn governor(&self) -> &Governor {
        &self.governor
    }

    pub fn state_reader(&self) -> &Rc<StateReader> {
        &self.state_reader
    }

    pub fn notifications(&self) -> Ref<'_, Vec<NotifyEventArgs>> {
        self.state_reader.notifications()
    }

    pub fn logs(&self) -> Ref<'_, Vec<LogEventArgs>> {
        self.state_reader.logs()
    }

    /// Runs `script` under the application trigger with no prepaid gas.
    pub fn run(
        script: impl Into<Script>,
        snapshot: Rc<dyn Snapshot>,
        container: Option<Rc<dyn ScriptContainer>>,
        test_mode: bool,
    ) -> VmResult<Self> {
        let mut engine = Self::new(TriggerType::Application, container, snapshot, 0, test_mode);
        engine.load_script(script)?;
        engine.execute();
        Ok(engine)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::MemorySnapshot;
    use neo_vm::{OpCode, ScriptBuilder};

    fn run(script: Vec<u8>) -> ApplicationEngine {
        ApplicationEngine::run(script, Rc::new(MemorySnapshot::new()), None, false).unwrap()
    }

    #[test]
    fn charges_per_instruction() {
        let mut sb = ScriptBuilder::new();
        sb.emit_push_int(2).emit_push_int(3).emit_opcode(OpCode::ADD);
        let engine = run(sb.to_array());
        assert_eq!(engine.state(), VMState::HALT);
        // Pushes are free, ADD costs one unit, the implicit RET nothing.
        assert_eq!(engine.gas_consumed(), neo_config::GAS_RATIO);
        assert_eq!(engine.result_stack().peek(0).unwrap().as_int().unwrap(), 5.into());
    }

    #[test]
    fn rejects_invalid_settings() {
        let mut settings = VmSettings::default();
        settings.gas.ratio = 0;
        let result = ApplicationEngine::with_settings(
            TriggerType::Application,
            None,
            Rc::new(MemorySnapshot::new()),
            0,
            false,
            &settings,
        );
        assert!(result.is_err());
    }
}
