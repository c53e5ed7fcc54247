//! Execution engine module for the Neo Virtual Machine.
//!
//! The engine owns the invocation stack and drives the fetch, decode and
//! dispatch loop. Handlers report failures as `Err`; the loop turns the first
//! one into the FAULT state and keeps it as the fault reason.

use crate::cycle_tracker::CycleTracker;
use crate::error::{VmError, VmResult};
use crate::execution_context::ExecutionContext;
use crate::instruction::Instruction;
use crate::interop_service::InteropService;
use crate::jump_table::JumpTable;
use crate::random_access_stack::RandomAccessStack;
use crate::script::Script;
use crate::stack_item::StackItem;
use crate::traits::{Crypto, NeoCrypto, ScriptContainer, ScriptTable};
use crate::vm_state::VMState;
use neo_core::UInt160;
use std::rc::Rc;

/// Restrictions on the VM.
pub use neo_config::VmLimits as ExecutionEngineLimits;

/// Runs scripts. See the crate docs for the execution model.
pub struct ExecutionEngine {
    state: VMState,
    fault_reason: Option<VmError>,
    jump_table: JumpTable,
    limits: ExecutionEngineLimits,
    invocation_stack: RandomAccessStack<ExecutionContext>,
    result_stack: RandomAccessStack<StackItem>,
    executed_script_hashes: Vec<UInt160>,
    script_container: Option<Rc<dyn ScriptContainer>>,
    script_table: Option<Rc<dyn ScriptTable>>,
    interop_service: Rc<InteropService>,
    crypto: Rc<dyn Crypto>,
    cycle_tracker: CycleTracker,
    /// Set by handlers that moved the pointer themselves.
    is_jumping: bool,
}

impl Default for ExecutionEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl ExecutionEngine {
    /// Creates an engine with default limits, the standard interop service
    /// and no container or script table.
    pub fn new() -> Self {
        Self {
            state: VMState::NONE,
            fault_reason: None,
            jump_table: JumpTable::default(),
            limits: ExecutionEngineLimits::DEFAULT,
            invocation_stack: RandomAccessStack::new(),
            result_stack: RandomAccessStack::new(),
            executed_script_hashes: Vec::new(),
            script_container: None,
            script_table: None,
            interop_service: Rc::new(InteropService::new()),
            crypto: Rc::new(NeoCrypto),
            cycle_tracker: CycleTracker::new(),
            is_jumping: false,
        }
    }

    pub fn with_limits(mut self, limits: ExecutionEngineLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn with_script_container(mut self, container: Rc<dyn ScriptContainer>) -> Self {
        self.script_container = Some(container);
        self
    }

    pub fn with_script_table(mut self, table: Rc<dyn ScriptTable>) -> Self {
        self.script_table = Some(table);
        self
    }

    pub fn with_interop_service(mut self, service: Rc<InteropService>) -> Self {
        self.interop_service = service;
        self
    }

    pub fn with_crypto(mut self, crypto: Rc<dyn Crypto>) -> Self {
        self.crypto = crypto;
        self
    }

    pub fn with_jump_table(mut self, jump_table: JumpTable) -> Self {
        self.jump_table = jump_table;
        self
    }

    pub fn state(&self) -> VMState {
        self.state
    }

    pub fn set_state(&mut self, state: VMState) {
        if self.state != state {
            log::trace!("state {} -> {}", self.state, state);
            self.state = state;
        }
    }

    /// The error that moved the engine into FAULT.
    pub fn fault_reason(&self) -> Option<&VmError> {
        self.fault_reason.as_ref()
    }

    fn on_fault(&mut self, error: VmError) {
        log::debug!(
            "fault at {:?}: {}",
            self.current_context()
                .map(|context| (context.script_hash(), context.instruction_pointer())),
            error
        );
        self.fault_reason = Some(error);
        self.set_state(VMState::FAULT);
    }

    pub fn limits(&self) -> &ExecutionEngineLimits {
        &self.limits
    }

    pub fn jump_table(&self) -> &JumpTable {
        &self.jump_table
    }

    pub fn crypto(&self) -> &Rc<dyn Crypto> {
        &self.crypto
    }

    pub fn script_container(&self) -> Option<&Rc<dyn ScriptContainer>> {
        self.script_container.as_ref()
    }

    pub fn script_table(&self) -> Option<&Rc<dyn ScriptTable>> {
        self.script_table.as_ref()
    }

    pub fn interop_service(&self) -> &Rc<InteropService> {
        &self.interop_service
    }

    pub fn invocation_stack(&self) -> &RandomAccessStack<ExecutionContext> {
        &self.invocation_stack
    }

    pub(crate) fn invocation_stack_mut(&mut self) -> &mut RandomAccessStack<ExecutionContext> {
        &mut self.invocation_stack
    }

    pub fn result_stack(&self) -> &RandomAccessStack<StackItem> {
        &self.result_stack
    }

    pub(crate) fn result_stack_mut(&mut self) -> &mut RandomAccessStack<StackItem> {
        &mut self.result_stack
    }

    /// Hash of every script loaded so far, in load order.
    pub fn executed_script_hashes(&self) -> &[UInt160] {
        &self.executed_script_hashes
    }

    pub(crate) fn cycle_tracker_mut(&mut self) -> &mut CycleTracker {
        &mut self.cycle_tracker
    }

    pub fn current_context(&self) -> Option<&ExecutionContext> {
        self.invocation_stack.peek(0).ok()
    }

    pub fn current_context_mut(&mut self) -> Option<&mut ExecutionContext> {
        self.invocation_stack.peek_mut(0).ok()
    }

    /// The context that called the current one.
    pub fn calling_context(&self) -> Option<&ExecutionContext> {
        self.invocation_stack.peek(1).ok()
    }

    /// The first context loaded.
    pub fn entry_context(&self) -> Option<&ExecutionContext> {
        let depth = self.invocation_stack.len();
        if depth == 0 {
            return None;
        }
        self.invocation_stack.peek(depth - 1).ok()
    }

    pub(crate) fn context(&self) -> VmResult<&ExecutionContext> {
        self.current_context()
            .ok_or_else(|| VmError::invalid_operation_msg("no current context"))
    }

    pub(crate) fn context_mut(&mut self) -> VmResult<&mut ExecutionContext> {
        self.current_context_mut()
            .ok_or_else(|| VmError::invalid_operation_msg("no current context"))
    }

    pub fn current_script_hash(&self) -> VmResult<UInt160> {
        Ok(self.context()?.script_hash())
    }

    /// Pushes onto the current evaluation stack.
    pub fn push(&mut self, item: StackItem) -> VmResult<()> {
        self.context_mut()?.push(item);
        Ok(())
    }

    /// Pops from the current evaluation stack.
    pub fn pop(&mut self) -> VmResult<StackItem> {
        self.context_mut()?.pop()
    }

    pub fn peek(&self, index: usize) -> VmResult<&StackItem> {
        self.context()?.peek(index)
    }

    pub fn pop_int(&mut self) -> VmResult<num_bigint::BigInt> {
        self.pop()?.as_int()
    }

    pub fn pop_bytes(&mut self) -> VmResult<Rc<[u8]>> {
        self.pop()?.as_bytes()
    }

    pub fn pop_bool(&mut self) -> VmResult<bool> {
        Ok(self.pop()?.as_bool())
    }

    /// Loads `script` as a new context that returns everything it leaves.
    pub fn load_script(&mut self, script: impl Into<Script>) -> VmResult<()> {
        self.load_script_with_rvcount(Rc::new(script.into()), -1)
    }

    pub fn load_script_with_rvcount(&mut self, script: Rc<Script>, rvcount: i32) -> VmResult<()> {
        self.load_context(ExecutionContext::new(script, rvcount))
    }

    /// Pushes a context, enforcing the invocation depth limit.
    pub fn load_context(&mut self, context: ExecutionContext) -> VmResult<()> {
        if self.invocation_stack.len() >= self.limits.max_invocation_stack_size {
            return Err(VmError::limit_exceeded("invocation stack"));
        }
        let hash = context.script_hash();
        log::debug!(
            "load {} ({} bytes) at depth {}",
            hash,
            context.script().len(),
            self.invocation_stack.len() + 1
        );
        self.executed_script_hashes.push(hash);
        self.invocation_stack.push(context);
        Ok(())
    }

    /// Removes the context at `index` (0 is the current one).
    pub fn remove_context(&mut self, index: usize) -> VmResult<ExecutionContext> {
        let context = self.invocation_stack.remove(index)?;
        log::debug!("unload {}", context.script_hash());
        Ok(context)
    }

    /// Resolves a script through the script table.
    pub fn get_script(&self, script_hash: &UInt160) -> VmResult<Rc<Script>> {
        self.script_table
            .as_ref()
            .and_then(|table| table.get_script(script_hash))
            .map(|bytes| Rc::new(Script::new(bytes)))
            .ok_or(VmError::ScriptNotFound(*script_hash))
    }

    /// Marks the current instruction as having moved the pointer itself.
    pub(crate) fn set_jumping(&mut self) {
        self.is_jumping = true;
    }

    /// Runs until HALT, FAULT or BREAK.
    pub fn execute(&mut self) -> VMState {
        self.execute_with(|_, _| Ok(()))
    }

    /// Like [`execute`](Self::execute), running `pre_execute` before each
    /// instruction. An error from it faults the engine before the
    /// instruction has any effect.
    pub fn execute_with<F>(&mut self, mut pre_execute: F) -> VMState
    where
        F: FnMut(&ExecutionEngine, &Instruction) -> VmResult<()>,
    {
        if self.state.is_break() {
            self.set_state(VMState::NONE);
        }
        while !self.state.is_terminal() && !self.state.is_break() {
            self.execute_next(&mut pre_execute);
        }
        self.state
    }

    /// Executes exactly one instruction.
    pub fn step_into(&mut self) -> VMState {
        self.step_into_with(|_, _| Ok(()))
    }

    pub fn step_into_with<F>(&mut self, mut pre_execute: F) -> VMState
    where
        F: FnMut(&ExecutionEngine, &Instruction) -> VmResult<()>,
    {
        if self.state.is_terminal() {
            return self.state;
        }
        self.execute_next(&mut pre_execute);
        self.state
    }

    /// Executes until the current context returns or a call it makes returns.
    pub fn step_over(&mut self) -> VMState {
        self.step_over_with(|_, _| Ok(()))
    }

    pub fn step_over_with<F>(&mut self, mut pre_execute: F) -> VMState
    where
        F: FnMut(&ExecutionEngine, &Instruction) -> VmResult<()>,
    {
        if self.state.is_terminal() {
            return self.state;
        }
        self.set_state(VMState::NONE);
        let depth = self.invocation_stack.len();
        loop {
            self.execute_next(&mut pre_execute);
            if !self.state.is_none() || self.invocation_stack.len() <= depth {
                break;
            }
        }
        self.state
    }

    /// Executes until the current context has returned.
    pub fn step_out(&mut self) -> VMState {
        self.step_out_with(|_, _| Ok(()))
    }

    pub fn step_out_with<F>(&mut self, mut pre_execute: F) -> VMState
    where
        F: FnMut(&ExecutionEngine, &Instruction) -> VmResult<()>,
    {
        if self.state.is_break() {
            self.set_state(VMState::NONE);
        }
        let depth = self.invocation_stack.len();
        while self.state.is_none() && self.invocation_stack.len() >= depth {
            self.execute_next(&mut pre_execute);
        }
        self.state
    }

    fn execute_next<F>(&mut self, pre_execute: &mut F)
    where
        F: FnMut(&ExecutionEngine, &Instruction) -> VmResult<()>,
    {
        let instruction = match self.current_context() {
            None => {
                self.set_state(VMState::HALT);
                return;
            }
            Some(context) => context.current_instruction(),
        };
        let result = instruction.and_then(|instruction| {
            pre_execute(self, &instruction)?;
            self.execute_instruction(&instruction)
        });
        if let Err(error) = result {
            self.on_fault(error);
            return;
        }
        if self.state.is_none() {
            if let Some(context) = self.current_context() {
                if context.breakpoints().contains(&context.instruction_pointer()) {
                    self.set_state(VMState::BREAK);
                }
            }
        }
    }

    /// Dispatches one instruction against the current context. The pointer
    /// advances past it only when the handler succeeds.
    pub fn execute_instruction(&mut self, instruction: &Instruction) -> VmResult<()> {
        log::trace!(
            "[{}] {}",
            self.invocation_stack.len(),
            instruction
        );
        let handler = self
            .jump_table
            .get(instruction.opcode())
            .ok_or(VmError::UnknownOpcode(instruction.opcode() as u8))?;
        self.is_jumping = false;
        handler(self, instruction)?;
        if !self.is_jumping {
            if let Some(context) = self.current_context_mut() {
                context.set_instruction_pointer(instruction.pointer() + instruction.size());
            }
        }
        Ok(())
    }

    /// Adds a breakpoint to the current context.
    pub fn add_breakpoint(&mut self, position: usize) -> VmResult<()> {
        self.context_mut()?.add_breakpoint(position);
        Ok(())
    }

    pub fn remove_breakpoint(&mut self, position: usize) -> VmResult<bool> {
        Ok(self.context_mut()?.remove_breakpoint(position))
    }
}

impl Drop for ExecutionEngine {
    fn drop(&mut self) {
        self.cycle_tracker.break_cycles();
    }
}

impl std::fmt::Debug for ExecutionEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExecutionEngine")
            .field("state", &self.state)
            .field("fault_reason", &self.fault_reason)
            .field("invocation_depth", &self.invocation_stack.len())
            .field("result_stack", &self.result_stack.len())
            .finish()
    }
}
