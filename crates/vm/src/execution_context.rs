//! Execution context module for the Neo Virtual Machine.

use crate::error::VmResult;
use crate::instruction::Instruction;
use crate::random_access_stack::RandomAccessStack;
use crate::script::Script;
use crate::stack_item::StackItem;
use neo_core::UInt160;
use std::collections::HashSet;
use std::rc::Rc;

/// One frame of the invocation stack: a cursor into a shared script plus
/// the frame's own evaluation and alt stacks.
#[derive(Debug)]
pub struct ExecutionContext {
    script: Rc<Script>,
    /// Number of items returned to the caller on RET; -1 returns everything.
    rvcount: i32,
    instruction_pointer: usize,
    evaluation_stack: RandomAccessStack<StackItem>,
    alt_stack: RandomAccessStack<StackItem>,
    breakpoints: HashSet<usize>,
}

impl ExecutionContext {
    pub fn new(script: Rc<Script>, rvcount: i32) -> Self {
        Self {
            script,
            rvcount,
            instruction_pointer: 0,
            evaluation_stack: RandomAccessStack::new(),
            alt_stack: RandomAccessStack::new(),
            breakpoints: HashSet::new(),
        }
    }

    pub fn script(&self) -> &Rc<Script> {
        &self.script
    }

    pub fn script_hash(&self) -> UInt160 {
        self.script.hash()
    }

    pub fn rvcount(&self) -> i32 {
        self.rvcount
    }

    pub fn instruction_pointer(&self) -> usize {
        self.instruction_pointer
    }

    pub fn set_instruction_pointer(&mut self, ip: usize) {
        self.instruction_pointer = ip;
    }

    /// Instruction at the pointer; past the end this is an implicit RET.
    pub fn current_instruction(&self) -> VmResult<Rc<Instruction>> {
        self.script.get_instruction(self.instruction_pointer)
    }

    pub fn is_at_end(&self) -> bool {
        self.instruction_pointer >= self.script.len()
    }

    pub fn evaluation_stack(&self) -> &RandomAccessStack<StackItem> {
        &self.evaluation_stack
    }

    pub fn evaluation_stack_mut(&mut self) -> &mut RandomAccessStack<StackItem> {
        &mut self.evaluation_stack
    }

    pub fn alt_stack(&self) -> &RandomAccessStack<StackItem> {
        &self.alt_stack
    }

    pub fn alt_stack_mut(&mut self) -> &mut RandomAccessStack<StackItem> {
        &mut self.alt_stack
    }

    pub fn push(&mut self, item: StackItem) {
        self.evaluation_stack.push(item);
    }

    pub fn pop(&mut self) -> VmResult<StackItem> {
        self.evaluation_stack.pop()
    }

    pub fn peek(&self, index: usize) -> VmResult<&StackItem> {
        self.evaluation_stack.peek(index)
    }

    pub fn breakpoints(&self) -> &HashSet<usize> {
        &self.breakpoints
    }

    pub fn add_breakpoint(&mut self, position: usize) {
        self.breakpoints.insert(position);
    }

    pub fn remove_breakpoint(&mut self, position: usize) -> bool {
        self.breakpoints.remove(&position)
    }
}
