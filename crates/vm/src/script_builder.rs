//! Script builder module for the Neo Virtual Machine.
//!
//! Builds scripts programmatically, always choosing the shortest push form.

use crate::error::{VmError, VmResult};
use crate::op_code::OpCode;
use crate::script::Script;
use neo_config::MAX_SYSCALL_NAME_LENGTH;
use neo_core::UInt160;
use num_bigint::BigInt;

/// Helps construct VM scripts programmatically.
#[derive(Debug, Default, Clone)]
pub struct ScriptBuilder {
    script: Vec<u8>,
}

impl ScriptBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.script.len()
    }

    pub fn is_empty(&self) -> bool {
        self.script.is_empty()
    }

    /// Emits an opcode followed by its raw operand.
    pub fn emit(&mut self, op: OpCode, operand: &[u8]) -> &mut Self {
        self.script.push(op as u8);
        self.script.extend_from_slice(operand);
        self
    }

    pub fn emit_opcode(&mut self, op: OpCode) -> &mut Self {
        self.emit(op, &[])
    }

    /// Emits raw bytes to the script.
    pub fn emit_raw(&mut self, bytes: &[u8]) -> &mut Self {
        self.script.extend_from_slice(bytes);
        self
    }

    /// Pushes `data` with PUSHBYTES for up to 75 bytes, otherwise PUSHDATA1/2/4.
    pub fn emit_push_bytes(&mut self, data: &[u8]) -> &mut Self {
        let len = data.len();
        if len <= OpCode::PUSHBYTES75 as usize {
            self.script.push(len as u8);
        } else if len <= u8::MAX as usize {
            self.script.push(OpCode::PUSHDATA1 as u8);
            self.script.push(len as u8);
        } else if len <= u16::MAX as usize {
            self.script.push(OpCode::PUSHDATA2 as u8);
            self.script.extend_from_slice(&(len as u16).to_le_bytes());
        } else {
            self.script.push(OpCode::PUSHDATA4 as u8);
            self.script.extend_from_slice(&(len as u32).to_le_bytes());
        }
        self.script.extend_from_slice(data);
        self
    }

    /// Pushes an integer with PUSHM1/PUSH0..PUSH16 when possible.
    pub fn emit_push_int(&mut self, value: impl Into<BigInt>) -> &mut Self {
        let value = value.into();
        if value == BigInt::from(-1) {
            return self.emit_opcode(OpCode::PUSHM1);
        }
        if value == BigInt::from(0) {
            return self.emit_opcode(OpCode::PUSH0);
        }
        if value > BigInt::from(0) && value <= BigInt::from(16) {
            let offset = value.to_signed_bytes_le()[0];
            self.script.push(OpCode::PUSH1 as u8 - 1 + offset);
            return self;
        }
        self.emit_push_bytes(&value.to_signed_bytes_le())
    }

    pub fn emit_push_bool(&mut self, value: bool) -> &mut Self {
        self.emit_opcode(if value { OpCode::PUSHT } else { OpCode::PUSHF })
    }

    pub fn emit_push_string(&mut self, value: &str) -> &mut Self {
        self.emit_push_bytes(value.as_bytes())
    }

    /// Emits a jump or CALL with a relative offset from the instruction start.
    pub fn emit_jump(&mut self, op: OpCode, offset: i16) -> VmResult<&mut Self> {
        if !matches!(
            op,
            OpCode::JMP | OpCode::JMPIF | OpCode::JMPIFNOT | OpCode::CALL
        ) {
            return Err(VmError::invalid_operation_msg(format!(
                "{op} is not a jump"
            )));
        }
        Ok(self.emit(op, &offset.to_le_bytes()))
    }

    /// Emits APPCALL or TAILCALL. A zero hash makes the call dynamic.
    pub fn emit_app_call(&mut self, script_hash: &UInt160, tail_call: bool) -> &mut Self {
        let op = if tail_call {
            OpCode::TAILCALL
        } else {
            OpCode::APPCALL
        };
        self.emit(op, script_hash.as_bytes())
    }

    pub fn emit_syscall(&mut self, api: &str) -> VmResult<&mut Self> {
        if api.is_empty() || api.len() > MAX_SYSCALL_NAME_LENGTH || !api.is_ascii() {
            return Err(VmError::invalid_operation_msg(format!(
                "invalid syscall name {api:?}"
            )));
        }
        self.script.push(OpCode::SYSCALL as u8);
        self.script.push(api.len() as u8);
        self.script.extend_from_slice(api.as_bytes());
        Ok(self)
    }

    pub fn to_script(&self) -> Script {
        Script::new(self.script.clone())
    }

    pub fn to_array(&self) -> Vec<u8> {
        self.script.clone()
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.script
    }
}
