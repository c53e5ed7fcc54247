use super::StateReader;
use crate::storage::{StorageContext, StorageItem, StorageKey};
use neo_config::MAX_STORAGE_KEY_SIZE;
use neo_vm::{ExecutionEngine, StackItem, VmResult};
use num_traits::ToPrimitive;

/// `Storage.PutEx` flag marking an entry that can never change again.
const CONSTANT: u8 = 0x01;

/// Only contracts deployed with storage may touch it.
fn check_storage_context(reader: &StateReader, context: &StorageContext) -> bool {
    reader
        .snapshot()
        .contract(&context.script_hash)
        .is_some_and(|contract| contract.has_storage())
}

fn pop_context(engine: &mut ExecutionEngine) -> VmResult<Option<StorageContext>> {
    let item = engine.pop()?;
    Ok(item.as_interface::<StorageContext>().ok().copied())
}

pub(super) fn get_context(_: &StateReader, engine: &mut ExecutionEngine) -> VmResult<bool> {
    let context = StorageContext::new(engine.current_script_hash()?);
    engine.push(StackItem::from_interface(context))?;
    Ok(true)
}

pub(super) fn get_read_only_context(
    _: &StateReader,
    engine: &mut ExecutionEngine,
) -> VmResult<bool> {
    let context = StorageContext::new(engine.current_script_hash()?).as_read_only();
    engine.push(StackItem::from_interface(context))?;
    Ok(true)
}

pub(super) fn as_read_only(_: &StateReader, engine: &mut ExecutionEngine) -> VmResult<bool> {
    let Some(context) = pop_context(engine)? else {
        return Ok(false);
    };
    engine.push(StackItem::from_interface(context.as_read_only()))?;
    Ok(true)
}

/// Missing keys read as an empty byte array.
pub(super) fn get(reader: &StateReader, engine: &mut ExecutionEngine) -> VmResult<bool> {
    let Some(context) = pop_context(engine)? else {
        return Ok(false);
    };
    if !check_storage_context(reader, &context) {
        return Ok(false);
    }
    let key = engine.pop_bytes()?;
    let value = reader
        .snapshot()
        .get_storage(&StorageKey::new(context.script_hash, key.to_vec()))
        .map(|item| item.value)
        .unwrap_or_default();
    engine.push(StackItem::from(value))?;
    Ok(true)
}

fn put_checked(
    reader: &StateReader,
    context: StorageContext,
    key: &[u8],
    value: &[u8],
    constant: bool,
) -> bool {
    if !reader.trigger().is_application() || context.is_read_only {
        return false;
    }
    if !check_storage_context(reader, &context) || key.len() > MAX_STORAGE_KEY_SIZE {
        return false;
    }
    let key = StorageKey::new(context.script_hash, key.to_vec());
    let snapshot = reader.snapshot();
    if snapshot.get_storage(&key).is_some_and(|item| item.is_constant) {
        return false;
    }
    let item = if constant {
        StorageItem::new_constant(value.to_vec())
    } else {
        StorageItem::new(value.to_vec())
    };
    tracing::debug!(key = %key, len = value.len(), "storage put");
    snapshot.put_storage(key, item);
    true
}

pub(super) fn put(reader: &StateReader, engine: &mut ExecutionEngine) -> VmResult<bool> {
    let Some(context) = pop_context(engine)? else {
        return Ok(false);
    };
    let key = engine.pop_bytes()?;
    let value = engine.pop_bytes()?;
    Ok(put_checked(reader, context, &key, &value, false))
}

pub(super) fn put_ex(reader: &StateReader, engine: &mut ExecutionEngine) -> VmResult<bool> {
    let Some(context) = pop_context(engine)? else {
        return Ok(false);
    };
    let key = engine.pop_bytes()?;
    let value = engine.pop_bytes()?;
    let Some(flags) = engine.pop_int()?.to_u8() else {
        return Ok(false);
    };
    Ok(put_checked(reader, context, &key, &value, flags & CONSTANT != 0))
}

pub(super) fn delete(reader: &StateReader, engine: &mut ExecutionEngine) -> VmResult<bool> {
    if !reader.trigger().is_application() {
        return Ok(false);
    }
    let Some(context) = pop_context(engine)? else {
        return Ok(false);
    };
    if context.is_read_only || !check_storage_context(reader, &context) {
        return Ok(false);
    }
    let key = StorageKey::new(context.script_hash, engine.pop_bytes()?.to_vec());
    let snapshot = reader.snapshot();
    if snapshot.get_storage(&key).is_some_and(|item| item.is_constant) {
        return Ok(false);
    }
    snapshot.delete_storage(&key);
    Ok(true)
}
