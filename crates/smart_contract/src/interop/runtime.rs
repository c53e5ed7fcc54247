use super::{to_uint160, LogEventArgs, NotifyEventArgs, StateReader};
use neo_config::SECONDS_PER_BLOCK;
use neo_core::UInt160;
use neo_cryptography::{decode_point, hash160};
use neo_vm::{deserialize, serialize, DeserializeLimits, ExecutionEngine, StackItem, VmResult};

pub(super) fn platform(engine: &mut ExecutionEngine) -> VmResult<bool> {
    engine.push(StackItem::from("NEO"))?;
    Ok(true)
}

pub(super) fn get_trigger(reader: &StateReader, engine: &mut ExecutionEngine) -> VmResult<bool> {
    engine.push(StackItem::from(reader.trigger() as u32))?;
    Ok(true)
}

/// A 33-byte argument is a compressed public key and stands for its
/// single-signature verification script. Points off the curve fail.
pub(super) fn check_witness(_: &StateReader, engine: &mut ExecutionEngine) -> VmResult<bool> {
    let argument = engine.pop_bytes()?;
    let hash = match argument.len() {
        20 => to_uint160(&argument),
        33 => decode_point(&argument).ok().map(|point| {
            let mut script = Vec::with_capacity(35);
            script.push(0x21);
            script.extend_from_slice(&point);
            script.push(0xAC);
            UInt160::from(hash160(&script))
        }),
        _ => None,
    };
    let Some(hash) = hash else {
        return Ok(false);
    };
    let Some(container) = engine.script_container() else {
        return Ok(false);
    };
    let witnessed = container.script_hashes_for_verifying().contains(&hash);
    engine.push(StackItem::from(witnessed))?;
    Ok(true)
}

pub(super) fn notify(reader: &StateReader, engine: &mut ExecutionEngine) -> VmResult<bool> {
    let state = engine.pop()?;
    let script_hash = engine.current_script_hash()?;
    tracing::info!(contract = %script_hash, state = ?state, "notify");
    reader.push_notification(NotifyEventArgs { script_hash, state });
    Ok(true)
}

pub(super) fn log(reader: &StateReader, engine: &mut ExecutionEngine) -> VmResult<bool> {
    let message = String::from_utf8_lossy(&engine.pop_bytes()?).into_owned();
    let script_hash = engine.current_script_hash()?;
    tracing::info!(contract = %script_hash, "{message}");
    reader.push_log(LogEventArgs {
        script_hash,
        message,
    });
    Ok(true)
}

/// The persisting block's timestamp, or one block interval past the
/// latest header.
pub(super) fn get_time(reader: &StateReader, engine: &mut ExecutionEngine) -> VmResult<bool> {
    let time = match reader.persisting_block() {
        Some(block) => u64::from(block.header.timestamp),
        None => {
            let snapshot = reader.snapshot();
            let header = snapshot
                .block_hash(snapshot.height())
                .and_then(|hash| snapshot.header(&hash));
            match header {
                Some(header) => u64::from(header.timestamp) + SECONDS_PER_BLOCK,
                None => return Ok(false),
            }
        }
    };
    engine.push(StackItem::from(time))?;
    Ok(true)
}

pub(super) fn serialize_item(_: &StateReader, engine: &mut ExecutionEngine) -> VmResult<bool> {
    let item = engine.pop()?;
    let Ok(data) = serialize(&item) else {
        return Ok(false);
    };
    if data.len() > engine.limits().max_item_size {
        return Ok(false);
    }
    engine.push(StackItem::from(data))?;
    Ok(true)
}

pub(super) fn deserialize_item(_: &StateReader, engine: &mut ExecutionEngine) -> VmResult<bool> {
    let data = engine.pop_bytes()?;
    let limits = engine.limits();
    let limits = DeserializeLimits {
        max_array_size: limits.max_array_size,
        max_item_size: limits.max_item_size,
    };
    let Ok(item) = deserialize(&data, &limits) else {
        return Ok(false);
    };
    engine.push(item)?;
    Ok(true)
}
