use crate::args::RunArgs;
use anyhow::{Context, Result};
use neo_config::VmSettings;
use neo_smart_contract::{ApplicationEngine, MemorySnapshot};
use neo_vm::{StackItem, VMState};
use serde::Serialize;
use serde_json::{json, Value};
use std::rc::Rc;
use tracing::info;

/// Outcome of one `run` invocation, printed as JSON.
#[derive(Debug, Serialize)]
pub struct RunReport {
    pub state: String,
    pub gas_consumed: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fault: Option<String>,
    pub out_of_gas: bool,
    /// Result stack, top first.
    pub stack: Vec<Value>,
}

pub fn run(args: &RunArgs) -> Result<RunReport> {
    let settings = match &args.config {
        Some(path) => VmSettings::load(path)
            .with_context(|| format!("failed to load settings from {}", path.display()))?,
        None => VmSettings::default(),
    };
    let script = super::decode_hex(&args.script)?;

    let mut engine = ApplicationEngine::with_settings(
        args.trigger.into(),
        None,
        Rc::new(MemorySnapshot::new()),
        args.gas,
        args.test_mode,
        &settings,
    )?;
    engine.load_script(script).context("failed to load script")?;
    let state = engine.execute();
    info!(
        target: "neovm",
        %state,
        gas = engine.gas_consumed(),
        "execution finished"
    );

    Ok(RunReport {
        state: state.to_string(),
        gas_consumed: engine.gas_consumed(),
        fault: engine.fault_reason().map(ToString::to_string),
        out_of_gas: state == VMState::FAULT
            && engine.fault_reason().map_or(false, |reason| reason.is_out_of_gas()),
        stack: engine.result_stack().iter().rev().map(stack_item_to_json).collect(),
    })
}

/// Items rendered per result before the output is cut short.
pub const MAX_RENDERED_ITEMS: usize = 16 * 1024;

/// Renders an item the way RPC nodes report invocation results. A
/// collection that contains itself is cut off at the repeated reference,
/// and output stops after [`MAX_RENDERED_ITEMS`] items so that heavily
/// shared collections stay small.
pub fn stack_item_to_json(item: &StackItem) -> Value {
    Renderer {
        ancestors: Vec::new(),
        budget: MAX_RENDERED_ITEMS,
    }
    .render(item)
}

struct Renderer {
    ancestors: Vec<usize>,
    budget: usize,
}

impl Renderer {
    fn render(&mut self, item: &StackItem) -> Value {
        if self.budget == 0 {
            return json!({ "type": item.stack_item_type().to_string(), "value": "<truncated>" });
        }
        self.budget -= 1;
        let (kind, items, pointer) = match item {
            StackItem::Boolean(value) => return json!({ "type": "Boolean", "value": value }),
            StackItem::Integer(value) => {
                return json!({ "type": "Integer", "value": value.to_string() })
            }
            StackItem::ByteArray(bytes) => {
                return json!({ "type": "ByteArray", "value": hex::encode(bytes) })
            }
            StackItem::InteropInterface(interface) => {
                return json!({ "type": "InteropInterface", "value": interface.interface_type() })
            }
            StackItem::Array(list) => ("Array", list.borrow().to_vec(), Rc::as_ptr(list) as usize),
            StackItem::Struct(list) => ("Struct", list.borrow().to_vec(), Rc::as_ptr(list) as usize),
            StackItem::Map(map) => {
                let pointer = Rc::as_ptr(map) as usize;
                if self.ancestors.contains(&pointer) {
                    return json!({ "type": "Map", "value": "<cycle>" });
                }
                let entries: Vec<(StackItem, StackItem)> = map
                    .borrow()
                    .iter()
                    .map(|(key, value)| (key.clone(), value.clone()))
                    .collect();
                self.ancestors.push(pointer);
                let entries: Vec<Value> = entries
                    .iter()
                    .map(|(key, value)| json!({ "key": self.render(key), "value": self.render(value) }))
                    .collect();
                self.ancestors.pop();
                return json!({ "type": "Map", "value": entries });
            }
        };
        if self.ancestors.contains(&pointer) {
            return json!({ "type": kind, "value": "<cycle>" });
        }
        self.ancestors.push(pointer);
        let value: Vec<Value> = items.iter().map(|item| self.render(item)).collect();
        self.ancestors.pop();
        json!({ "type": kind, "value": value })
    }
}
