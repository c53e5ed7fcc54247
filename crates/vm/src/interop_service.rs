//! Interop service: the registry behind SYSCALL.
//!
//! Handlers are looked up by ASCII name. A handler returning `Ok(false)` is a
//! failed call and faults the VM just like an `Err`.

use crate::error::{VmError, VmResult};
use crate::execution_engine::ExecutionEngine;
use crate::stack_item::StackItem;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

/// A host function callable through SYSCALL.
pub type InteropMethod = Rc<dyn Fn(&mut ExecutionEngine) -> VmResult<bool>>;

/// Computes a price from the engine state just before the call runs.
pub type PriceCalculator = fn(&ExecutionEngine) -> VmResult<i64>;

/// How a syscall is charged, in gas units before the gas ratio is applied.
#[derive(Clone, Copy)]
pub enum InteropPrice {
    Fixed(i64),
    Dynamic(PriceCalculator),
}

impl fmt::Debug for InteropPrice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InteropPrice::Fixed(price) => write!(f, "Fixed({price})"),
            InteropPrice::Dynamic(_) => f.write_str("Dynamic"),
        }
    }
}

/// Represents an interop descriptor.
pub struct InteropDescriptor {
    /// Canonical name; aliases point at the same descriptor.
    pub name: String,
    pub handler: InteropMethod,
    pub price: InteropPrice,
}

impl fmt::Debug for InteropDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InteropDescriptor")
            .field("name", &self.name)
            .field("price", &self.price)
            .finish()
    }
}

/// Provides interoperability between the Neo VM and external services.
#[derive(Debug, Clone, Default)]
pub struct InteropService {
    methods: HashMap<String, Rc<InteropDescriptor>>,
}

impl InteropService {
    /// Creates a service with the `System.ExecutionEngine.*` calls registered.
    pub fn new() -> Self {
        let mut service = Self::empty();
        service.register_standard_methods();
        service
    }

    /// Creates a service with nothing registered.
    pub fn empty() -> Self {
        Self::default()
    }

    fn register_standard_methods(&mut self) {
        self.register(
            "System.ExecutionEngine.GetScriptContainer",
            1,
            get_script_container,
        );
        self.register(
            "System.ExecutionEngine.GetExecutingScriptHash",
            1,
            get_executing_script_hash,
        );
        self.register(
            "System.ExecutionEngine.GetCallingScriptHash",
            1,
            get_calling_script_hash,
        );
        self.register(
            "System.ExecutionEngine.GetEntryScriptHash",
            1,
            get_entry_script_hash,
        );
    }

    /// Registers a handler with a fixed price, replacing any previous entry.
    pub fn register<F>(&mut self, name: &str, price: i64, handler: F)
    where
        F: Fn(&mut ExecutionEngine) -> VmResult<bool> + 'static,
    {
        self.register_descriptor(InteropDescriptor {
            name: name.to_string(),
            handler: Rc::new(handler),
            price: InteropPrice::Fixed(price),
        });
    }

    /// Registers a handler whose price depends on its arguments.
    pub fn register_dynamic<F>(&mut self, name: &str, price: PriceCalculator, handler: F)
    where
        F: Fn(&mut ExecutionEngine) -> VmResult<bool> + 'static,
    {
        self.register_descriptor(InteropDescriptor {
            name: name.to_string(),
            handler: Rc::new(handler),
            price: InteropPrice::Dynamic(price),
        });
    }

    pub fn register_descriptor(&mut self, descriptor: InteropDescriptor) {
        self.methods
            .insert(descriptor.name.clone(), Rc::new(descriptor));
    }

    /// Makes `alias` resolve to the descriptor registered as `name`.
    /// Returns false when `name` is unknown.
    pub fn register_alias(&mut self, alias: &str, name: &str) -> bool {
        match self.methods.get(name).cloned() {
            Some(descriptor) => {
                self.methods.insert(alias.to_string(), descriptor);
                true
            }
            None => false,
        }
    }

    pub fn get(&self, name: &str) -> Option<&Rc<InteropDescriptor>> {
        self.methods.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.methods.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.methods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.methods.is_empty()
    }

    /// Registered names, aliases included.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.methods.keys().map(String::as_str)
    }

    /// Price of a call in gas units; unknown names are not priced.
    pub fn get_price(&self, name: &str, engine: &ExecutionEngine) -> VmResult<Option<i64>> {
        match self.methods.get(name) {
            Some(descriptor) => match descriptor.price {
                InteropPrice::Fixed(price) => Ok(Some(price)),
                InteropPrice::Dynamic(calculate) => calculate(engine).map(Some),
            },
            None => Ok(None),
        }
    }

    /// Runs the handler registered for `name`.
    pub fn invoke(&self, name: &str, engine: &mut ExecutionEngine) -> VmResult<()> {
        let descriptor = self
            .methods
            .get(name)
            .cloned()
            .ok_or_else(|| VmError::UnknownSyscall(name.to_string()))?;
        log::trace!("syscall {}", descriptor.name);
        if (descriptor.handler)(engine)? {
            Ok(())
        } else {
            Err(VmError::InteropFailed(name.to_string()))
        }
    }
}

fn get_script_container(engine: &mut ExecutionEngine) -> VmResult<bool> {
    let container = match engine.script_container() {
        Some(container) => Rc::clone(container).as_interop(),
        None => return Ok(false),
    };
    engine.push(StackItem::InteropInterface(container))?;
    Ok(true)
}

fn get_executing_script_hash(engine: &mut ExecutionEngine) -> VmResult<bool> {
    let hash = engine.current_script_hash()?;
    engine.push(StackItem::from(hash.to_vec()))?;
    Ok(true)
}

fn get_calling_script_hash(engine: &mut ExecutionEngine) -> VmResult<bool> {
    let hash = engine
        .calling_context()
        .map(|context| context.script_hash().to_vec())
        .unwrap_or_default();
    engine.push(StackItem::from(hash))?;
    Ok(true)
}

fn get_entry_script_hash(engine: &mut ExecutionEngine) -> VmResult<bool> {
    let hash = engine
        .entry_context()
        .ok_or_else(|| VmError::invalid_operation_msg("no entry context"))?
        .script_hash();
    engine.push(StackItem::from(hash.to_vec()))?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aliases_share_the_descriptor() {
        let mut service = InteropService::empty();
        service.register("Neo.Runtime.GetTrigger", 1, |_| Ok(true));
        assert!(service.register_alias("AntShares.Runtime.GetTrigger", "Neo.Runtime.GetTrigger"));
        assert!(!service.register_alias("X", "Missing"));
        let a = service.get("Neo.Runtime.GetTrigger").unwrap();
        let b = service.get("AntShares.Runtime.GetTrigger").unwrap();
        assert!(Rc::ptr_eq(a, b));
    }

    #[test]
    fn standard_methods_are_registered() {
        let service = InteropService::new();
        assert_eq!(service.len(), 4);
        assert!(service.contains("System.ExecutionEngine.GetEntryScriptHash"));
        let engine = ExecutionEngine::new();
        assert_eq!(
            service.get_price("System.ExecutionEngine.GetScriptContainer", &engine),
            Ok(Some(1))
        );
        assert_eq!(service.get_price("Nope", &engine), Ok(None));
    }

    #[test]
    fn unknown_and_failing_calls_are_errors() {
        let mut service = InteropService::empty();
        service.register("Test.Fail", 1, |_| Ok(false));
        let mut engine = ExecutionEngine::new();
        assert_eq!(
            service.invoke("Test.Missing", &mut engine),
            Err(VmError::UnknownSyscall("Test.Missing".to_string()))
        );
        assert_eq!(
            service.invoke("Test.Fail", &mut engine),
            Err(VmError::InteropFailed("Test.Fail".to_string()))
        );
    }
}
