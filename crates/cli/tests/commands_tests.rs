use neo_vm_cli::args::{RunArgs, Trigger};
use neo_vm::StackItem;
use neo_vm_cli::commands::{decode_hex, disasm, run, stack_item_to_json, MAX_RENDERED_ITEMS};
use serde_json::{json, Value};
use std::io::Write;

fn run_args(script: &str) -> RunArgs {
    RunArgs {
        script: script.to_string(),
        gas: 0,
        test_mode: false,
        trigger: Trigger::Application,
        config: None,
    }
}

#[test]
fn run_reports_the_result_stack_top_first() {
    // PUSH2 PUSH3 ADD PUSH1
    let report = run(&run_args("52539351")).unwrap();
    assert_eq!(report.state, "HALT");
    assert_eq!(report.gas_consumed, 100_000);
    assert!(report.fault.is_none());
    assert_eq!(
        serde_json::to_value(&report.stack).unwrap(),
        json!([
            { "type": "Integer", "value": "1" },
            { "type": "Integer", "value": "5" },
        ])
    );
}

#[test]
fn run_reports_faults() {
    // PUSH1 THROW
    let report = run(&run_args("0x51f0")).unwrap();
    assert_eq!(report.state, "FAULT");
    assert_eq!(report.fault.as_deref(), Some("THROW executed"));
    assert!(!report.out_of_gas);
    assert!(report.stack.is_empty());
}

#[test]
fn run_reads_limits_from_config() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "[limits]\nmax_stack_size = 2").unwrap();
    let mut args = run_args("515151");
    args.config = Some(file.path().to_path_buf());
    let report = run(&args).unwrap();
    assert_eq!(report.state, "FAULT");
    assert_eq!(report.fault.as_deref(), Some("stack size limit exceeded"));
}

#[test]
fn run_rejects_bad_input() {
    assert!(run(&run_args("zz")).is_err());
    let mut args = run_args("51");
    args.config = Some("/nonexistent/neovm.toml".into());
    assert!(run(&args).is_err());
}

#[test]
fn cyclic_results_render() {
    // PUSH0 NEWARRAY DUP DUP APPEND
    let report = run(&run_args("00c57676c8")).unwrap();
    assert_eq!(report.state, "HALT", "{:?}", report.fault);
    assert_eq!(
        serde_json::to_value(&report.stack).unwrap(),
        json!([{ "type": "Array", "value": [{ "type": "Array", "value": "<cycle>" }] }])
    );
}

fn count_nodes(value: &Value) -> usize {
    match &value["value"] {
        Value::Array(children) => {
            1 + children
                .iter()
                .map(|child| match child.get("key") {
                    Some(key) => count_nodes(key) + count_nodes(&child["value"]),
                    None => count_nodes(child),
                })
                .sum::<usize>()
        }
        _ => 1,
    }
}

#[test]
fn shared_collections_render_within_budget() {
    let mut item = StackItem::from(1);
    for _ in 0..64 {
        item = StackItem::new_array(vec![item.clone(), item]);
    }
    let rendered = stack_item_to_json(&item);
    assert!(count_nodes(&rendered) <= 2 * MAX_RENDERED_ITEMS + 1);
    assert!(rendered.to_string().contains("<truncated>"));

    let small = StackItem::new_array(vec![StackItem::from(true), StackItem::from(vec![0xabu8])]);
    assert_eq!(
        stack_item_to_json(&small),
        json!({ "type": "Array", "value": [
            { "type": "Boolean", "value": true },
            { "type": "ByteArray", "value": "ab" },
        ] })
    );
}

#[test]
fn disasm_lists_syscalls() {
    let lines = disasm("68044e656f2e").unwrap();
    assert_eq!(lines, vec!["0000 SYSCALL Neo.".to_string()]);
    assert_eq!(decode_hex(" 0xABcd ").unwrap(), vec![0xab, 0xcd]);
}
