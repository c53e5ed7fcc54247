//! The `neovm` command-line tool: runs hex scripts under the resource
//! governor and disassembles them.

pub mod args;
pub mod commands;
