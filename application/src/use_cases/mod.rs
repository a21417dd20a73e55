//! Use cases (application services)

pub mod locate_parent;
pub mod prepare_command;
pub mod register_tool;
pub mod tool_lifecycle;

#[cfg(test)]
pub(crate) mod testing;
