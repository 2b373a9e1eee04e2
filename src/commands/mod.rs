pub mod library_commands;
pub mod query_commands;
