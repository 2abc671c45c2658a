pub mod classify_command;
