pub mod safe_name_command;
