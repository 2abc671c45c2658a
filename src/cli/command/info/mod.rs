pub mod info_command;
