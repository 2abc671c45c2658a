pub mod thumbs_command;
