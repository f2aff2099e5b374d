pub mod script;
pub mod shell;

pub use script::{ShellCommand, parse_line};
pub use shell::{Flow, Shell};
