pub mod console;
pub mod telnet;
