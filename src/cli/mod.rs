pub mod align;
pub mod capture;
pub mod command;
pub mod info;
pub mod output;
pub mod progress;
pub mod unpack;
