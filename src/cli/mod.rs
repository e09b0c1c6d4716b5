pub mod command;
pub mod retry;
pub mod sleep;
pub mod wait;
