pub mod callback;
pub mod collection;
pub mod error;
pub mod logger;
pub mod poll;
pub mod retry;
pub mod settings;
pub mod sleep;
pub mod truthy;
