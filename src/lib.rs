pub mod config;
pub mod console;
pub mod dictionary;
pub mod engine;
pub mod error;
pub mod game;
pub mod gateway;
pub mod models;
pub mod registry;
pub mod timer;

#[cfg(test)]
pub(crate) mod test_support;
