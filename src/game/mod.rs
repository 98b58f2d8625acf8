// Pure round rules, free of locking and I/O

pub mod rng;
pub mod scorer;
pub mod validator;

pub use rng::{RandomSource, StdRandom};
pub use scorer::Scorer;
pub use validator::WordValidator;
