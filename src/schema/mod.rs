pub mod block;
pub mod prompt;
