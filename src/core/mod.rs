pub mod assemble;
pub mod augment;
pub mod corpus;
pub mod enumerate;
pub mod hierarchy;
pub mod permute;
pub mod prompt;
pub mod slicer;
