pub mod metadata;
pub mod parser;
pub mod payload;
pub mod pipeline;
pub mod validation;
