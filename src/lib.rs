pub mod analyze;
pub mod ast;
pub mod enrich;
pub mod error;
pub mod interpret;
pub mod ir;
pub mod migrate;
pub mod parse;
pub mod pipeline;
pub mod validate;
