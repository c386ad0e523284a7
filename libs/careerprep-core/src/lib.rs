pub mod analyzer;
pub mod audio;
pub mod cover_letter;
pub mod engine;
pub mod evaluator;
pub mod hints;
pub mod interview;
pub mod llm;
pub mod tutor;

pub use analyzer::analyze;
pub use engine::ProcessEngine;
pub use tutor::{run, run_test, tutor};
