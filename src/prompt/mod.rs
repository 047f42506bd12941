pub mod composer;
pub mod refiner;

pub use composer::{fallback_prompt, Prompt, PromptComposer, Provenance};
pub use refiner::{select_refiner, NullRefiner, PromptRefiner};
