mod generator;

pub use generator::{IdeaGenerator, OpenAiIdeaGenerator};
