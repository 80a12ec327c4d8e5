mod idea;
mod inspiration;
mod source;
mod tag;

pub use idea::{DraftIdea, GeneratedIdea, Idea};
pub use inspiration::Inspiration;
pub use source::Source;
pub use tag::Tag;
