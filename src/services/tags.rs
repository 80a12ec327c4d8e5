use std::collections::HashSet;

use crate::models::{DraftIdea, Tag};

/// Human-readable name for a tag key: `"ai_tools"` becomes `"Ai Tools"`.
/// Only the first character of each segment is touched.
pub fn tag_key_to_name(key: &str) -> String {
    key.split('_')
        .map(|segment| {
            let mut chars = segment.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

/// Tags referenced by `ideas` that are neither known nor already collected,
/// in first-seen order.
pub fn reconcile<'a, I>(known_keys: &HashSet<String>, ideas: I) -> Vec<Tag>
where
    I: IntoIterator<Item = &'a DraftIdea>,
{
    let mut seen: HashSet<&str> = HashSet::new();
    let mut new_tags = Vec::new();

    for idea in ideas {
        for key in &idea.tags {
            if known_keys.contains(key) || !seen.insert(key.as_str()) {
                continue;
            }
            new_tags.push(Tag::new(key.clone(), tag_key_to_name(key)));
        }
    }

    new_tags
}
