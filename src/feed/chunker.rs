//! Rough token budgeting for prompt excerpts.
//!
//! Counts follow the usual BPE rule of thumb of about four characters per
//! token, which is close enough for keeping prompts inside the model window.

const CHARS_PER_TOKEN: usize = 4;

pub fn estimate_tokens(word: &str) -> usize {
    word.chars().count().div_ceil(CHARS_PER_TOKEN).max(1)
}

/// Leading excerpt of `text` holding at most about `budget` tokens.
/// Whitespace runs collapse to single spaces.
pub fn first_chunk(text: &str, budget: usize) -> String {
    let mut chunk: Vec<&str> = Vec::new();
    let mut used: usize = 0;

    for word in text.split_whitespace() {
        let cost = estimate_tokens(word);
        if used.saturating_add(cost) > budget {
            if chunk.is_empty() && budget > 0 {
                // a single oversized word still yields a truncated excerpt
                return word.chars().take(budget.saturating_mul(CHARS_PER_TOKEN)).collect();
            }
            break;
        }
        used += cost;
        chunk.push(word);
    }

    chunk.join(" ")
}
