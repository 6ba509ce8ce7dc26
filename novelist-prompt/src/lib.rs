mod template;

pub use template::{format_bullets, format_entries, PromptTemplate, EMPTY_SENTINEL};
