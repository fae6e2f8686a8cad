mod gemini;
mod provider;

pub use gemini::{GeminiConfig, GeminiProvider};
pub use provider::EmbeddingProvider;

#[cfg(test)]
pub use provider::MockEmbeddingProvider;

/// Text embedded for an item: its name and description on separate lines
pub fn embedding_text(name: &str, description: &str) -> String {
    format!("{}\n{}", name, description)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embedding_text_joins_name_and_description() {
        assert_eq!(embedding_text("Desk lamp", "Warm light"), "Desk lamp\nWarm light");
        assert_eq!(embedding_text("Desk lamp", ""), "Desk lamp\n");
    }
}
