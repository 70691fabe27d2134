//! Region content sources.

use std::collections::HashMap;
use std::future::Future;

use async_trait::async_trait;

use crate::error::ContentError;

/// Greeting used for any region without its own entry.
pub const FALLBACK_GREETING: &str = "Hello from somewhere in the world!";

/// Supplies the text shown for a region code.
///
/// Implementations must answer every code, falling back to generic text for
/// codes they don't know; an `Err` means the source itself failed.
#[async_trait]
pub trait ContentSource: Send + Sync {
    async fn fetch(&self, region: &str) -> Result<String, ContentError>;
}

/// Static region -> greeting table.
#[derive(Debug, Clone)]
pub struct GreetingTable {
    entries: HashMap<String, String>,
}

impl Default for GreetingTable {
    fn default() -> Self {
        let entries = [
            ("US", "Hello from the United States!"),
            ("CA", "Bonjour du Canada!"),
            ("UK", "Greetings from the United Kingdom!"),
        ]
        .into_iter()
        .map(|(code, text)| (code.to_string(), text.to_string()))
        .collect();

        Self { entries }
    }
}

impl GreetingTable {
    /// Built-in greetings with `overrides` layered on top. Blank codes are skipped.
    pub fn with_overrides<I>(overrides: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut table = Self::default();
        for (code, text) in overrides {
            let code = code.trim();
            if code.is_empty() {
                continue;
            }
            table.entries.insert(code.to_string(), text);
        }
        table
    }

    /// Exact, case-sensitive lookup
    pub fn lookup(&self, region: &str) -> &str {
        self.entries
            .get(region)
            .map(String::as_str)
            .unwrap_or(FALLBACK_GREETING)
    }
}

#[async_trait]
impl ContentSource for GreetingTable {
    async fn fetch(&self, region: &str) -> Result<String, ContentError> {
        Ok(self.lookup(region).to_string())
    }
}

/// Adapter turning an async closure into a `ContentSource`.
pub struct ContentFn<F> {
    f: F,
}

/// Wrap `f` as a `ContentSource`.
pub fn content_fn<F, Fut>(f: F) -> ContentFn<F>
where
    F: Fn(String) -> Fut + Send + Sync,
    Fut: Future<Output = Result<String, ContentError>> + Send,
{
    ContentFn { f }
}

#[async_trait]
impl<F, Fut> ContentSource for ContentFn<F>
where
    F: Fn(String) -> Fut + Send + Sync,
    Fut: Future<Output = Result<String, ContentError>> + Send,
{
    async fn fetch(&self, region: &str) -> Result<String, ContentError> {
        (self.f)(region.to_string()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_greetings() {
        let table = GreetingTable::default();
        assert_eq!(table.lookup("US"), "Hello from the United States!");
        assert_eq!(table.lookup("CA"), "Bonjour du Canada!");
        assert_eq!(table.lookup("UK"), "Greetings from the United Kingdom!");
        assert_eq!(table.lookup("XX"), "Hello from somewhere in the world!");
    }

    #[test]
    fn test_lookup_is_case_sensitive() {
        let table = GreetingTable::default();
        assert_eq!(table.lookup("us"), FALLBACK_GREETING);
        assert_eq!(table.lookup(""), FALLBACK_GREETING);
    }

    #[test]
    fn test_overrides_extend_and_replace() {
        let table = GreetingTable::with_overrides([
            ("FR".to_string(), "Bonjour de France !".to_string()),
            ("US".to_string(), "Howdy!".to_string()),
            (" ".to_string(), "ignored".to_string()),
        ]);
        assert_eq!(table.lookup("FR"), "Bonjour de France !");
        assert_eq!(table.lookup("US"), "Howdy!");
        assert_eq!(table.lookup("CA"), "Bonjour du Canada!");
        assert_eq!(table.lookup(" "), FALLBACK_GREETING);
    }

    #[tokio::test]
    async fn test_table_as_content_source() {
        let source: &dyn ContentSource = &GreetingTable::default();
        assert_eq!(source.fetch("CA").await.unwrap(), "Bonjour du Canada!");
        assert_eq!(source.fetch("FR").await.unwrap(), FALLBACK_GREETING);
    }

    #[tokio::test]
    async fn test_content_fn_adapter() {
        let source = content_fn(|region: String| async move {
            if region == "XX" {
                Err(ContentError::unavailable("no content for XX"))
            } else {
                Ok(format!("content for {}", region))
            }
        });
        assert_eq!(source.fetch("DE").await.unwrap(), "content for DE");
        assert!(source.fetch("XX").await.is_err());
    }
}
