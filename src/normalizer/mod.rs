use html_escape::decode_html_entities;
use serde_json::Value;
use url::Url;

use crate::app::{Result, StoryreelError};
use crate::domain::Story;

/// Turns an upstream JSON document into a story collection.
///
/// The document must carry a `memes` array. Within each record only the
/// media `url` is mandatory; every other field falls back to a default.
#[derive(Clone, Default)]
pub struct Normalizer;

impl Normalizer {
    pub fn new() -> Self {
        Self
    }

    pub fn normalize(&self, body: &[u8]) -> Result<Vec<Story>> {
        let document: Value = serde_json::from_slice(body)?;

        let records = document
            .get("memes")
            .and_then(Value::as_array)
            .ok_or_else(|| StoryreelError::Normalize("missing `memes` array".into()))?;

        records
            .iter()
            .enumerate()
            .map(|(index, record)| Self::normalize_record(index, record))
            .collect()
    }

    fn normalize_record(index: usize, record: &Value) -> Result<Story> {
        let url = record
            .get("url")
            .and_then(Value::as_str)
            .ok_or_else(|| StoryreelError::Normalize(format!("record {} has no media url", index)))?;

        // Relative or garbage references cannot be loaded later.
        Url::parse(url)?;

        let author = record
            .get("author")
            .and_then(Value::as_str)
            .map(String::from);

        let ups = record
            .get("ups")
            .and_then(|v| v.as_i64().or_else(|| v.as_f64().map(|f| f as i64)))
            .unwrap_or(0);

        let mut story = Story::single(url, author, ups);
        story.title = record
            .get("title")
            .and_then(Value::as_str)
            .map(|t| decode_html_entities(t).to_string());
        story.link = record
            .get("postLink")
            .and_then(Value::as_str)
            .map(String::from);

        Ok(story)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::UNKNOWN_AUTHOR;

    const SAMPLE: &str = r#"{
  "count": 3,
  "memes": [
    {
      "postLink": "https://redd.it/abc",
      "subreddit": "memes",
      "title": "Tom &amp; Jerry",
      "url": "https://i.redd.it/one.png",
      "author": "alice",
      "ups": 120
    },
    {
      "title": "no author",
      "url": "https://i.redd.it/two.jpg",
      "ups": 7
    },
    {
      "url": "https://i.redd.it/three.gif",
      "author": null,
      "ups": "lots"
    }
  ]
}"#;

    #[test]
    fn test_normalize_sample() {
        let stories = Normalizer::new().normalize(SAMPLE.as_bytes()).unwrap();

        assert_eq!(stories.len(), 3);
        assert_eq!(stories[0].author, "alice");
        assert_eq!(stories[0].ups, 120);
        assert_eq!(stories[0].preview, vec!["https://i.redd.it/one.png".to_string()]);
        assert_eq!(stories[0].title.as_deref(), Some("Tom & Jerry"));
        assert_eq!(stories[0].link.as_deref(), Some("https://redd.it/abc"));
    }

    #[test]
    fn test_missing_fields_default() {
        let stories = Normalizer::new().normalize(SAMPLE.as_bytes()).unwrap();

        assert_eq!(stories[1].author, UNKNOWN_AUTHOR);
        assert_eq!(stories[2].author, UNKNOWN_AUTHOR);
        assert_eq!(stories[2].ups, 0);
        assert!(stories[2].title.is_none());
    }

    #[test]
    fn test_order_preserved() {
        let stories = Normalizer::new().normalize(SAMPLE.as_bytes()).unwrap();
        let urls: Vec<_> = stories.iter().map(|s| s.url.as_str()).collect();
        assert_eq!(
            urls,
            vec![
                "https://i.redd.it/one.png",
                "https://i.redd.it/two.jpg",
                "https://i.redd.it/three.gif"
            ]
        );
    }

    #[test]
    fn test_missing_url_fails_batch() {
        let body = r#"{"memes": [{"url": "https://i.redd.it/ok.png"}, {"author": "bob"}]}"#;
        let result = Normalizer::new().normalize(body.as_bytes());
        assert!(matches!(result, Err(StoryreelError::Normalize(_))));
    }

    #[test]
    fn test_relative_url_fails_batch() {
        let body = r#"{"memes": [{"url": "/images/a.png"}]}"#;
        let result = Normalizer::new().normalize(body.as_bytes());
        assert!(matches!(result, Err(StoryreelError::InvalidUrl(_))));
    }

    #[test]
    fn test_missing_memes_array() {
        let result = Normalizer::new().normalize(br#"{"message": "rate limited"}"#);
        assert!(matches!(result, Err(StoryreelError::Normalize(_))));
    }

    #[test]
    fn test_not_json() {
        let result = Normalizer::new().normalize(b"<html>502</html>");
        assert!(matches!(result, Err(StoryreelError::Json(_))));
    }

    #[test]
    fn test_empty_memes_array() {
        let stories = Normalizer::new().normalize(br#"{"memes": []}"#).unwrap();
        assert!(stories.is_empty());
    }
}
