use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum Genre {
    Fantasy,
    SciFi,
    Mystery,
    Romance,
    Horror,
}

impl Genre {
    pub const ALL: [Genre; 5] = [
        Genre::Fantasy,
        Genre::SciFi,
        Genre::Mystery,
        Genre::Romance,
        Genre::Horror,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Self::Fantasy => "Fantasy",
            Self::SciFi => "Sci-Fi",
            Self::Mystery => "Mystery",
            Self::Romance => "Romance",
            Self::Horror => "Horror",
        }
    }
}

impl fmt::Display for Genre {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Genre {
    type Err = StoryRequestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fantasy" => Ok(Self::Fantasy),
            "sci-fi" | "scifi" | "sci_fi" => Ok(Self::SciFi),
            "mystery" => Ok(Self::Mystery),
            "romance" => Ok(Self::Romance),
            "horror" => Ok(Self::Horror),
            _ => Err(StoryRequestError::UnknownGenre(s.trim().to_string())),
        }
    }
}

/// Word-count presets offered to readers.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum StoryLength {
    Small,
    Medium,
    Large,
}

impl StoryLength {
    pub fn word_count(&self) -> u32 {
        match self {
            Self::Small => 200,
            Self::Medium => 500,
            Self::Large => 700,
        }
    }
}

impl From<StoryLength> for u32 {
    fn from(length: StoryLength) -> Self {
        length.word_count()
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StoryRequestError {
    #[error("unknown genre `{0}`")]
    UnknownGenre(String),
    #[error("a short topic is required")]
    MissingTopic,
    #[error("at least one keyword is required")]
    MissingKeywords,
    #[error("target word count must be greater than zero")]
    ZeroWordCount,
}

/// Splits a comma-separated keyword field, dropping blank entries.
pub fn parse_keywords(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|keyword| !keyword.is_empty())
        .map(str::to_string)
        .collect()
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoryRequest {
    genre: Genre,
    target_word_count: u32,
    topic: String,
    character_name: String,
    keywords: Vec<String>,
}

impl StoryRequest {
    pub fn new<I, S>(
        genre: Genre,
        target_word_count: impl Into<u32>,
        topic: impl Into<String>,
        character_name: impl Into<String>,
        keywords: I,
    ) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            genre,
            target_word_count: target_word_count.into(),
            topic: topic.into().trim().to_string(),
            character_name: character_name.into().trim().to_string(),
            keywords: keywords
                .into_iter()
                .map(Into::into)
                .map(|k: String| k.trim().to_string())
                .filter(|k| !k.is_empty())
                .collect(),
        }
    }

    pub fn genre(&self) -> Genre {
        self.genre
    }

    pub fn target_word_count(&self) -> u32 {
        self.target_word_count
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn character_name(&self) -> &str {
        &self.character_name
    }

    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }

    pub fn joined_keywords(&self) -> String {
        self.keywords.join(", ")
    }

    pub fn validate(&self) -> Result<(), StoryRequestError> {
        if self.topic.is_empty() {
            return Err(StoryRequestError::MissingTopic);
        }
        if self.keywords.is_empty() {
            return Err(StoryRequestError::MissingKeywords);
        }
        if self.target_word_count == 0 {
            return Err(StoryRequestError::ZeroWordCount);
        }
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoryResult {
    pub title: String,
    pub body: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn genre_round_trips_through_label() {
        for genre in Genre::ALL {
            assert_eq!(genre.label().parse::<Genre>(), Ok(genre));
        }
        assert_eq!("SCIFI".parse::<Genre>(), Ok(Genre::SciFi));
        assert_eq!(
            "western".parse::<Genre>(),
            Err(StoryRequestError::UnknownGenre("western".into()))
        );
    }

    #[test]
    fn keywords_are_trimmed_and_filtered() {
        assert_eq!(
            parse_keywords(" castle, dragon ,, treasure ,"),
            vec!["castle", "dragon", "treasure"]
        );
        assert!(parse_keywords(" , ").is_empty());
    }

    #[test]
    fn length_presets_map_to_word_counts() {
        let request = StoryRequest::new(
            Genre::Romance,
            StoryLength::Medium,
            "a letter",
            "Sam",
            ["rain"],
        );
        assert_eq!(request.target_word_count(), 500);
        assert_eq!(StoryLength::Small.word_count(), 200);
        assert_eq!(u32::from(StoryLength::Large), 700);
    }

    #[test]
    fn validation_rejects_blank_fields() {
        let ok = StoryRequest::new(Genre::Fantasy, 200u32, "quest", "Alex", ["castle"]);
        assert_eq!(ok.validate(), Ok(()));

        let no_topic = StoryRequest::new(Genre::Fantasy, 200u32, "   ", "Alex", ["castle"]);
        assert_eq!(no_topic.validate(), Err(StoryRequestError::MissingTopic));

        let no_keywords =
            StoryRequest::new(Genre::Fantasy, 200u32, "quest", "Alex", parse_keywords(" , "));
        assert_eq!(no_keywords.validate(), Err(StoryRequestError::MissingKeywords));

        let zero = StoryRequest::new(Genre::Fantasy, 0u32, "quest", "Alex", ["castle"]);
        assert_eq!(zero.validate(), Err(StoryRequestError::ZeroWordCount));
    }
}
