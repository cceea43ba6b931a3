use crate::error::StorageError;
use chrono::{NaiveTime, Timelike};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::io::ErrorKind;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};
use xorshift::{Rng, SeedableRng, Xorshift128};

pub const VERSES_FILE: &str = "verses.json";
pub const QUIZZES_FILE: &str = "quizzes.json";
pub const EVENTS_FILE: &str = "events.json";

const DEFAULT_INSPIRATIONS: &[&str] = &[
    "🌟 Keep your faith strong today!",
    "🙏 God is always with you.",
    "✨ Your small acts matter.",
];

#[derive(Debug, Clone, Deserialize, Serialize, Eq, PartialEq)]
pub struct Quiz {
    pub question: String,
    pub answer: String,
}

impl Quiz {
    pub fn is_correct(&self, answer: &str) -> bool {
        answer.trim().to_lowercase() == self.answer.trim().to_lowercase()
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, Eq, PartialEq)]
pub struct Event {
    pub name: String,
    #[serde(with = "hh_mm")]
    pub time: NaiveTime,
}

impl Event {
    pub fn starts_at(&self, now: NaiveTime) -> bool {
        self.time.hour() == now.hour() && self.time.minute() == now.minute()
    }
}

mod hh_mm {
    use chrono::NaiveTime;
    use serde::{de, Deserialize, Deserializer, Serializer};

    const FORMAT: &str = "%H:%M";

    pub fn serialize<S: Serializer>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&time.format(FORMAT))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        NaiveTime::parse_from_str(raw.trim(), FORMAT).map_err(de::Error::custom)
    }
}

/// Static content the bot serves and broadcasts. Read-only after loading.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContentPool {
    pub verses: Vec<String>,
    pub quizzes: Vec<Quiz>,
    pub events: Vec<Event>,
    pub inspirations: Vec<String>,
}

impl ContentPool {
    /// Loads the pools from `data_dir`. Missing files give empty pools.
    pub async fn load(data_dir: &Path) -> Result<Self, StorageError> {
        let pool = Self {
            verses: load_json(&data_dir.join(VERSES_FILE)).await?,
            quizzes: load_json(&data_dir.join(QUIZZES_FILE)).await?,
            events: load_json(&data_dir.join(EVENTS_FILE)).await?,
            inspirations: DEFAULT_INSPIRATIONS.iter().map(|s| s.to_string()).collect(),
        };
        log::info!(
            "Loaded {} verse(s), {} quiz question(s) and {} event(s) from {}",
            pool.verses.len(),
            pool.quizzes.len(),
            pool.events.len(),
            data_dir.display()
        );
        Ok(pool)
    }

    pub fn random_verse(&self, salt: u64) -> Option<&String> {
        pick(&self.verses, salt)
    }

    pub fn random_quiz(&self, salt: u64) -> Option<&Quiz> {
        pick(&self.quizzes, salt)
    }

    pub fn random_inspiration(&self, salt: u64) -> Option<&String> {
        pick(&self.inspirations, salt)
    }

    pub fn events_at(&self, now: NaiveTime) -> impl Iterator<Item = &Event> {
        self.events.iter().filter(move |event| event.starts_at(now))
    }
}

async fn load_json<T: DeserializeOwned + Default>(path: &Path) -> Result<T, StorageError> {
    match tokio::fs::read_to_string(path).await {
        Ok(contents) => serde_json::from_str(&contents).map_err(|source| StorageError::Format {
            path: path.display().to_string(),
            source,
        }),
        Err(error) if error.kind() == ErrorKind::NotFound => {
            log::warn!("{} does not exist, using an empty pool", path.display());
            Ok(T::default())
        }
        Err(source) => Err(StorageError::Io {
            path: path.display().to_string(),
            source,
        }),
    }
}

/// Generator seeded from the clock and `salt`, so two callers in the same instant still differ.
pub fn rng(salt: u64) -> Xorshift128 {
    let now_ns = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|duration| duration.as_nanos() as u64)
        .unwrap_or_default();
    // an all-zero state would only ever yield zeros
    let states = [now_ns | 1, salt];
    SeedableRng::from_seed(&states[..])
}

/// Uniformly random element of `items`, `None` if there is nothing to pick.
pub fn pick<T>(items: &[T], salt: u64) -> Option<&T> {
    if items.is_empty() {
        return None;
    }
    let index = (rng(salt).next_u64() as usize) % items.len();
    items.get(index)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quiz_answers_ignore_case_and_padding() {
        let quiz = Quiz {
            question: "Who built the ark?".into(),
            answer: "Noah".into(),
        };
        assert!(quiz.is_correct("  noah "));
        assert!(!quiz.is_correct("Moses"));
    }

    #[test]
    fn events_parse_and_match_by_minute() {
        let events: Vec<Event> =
            serde_json::from_str(r#"[{"name": "Youth night", "time": "19:30"}, {"name": "Choir", "time": "08:00"}]"#)
                .unwrap();
        let pool = ContentPool {
            events,
            ..Default::default()
        };

        let now = NaiveTime::from_hms_opt(19, 30, 42).unwrap();
        let due: Vec<_> = pool.events_at(now).map(|event| event.name.as_str()).collect();
        assert_eq!(due, vec!["Youth night"]);

        let later = NaiveTime::from_hms_opt(19, 31, 0).unwrap();
        assert_eq!(pool.events_at(later).count(), 0);
    }

    #[test]
    fn invalid_event_time_is_rejected() {
        let parsed: Result<Vec<Event>, _> = serde_json::from_str(r#"[{"name": "x", "time": "25:99"}]"#);
        assert!(parsed.is_err());
    }

    #[test]
    fn pick_from_empty_pool_is_none() {
        let empty: Vec<String> = Vec::new();
        assert!(pick(&empty, 7).is_none());
        assert!(ContentPool::default().random_verse(7).is_none());
    }

    #[test]
    fn pick_stays_within_pool() {
        let pool = vec!["A".to_string(), "B".to_string()];
        for salt in 0..50 {
            assert!(pool.contains(pick(&pool, salt).unwrap()));
        }
    }

    #[tokio::test]
    async fn load_reads_files_and_tolerates_missing_ones() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(VERSES_FILE), r#"["John 3:16", "Psalm 23:1"]"#).unwrap();
        std::fs::write(
            dir.path().join(QUIZZES_FILE),
            r#"[{"question": "First book?", "answer": "Genesis"}]"#,
        )
        .unwrap();

        let pool = ContentPool::load(dir.path()).await.unwrap();
        assert_eq!(pool.verses.len(), 2);
        assert_eq!(pool.quizzes[0].answer, "Genesis");
        assert!(pool.events.is_empty());
        assert!(!pool.inspirations.is_empty());
    }

    #[tokio::test]
    async fn malformed_pool_is_a_format_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(EVENTS_FILE), r#"{"oops": true}"#).unwrap();

        let err = ContentPool::load(dir.path()).await.unwrap_err();
        assert!(matches!(err, StorageError::Format { .. }));
    }
}
