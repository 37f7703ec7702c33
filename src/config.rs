use std::collections::HashMap;
use std::env;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::warn;

use crate::db::TableNames;
use crate::sentiment::download::default_model_dir;
use crate::sentiment::SentimentMode;
use crate::text::stopwords::StopWordSet;
use crate::tracker::DEFAULT_MAX_ATTEMPTS;

/// Prefix of every default bucket and table name.
pub const DEFAULT_PREFIX: &str = "review-analysis";
pub const DEFAULT_REVIEWS_TABLE: &str = "review-analysis-reviews";
pub const DEFAULT_USERS_TABLE: &str = "review-analysis-users";

/// Environment prefix read by `EnvParameters`.
const ENV_PARAM_PREFIX: &str = "GAVEL_PARAM_";

/// The named deployment parameters the pipeline needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Parameter {
    ReviewsBucket,
    ProcessedBucket,
    ProfanityBucket,
    SentimentBucket,
    ReviewsTable,
    UsersTable,
}

impl Parameter {
    pub const ALL: [Parameter; 6] = [
        Parameter::ReviewsBucket,
        Parameter::ProcessedBucket,
        Parameter::ProfanityBucket,
        Parameter::SentimentBucket,
        Parameter::ReviewsTable,
        Parameter::UsersTable,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Parameter::ReviewsBucket => "reviews_bucket",
            Parameter::ProcessedBucket => "processed_bucket",
            Parameter::ProfanityBucket => "profanity_bucket",
            Parameter::SentimentBucket => "sentiment_bucket",
            Parameter::ReviewsTable => "reviews_table",
            Parameter::UsersTable => "users_table",
        }
    }

    /// `review-analysis-<suffix>`, used when the source has no value.
    pub fn default_value(&self) -> String {
        let suffix = match self {
            Parameter::ReviewsBucket => "reviews",
            Parameter::ProcessedBucket => "processed",
            Parameter::ProfanityBucket => "profanity",
            Parameter::SentimentBucket => "sentiment",
            Parameter::ReviewsTable => "reviews",
            Parameter::UsersTable => "users",
        };
        format!("{DEFAULT_PREFIX}-{suffix}")
    }
}

/// Somewhere named parameters can be looked up.
///
/// `Ok(None)` means the source answered but has no such name; `Err` means the
/// source itself couldn't be reached. Both fall back to the default.
pub trait ParameterSource: Send + Sync {
    fn describe(&self) -> String;

    fn get(&self, name: &str) -> Result<Option<String>>;
}

/// Parameters from `GAVEL_PARAM_<NAME>` environment variables.
pub struct EnvParameters;

impl ParameterSource for EnvParameters {
    fn describe(&self) -> String {
        format!("environment ({ENV_PARAM_PREFIX}*)")
    }

    fn get(&self, name: &str) -> Result<Option<String>> {
        let var = format!("{ENV_PARAM_PREFIX}{}", name.to_ascii_uppercase());
        Ok(env::var(var).ok().filter(|v| !v.trim().is_empty()))
    }
}

/// Parameters from a flat JSON object file (`{"reviews_bucket": "..."}`).
pub struct FileParameters {
    path: PathBuf,
}

impl FileParameters {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn read(&self) -> Result<HashMap<String, String>> {
        let text = std::fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read parameter file {}", self.path.display()))?;
        serde_json::from_str(&text)
            .with_context(|| format!("Parameter file {} is not a JSON object of strings", self.path.display()))
    }
}

impl ParameterSource for FileParameters {
    fn describe(&self) -> String {
        format!("file {}", self.path.display())
    }

    fn get(&self, name: &str) -> Result<Option<String>> {
        Ok(self.read()?.remove(name).filter(|v| !v.trim().is_empty()))
    }
}

/// Bucket names for each artifact kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Buckets {
    pub reviews: String,
    pub processed: String,
    pub profanity: String,
    pub sentiment: String,
}

impl Default for Buckets {
    fn default() -> Self {
        Self {
            reviews: Parameter::ReviewsBucket.default_value(),
            processed: Parameter::ProcessedBucket.default_value(),
            profanity: Parameter::ProfanityBucket.default_value(),
            sentiment: Parameter::SentimentBucket.default_value(),
        }
    }
}

/// Look up one parameter, falling back to its default with a warning.
pub fn resolve_parameter(source: &dyn ParameterSource, param: Parameter) -> String {
    match source.get(param.name()) {
        Ok(Some(value)) => value,
        Ok(None) => {
            let fallback = param.default_value();
            warn!(
                parameter = param.name(),
                source = %source.describe(),
                default = %fallback,
                "Parameter not set, using default"
            );
            fallback
        }
        Err(e) => {
            let fallback = param.default_value();
            warn!(
                parameter = param.name(),
                source = %source.describe(),
                default = %fallback,
                error = %e,
                "Parameter source unavailable, using default"
            );
            fallback
        }
    }
}

/// Resolve every bucket and table name once.
pub fn resolve_parameters(source: &dyn ParameterSource) -> (Buckets, TableNames) {
    let buckets = Buckets {
        reviews: resolve_parameter(source, Parameter::ReviewsBucket),
        processed: resolve_parameter(source, Parameter::ProcessedBucket),
        profanity: resolve_parameter(source, Parameter::ProfanityBucket),
        sentiment: resolve_parameter(source, Parameter::SentimentBucket),
    };
    let tables = TableNames::new(
        resolve_parameter(source, Parameter::ReviewsTable),
        resolve_parameter(source, Parameter::UsersTable),
    );
    (buckets, tables)
}

/// Central configuration loaded from environment variables.
///
/// The .env file is loaded at startup via dotenvy before this runs. Every
/// setting has a default, so `Config::load()` works on a bare checkout.
#[derive(Debug, Clone)]
pub struct Config {
    pub db_path: String,
    /// Root directory of the filesystem blob store; buckets are subdirectories
    pub blob_root: PathBuf,
    /// Directory containing downloaded model files
    pub model_dir: PathBuf,
    /// Tab-separated form/lemma dictionary; absent means no lemmatization
    pub lemma_path: PathBuf,
    pub sentiment_mode: SentimentMode,
    pub stop_words: StopWordSet,
    /// Attempts for a conditional violation update before giving up
    pub max_conflict_retries: u32,
    pub parameters_file: Option<PathBuf>,
    pub buckets: Buckets,
    pub tables: TableNames,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self> {
        let sentiment_mode = match env::var("GAVEL_SENTIMENT") {
            Ok(v) => SentimentMode::from_name(&v).unwrap_or_else(|| {
                warn!(value = %v, "Unknown GAVEL_SENTIMENT, using auto");
                SentimentMode::Auto
            }),
            Err(_) => SentimentMode::Auto,
        };

        let stop_words = match env::var("GAVEL_STOPWORDS") {
            Ok(v) => StopWordSet::from_name(&v).unwrap_or_else(|| {
                warn!(value = %v, "Unknown GAVEL_STOPWORDS, using core");
                StopWordSet::Core
            }),
            Err(_) => StopWordSet::Core,
        };

        let max_conflict_retries = match env::var("GAVEL_MAX_CONFLICT_RETRIES") {
            Ok(v) => v
                .trim()
                .parse::<u32>()
                .with_context(|| format!("GAVEL_MAX_CONFLICT_RETRIES must be a positive integer, got {v:?}"))?,
            Err(_) => DEFAULT_MAX_ATTEMPTS,
        };
        if max_conflict_retries == 0 {
            anyhow::bail!("GAVEL_MAX_CONFLICT_RETRIES must be at least 1");
        }

        let parameters_file = env::var("GAVEL_PARAMETERS_FILE").ok().map(PathBuf::from);
        let (buckets, tables) = match &parameters_file {
            Some(path) => resolve_parameters(&FileParameters::new(path)),
            None => resolve_parameters(&EnvParameters),
        };

        Ok(Self {
            db_path: env::var("GAVEL_DB_PATH").unwrap_or_else(|_| "./gavel.db".to_string()),
            blob_root: env::var("GAVEL_BLOB_ROOT")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("./blobs")),
            model_dir: env::var("GAVEL_MODEL_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| default_model_dir()),
            lemma_path: env::var("GAVEL_LEMMA_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("./data/lemmas.tsv")),
            sentiment_mode,
            stop_words,
            max_conflict_retries,
            parameters_file,
            buckets,
            tables,
        })
    }

    pub fn lemma_file_present(&self) -> bool {
        Path::new(&self.lemma_path).is_file()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct MapSource(HashMap<String, String>);

    impl ParameterSource for MapSource {
        fn describe(&self) -> String {
            "test map".to_string()
        }

        fn get(&self, name: &str) -> Result<Option<String>> {
            Ok(self.0.get(name).cloned())
        }
    }

    struct Unreachable;

    impl ParameterSource for Unreachable {
        fn describe(&self) -> String {
            "unreachable".to_string()
        }

        fn get(&self, _name: &str) -> Result<Option<String>> {
            anyhow::bail!("connection refused")
        }
    }

    #[test]
    fn test_defaults_follow_prefix() {
        assert_eq!(Parameter::ReviewsBucket.default_value(), "review-analysis-reviews");
        assert_eq!(Parameter::UsersTable.default_value(), DEFAULT_USERS_TABLE);
        assert_eq!(Parameter::ReviewsTable.default_value(), DEFAULT_REVIEWS_TABLE);
    }

    #[test]
    fn test_resolve_uses_source_values_and_defaults_missing() {
        let mut map = HashMap::new();
        map.insert("sentiment_bucket".to_string(), "prod-sentiment".to_string());
        map.insert("users_table".to_string(), "prod-users".to_string());

        let (buckets, tables) = resolve_parameters(&MapSource(map));
        assert_eq!(buckets.sentiment, "prod-sentiment");
        assert_eq!(buckets.reviews, "review-analysis-reviews");
        assert_eq!(tables.users, "prod-users");
        assert_eq!(tables.reviews, DEFAULT_REVIEWS_TABLE);
    }

    #[test]
    fn test_unreachable_source_falls_back_to_defaults() {
        let (buckets, tables) = resolve_parameters(&Unreachable);
        assert_eq!(buckets, Buckets::default());
        assert_eq!(tables, TableNames::default());
    }

    #[test]
    fn test_file_parameters() {
        let path = std::env::temp_dir().join(format!("gavel-params-{}.json", std::process::id()));
        std::fs::write(&path, r#"{"reviews_bucket": "from-file", "processed_bucket": ""}"#).unwrap();

        let source = FileParameters::new(&path);
        assert_eq!(source.get("reviews_bucket").unwrap().as_deref(), Some("from-file"));
        // blank counts as unset
        assert_eq!(source.get("processed_bucket").unwrap(), None);

        std::fs::remove_file(&path).unwrap();
        assert!(source.get("reviews_bucket").is_err());
    }
}
