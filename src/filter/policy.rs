// src/filter/policy.rs
//! Externally configurable classification policy. Resolution order:
//! 1) $SHORTS_POLICY_PATH (must exist when set)
//! 2) config/policy.toml
//! 3) built-in defaults
//! Env vars MAX_SHORT_DURATION / STRICT_FILTER override file values.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use regex::{Regex, RegexBuilder};
use serde::Deserialize;

pub const DEFAULT_POLICY_PATH: &str = "config/policy.toml";
pub const ENV_POLICY_PATH: &str = "SHORTS_POLICY_PATH";
pub const ENV_MAX_SHORT_DURATION: &str = "MAX_SHORT_DURATION";
pub const ENV_STRICT_FILTER: &str = "STRICT_FILTER";

pub const DEFAULT_MAX_SHORT_DURATION: u64 = 90;

const DEFAULT_KEYWORD_PATTERNS: &[&str] =
    &["#shorts?", "#short", "#youtubeshorts", "shorts", "short video"];

const DEFAULT_STRICT_PATTERNS: &[&str] = &[
    r"\b(quick|fast|rapid|instant)\b",
    r"\b(tip|hack|trick)\b",
    r"\b(\d+\s*sec(ond)?s?)\b",
];

#[derive(Debug, Default, Deserialize)]
struct PolicyFile {
    max_short_duration: Option<u64>,
    strict: Option<bool>,
    keyword_patterns: Option<Vec<String>>,
    strict_patterns: Option<Vec<String>>,
}

/// Compiled Shorts-classification policy.
#[derive(Debug, Clone)]
pub struct FilterPolicy {
    /// Entries with a declared duration at or below this are Shorts.
    pub max_short_duration: u64,
    /// Apply the extra heuristic patterns.
    pub strict: bool,
    keywords: Option<Regex>,
    strict_patterns: Vec<Regex>,
}

impl FilterPolicy {
    /// Built-in policy; the compiled-in patterns are known-good.
    pub fn defaults() -> Self {
        Self::from_file(PolicyFile::default()).expect("built-in policy patterns compile")
    }

    /// Resolve the policy from file + environment overrides.
    pub fn load() -> Result<Self> {
        let file = if let Ok(p) = std::env::var(ENV_POLICY_PATH) {
            let pb = PathBuf::from(&p);
            if !pb.exists() {
                return Err(anyhow!("{ENV_POLICY_PATH} points to non-existent path {p}"));
            }
            Some(read_policy_file(&pb)?)
        } else {
            let fallback = Path::new(DEFAULT_POLICY_PATH);
            if fallback.exists() {
                Some(read_policy_file(fallback)?)
            } else {
                None
            }
        };

        let mut policy = Self::from_file(file.unwrap_or_default())?;

        if let Ok(raw) = std::env::var(ENV_MAX_SHORT_DURATION) {
            policy.max_short_duration = raw
                .trim()
                .parse::<u64>()
                .with_context(|| format!("parsing {ENV_MAX_SHORT_DURATION}='{raw}'"))?;
        }
        if let Ok(raw) = std::env::var(ENV_STRICT_FILTER) {
            policy.strict = matches!(
                raw.trim().to_ascii_lowercase().as_str(),
                "true" | "1" | "yes"
            );
        }

        Ok(policy)
    }

    fn from_file(f: PolicyFile) -> Result<Self> {
        let keyword_patterns = f.keyword_patterns.unwrap_or_else(|| {
            DEFAULT_KEYWORD_PATTERNS
                .iter()
                .map(|s| s.to_string())
                .collect()
        });
        let strict_source = f.strict_patterns.unwrap_or_else(|| {
            DEFAULT_STRICT_PATTERNS
                .iter()
                .map(|s| s.to_string())
                .collect()
        });

        // An explicitly empty pattern list disables that detection method.
        let keywords = if keyword_patterns.is_empty() {
            None
        } else {
            Some(
                RegexBuilder::new(&keyword_patterns.join("|"))
                    .case_insensitive(true)
                    .build()
                    .context("compiling keyword patterns")?,
            )
        };

        let strict_patterns = strict_source
            .iter()
            .map(|p| {
                RegexBuilder::new(p)
                    .case_insensitive(true)
                    .build()
                    .with_context(|| format!("compiling strict pattern '{p}'"))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            max_short_duration: f.max_short_duration.unwrap_or(DEFAULT_MAX_SHORT_DURATION),
            strict: f.strict.unwrap_or(false),
            keywords,
            strict_patterns,
        })
    }

    pub fn matches_keyword(&self, text: &str) -> bool {
        self.keywords.as_ref().is_some_and(|re| re.is_match(text))
    }

    pub fn matches_strict(&self, text: &str) -> bool {
        self.strict_patterns.iter().any(|re| re.is_match(text))
    }
}

fn read_policy_file(path: &Path) -> Result<PolicyFile> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("reading policy from {}", path.display()))?;
    toml::from_str(&content).with_context(|| format!("parsing policy {}", path.display()))
}
