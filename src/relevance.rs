// src/relevance.rs
//! Relevance gate for ingested feed entries: a single case-insensitive regex
//! alternation over topics that are never financial news (celebrity, sports,
//! crime blotter, lifestyle). Coarse by design; false negatives are expected.

use regex::Regex;

use crate::config::DEFAULT_NOISE_PATTERNS;

/// Compiled noise blocklist.
#[derive(Debug, Clone)]
pub struct NoiseFilter {
    re: Option<Regex>,
}

impl NoiseFilter {
    /// Compile a filter from raw pattern fragments. Each fragment is a regex
    /// matched on word boundaries; an empty list accepts everything.
    pub fn from_patterns<S: AsRef<str>>(patterns: &[S]) -> anyhow::Result<Self> {
        let parts: Vec<&str> = patterns
            .iter()
            .map(|p| p.as_ref().trim())
            .filter(|p| !p.is_empty())
            .collect();
        if parts.is_empty() {
            return Ok(Self { re: None });
        }

        // Validate each fragment on its own so the error names the culprit.
        for p in &parts {
            Regex::new(p).map_err(|e| anyhow::anyhow!("noise pattern `{p}` regex error: {e}"))?;
        }

        let alternation = parts
            .iter()
            .map(|p| format!("(?:{p})"))
            .collect::<Vec<_>>()
            .join("|");
        let re = Regex::new(&format!(r"(?i)\b(?:{alternation})\b"))
            .map_err(|e| anyhow::anyhow!("noise blocklist regex error: {e}"))?;
        Ok(Self { re: Some(re) })
    }

    /// Returns the first blocklisted term found in the entry, if any.
    pub fn blocked_term(&self, title: &str, summary: &str, category: &str) -> Option<String> {
        let re = self.re.as_ref()?;
        [title, summary, category]
            .iter()
            .find_map(|field| re.find(field).map(|m| m.as_str().to_ascii_lowercase()))
    }

    /// True when the entry should be kept.
    pub fn is_relevant(&self, title: &str, summary: &str, category: &str) -> bool {
        self.blocked_term(title, summary, category).is_none()
    }
}

impl Default for NoiseFilter {
    fn default() -> Self {
        // The built-in list is a compile-time constant; failure here is a programming error.
        Self::from_patterns(DEFAULT_NOISE_PATTERNS).expect("default noise blocklist compiles")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lottery_is_noise_rates_are_news() {
        let f = NoiseFilter::default();
        assert!(!f.is_relevant("Local lottery winner announced", "", "markets"));
        assert!(f.is_relevant("Fed raises interest rates", "", "macro"));
    }

    #[test]
    fn matching_is_case_insensitive_and_word_bounded() {
        let f = NoiseFilter::default();
        assert_eq!(
            f.blocked_term("Kardashian Brand Files For IPO", "", "deals"),
            Some("kardashian".to_string())
        );
        // "nba" inside a longer word is not a hit
        assert!(f.is_relevant("Unbanked households rise", "", "personal-finance"));
        // Summary is checked too
        assert!(!f.is_relevant("Weekend roundup", "Playoffs continue tonight", "markets"));
    }

    #[test]
    fn empty_patterns_accept_everything() {
        let f = NoiseFilter::from_patterns::<&str>(&[]).unwrap();
        assert!(f.is_relevant("Local lottery winner announced", "", ""));
    }

    #[test]
    fn bad_pattern_is_reported() {
        let err = NoiseFilter::from_patterns(&["ok", "(unclosed"]).unwrap_err();
        assert!(err.to_string().contains("(unclosed"));
    }
}
