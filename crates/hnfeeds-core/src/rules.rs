//! Static per-site configuration: which links are passed through untouched,
//! which are sent to the full-text service, and which cookies to send.
//!
//! The built-in tables reflect the sites the service was tuned against. A JSON
//! document with the same shape as [`RulesFile`] replaces them wholesale:
//!
//! ```json
//! {
//!   "ignored_domains": [{ "pattern": "youtube.com", "title_prefix": "YT" }],
//!   "fulltext_domains": ["arxiv.org", "wired.co[^/]+"],
//!   "cookies": [{ "domain": "npr.org", "values": { "trackingChoice": "true" } }]
//! }
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use regex::RegexSet;
use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Links matching `pattern` (plain substring) are returned as they are.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IgnoredDomain {
    pub pattern: String,
    #[serde(default)]
    pub title_prefix: Option<String>,
}

/// Cookies injected into page fetches whose URL contains `domain`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CookieRule {
    pub domain: String,
    pub values: BTreeMap<String, String>,
}

/// On-disk form of the rule tables.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RulesFile {
    #[serde(default)]
    pub ignored_domains: Vec<IgnoredDomain>,
    /// Regular expressions searched anywhere in the link.
    #[serde(default)]
    pub fulltext_domains: Vec<String>,
    #[serde(default)]
    pub cookies: Vec<CookieRule>,
}

/// Classification of a single link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DomainRule {
    Pdf,
    Ignored { title_prefix: Option<String> },
    FullTextEligible,
    Default,
}

/// Compiled rule tables, shared read-only by every worker.
#[derive(Debug, Clone)]
pub struct SiteRules {
    ignored: Vec<IgnoredDomain>,
    fulltext: RegexSet,
    cookies: Vec<CookieRule>,
}

impl SiteRules {
    pub fn new(file: RulesFile) -> Result<Self, AppError> {
        let fulltext = RegexSet::new(&file.fulltext_domains)
            .map_err(|e| AppError::ConfigError(format!("Invalid fulltext domain pattern: {e}")))?;

        Ok(Self {
            ignored: file.ignored_domains,
            fulltext,
            cookies: file.cookies,
        })
    }

    pub fn from_json(json: &str) -> Result<Self, AppError> {
        let file: RulesFile = serde_json::from_str(json)?;
        Self::new(file)
    }

    pub fn from_file(path: &Path) -> Result<Self, AppError> {
        let json = std::fs::read_to_string(path).map_err(|e| {
            AppError::ConfigError(format!("Failed to read rules file {}: {e}", path.display()))
        })?;
        Self::from_json(&json)
    }

    /// Classify a link. PDF beats every table; ignored beats fulltext.
    pub fn classify(&self, link: &str) -> DomainRule {
        if is_pdf(link) {
            return DomainRule::Pdf;
        }

        if let Some(rule) = self.ignored.iter().find(|r| link.contains(&r.pattern)) {
            return DomainRule::Ignored {
                title_prefix: rule.title_prefix.clone(),
            };
        }

        if self.fulltext.is_match(link) {
            return DomainRule::FullTextEligible;
        }

        DomainRule::Default
    }

    /// Cookies for the first cookie rule whose domain occurs in `url`.
    pub fn cookies_for(&self, url: &str) -> Option<&BTreeMap<String, String>> {
        self.cookies
            .iter()
            .find(|rule| url.contains(&rule.domain))
            .map(|rule| &rule.values)
    }
}

impl Default for SiteRules {
    fn default() -> Self {
        let file = builtin_rules();
        match Self::new(file.clone()) {
            Ok(rules) => rules,
            Err(e) => {
                tracing::error!(error = %e, "Built-in fulltext patterns rejected");
                Self {
                    ignored: file.ignored_domains,
                    fulltext: RegexSet::empty(),
                    cookies: file.cookies,
                }
            }
        }
    }
}

fn is_pdf(link: &str) -> bool {
    link.to_ascii_lowercase().ends_with(".pdf")
}

/// The tables the service ships with.
pub fn builtin_rules() -> RulesFile {
    let ignored = |pattern: &str, prefix: Option<&str>| IgnoredDomain {
        pattern: pattern.to_string(),
        title_prefix: prefix.map(str::to_string),
    };
    let cookies = |domain: &str, values: &[(&str, &str)]| CookieRule {
        domain: domain.to_string(),
        values: values
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect(),
    };

    RulesFile {
        ignored_domains: vec![
            ignored("news.ycombinator.com", None),
            ignored("youtube.com", Some("YT")),
            ignored("twitter.com", Some("twit")),
            ignored("spectrum.ieee.org", None),
        ],
        fulltext_domains: [
            "arxiv.org",
            "bbc.co.uk",
            "ai.googleblog.com",
            "github.com",
            "nature.com",
            "newyorker.com",
            "quantamagazine.org",
            "techcrunch.com",
            "theatlantic.com",
            "thedrive.com",
            r"wired.co[^/]+",
        ]
        .iter()
        .map(|p| p.to_string())
        .collect(),
        cookies: vec![
            cookies(
                "npr.org",
                &[
                    ("trackingChoice", "true"),
                    ("choiceVersion", "1"),
                    ("dateOfChoice", "1596844800021"),
                ],
            ),
            cookies(
                "techcrunch.com",
                &[
                    (
                        "EuConsent",
                        "BOsb5w6O4A6WNAOABCENCuuAAAAuJ6__f_97_8_v2fdvduz_Ov_j_c__\
                         3XWcfPZvcELzhK9Meu_2wxd4u9wNRM5wckx87eJrEso5YzISsG-RMod_\
                         zl_v3ziX9ohPowEc9qzznZEw6vs2o8JzBAAAgAAA",
                    ),
                    ("GUC", "AQABAQFe_MVfN0IiWQTD"),
                    ("GUCS", "AXGZ9Av6"),
                ],
            ),
        ],
    }
}
