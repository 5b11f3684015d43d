//! Theme keyword tables.
//!
//! A [`ThemeConfig`] is an immutable value: the built-in tables come from
//! [`ThemeConfig::default`], a JSON file can replace them wholesale via
//! [`ThemeConfig::from_json_file`], and the classifier only ever borrows it.
//!
//! ```json
//! {
//!   "themes": [
//!     { "id": "finance", "keywords": ["予算", "決算"], "threshold": 2 },
//!     { "id": "health", "keywords": ["医療", "健康"], "threshold": 1,
//!       "score1Allowlist": ["医療"], "weakKeywords": ["健康"] }
//!   ],
//!   "priority": ["finance", "health"]
//! }
//! ```

use crate::error::GiketsuError;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

fn default_threshold() -> usize {
    2
}

/// Keywords and acceptance rules for one theme.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThemeRule {
    /// Becomes the `theme:<id>` ref.
    pub id: String,
    /// Matched as plain substrings of the title, in this order.
    pub keywords: Vec<String>,
    /// Minimum number of matched keywords. Default: 2.
    #[serde(default = "default_threshold")]
    pub threshold: usize,
    /// At score 1, at least one matched keyword must be listed here.
    /// Empty means no allow-list.
    #[serde(default)]
    pub score1_allowlist: Vec<String>,
    /// Keywords too generic to carry a tag on their own. Reported when they
    /// were the only reason a score-1 candidate was considered.
    #[serde(default)]
    pub weak_keywords: Vec<String>,
}

impl ThemeRule {
    fn new(id: &str, threshold: usize, keywords: &[&str]) -> Self {
        Self {
            id: id.to_string(),
            keywords: owned(keywords),
            threshold,
            score1_allowlist: Vec::new(),
            weak_keywords: Vec::new(),
        }
    }

    fn allow(mut self, allowlist: &[&str]) -> Self {
        self.score1_allowlist = owned(allowlist);
        self
    }

    fn weak(mut self, weak: &[&str]) -> Self {
        self.weak_keywords = owned(weak);
        self
    }
}

fn owned(words: &[&str]) -> Vec<String> {
    words.iter().map(|w| w.to_string()).collect()
}

/// Complete classifier configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThemeConfig {
    pub themes: Vec<ThemeRule>,
    /// Tie-break order for equal scores. Themes not listed rank after all
    /// listed ones, by id.
    #[serde(default)]
    pub priority: Vec<String>,
}

impl Default for ThemeConfig {
    fn default() -> Self {
        let themes = vec![
            ThemeRule::new(
                "finance",
                2,
                &[
                    "予算", "決算", "補正", "財政", "基金", "起債", "債務", "交付税", "税", "歳入",
                    "歳出", "入札",
                ],
            ),
            ThemeRule::new(
                "agriculture",
                1,
                &[
                    "農", "農業", "畑", "酪農", "畜産", "家畜", "飼料", "乳", "牛", "馬鈴薯",
                    "甜菜", "ビート", "収穫", "農地",
                ],
            )
            .allow(&["農業", "畜産", "酪農", "収穫", "農地", "家畜", "飼料"]),
            ThemeRule::new(
                "tourism",
                1,
                &[
                    "観光", "宿泊", "温泉", "道の駅", "キャンプ", "イベント", "誘客", "交流",
                    "滞在", "プロモーション",
                ],
            )
            .allow(&["観光", "宿泊", "滞在", "温泉"]),
            ThemeRule::new(
                "health",
                1,
                &[
                    "福祉", "介護", "医療", "健診", "健康", "子育て", "保育", "教育", "学校",
                    "給食",
                ],
            )
            .allow(&["医療", "介護", "福祉", "保育"])
            .weak(&["健康", "教育", "学校"]),
            ThemeRule::new(
                "community",
                1,
                &[
                    "地域", "自治", "町内会", "防災", "消防", "移住", "定住", "空き家", "交通",
                    "公共交通", "まちづくり",
                ],
            )
            .allow(&["定住", "移住", "防災", "消防", "町内会", "地域", "まちづくり"]),
        ];

        Self {
            themes,
            priority: owned(&["finance", "health", "community", "agriculture", "tourism"]),
        }
    }
}

impl ThemeConfig {
    /// Load a replacement configuration from JSON and validate it.
    pub fn from_json_file(path: &Path) -> Result<Self, GiketsuError> {
        let raw = std::fs::read_to_string(path).map_err(|e| GiketsuError::InputReadFailed {
            path: path.to_path_buf(),
            detail: e.to_string(),
        })?;
        let config: Self = serde_json::from_str(&raw).map_err(|e| GiketsuError::InputReadFailed {
            path: path.to_path_buf(),
            detail: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Reject configurations the classifier cannot interpret unambiguously.
    pub fn validate(&self) -> Result<(), GiketsuError> {
        let mut ids = HashSet::new();

        for rule in &self.themes {
            if rule.id.trim().is_empty() {
                return Err(GiketsuError::InvalidConfig("theme id must not be empty".into()));
            }
            if !ids.insert(rule.id.as_str()) {
                return Err(GiketsuError::InvalidConfig(format!(
                    "duplicate theme id '{}'",
                    rule.id
                )));
            }
            if rule.threshold == 0 {
                return Err(GiketsuError::InvalidConfig(format!(
                    "theme '{}': threshold must be ≥ 1",
                    rule.id
                )));
            }
            if rule.keywords.is_empty() || rule.keywords.iter().any(|k| k.is_empty()) {
                return Err(GiketsuError::InvalidConfig(format!(
                    "theme '{}': keywords must be non-empty strings",
                    rule.id
                )));
            }
            if let Some(kw) = rule
                .weak_keywords
                .iter()
                .find(|kw| rule.score1_allowlist.contains(kw))
            {
                return Err(GiketsuError::InvalidConfig(format!(
                    "theme '{}': weak keyword '{}' is also on the allow-list",
                    rule.id, kw
                )));
            }
        }

        if let Some(unknown) = self.priority.iter().find(|p| !ids.contains(p.as_str())) {
            return Err(GiketsuError::InvalidConfig(format!(
                "priority names unknown theme '{unknown}'"
            )));
        }

        Ok(())
    }

    /// Tie-break rank of a theme; lower wins.
    pub fn priority_rank(&self, id: &str) -> usize {
        self.priority
            .iter()
            .position(|p| p == id)
            .unwrap_or(self.priority.len())
    }
}
