//! Boilerplate stripping for Korean news article text.
//!
//! The cleanup is an ordered list of rewrites. Order matters: URLs are removed
//! before the domain-suffix rules see the text, and the character whitelist
//! runs before the disclaimer rules so those match on already-flattened text.

use crate::error::{PipelineError, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Literal boilerplate, in removal order. `true` marks entries that only the
/// extended profile strips.
const LITERALS: [(&str, bool); 12] = [
    ("뉴스코리아", false),
    ("및", true),
    ("Copyright", false),
    ("copyright", true),
    ("COPYRIGHT", true),
    ("저작권자", false),
    ("ZDNET A RED VENTURES COMPANY", false),
    ("appeared first on 벤처스퀘어", false),
    ("appeared first on 벤처 스퀘어", false),
    ("appeared first on 모비인사이드 MOBIINSIDE", false),
    ("appeared first on 모비 인사이드 MOBIINSIDE", false),
    ("The post", false),
];

/// Anchored at both ends of the whole text, so it never matches inside an
/// article body. Kept as-is so output stays comparable with earlier runs.
pub const EMAIL_PATTERN: &str = r"/^[a-z0-9_+.-]+@([a-z0-9-]+\.)+[a-z0-9]{2,4}$/";

const PATTERN_RULES: [(&str, &str); 33] = [
    (
        r"http[s]?://(?:[a-zA-Z]|[0-9]|[$\-@\.&+:/?=]|[!*\(\),]|(?:%[0-9a-fA-F][0-9a-fA-F]))+",
        "",
    ),
    (r"[a-zA-Z가-힣]+뉴스", ""),
    (r"[a-zA-Z가-힣]+ 뉴스", ""),
    (r"[a-zA-Z가-힣]+newskr", ""),
    (r"[a-zA-Z가-힣]+Copyrights", ""),
    (r"[a-zA-Z가-힣]+ Copyrights", ""),
    (r"\s+Copyrights", ""),
    (r"[a-zA-Z가-힣]+com", ""),
    (r"[가-힣]+ 기자", ""),
    (r"[가-힣]+기자", ""),
    (r"[가-힣]+ 신문", ""),
    (r"[가-힣]+신문", ""),
    (r"데일리+[가-힣]", ""),
    (r"[가-힣]+투데이", ""),
    (r"[가-힣]+미디어", ""),
    (r"[가-힣]+ 데일리", ""),
    (r"[가-힣]+데일리", ""),
    (r"[가-힣]+ 콘텐츠 무단", ""),
    (r"전재\s+변형", "전재"),
    (r"[가-힣]+ 전재", ""),
    (r"[가-힣]+전재", ""),
    (r"[가-힣]+배포금지", ""),
    (r"[가-힣]+배포 금지", ""),
    (r"\s+배포금지", ""),
    (r"\s+배포 금지", ""),
    (r"[a-zA-Z가-힣]+.kr", ""),
    (EMAIL_PATTERN, ""),
    (r"[\r|\n]", ""),
    // Square brackets stop at the last `]` before a `)`; parentheses stop at
    // the first `)` even when another `(` was opened in between.
    (r"\[[^)]*\]", ""),
    (r"\([^)]*\)", ""),
    (r"[^ ㄱ-ㅣ가-힣A-Za-z0-9.]", ""),
    (r"이 글은 외부 필자인 +[a-zA-Z가-힣]", ""),
    (r"[a-zA-Z가-힣]+기고입니다.", ""),
];

const CUT_MARKERS: [&str; 2] = ["관련기사", "관련 기사"];

/// The two boilerplate revisions the job has shipped with.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleProfile {
    /// Also strips the conjunction `및` and every casing of `Copyright`.
    #[default]
    Extended,
    Basic,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewriteRule {
    pub pattern: String,
    #[serde(default)]
    pub replacement: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizerRules {
    pub literals: Vec<String>,
    pub patterns: Vec<RewriteRule>,
    pub cut_markers: Vec<String>,
}

impl NormalizerRules {
    pub fn for_profile(profile: RuleProfile) -> Self {
        let literals = LITERALS
            .iter()
            .filter(|(_, extended_only)| !extended_only || profile == RuleProfile::Extended)
            .map(|(literal, _)| literal.to_string())
            .collect();

        Self {
            literals,
            patterns: PATTERN_RULES
                .iter()
                .map(|(pattern, replacement)| RewriteRule {
                    pattern: pattern.to_string(),
                    replacement: replacement.to_string(),
                })
                .collect(),
            cut_markers: CUT_MARKERS.iter().map(|marker| marker.to_string()).collect(),
        }
    }

    pub fn with_extra_literals<I, S>(mut self, extra: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.literals.extend(extra.into_iter().map(Into::into));
        self
    }
}

impl Default for NormalizerRules {
    fn default() -> Self {
        Self::for_profile(RuleProfile::default())
    }
}

#[derive(Debug)]
struct CompiledRule {
    regex: Regex,
    replacement: String,
}

#[derive(Debug)]
pub struct Normalizer {
    literals: Vec<String>,
    patterns: Vec<CompiledRule>,
    cut_markers: Vec<String>,
}

impl Normalizer {
    pub fn new(rules: &NormalizerRules) -> Result<Self> {
        if rules.cut_markers.iter().any(|marker| marker.is_empty()) {
            return Err(PipelineError::Config(
                "normalizer cut markers must not be empty".to_string(),
            ));
        }

        let patterns = rules
            .patterns
            .iter()
            .map(|rule| {
                Ok(CompiledRule {
                    regex: Regex::new(&rule.pattern)?,
                    replacement: rule.replacement.clone(),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            literals: rules
                .literals
                .iter()
                .filter(|literal| !literal.is_empty())
                .cloned()
                .collect(),
            patterns,
            cut_markers: rules.cut_markers.clone(),
        })
    }

    /// Cleans `raw` until another pass would change nothing.
    ///
    /// A pass can expose new matches (removing a `!` can glue a name onto
    /// `기자`), so passes repeat while they keep shortening the text.
    pub fn normalize(&self, raw: &str) -> String {
        let mut current = self.apply_once(raw);
        loop {
            let next = self.apply_once(&current);
            if next.len() >= current.len() {
                return current;
            }
            current = next;
        }
    }

    fn apply_once(&self, text: &str) -> String {
        let mut result = text.to_string();

        for literal in &self.literals {
            if result.contains(literal.as_str()) {
                result = result.replace(literal.as_str(), "");
            }
        }

        for rule in &self.patterns {
            result = rule
                .regex
                .replace_all(&result, rule.replacement.as_str())
                .into_owned();
        }

        result.retain(|character| character != '.');

        if let Some(cut) = self
            .cut_markers
            .iter()
            .filter_map(|marker| result.find(marker.as_str()))
            .min()
        {
            result.truncate(cut);
        }

        result.trim().to_string()
    }
}
