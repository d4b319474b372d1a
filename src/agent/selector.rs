//! Per-request model profile selection.
//!
//! Requests may name a profile, ask for `"auto"`, or say nothing (general).

use std::sync::OnceLock;

use regex::RegexSet;

use crate::llm::{ModelProfiles, CODE, GENERAL, REASONING};

pub const AUTO: &str = "auto";

/// Queries longer than this usually need deeper thought.
const LONG_QUERY_CHARS: usize = 500;

/// Kind of request, used to tailor the system prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    General,
    Code,
    Reasoning,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub profile: String,
    pub category: Category,
    pub reason: &'static str,
}

impl Selection {
    fn new(profile: &str, category: Category, reason: &'static str) -> Self {
        Self {
            profile: profile.to_string(),
            category,
            reason,
        }
    }
}

fn code_patterns() -> &'static RegexSet {
    static PATTERNS: OnceLock<RegexSet> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        RegexSet::new([
            r"(?i)\b(code|function|implement|debug|refactor|script|program|algorithm)\b",
            r"(?i)\b(python|javascript|typescript|react|vue|angular|java|rust|go|ruby|php|swift|kotlin)\b|c\+\+",
            r"```",
            r"(?i)\b(fix|solve|patch)\s+(the|this|a|my)?\s*(bug|error|issue|problem)",
            r"(?i)\b(api|endpoint|database|query|sql|json|xml|html|css)\b",
            r"(?i)\b(write|create|build|generate)\s+(a|the|some)?\s*(code|function|class|component|module)",
        ])
        .expect("code patterns are valid")
    })
}

fn reasoning_patterns() -> &'static RegexSet {
    static PATTERNS: OnceLock<RegexSet> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        RegexSet::new([
            r"(?i)\b(analyze|compare|evaluate|assess|examine|critique|review)\b",
            r"(?i)\b(explain\s+(why|how)|how\s+does\s+.+\s+work|what\s+causes)\b",
            r"(?i)\b(pros|cons|advantages|disadvantages|trade-?offs|benefits|drawbacks)\b",
            r"(?i)\b(research|investigate|deep\s*dive|break\s*down|summarize)\b",
            r"(?i)\b(implications|consequences|considerations|factors|aspects)\b",
            r"(?i)\b(strategy|approach|methodology|framework|architecture)\b",
        ])
        .expect("reasoning patterns are valid")
    })
}

/// Classify a query by its wording.
pub fn classify(query: &str) -> Selection {
    if code_patterns().is_match(query) {
        return Selection::new(CODE, Category::Code, "Code-related query");
    }
    if reasoning_patterns().is_match(query) {
        return Selection::new(REASONING, Category::Reasoning, "Complex reasoning detected");
    }
    if query.chars().count() > LONG_QUERY_CHARS {
        return Selection::new(REASONING, Category::Reasoning, "Complex query detected");
    }
    Selection::new(GENERAL, Category::General, "General query")
}

/// Resolve the requested model into a profile and prompt category.
pub fn select(requested: Option<&str>, query: &str, profiles: &ModelProfiles) -> Selection {
    match requested.map(str::trim) {
        None | Some("") => Selection::new(GENERAL, Category::General, "Default profile"),
        Some(AUTO) => classify(query),
        Some(name) => {
            let profile = &profiles.get(name).name;
            let category = match profile.as_str() {
                CODE => Category::Code,
                REASONING => Category::Reasoning,
                _ => Category::General,
            };
            Selection::new(profile, category, "Requested profile")
        }
    }
}
