//! Detection of plan-generation requests in outgoing chat text.

/// Matches chat text against a set of trigger phrases.
///
/// Both sides are normalized by removing all whitespace and lowercasing, and
/// a message matches when its normalized text contains any normalized
/// phrase. "일정 짜 줘", "일정짜줘!" and "Make a Plan" all match.
#[derive(Debug, Clone)]
pub struct TriggerMatcher {
    phrases: Vec<String>,
}

impl TriggerMatcher {
    pub fn new<I, S>(phrases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let phrases = phrases
            .into_iter()
            .map(|p| normalize(p.as_ref()))
            .filter(|p| !p.is_empty())
            .collect();
        Self { phrases }
    }

    pub fn matches(&self, text: &str) -> bool {
        let text = normalize(text);
        !text.is_empty() && self.phrases.iter().any(|p| text.contains(p.as_str()))
    }
}

pub fn normalize(text: &str) -> String {
    text.chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect()
}
