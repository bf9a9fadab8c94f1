use crate::error::{Result, RorError};
use regex::Regex;
use std::fmt;

/// Правило сопоставления поля `wm_class` или `title`.
///
/// `/.../` - регулярное выражение (ищется вхождение), всё остальное -
/// регистрозависимый поиск подстроки.
#[derive(Clone)]
pub enum MatchRule {
    Substring(String),
    Pattern(Regex),
}

impl MatchRule {
    pub fn parse(field: &str) -> Result<Self> {
        if field.len() >= 2 && field.starts_with('/') && field.ends_with('/') {
            let body = &field[1..field.len() - 1];
            let regex = Regex::new(body).map_err(|e| {
                RorError::config_line(format!("неверное регулярное выражение {}: {}", field, e))
            })?;
            return Ok(MatchRule::Pattern(regex));
        }
        Ok(MatchRule::Substring(field.to_string()))
    }

    pub fn is_empty(&self) -> bool {
        match self {
            MatchRule::Substring(needle) => needle.is_empty(),
            MatchRule::Pattern(_) => false,
        }
    }

    pub fn matches(&self, haystack: &str) -> bool {
        match self {
            MatchRule::Substring(needle) => haystack.contains(needle.as_str()),
            MatchRule::Pattern(regex) => regex.is_match(haystack),
        }
    }

    /// Исходный вид поля, как он записан в конфигурации
    pub fn source(&self) -> String {
        match self {
            MatchRule::Substring(needle) => needle.clone(),
            MatchRule::Pattern(regex) => format!("/{}/", regex.as_str()),
        }
    }
}

impl Default for MatchRule {
    fn default() -> Self {
        MatchRule::Substring(String::new())
    }
}

impl fmt::Debug for MatchRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchRule::Substring(needle) => write!(f, "Substring({:?})", needle),
            MatchRule::Pattern(regex) => write!(f, "Pattern(/{}/)", regex.as_str()),
        }
    }
}

impl PartialEq for MatchRule {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (MatchRule::Substring(a), MatchRule::Substring(b)) => a == b,
            (MatchRule::Pattern(a), MatchRule::Pattern(b)) => a.as_str() == b.as_str(),
            _ => false,
        }
    }
}
