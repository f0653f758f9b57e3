//! Notification / toast category
//!
//! Kind only decides how a surface presents a message (icon, colour).
//! The core never branches on it:
//! - Info: neutral status updates
//! - Success: an operation finished
//! - Warning: something needs attention soon (e.g. low oxygen in a pond)
//! - Error: an operation failed

use std::str::FromStr;

/// Presentation category shared by notifications and toasts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Kind {
    #[default]
    Info,
    Success,
    Warning,
    Error,
}

impl std::fmt::Display for Kind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl Kind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Kind::Info => "info",
            Kind::Success => "success",
            Kind::Warning => "warning",
            Kind::Error => "error",
        }
    }

    /// 终端输出用的图标
    pub fn icon(&self) -> &'static str {
        match self {
            Kind::Info => "ℹ️",
            Kind::Success => "✅",
            Kind::Warning => "⚠️",
            Kind::Error => "❌",
        }
    }
}

impl FromStr for Kind {
    type Err = String;

    /// 大小写不敏感，接受 `warn` 作为 `warning` 的简写
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "info" => Ok(Kind::Info),
            "success" => Ok(Kind::Success),
            "warning" | "warn" => Ok(Kind::Warning),
            "error" => Ok(Kind::Error),
            other => Err(format!(
                "unknown kind: {} (expected info, success, warning, error)",
                other
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_parse_case_insensitive() {
        assert_eq!("WARNING".parse::<Kind>().unwrap(), Kind::Warning);
        assert_eq!("warn".parse::<Kind>().unwrap(), Kind::Warning);
        assert_eq!(" Error ".parse::<Kind>().unwrap(), Kind::Error);
        assert!("critical".parse::<Kind>().is_err());
    }

    #[test]
    fn test_kind_serializes_lowercase() {
        let json = serde_json::to_string(&Kind::Success).unwrap();
        assert_eq!(json, "\"success\"");
        let parsed: Kind = serde_json::from_str("\"warning\"").unwrap();
        assert_eq!(parsed, Kind::Warning);
    }

    #[test]
    fn test_kind_display_matches_as_str() {
        assert_eq!(Kind::Info.to_string(), "info");
        assert_eq!(Kind::default(), Kind::Info);
    }
}
