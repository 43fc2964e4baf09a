use serde::{Deserialize, Serialize};

/// Language tag attached to a detected code block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CodeLanguage {
    Rpg,
    Dds,
    Sql,
    Cl,
    Generic,
}

impl CodeLanguage {
    /// Maps a markdown fence tag (```rpgle, ```sql, ...) to a language.
    /// Returns `None` for an empty tag so the caller can fall back to guessing.
    pub fn from_fence_tag(tag: &str) -> Option<Self> {
        let tag = tag.trim().to_ascii_lowercase();
        if tag.is_empty() {
            return None;
        }

        let language = match tag.as_str() {
            "rpg" | "rpgle" | "sqlrpgle" | "rpg4" | "rpgiv" | "ile-rpg" => CodeLanguage::Rpg,
            "dds" | "dspf" | "pf" | "lf" | "prtf" => CodeLanguage::Dds,
            "sql" | "db2" | "db2sql" => CodeLanguage::Sql,
            "cl" | "clle" | "clp" | "cmd" => CodeLanguage::Cl,
            _ => CodeLanguage::Generic,
        };
        Some(language)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CodeLanguage::Rpg => "rpg",
            CodeLanguage::Dds => "dds",
            CodeLanguage::Sql => "sql",
            CodeLanguage::Cl => "cl",
            CodeLanguage::Generic => "generic",
        }
    }
}

impl std::fmt::Display for CodeLanguage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fence_tags() {
        assert_eq!(CodeLanguage::from_fence_tag("RPGLE"), Some(CodeLanguage::Rpg));
        assert_eq!(CodeLanguage::from_fence_tag("dspf"), Some(CodeLanguage::Dds));
        assert_eq!(CodeLanguage::from_fence_tag(" sql "), Some(CodeLanguage::Sql));
        assert_eq!(CodeLanguage::from_fence_tag("clle"), Some(CodeLanguage::Cl));
        assert_eq!(CodeLanguage::from_fence_tag("python"), Some(CodeLanguage::Generic));
        assert_eq!(CodeLanguage::from_fence_tag(""), None);
    }

    #[test]
    fn test_serializes_lowercase() {
        let json = serde_json::to_string(&CodeLanguage::Dds).unwrap();
        assert_eq!(json, "\"dds\"");
    }
}
