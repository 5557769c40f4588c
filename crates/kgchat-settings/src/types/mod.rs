//! Settings type definitions.
//!
//! All types use camelCase JSON keys. Every section is `#[serde(default)]` so a
//! partial file only needs the keys it changes. Secrets are never serialized.

mod runtime;
mod services;

pub use runtime::*;
pub use services::*;

use serde::{Deserialize, Serialize};

/// Root settings type.
///
/// ```json
/// {
///   "llm": { "model": "gpt-4o" },
///   "graph": { "url": "http://neo4j.internal:7474" },
///   "agent": { "maxResponseTokens": 8000 }
/// }
/// ```
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct KgchatSettings {
    /// Completion engine connection.
    pub llm: LlmSettings,
    /// Graph database connection.
    pub graph: GraphSettings,
    /// Keyword search endpoint.
    pub search: SearchSettings,
    /// Agent loop limits and tool budgets.
    pub agent: AgentSettings,
    /// Agent catalog inputs and pricing.
    pub catalog: CatalogSettings,
    /// Logging configuration.
    pub logging: LoggingSettings,
    /// Where user-facing artifacts are written.
    pub output: OutputSettings,
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    #[test]
    fn secrets_never_serialized() {
        let mut settings = KgchatSettings::default();
        settings.llm.api_key = Some("sk-test".into());
        settings.graph.password = Some("hunter2".into());
        let json = serde_json::to_string(&settings).unwrap();
        assert!(!json.contains("sk-test"));
        assert!(!json.contains("hunter2"));
    }

    #[test]
    fn secrets_deserialize_from_file_shape() {
        let settings: KgchatSettings =
            serde_json::from_str(r#"{"llm": {"apiKey": "sk-file"}}"#).unwrap();
        assert_eq!(
            settings.llm.api_key.as_ref().unwrap().expose_secret(),
            "sk-file"
        );
        assert_eq!(settings.llm.model, "gpt-4-1106-preview");
    }

    #[test]
    fn camel_case_keys() {
        let json = serde_json::to_value(KgchatSettings::default()).unwrap();
        assert!(json["agent"].get("maxResponseTokens").is_some());
        assert!(json["llm"].get("baseUrl").is_some());
        assert!(json["catalog"].get("promptCostPer1k").is_some());
    }
}
