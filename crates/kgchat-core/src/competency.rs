//! Competency questions: the reference set loaded at startup and the validated
//! triples produced by the pipeline.

use serde::{Deserialize, Serialize};

/// Reference question paired with the query that answers it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompetencyQuestion {
    pub question: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search_terms: Option<Vec<String>>,
    pub query: String,
}

/// A question whose query was checked by an evaluator and accepted.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidatedCompetencyQuestion {
    pub question: String,
    pub query: String,
    pub expected_answer: String,
}

/// Evaluator's judgement of one answering run.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluationVerdict {
    pub feedback: String,
    pub accept: bool,
}

impl EvaluationVerdict {
    /// Render the verdict the way the feedback tool reports it:
    /// `{"feedback": "...", "accept": true}`.
    pub fn to_payload(&self) -> String {
        let feedback = serde_json::Value::String(self.feedback.clone());
        format!("{{\"feedback\": {feedback}, \"accept\": {}}}", self.accept)
    }

    pub fn from_payload(payload: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reference_questions_ignore_extra_fields() {
        let raw = r#"[{"question": "q", "query": "MATCH (n) RETURN n", "answer": "x", "notes": 1}]"#;
        let parsed: Vec<CompetencyQuestion> = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed[0].question, "q");
        assert!(parsed[0].search_terms.is_none());
    }

    #[test]
    fn validated_field_names() {
        let v = ValidatedCompetencyQuestion {
            question: "q".into(),
            query: "RETURN 1".into(),
            expected_answer: "1".into(),
        };
        let json = serde_json::to_value(&v).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"question": "q", "query": "RETURN 1", "expected_answer": "1"})
        );
    }

    #[test]
    fn verdict_payload_format() {
        let raw = r#"{"feedback": "Query is correct", "accept": true}"#;
        let v = EvaluationVerdict::from_payload(raw).unwrap();
        assert!(v.accept);
        assert_eq!(v.to_payload(), raw);
    }

    #[test]
    fn verdict_payload_escapes_feedback() {
        let v = EvaluationVerdict {
            feedback: "Missing \"LIMIT\"\nclause".into(),
            accept: false,
        };
        let parsed = EvaluationVerdict::from_payload(&v.to_payload()).unwrap();
        assert_eq!(parsed, v);
    }

    #[test]
    fn verdict_payload_rejects_missing_accept() {
        assert!(EvaluationVerdict::from_payload(r#"{"feedback": "ok"}"#).is_err());
    }
}
