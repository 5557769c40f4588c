use std::collections::BTreeMap;
use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, instrument, warn};

use crate::budget::{BudgetExceeded, BudgetSubject, ResponseBudget};

/// One search hit reduced to the fields the model needs. Fields missing from
/// the upstream hit stay missing.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub in_taxon_label: Option<Value>,
}

#[derive(Debug, Default, Deserialize)]
struct SearchPage {
    #[serde(default)]
    items: Vec<SearchHit>,
}

/// Results keyed by term, with the serialized form handed to the model.
#[derive(Clone, Debug)]
pub struct SearchOutput {
    pub results: BTreeMap<String, Vec<SearchHit>>,
    pub payload: String,
    pub tokens: u32,
}

#[derive(Clone, Debug)]
pub struct SearchConfig {
    /// Full search endpoint, e.g. `https://api-v3.monarchinitiative.org/v3/api/search`.
    pub url: String,
    pub page_size: u32,
    pub timeout: Duration,
}

/// Keyword lookups against the external search API, one request per term.
pub struct KeywordSearchClient {
    client: Client,
    config: SearchConfig,
    budget: ResponseBudget,
}

impl KeywordSearchClient {
    pub fn new(config: SearchConfig, budget: ResponseBudget) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("kgchat/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            client,
            config,
            budget,
        })
    }

    /// Look up every term in order. A failed lookup leaves that term with an
    /// empty list; only the aggregate size can fail the call.
    #[instrument(skip(self, terms), fields(terms = terms.len()))]
    pub async fn search(&self, terms: &[String]) -> Result<SearchOutput, BudgetExceeded> {
        let mut results = BTreeMap::new();
        for term in terms {
            let hits = self.lookup(term).await;
            debug!(term = %term, hits = hits.len(), "search term resolved");
            results.insert(term.clone(), hits);
        }

        let payload = serde_json::to_string(&results).unwrap_or_else(|_| "{}".into());
        let tokens = self.budget.check(&payload, BudgetSubject::Search)?;
        Ok(SearchOutput {
            results,
            payload,
            tokens,
        })
    }

    async fn lookup(&self, term: &str) -> Vec<SearchHit> {
        let limit = self.config.page_size.to_string();
        let response = match self
            .client
            .get(&self.config.url)
            .query(&[("q", term), ("limit", limit.as_str()), ("offset", "0")])
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                warn!(term, error = %e, "search request failed");
                return Vec::new();
            }
        };

        if !response.status().is_success() {
            warn!(term, status = response.status().as_u16(), "search returned error status");
            return Vec::new();
        }

        match response.json::<SearchPage>().await {
            Ok(page) => page.items,
            Err(e) => {
                warn!(term, error = %e, "search response was not understood");
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer, limit: u32) -> KeywordSearchClient {
        KeywordSearchClient::new(
            SearchConfig {
                url: format!("{}/v3/api/search", server.uri()),
                page_size: 5,
                timeout: Duration::from_secs(5),
            },
            ResponseBudget::new(limit),
        )
        .unwrap()
    }

    fn terms(items: &[&str]) -> Vec<String> {
        items.iter().map(|t| t.to_string()).collect()
    }

    #[tokio::test]
    async fn slims_hits_and_keeps_empty_terms() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v3/api/search"))
            .and(query_param("q", "CARD9"))
            .and(query_param("limit", "5"))
            .and(query_param("offset", "0"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "limit": 5,
                "offset": 0,
                "total": 1,
                "items": [{
                    "id": "HGNC:16391",
                    "category": "biolink:Gene",
                    "name": "CARD9",
                    "in_taxon_label": "Homo sapiens",
                    "description": "caspase recruitment domain family member 9",
                    "synonym": ["CANDF2"]
                }]
            })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(query_param("q", "nonexistent-xyz"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"items": []})))
            .expect(1)
            .mount(&server)
            .await;

        let out = client(&server, 10_000)
            .search(&terms(&["CARD9", "nonexistent-xyz"]))
            .await
            .unwrap();

        assert_eq!(out.results.len(), 2);
        assert!(out.results["nonexistent-xyz"].is_empty());
        let hit = serde_json::to_value(&out.results["CARD9"][0]).unwrap();
        assert_eq!(
            hit,
            json!({
                "id": "HGNC:16391",
                "category": "biolink:Gene",
                "name": "CARD9",
                "in_taxon_label": "Homo sapiens"
            })
        );
        assert!(!out.payload.contains("description"));
    }

    #[tokio::test]
    async fn absent_fields_stay_absent() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "items": [{"id": "MONDO:0009061", "name": "cystic fibrosis"}]
            })))
            .mount(&server)
            .await;

        let out = client(&server, 10_000).search(&terms(&["cystic fibrosis"])).await.unwrap();
        let hit = serde_json::to_value(&out.results["cystic fibrosis"][0]).unwrap();
        assert_eq!(hit, json!({"id": "MONDO:0009061", "name": "cystic fibrosis"}));
    }

    #[tokio::test]
    async fn failed_term_does_not_abort_batch() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(query_param("q", "broken"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(query_param("q", "garbled"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(query_param("q", "BRAF"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "items": [{"id": "HGNC:1097", "name": "BRAF"}]
            })))
            .mount(&server)
            .await;

        let out = client(&server, 10_000)
            .search(&terms(&["broken", "garbled", "BRAF"]))
            .await
            .unwrap();
        assert!(out.results["broken"].is_empty());
        assert!(out.results["garbled"].is_empty());
        assert_eq!(out.results["BRAF"].len(), 1);
    }

    #[tokio::test]
    async fn budget_applies_to_aggregate() {
        let server = MockServer::start().await;
        let items: Vec<_> = (0..5)
            .map(|i| json!({"id": format!("MONDO:{i:07}"), "name": "a fairly long disease name"}))
            .collect();
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"items": items})))
            .mount(&server)
            .await;

        let search = client(&server, 150);
        // One term alone fits; three together do not.
        assert!(search.search(&terms(&["a"])).await.is_ok());
        let err = search.search(&terms(&["a", "b", "c"])).await.unwrap_err();
        assert!(err.tokens > 150);
        assert!(err.to_string().ends_with("Please try a smaller search."));
    }
}
