//! Contains bindings for the elasticsearch API,
//! used to make working with responses more ergonomic

/// Source: `https://www.elastic.co/guide/en/elasticsearch/reference/7.10/search-search.html#search-api-response-body`
pub mod search {
    use serde::{Deserialize, Serialize};
    use serde_json::Value;

    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct Response {
        pub took: Option<i64>,
        pub timed_out: Option<bool>,
        #[serde(rename = "_shards")]
        pub shards: Option<Shards>,
        pub hits: Hits,
    }

    impl Response {
        /// Unwraps the envelope into the `_source` documents,
        /// in the same order the hits were returned
        pub fn into_sources(self) -> Vec<Value> {
            self.hits.hits.into_iter().map(|hit| hit.source).collect()
        }
    }

    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct Shards {
        pub total: i64,
        pub successful: i64,
        #[serde(default)]
        pub skipped: i64,
        pub failed: i64,
    }

    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct Hits {
        pub total: Option<HitsTotal>,
        pub max_score: Option<f64>,
        #[serde(default)]
        pub hits: Vec<HitObject>,
    }

    /// Servers before 7.0 report the total as a bare number
    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    #[serde(untagged)]
    pub enum HitsTotal {
        Count(i64),
        Tracked {
            value: i64,
            relation: HitsTotalRelation,
        },
    }

    impl HitsTotal {
        pub const fn value(&self) -> i64 {
            match self {
                Self::Count(value) | Self::Tracked { value, .. } => *value,
            }
        }
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
    pub enum HitsTotalRelation {
        #[serde(rename = "eq")]
        Accurate,
        #[serde(rename = "gte")]
        LowerBound,
    }

    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct HitObject {
        #[serde(rename = "_index")]
        pub index: Option<String>,
        #[serde(rename = "_type")]
        pub hit_type: Option<String>,
        #[serde(rename = "_id")]
        pub id: Option<String>,
        #[serde(rename = "_score")]
        pub score: Option<f64>,
        // Missing when `_source` is disabled or filtered out entirely
        #[serde(rename = "_source", default)]
        pub source: Value,
    }

}

/// Source: `https://www.elastic.co/guide/en/elasticsearch/reference/current/docs-bulk.html#bulk-api-response-body`
pub mod bulk {
    use elasticsearch::http::StatusCode;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct Response {
        pub took: i64,
        pub errors: bool,
        #[serde(default)]
        pub items: Vec<ResultItem>,
    }

    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct ResultItem {
        pub create: Option<ResultItemAction>,
        pub delete: Option<ResultItemAction>,
        pub index: Option<ResultItemAction>,
        pub update: Option<ResultItemAction>,
    }

    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct ResultItemAction {
        #[serde(rename = "_index")]
        pub index: String,
        // Removed in 8.0
        #[serde(rename = "_type")]
        pub r#type: Option<String>,
        #[serde(rename = "_id")]
        pub id: Option<String>,
        #[serde(rename = "_version")]
        pub version: Option<i64>,
        pub result: Option<String>,
        #[serde(rename = "_shards")]
        pub shards: Option<Shards>,
        #[serde(rename = "_seq_no")]
        pub seq_no: Option<i64>,
        #[serde(rename = "_primary_term")]
        pub primary_term: Option<i64>,
        #[serde(with = "serde_status_code")]
        pub status: StatusCode,
        pub error: Option<Error>,
    }

    mod serde_status_code {
        use elasticsearch::http::StatusCode;
        use serde::Deserialize;

        pub fn deserialize<'de, D>(deserializer: D) -> Result<StatusCode, D::Error>
        where
            D: serde::Deserializer<'de>,
        {
            StatusCode::from_u16(u16::deserialize(deserializer)?).map_err(serde::de::Error::custom)
        }

        pub fn serialize<S>(status_code: &StatusCode, serializer: S) -> Result<S::Ok, S::Error>
        where
            S: serde::Serializer,
        {
            serializer.serialize_u16(status_code.as_u16())
        }
    }

    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct Shards {
        pub total: i64,
        pub successful: i64,
        pub failed: i64,
    }

    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct Error {
        pub r#type: String,
        pub reason: Option<String>,
        pub index_uuid: Option<String>,
        pub shard: Option<String>,
        pub index: Option<String>,
    }

    /// From https://github.com/elastic/elasticsearch/blob/7.13/docs/reference/docs/bulk.asciidoc#api-examples-title
    #[test]
    fn response_deserializes_example_1() {
        let response = serde_json::from_value::<Response>(serde_json::json!({
           "took": 30,
           "errors": false,
           "items": [
              {
                 "index": {
                    "_index": "test",
                    "_type": "_doc",
                    "_id": "1",
                    "_version": 1,
                    "result": "created",
                    "_shards": {
                       "total": 2,
                       "successful": 1,
                       "failed": 0
                    },
                    "status": 201,
                    "_seq_no" : 0,
                    "_primary_term": 1
                 }
              },
              {
                 "delete": {
                    "_index": "test",
                    "_type": "_doc",
                    "_id": "2",
                    "_version": 1,
                    "result": "not_found",
                    "_shards": {
                       "total": 2,
                       "successful": 1,
                       "failed": 0
                    },
                    "status": 404,
                    "_seq_no" : 1,
                    "_primary_term" : 2
                 }
              }
           ]
        }))
        .unwrap();

        assert_eq!(response.items.len(), 2);
        assert_eq!(
            response.items[1].delete.as_ref().map(|action| action.status),
            Some(StatusCode::NOT_FOUND)
        );
    }

    /// From https://github.com/elastic/elasticsearch/blob/7.13/docs/reference/docs/bulk.asciidoc#example-with-failed-actions
    #[test]
    fn response_deserializes_example_2() {
        let response = serde_json::from_value::<Response>(serde_json::json!({
          "took": 486,
          "errors": true,
          "items": [
            {
              "update": {
                "_index": "index1",
                "_type" : "_doc",
                "_id": "5",
                "status": 404,
                "error": {
                  "type": "document_missing_exception",
                  "reason": "[_doc][5]: document missing",
                  "index_uuid": "aAsFqTI0Tc2W0LCWgPNrOA",
                  "shard": "0",
                  "index": "index1"
                }
              }
            },
            {
              "create": {
                "_index": "index1",
                "_id": "7",
                "_version": 1,
                "result": "created",
                "_shards": {
                  "total": 2,
                  "successful": 1,
                  "failed": 0
                },
                "_seq_no": 0,
                "_primary_term": 1,
                "status": 201
              }
            }
          ]
        }))
        .unwrap();

        assert!(response.errors);
        let failed = response.items[0].update.as_ref().unwrap();
        assert_eq!(
            failed.error.as_ref().map(|err| err.r#type.as_str()),
            Some("document_missing_exception")
        );
        assert_eq!(response.items[1].create.as_ref().unwrap().r#type, None);
    }
}
