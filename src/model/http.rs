use std::collections::HashMap;

use crate::model;

#[derive(Clone, Debug)]
pub struct TransportRequest {
    pub method: reqwest::Method,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub query: Vec<(String, String)>,
    pub body: Option<Vec<u8>>,
}

impl TransportRequest {
    pub fn new(method: reqwest::Method, url: String) -> Self {
        Self {
            method,
            url,
            headers: Vec::new(),
            query: Vec::new(),
            body: None,
        }
    }

    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    pub fn query(mut self, name: &str, value: &str) -> Self {
        self.query.push((name.to_string(), value.to_string()));
        self
    }

    pub fn body(mut self, body: Vec<u8>) -> Self {
        self.body = Some(body);
        self
    }

    pub fn header_value(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn query_value(&self, name: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }
}

// Header names are stored lowercased, matching what reqwest hands back.
#[derive(Clone, Debug)]
pub struct TransportResponse {
    pub status: u16,
    pub headers: HashMap<String, String>,
    pub body: Vec<u8>,
}

impl TransportResponse {
    pub fn new(status: u16) -> Self {
        Self {
            status,
            headers: HashMap::new(),
            body: Vec::new(),
        }
    }

    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.headers.insert(name.to_lowercase(), value.to_string());
        self
    }

    pub fn body(mut self, body: Vec<u8>) -> Self {
        self.body = body;
        self
    }

    pub fn header_value(&self, name: &str) -> Option<&str> {
        self.headers.get(&name.to_lowercase()).map(|v| v.as_str())
    }

    pub fn json<T: serde::de::DeserializeOwned>(&self) -> Result<T, model::error::StorageError> {
        serde_json::from_slice(&self.body).map_err(|err| model::error::StorageError::Protocol {
            status: self.status,
            message: format!("failed to parse response body: {}", err),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_lookups() {
        let req = TransportRequest::new(reqwest::Method::GET, "https://storage.test".to_string())
            .header("X-Auth-Token", "tok")
            .query("marker", "a/b.txt");

        assert_eq!(req.header_value("x-auth-token"), Some("tok"));
        assert_eq!(req.header_value("x-copy-from"), None);
        assert_eq!(req.query_value("marker"), Some("a/b.txt"));
        assert_eq!(req.query_value("limit"), None);
    }

    #[test]
    fn test_response_header_case() {
        let resp = TransportResponse::new(204).header("X-Storage-Url", "https://storage.test/v1");

        assert_eq!(resp.header_value("x-storage-url"), Some("https://storage.test/v1"));
        assert_eq!(resp.header_value("X-STORAGE-URL"), Some("https://storage.test/v1"));
    }

    #[test]
    fn test_response_json() {
        let resp = TransportResponse::new(200).body(b"[{\"name\":\"a/b.txt\"}]".to_vec());

        let entries: Vec<model::storage::ListEntry> = resp.json().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].name, "a/b.txt");

        let resp = TransportResponse::new(200).body(b"not json".to_vec());
        let result: Result<Vec<model::storage::ListEntry>, _> = resp.json();
        assert!(result.is_err());
    }
}
