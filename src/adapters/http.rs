use crate::{adapters, model};

pub struct HttpTransport {
    client: reqwest::blocking::Client,
}

impl HttpTransport {
    pub fn new() -> Self {
        Self {
            client: reqwest::blocking::Client::new(),
        }
    }
}

impl Default for HttpTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl adapters::Transport for HttpTransport {
    fn send(
        &self,
        req: &model::http::TransportRequest,
    ) -> Result<model::http::TransportResponse, model::error::StorageError> {
        let mut builder = self.client.request(req.method.clone(), &req.url);

        if !req.query.is_empty() {
            builder = builder.query(&req.query);
        }

        for (name, value) in &req.headers {
            builder = builder.header(name, value);
        }

        if let Some(body) = &req.body {
            builder = builder.body(body.clone());
        }

        let resp = builder.send()?;

        let status = resp.status().as_u16();
        let headers = resp
            .headers()
            .iter()
            .map(|(name, value)| {
                (
                    name.as_str().to_string(),
                    value.to_str().unwrap_or("").to_string(),
                )
            })
            .collect();
        let body = resp.bytes()?.to_vec();

        Ok(model::http::TransportResponse {
            status,
            headers,
            body,
        })
    }
}
