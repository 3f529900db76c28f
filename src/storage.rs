use std::{
    collections::{HashMap, HashSet},
    thread,
    time::{Duration, SystemTime},
};

use reqwest::Method;
use tracing::{debug, warn};

use crate::{adapters, config, model, util};

const MAX_ATTEMPTS: u32 = 10;

pub struct SwiftStorage {
    cfg: config::Config,
    transport: Box<dyn adapters::Transport>,
    session: Option<model::storage::Session>,
    known: HashSet<String>,
}

impl SwiftStorage {
    pub fn new(cfg: config::Config, transport: Box<dyn adapters::Transport>) -> Self {
        Self {
            cfg,
            transport,
            session: None,
            known: HashSet::new(),
        }
    }

    pub fn read(
        &mut self,
        name: &str,
    ) -> Result<model::storage::StorageFile, model::error::StorageError> {
        debug!(name = %name, "read");

        let resp = self.call(|session, cfg| {
            model::http::TransportRequest::new(Method::GET, object_url(session, cfg, name))
                .header("X-Auth-Token", &session.token)
        })?;

        if resp.status == 404 {
            warn!(name = %name, "object not found");
            return Err(model::error::StorageError::NotFound(name.to_string()));
        }

        if !(200..400).contains(&resp.status) {
            return Err(protocol_error("read", name, &resp));
        }

        Ok(model::storage::StorageFile {
            name: util::path::basename(name).to_string(),
            content: resp.body,
        })
    }

    pub fn write(
        &mut self,
        name: &str,
        content: &[u8],
    ) -> Result<(), model::error::StorageError> {
        debug!(name = %name, size = content.len(), "write");

        let resp = self.call(|session, cfg| {
            model::http::TransportRequest::new(Method::PUT, object_url(session, cfg, name))
                .header("X-Auth-Token", &session.token)
                .body(content.to_vec())
        })?;

        if resp.status != 201 {
            return Err(protocol_error("write", name, &resp));
        }

        if self.cfg.use_cache {
            self.known.insert(name.to_string());
        }

        Ok(())
    }

    pub fn headers(
        &mut self,
        name: &str,
    ) -> Result<Option<HashMap<String, String>>, model::error::StorageError> {
        let resp = self.call(|session, cfg| {
            model::http::TransportRequest::new(Method::HEAD, object_url(session, cfg, name))
                .header("X-Auth-Token", &session.token)
        })?;

        match resp.status {
            404 => Ok(None),
            200 => Ok(Some(resp.headers)),
            _ => Err(protocol_error("head", name, &resp)),
        }
    }

    pub fn exists(&mut self, name: &str) -> Result<bool, model::error::StorageError> {
        let result = if !self.cfg.use_cache {
            self.headers(name)?.is_some()
        } else if self.known.contains(name) {
            true
        } else {
            let found = self.headers(name)?.is_some();
            if found {
                self.known.insert(name.to_string());
            }
            found
        };

        debug!(name = %name, exists = result, "exists");
        Ok(result)
    }

    pub fn size(&mut self, name: &str) -> Result<u64, model::error::StorageError> {
        debug!(name = %name, "size");

        let headers = self
            .headers(name)?
            .ok_or_else(|| model::error::StorageError::NotFound(name.to_string()))?;

        let length = headers
            .get("content-length")
            .ok_or_else(|| model::error::StorageError::Protocol {
                status: 200,
                message: format!("missing content-length for: {}", name),
            })?;

        length
            .parse()
            .map_err(|_| model::error::StorageError::Protocol {
                status: 200,
                message: format!("bad content-length for: {}, {}", name, length),
            })
    }

    pub fn modified_time(
        &mut self,
        name: &str,
    ) -> Result<SystemTime, model::error::StorageError> {
        debug!(name = %name, "modified_time");

        let headers = self
            .headers(name)?
            .ok_or_else(|| model::error::StorageError::NotFound(name.to_string()))?;

        let stamp = headers
            .get("x-timestamp")
            .ok_or_else(|| model::error::StorageError::Protocol {
                status: 200,
                message: format!("missing x-timestamp for: {}", name),
            })?;

        let secs: f64 = stamp
            .parse()
            .map_err(|_| model::error::StorageError::Protocol {
                status: 200,
                message: format!("bad x-timestamp for: {}, {}", name, stamp),
            })?;
        let offset =
            Duration::try_from_secs_f64(secs).map_err(|_| model::error::StorageError::Protocol {
                status: 200,
                message: format!("bad x-timestamp for: {}, {}", name, stamp),
            })?;

        Ok(SystemTime::UNIX_EPOCH + offset)
    }

    pub fn url(&mut self, name: &str) -> Result<String, model::error::StorageError> {
        if let Some(base) = &self.cfg.container_url {
            return Ok(format!(
                "{}/{}",
                base.trim_end_matches('/'),
                util::path::clean_name(name)
            ));
        }

        let session = self.session()?;
        Ok(object_url(&session, &self.cfg, name))
    }

    pub fn copy(&mut self, src: &str, dst: &str) -> Result<(), model::error::StorageError> {
        debug!(src = %src, dst = %dst, "copy");

        let resp = self.call(|session, cfg| {
            model::http::TransportRequest::new(Method::PUT, object_url(session, cfg, dst))
                .header("X-Auth-Token", &session.token)
                .header(
                    "X-Copy-From",
                    &format!("/{}/{}", cfg.container, util::path::clean_name(src)),
                )
        })?;

        if resp.status != 201 {
            return Err(protocol_error("copy", dst, &resp));
        }

        Ok(())
    }

    /// Best-effort move: copy then delete, not atomic. A failure between the
    /// two legs leaves the object present under both names.
    pub fn rename(&mut self, src: &str, dst: &str) -> Result<(), model::error::StorageError> {
        self.copy(src, dst)?;
        self.delete(src)
    }

    pub fn list(
        &mut self,
        path: &str,
    ) -> Result<model::storage::Listing, model::error::StorageError> {
        debug!(path = %path, "list");

        let path = util::path::clean_name(path).to_string();
        if !path.is_empty() && !path.ends_with('/') {
            return Err(model::error::StorageError::InvalidPath(path));
        }

        let mut listing = model::storage::Listing::default();
        for entry in self.list_pages(&path)? {
            let rest = entry
                .name
                .strip_prefix(path.as_str())
                .unwrap_or(entry.name.as_str());

            let mut bits = rest.splitn(2, '/');
            let first = bits.next().unwrap_or("");
            if bits.next().is_none() {
                listing.files.push(first.to_string());
            } else if !listing.dirs.iter().any(|dir| dir == first) {
                listing.dirs.push(first.to_string());
            }
        }

        Ok(listing)
    }

    pub fn delete(&mut self, name: &str) -> Result<(), model::error::StorageError> {
        debug!(name = %name, "delete");

        let resp = self.call(|session, cfg| {
            model::http::TransportRequest::new(Method::DELETE, object_url(session, cfg, name))
                .header("X-Auth-Token", &session.token)
        })?;

        // 404 is success, the object is gone either way
        if resp.status != 404 && resp.status != 204 {
            return Err(protocol_error("delete", name, &resp));
        }

        if self.cfg.use_cache {
            self.known.remove(name);
        }

        Ok(())
    }

    fn list_pages(
        &mut self,
        path: &str,
    ) -> Result<Vec<model::storage::ListEntry>, model::error::StorageError> {
        let mut entries = Vec::new();
        let mut marker = String::new();

        loop {
            let resp = self.call(|session, cfg| {
                model::http::TransportRequest::new(Method::GET, object_url(session, cfg, ""))
                    .query("path", path)
                    .query("format", "json")
                    .query("marker", &marker)
                    .query("limit", "500")
                    .header("X-Auth-Token", &session.token)
            })?;

            if resp.status == 204 {
                break;
            }

            if !(200..300).contains(&resp.status) {
                return Err(protocol_error("list", path, &resp));
            }

            let page: Vec<model::storage::ListEntry> = resp.json()?;
            let last = match page.last() {
                None => break,
                Some(last) => last,
            };

            marker = last.name.clone();
            entries.extend(page);
        }

        Ok(entries)
    }

    // Retry loop shared by every operation. 401/407 drops the session so the
    // next iteration reauthenticates; 503 backs off and retries; anything
    // else falls through to the caller's own status check.
    fn call<F>(
        &mut self,
        build: F,
    ) -> Result<model::http::TransportResponse, model::error::StorageError>
    where
        F: Fn(&model::storage::Session, &config::Config) -> model::http::TransportRequest,
    {
        let mut attempt = 0;
        let resp = loop {
            let session = self.session()?;
            let req = build(&session, &self.cfg);
            let resp = self.transport.send(&req)?;

            attempt += 1;
            if attempt >= MAX_ATTEMPTS {
                break resp;
            }

            match resp.status {
                401 | 407 => {
                    debug!(status = resp.status, "token rejected, reauthenticating");
                    self.session = None;
                }
                503 => {
                    warn!(body = %String::from_utf8_lossy(&resp.body), "service unavailable, backing off");
                    thread::sleep(backoff_delay(attempt));
                }
                _ => break resp,
            }
        };

        match resp.status {
            401 | 407 => Err(model::error::StorageError::Unauthorized),
            503 => Err(model::error::StorageError::ServiceUnavailable { attempts: attempt }),
            _ => Ok(resp),
        }
    }

    fn session(
        &mut self,
    ) -> Result<model::storage::Session, model::error::StorageError> {
        if let Some(session) = &self.session {
            return Ok(session.clone());
        }

        let session = self.authenticate()?;
        self.session = Some(session.clone());
        Ok(session)
    }

    fn authenticate(&self) -> Result<model::storage::Session, model::error::StorageError> {
        debug!(auth_url = %self.cfg.auth_url, "authenticating");

        let req = model::http::TransportRequest::new(Method::GET, self.cfg.auth_url.clone())
            .header("X-Auth-User", &self.cfg.user)
            .header("X-Auth-Key", &self.cfg.key);
        let resp = self.transport.send(&req)?;

        if resp.status != 204 {
            return Err(protocol_error("authenticate", &self.cfg.auth_url, &resp));
        }

        let storage_url = auth_header(&resp, "x-storage-url")?
            .trim_end_matches('/')
            .to_string();
        let token = auth_header(&resp, "x-auth-token")?.to_string();

        Ok(model::storage::Session { storage_url, token })
    }
}

fn object_url(
    session: &model::storage::Session,
    cfg: &config::Config,
    name: &str,
) -> String {
    format!(
        "{}/{}/{}",
        session.storage_url,
        cfg.container,
        util::path::clean_name(name)
    )
}

fn auth_header<'r>(
    resp: &'r model::http::TransportResponse,
    name: &str,
) -> Result<&'r str, model::error::StorageError> {
    resp.header_value(name)
        .ok_or_else(|| model::error::StorageError::Protocol {
            status: resp.status,
            message: format!("missing {} header in auth response", name),
        })
}

fn protocol_error(
    op: &str,
    subject: &str,
    resp: &model::http::TransportResponse,
) -> model::error::StorageError {
    model::error::StorageError::Protocol {
        status: resp.status,
        message: format!(
            "failed to {}: {}, {}",
            op,
            subject,
            String::from_utf8_lossy(&resp.body)
        ),
    }
}

fn backoff_delay(attempt: u32) -> Duration {
    Duration::from_secs(attempt as u64)
}
