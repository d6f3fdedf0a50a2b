// API client module: a small blocking HTTP client for the MyLittleWordLand
// backend. Only the three calls the occlusion workflow needs are wrapped:
// log-in, the learner dashboard and a course's entries.

use anyhow::{Context, Result};
use log::debug;
use reqwest::blocking::{Client, Response};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

pub const DEFAULT_BASE_URL: &str = "https://backend.mylittlewordland.com/api";
pub const AUTH_TOKEN_MAX_LEN: usize = 256;
pub const MAX_COURSES: usize = 100;

/// Blocking client holding the base URL and, once logged in, the bearer
/// token used for every other call.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    token: Option<String>,
}

/// Login request payload.
#[derive(Serialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Only `authToken` matters; the rest of the login response is ignored.
#[derive(Deserialize, Debug)]
struct LoginResponse {
    #[serde(rename = "authToken")]
    auth_token: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Course {
    pub id: i64,
    pub name: String,
}

impl ApiClient {
    /// Create an ApiClient configured from `MLWL_API_URL`, falling back to
    /// the public backend.
    pub fn from_env() -> Result<Self> {
        let base_url = std::env::var("MLWL_API_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.into());
        Self::new(&base_url)
    }

    pub fn new(base_url: &str) -> Result<Self> {
        let client = Client::builder()
            .build()
            .context("Failed to build HTTP client")?;
        Ok(ApiClient {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: None,
        })
    }

    pub fn set_token(&mut self, token: &str) {
        self.token = Some(token.to_string());
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    fn auth_headers(&self) -> Result<HeaderMap> {
        let token = self
            .token
            .as_deref()
            .context("Not logged in: no auth token available")?;
        let mut headers = HeaderMap::new();
        let val = HeaderValue::from_str(&format!("Bearer {}", token))
            .context("Auth token is not a valid header value")?;
        headers.insert(AUTHORIZATION, val);
        Ok(headers)
    }

    fn get_json(&self, path: &str, what: &str) -> Result<Value> {
        let url = format!("{}{}", &self.base_url, path);
        debug!("GET {}", url);
        let res = self
            .client
            .get(&url)
            .headers(self.auth_headers()?)
            .send()
            .with_context(|| format!("Failed to send {} request", what))?;
        let res = ensure_success(res, what)?;
        res.json()
            .with_context(|| format!("Parsing {} response json", what))
    }

    /// POST the credentials to `/log-in` and store the returned token.
    pub fn login(&mut self, creds: &Credentials) -> Result<String> {
        let url = format!("{}/log-in", &self.base_url);
        debug!("POST {}", url);
        let res = self
            .client
            .post(&url)
            .json(creds)
            .send()
            .context("Failed to send log-in request")?;
        let res = ensure_success(res, "Login")?;
        let resp: LoginResponse = res.json().context("Parsing log-in response json")?;
        let token = match resp.auth_token {
            Some(t) if !t.is_empty() && t.len() < AUTH_TOKEN_MAX_LEN => t,
            Some(_) => anyhow::bail!("Login failed: auth token has an unexpected length"),
            None => anyhow::bail!("Login failed: no auth token in response"),
        };
        self.set_token(&token);
        Ok(token)
    }

    /// Fetch the learner dashboard and pull the course list out of it.
    pub fn courses(&self) -> Result<Vec<Course>> {
        let body = self.get_json("/learner/dashboard", "dashboard")?;
        Ok(parse_courses(&body))
    }

    /// Fetch a course's entries and return the id of its second column.
    pub fn column_id(&self, course_id: i64) -> Result<Option<i64>> {
        let path = format!("/course/{}/entries", course_id);
        let body = self.get_json(&path, "course entries")?;
        Ok(parse_column_id(&body))
    }
}

fn ensure_success(res: Response, what: &str) -> Result<Response> {
    if !res.status().is_success() {
        let status = res.status();
        let txt = res.text().unwrap_or_else(|_| "".into());
        anyhow::bail!("{} failed: {} - {}", what, status, txt);
    }
    Ok(res)
}

/// Every object with an integer `id` and a string `name` counts as a
/// course, in document order.
pub fn parse_courses(body: &Value) -> Vec<Course> {
    let mut courses = Vec::new();
    collect_courses(body, &mut courses);
    courses
}

fn collect_courses(value: &Value, out: &mut Vec<Course>) {
    if out.len() >= MAX_COURSES {
        return;
    }
    match value {
        Value::Object(map) => {
            if let (Some(id), Some(name)) = (
                map.get("id").and_then(Value::as_i64),
                map.get("name").and_then(Value::as_str),
            ) {
                out.push(Course {
                    id,
                    name: name.to_string(),
                });
            }
            for child in map.values() {
                collect_courses(child, out);
            }
        }
        Value::Array(items) => {
            for item in items {
                collect_courses(item, out);
            }
        }
        _ => {}
    }
}

/// The first `columns` array found; the id of its second element.
pub fn parse_column_id(body: &Value) -> Option<i64> {
    let columns = find_key(body, "columns")?.as_array()?;
    columns.get(1)?.get("id")?.as_i64()
}

/// Depth-first in document order; an earlier nested array beats a later
/// sibling key.
fn find_key<'a>(value: &'a Value, key: &str) -> Option<&'a Value> {
    match value {
        Value::Object(map) => map.iter().find_map(|(k, v)| {
            if k == key && v.is_array() {
                Some(v)
            } else {
                find_key(v, key)
            }
        }),
        Value::Array(items) => items.iter().find_map(|v| find_key(v, key)),
        _ => None,
    }
}
