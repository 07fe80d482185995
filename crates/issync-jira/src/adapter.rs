//! A `RemoteAdapter` over the Jira Cloud REST v3 API, built on
//! [`issync_transport::RetryingTransport`].

use base64::Engine;
use issync_transport::{RetryingTransport, TransportRequest};
use issync_types::TransitionCandidate;
use serde_json::{json, Value};

use issync_core::ports::{
    AccountRef, CreateIssueRequestWithDescription, CreatedIssue, NamedRef, RemoteAdapter, RemoteError, RemoteIssue,
    RemoteUpdateWithDescription, SearchPage, SearchResult,
};

const FIELDS: &str = "summary,description,labels,assignee,reporter,priority,issuetype,status,created,updated";

/// Talks to a single Jira Cloud site over basic auth (`email:api_token`).
/// The composite and the resulting header are both registered with the
/// underlying transport's redactor.
pub struct JiraAdapter {
    transport: RetryingTransport,
    base_url: String,
    auth_header: String,
}

impl JiraAdapter {
    pub fn new(base_url: impl Into<String>, email: &str, api_token: &str, transport: RetryingTransport) -> Self {
        let composite = format!("{email}:{api_token}");
        let encoded = base64::engine::general_purpose::STANDARD.encode(composite.as_bytes());
        let auth_header = format!("Basic {encoded}");
        let transport = transport.with_secret(api_token).with_secret(&composite).with_secret(&auth_header);
        Self { transport, base_url: base_url.into(), auth_header }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url.trim_end_matches('/'))
    }

    fn authed(&self, request: TransportRequest) -> TransportRequest {
        request.with_header("Authorization", self.auth_header.clone()).with_header("Accept", "application/json")
    }

    fn execute(&self, operation: &str, request: TransportRequest) -> Result<Value, RemoteError> {
        let response = self
            .transport
            .execute(&request)
            .map_err(|e| RemoteError::Transport { operation: operation.to_string(), message: e.to_string() })?;

        if response.status == 401 || response.status == 403 {
            return Err(RemoteError::Auth { operation: operation.to_string() });
        }
        if !response.is_success() {
            return Err(RemoteError::UnexpectedStatus {
                operation: operation.to_string(),
                status: response.status,
                message: response.text(),
            });
        }
        if response.body.is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_slice(&response.body).map_err(|e| RemoteError::UnexpectedStatus {
            operation: operation.to_string(),
            status: response.status,
            message: format!("invalid JSON response: {e}"),
        })
    }
}

fn named_ref(value: &Value, key: &str) -> Option<NamedRef> {
    value.get(key).and_then(|v| v.get("name")).and_then(Value::as_str).map(|s| NamedRef { name: s.to_string() })
}

fn account_ref(value: &Value, key: &str) -> Option<AccountRef> {
    let account = value.get(key)?;
    let id = account.get("accountId").and_then(Value::as_str)?.to_string();
    let display_name = account.get("displayName").and_then(Value::as_str).map(str::to_string);
    Some(AccountRef { id, display_name })
}

fn parse_issue(value: &Value) -> RemoteIssue {
    let key = value.get("key").and_then(Value::as_str).unwrap_or_default().to_string();
    let fields = value.get("fields").cloned().unwrap_or(Value::Null);

    RemoteIssue {
        key,
        summary: fields.get("summary").and_then(Value::as_str).unwrap_or_default().to_string(),
        description: fields.get("description").filter(|d| !d.is_null()).cloned(),
        labels: fields
            .get("labels")
            .and_then(Value::as_array)
            .map(|arr| arr.iter().filter_map(Value::as_str).map(str::to_string).collect())
            .unwrap_or_default(),
        assignee: account_ref(&fields, "assignee"),
        reporter: account_ref(&fields, "reporter"),
        priority: named_ref(&fields, "priority"),
        issue_type: named_ref(&fields, "issuetype").unwrap_or(NamedRef { name: String::new() }),
        status: named_ref(&fields, "status").unwrap_or(NamedRef { name: String::new() }),
        created: fields.get("created").and_then(Value::as_str).map(str::to_string),
        updated: fields.get("updated").and_then(Value::as_str).map(str::to_string),
    }
}

impl RemoteAdapter for JiraAdapter {
    fn search_issues(
        &self,
        query: &str,
        start_at: u64,
        max_results: u64,
        next_page_token: Option<&str>,
    ) -> Result<SearchResult, RemoteError> {
        let mut url = format!(
            "{}?jql={}&maxResults={max_results}&fields={FIELDS}",
            self.url("/rest/api/3/search"),
            urlencoding_encode(query)
        );
        match next_page_token {
            Some(token) => url.push_str(&format!("&nextPageToken={}", urlencoding_encode(token))),
            None => url.push_str(&format!("&startAt={start_at}")),
        }

        let body = self.execute("search_issues", self.authed(TransportRequest::get(url)))?;
        let issues = body
            .get("issues")
            .and_then(Value::as_array)
            .map(|arr| arr.iter().map(parse_issue).collect())
            .unwrap_or_default();

        Ok(SearchResult {
            page: SearchPage {
                start_at: body.get("startAt").and_then(Value::as_u64).unwrap_or(start_at),
                max_results: body.get("maxResults").and_then(Value::as_u64).unwrap_or(max_results),
                total: body.get("total").and_then(Value::as_u64).unwrap_or(0),
                next_page_token: body.get("nextPageToken").and_then(Value::as_str).map(str::to_string),
                is_last: body.get("isLast").and_then(Value::as_bool),
            },
            issues,
        })
    }

    fn get_issue(&self, key: &str) -> Result<RemoteIssue, RemoteError> {
        let url = format!("{}?fields={FIELDS}", self.url(&format!("/rest/api/3/issue/{key}")));
        let body = self.execute("get_issue", self.authed(TransportRequest::get(url)))?;
        Ok(parse_issue(&body))
    }

    fn create_issue(&self, request: CreateIssueRequestWithDescription) -> Result<CreatedIssue, RemoteError> {
        let mut fields = json!({
            "project": {"key": request.base.project_key},
            "issuetype": {"name": request.base.issue_type_name},
            "summary": request.base.summary,
        });
        let map = fields.as_object_mut().expect("object literal");
        if !request.base.labels.is_empty() {
            map.insert("labels".to_string(), json!(request.base.labels));
        }
        if let Some(account_id) = &request.base.assignee_account_id {
            map.insert("assignee".to_string(), json!({"accountId": account_id}));
        }
        if let Some(priority) = &request.base.priority_name {
            map.insert("priority".to_string(), json!({"name": priority}));
        }
        if let Some(description) = &request.description {
            map.insert("description".to_string(), description.clone());
        }

        let body_bytes = serde_json::to_vec(&json!({"fields": fields})).expect("request body always serializes");
        let req = self.authed(TransportRequest::new(reqwest::Method::POST, self.url("/rest/api/3/issue")).with_json_body(body_bytes));
        let response = self.execute("create_issue", req)?;

        Ok(CreatedIssue {
            id: response.get("id").and_then(Value::as_str).unwrap_or_default().to_string(),
            key: response.get("key").and_then(Value::as_str).unwrap_or_default().to_string(),
            self_url: response.get("self").and_then(Value::as_str).unwrap_or_default().to_string(),
        })
    }

    fn update_issue(&self, key: &str, update: RemoteUpdateWithDescription) -> Result<(), RemoteError> {
        let mut fields = serde_json::Map::new();
        if let Some(summary) = &update.fields.summary {
            fields.insert("summary".to_string(), json!(summary));
        }
        if let Some(labels) = &update.fields.labels {
            fields.insert("labels".to_string(), json!(labels));
        }
        if let Some(account_id) = &update.fields.assignee {
            fields.insert("assignee".to_string(), json!({"accountId": account_id}));
        }
        if let Some(priority) = &update.fields.priority {
            fields.insert("priority".to_string(), json!({"name": priority}));
        }
        if let Some(description) = &update.description {
            fields.insert("description".to_string(), description.clone());
        }

        let body_bytes = serde_json::to_vec(&json!({"fields": Value::Object(fields)})).expect("request body always serializes");
        let url = self.url(&format!("/rest/api/3/issue/{key}"));
        let req = self.authed(TransportRequest::new(reqwest::Method::PUT, url).with_json_body(body_bytes));
        self.execute("update_issue", req)?;
        Ok(())
    }

    fn list_transitions(&self, key: &str) -> Result<Vec<TransitionCandidate>, RemoteError> {
        let url = self.url(&format!("/rest/api/3/issue/{key}/transitions"));
        let body = self.execute("list_transitions", self.authed(TransportRequest::get(url)))?;
        let candidates = body
            .get("transitions")
            .and_then(Value::as_array)
            .map(|arr| {
                arr.iter()
                    .map(|t| TransitionCandidate {
                        id: t.get("id").and_then(Value::as_str).unwrap_or_default().to_string(),
                        name: t.get("name").and_then(Value::as_str).unwrap_or_default().to_string(),
                        to_status_name: t
                            .get("to")
                            .and_then(|to| to.get("name"))
                            .and_then(Value::as_str)
                            .unwrap_or_default()
                            .to_string(),
                    })
                    .collect()
            })
            .unwrap_or_default();
        Ok(candidates)
    }

    fn apply_transition(&self, key: &str, transition_id: &str) -> Result<(), RemoteError> {
        let body_bytes = serde_json::to_vec(&json!({"transition": {"id": transition_id}})).expect("request body always serializes");
        let url = self.url(&format!("/rest/api/3/issue/{key}/transitions"));
        let req = self.authed(TransportRequest::new(reqwest::Method::POST, url).with_json_body(body_bytes));
        self.execute("apply_transition", req)?;
        Ok(())
    }
}

/// Minimal percent-encoding for query parameters. `reqwest`'s URL parser
/// would do this for us on a `Url`, but the transport takes pre-built
/// strings, so query values are encoded by hand here.
fn urlencoding_encode(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for byte in raw.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => out.push(byte as char),
            _ => out.push_str(&format!("%{byte:02X}")),
        }
    }
    out
}
