// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

//! Scripted HTTP mock server for integration tests. Serves a fixed sequence
//! of canned responses and records every request it answered, so tests can
//! assert on methods, paths, headers and bodies after the fact.

use anyhow::{Result, anyhow};
use std::io::Read;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tiny_http::{Header, Response, Server};

const RECV_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CannedResponse {
    pub status: u16,
    pub body: String,
    pub content_type: &'static str,
}

impl CannedResponse {
    pub fn json(status: u16, body: &str) -> Self {
        Self {
            status,
            body: body.to_owned(),
            content_type: "application/json",
        }
    }

    /// Non-JSON payload, for exercising transport-error classification.
    pub fn text(status: u16, body: &str) -> Self {
        Self {
            status,
            body: body.to_owned(),
            content_type: "text/plain",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedRequest {
    pub method: String,
    pub url: String,
    pub authorization: Option<String>,
    pub content_type: Option<String>,
    pub body: String,
}

/// One-shot mock server bound to an ephemeral local port. Answers exactly the
/// scripted responses in order, then stops; an unexpected extra request times
/// out instead of hanging the test.
pub struct MockServer {
    base_url: String,
    handle: JoinHandle<Vec<RecordedRequest>>,
}

impl MockServer {
    pub fn serve(responses: Vec<CannedResponse>) -> Result<Self> {
        let server =
            Server::http("127.0.0.1:0").map_err(|error| anyhow!("start mock server: {error}"))?;
        let base_url = format!("http://{}", server.server_addr());

        let handle = thread::spawn(move || {
            let mut recorded = Vec::new();
            for canned in responses {
                let Ok(Some(mut request)) = server.recv_timeout(RECV_TIMEOUT) else {
                    break;
                };

                let mut body = String::new();
                let _ = request.as_reader().read_to_string(&mut body);
                recorded.push(RecordedRequest {
                    method: request.method().to_string(),
                    url: request.url().to_owned(),
                    authorization: header_value(&request, "Authorization"),
                    content_type: header_value(&request, "Content-Type"),
                    body,
                });

                let response = Response::from_string(canned.body)
                    .with_status_code(canned.status)
                    .with_header(
                        Header::from_bytes("Content-Type", canned.content_type)
                            .expect("valid content type header"),
                    );
                let _ = request.respond(response);
            }
            recorded
        });

        Ok(Self { base_url, handle })
    }

    pub fn single(response: CannedResponse) -> Result<Self> {
        Self::serve(vec![response])
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Joins the server thread and returns the requests it answered, in
    /// arrival order.
    pub fn finish(self) -> Vec<RecordedRequest> {
        self.handle.join().expect("mock server thread should join")
    }
}

// Header fields are case-insensitive per RFC 9110.
fn header_value(request: &tiny_http::Request, field: &str) -> Option<String> {
    request
        .headers()
        .iter()
        .find(|header| header.field.as_str().as_str().eq_ignore_ascii_case(field))
        .map(|header| header.value.as_str().to_owned())
}
