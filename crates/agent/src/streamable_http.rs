//! Raw MCP streamable-HTTP exchanges (POST a message, DELETE a session).

use futures::{StreamExt as _, stream::BoxStream};
use reqwest::header::{HeaderMap, HeaderValue};
use rmcp::model::{ClientJsonRpcMessage, ServerJsonRpcMessage};
use rmcp::transport::common::http_header::{
    EVENT_STREAM_MIME_TYPE, HEADER_SESSION_ID, JSON_MIME_TYPE,
};
use rmcp::transport::streamable_http_client::{StreamableHttpError, StreamableHttpPostResponse};

type HttpResult<T> = std::result::Result<T, StreamableHttpError<reqwest::Error>>;

fn header_to_string(h: &HeaderValue) -> Option<String> {
    h.to_str().ok().map(ToString::to_string)
}

fn content_type(headers: &HeaderMap) -> Option<String> {
    headers
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(header_to_string)
        .map(|s| s.split(';').next().unwrap_or(&s).trim().to_string())
}

pub(crate) async fn post_message(
    http: &reqwest::Client,
    uri: &str,
    message: &ClientJsonRpcMessage,
    session_id: Option<&str>,
    headers: &HeaderMap,
) -> HttpResult<StreamableHttpPostResponse> {
    let body = serde_json::to_vec(message)?;

    let mut req = http
        .post(uri)
        .header(reqwest::header::CONTENT_TYPE, JSON_MIME_TYPE)
        .header(
            reqwest::header::ACCEPT,
            format!("{JSON_MIME_TYPE}, {EVENT_STREAM_MIME_TYPE}"),
        )
        .headers(headers.clone())
        .body(body);
    if let Some(sid) = session_id {
        req = req.header(HEADER_SESSION_ID, sid);
    }

    let resp = req.send().await.map_err(StreamableHttpError::Client)?;
    let status = resp.status();

    if status == reqwest::StatusCode::ACCEPTED {
        return Ok(StreamableHttpPostResponse::Accepted);
    }
    if status.is_client_error() || status.is_server_error() {
        // Gateway errors (401 on a stale token, 4xx on bad input) carry their reason in the body.
        let body = resp
            .text()
            .await
            .unwrap_or_else(|e| format!("<response body unreadable: {e}>"));
        return Err(StreamableHttpError::UnexpectedServerResponse(
            format!("gateway http {status}: {}", body.trim()).into(),
        ));
    }

    let session_id = resp
        .headers()
        .get(HEADER_SESSION_ID)
        .and_then(header_to_string);

    match content_type(resp.headers()).as_deref() {
        Some(ct) if ct.eq_ignore_ascii_case(EVENT_STREAM_MIME_TYPE) => {
            let stream: BoxStream<'static, Result<sse_stream::Sse, sse_stream::Error>> =
                sse_stream::SseStream::from_bytes_stream(resp.bytes_stream()).boxed();
            Ok(StreamableHttpPostResponse::Sse(stream, session_id))
        }
        Some(ct) if ct.eq_ignore_ascii_case(JSON_MIME_TYPE) => {
            let msg: ServerJsonRpcMessage =
                resp.json().await.map_err(StreamableHttpError::Client)?;
            Ok(StreamableHttpPostResponse::Json(msg, session_id))
        }
        other => Err(StreamableHttpError::UnexpectedContentType(
            other.map(ToString::to_string),
        )),
    }
}

pub(crate) async fn delete_session(
    http: &reqwest::Client,
    uri: &str,
    session_id: &str,
    headers: &HeaderMap,
) -> HttpResult<()> {
    let resp = http
        .delete(uri)
        .headers(headers.clone())
        .header(HEADER_SESSION_ID, session_id)
        .send()
        .await
        .map_err(StreamableHttpError::Client)?;
    let status = resp.status();
    // 405: the server does not support explicit session termination.
    if !status.is_success() && status != reqwest::StatusCode::METHOD_NOT_ALLOWED {
        return Err(StreamableHttpError::UnexpectedServerResponse(
            format!("session delete returned http {status}").into(),
        ));
    }
    Ok(())
}
