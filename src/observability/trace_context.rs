//! W3C Trace Context propagation.
//!
//! Handles the `traceparent` header (`{version}-{trace_id}-{span_id}-{flags}`)
//! and carries `tracestate` through untouched. See
//! <https://www.w3.org/TR/trace-context/>.

use axum::http::{HeaderMap, HeaderValue};
use thiserror::Error;
use uuid::Uuid;

pub const TRACEPARENT: &str = "traceparent";
pub const TRACESTATE: &str = "tracestate";

const TRACE_ID_LEN: usize = 32;
const SPAN_ID_LEN: usize = 16;
const FLAG_SAMPLED: u8 = 0x01;

/// Reasons a `traceparent` header is rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TraceParseError {
    #[error("traceparent must have 4 dash-separated fields")]
    FieldCount,

    #[error("unsupported traceparent version '{0}'")]
    Version(String),

    #[error("invalid trace id")]
    TraceId,

    #[error("invalid span id")]
    SpanId,

    #[error("invalid trace flags")]
    Flags,
}

/// Correlation identifiers for one hop of a distributed trace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceContext {
    trace_id: String,
    span_id: String,
    sampled: bool,
    trace_state: Option<String>,
}

impl TraceContext {
    /// Start a new trace. Always sampled.
    pub fn new_root() -> Self {
        Self {
            trace_id: Uuid::new_v4().simple().to_string(),
            span_id: new_span_id(),
            sampled: true,
            trace_state: None,
        }
    }

    /// Same trace, new span id. The child is always sampled regardless of
    /// the parent's flag.
    pub fn child(&self) -> Self {
        Self {
            trace_id: self.trace_id.clone(),
            span_id: new_span_id(),
            sampled: true,
            trace_state: self.trace_state.clone(),
        }
    }

    pub fn trace_id(&self) -> &str {
        &self.trace_id
    }

    pub fn span_id(&self) -> &str {
        &self.span_id
    }

    pub fn is_sampled(&self) -> bool {
        self.sampled
    }

    pub fn trace_state(&self) -> Option<&str> {
        self.trace_state.as_deref()
    }

    /// Format as a version 00 `traceparent` value.
    pub fn traceparent(&self) -> String {
        let flags = if self.sampled { FLAG_SAMPLED } else { 0 };
        format!("00-{}-{}-{:02x}", self.trace_id, self.span_id, flags)
    }

    /// Parse a `traceparent` value.
    ///
    /// Versions other than `00` are accepted as long as the first four fields
    /// have the version 00 layout; `ff` is always invalid.
    pub fn parse_traceparent(value: &str) -> Result<Self, TraceParseError> {
        let parts: Vec<&str> = value.trim().split('-').collect();
        if parts.len() < 4 {
            return Err(TraceParseError::FieldCount);
        }

        let version = parts[0];
        if !is_lower_hex(version, 2) || version == "ff" {
            return Err(TraceParseError::Version(version.to_string()));
        }
        if version == "00" && parts.len() != 4 {
            return Err(TraceParseError::FieldCount);
        }

        let trace_id = parts[1];
        if !is_lower_hex(trace_id, TRACE_ID_LEN) || is_all_zero(trace_id) {
            return Err(TraceParseError::TraceId);
        }

        let span_id = parts[2];
        if !is_lower_hex(span_id, SPAN_ID_LEN) || is_all_zero(span_id) {
            return Err(TraceParseError::SpanId);
        }

        let flags = parts[3];
        if !is_lower_hex(flags, 2) {
            return Err(TraceParseError::Flags);
        }
        let flags = u8::from_str_radix(flags, 16).map_err(|_| TraceParseError::Flags)?;

        Ok(Self {
            trace_id: trace_id.to_string(),
            span_id: span_id.to_string(),
            sampled: flags & FLAG_SAMPLED != 0,
            trace_state: None,
        })
    }

    /// Extract the inbound context, if any.
    ///
    /// A missing or malformed `traceparent` yields `None`, in which case the
    /// caller starts a new trace.
    pub fn extract(headers: &HeaderMap) -> Option<Self> {
        let value = headers.get(TRACEPARENT)?.to_str().ok()?;
        match Self::parse_traceparent(value) {
            Ok(mut ctx) => {
                ctx.trace_state = headers
                    .get(TRACESTATE)
                    .and_then(|v| v.to_str().ok())
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string);
                Some(ctx)
            }
            Err(e) => {
                tracing::debug!(traceparent = value, error = %e, "Ignoring malformed traceparent");
                None
            }
        }
    }

    /// Write `traceparent` (and `tracestate` when present) into `headers`.
    pub fn inject(&self, headers: &mut HeaderMap) {
        if let Ok(value) = HeaderValue::from_str(&self.traceparent()) {
            headers.insert(TRACEPARENT, value);
        }
        if let Some(state) = &self.trace_state {
            if let Ok(value) = HeaderValue::from_str(state) {
                headers.insert(TRACESTATE, value);
            }
        }
    }
}

/// Attach a trace context to an outbound `reqwest` request.
pub trait TraceContextExt {
    fn trace_context(self, ctx: &TraceContext) -> Self;
}

impl TraceContextExt for reqwest::RequestBuilder {
    fn trace_context(self, ctx: &TraceContext) -> Self {
        let mut headers = HeaderMap::new();
        ctx.inject(&mut headers);
        self.headers(headers)
    }
}

fn new_span_id() -> String {
    Uuid::new_v4().simple().to_string()[..SPAN_ID_LEN].to_string()
}

fn is_lower_hex(s: &str, len: usize) -> bool {
    s.len() == len && s.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
}

fn is_all_zero(s: &str) -> bool {
    s.bytes().all(|b| b == b'0')
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "00-0af7651916cd43dd8448eb211c80319c-b7ad6b7169203331-01";

    #[test]
    fn test_new_root_ids() {
        let ctx = TraceContext::new_root();
        assert_eq!(ctx.trace_id().len(), 32);
        assert_eq!(ctx.span_id().len(), 16);
        assert!(ctx.is_sampled());
        assert!(TraceContext::parse_traceparent(&ctx.traceparent()).is_ok());
    }

    #[test]
    fn test_child_keeps_trace_id() {
        let parent = TraceContext::parse_traceparent(SAMPLE).unwrap();
        let child = parent.child();
        assert_eq!(child.trace_id(), parent.trace_id());
        assert_ne!(child.span_id(), parent.span_id());
        assert!(child.is_sampled());
    }

    #[test]
    fn test_child_of_unsampled_parent_is_sampled() {
        let parent = TraceContext::parse_traceparent(
            "00-0af7651916cd43dd8448eb211c80319c-b7ad6b7169203331-00",
        )
        .unwrap();
        assert!(!parent.is_sampled());
        assert!(parent.child().is_sampled());
    }

    #[test]
    fn test_parse_valid() {
        let ctx = TraceContext::parse_traceparent(SAMPLE).unwrap();
        assert_eq!(ctx.trace_id(), "0af7651916cd43dd8448eb211c80319c");
        assert_eq!(ctx.span_id(), "b7ad6b7169203331");
        assert!(ctx.is_sampled());
        assert_eq!(ctx.traceparent(), SAMPLE);
    }

    #[test]
    fn test_parse_future_version_with_extra_fields() {
        let ctx = TraceContext::parse_traceparent(
            "cc-0af7651916cd43dd8448eb211c80319c-b7ad6b7169203331-01-extra",
        )
        .unwrap();
        assert_eq!(ctx.span_id(), "b7ad6b7169203331");
    }

    #[test]
    fn test_parse_rejects_malformed() {
        let cases = [
            ("", TraceParseError::FieldCount),
            ("00-abc", TraceParseError::FieldCount),
            (
                "00-0af7651916cd43dd8448eb211c80319c-b7ad6b7169203331-01-extra",
                TraceParseError::FieldCount,
            ),
            (
                "ff-0af7651916cd43dd8448eb211c80319c-b7ad6b7169203331-01",
                TraceParseError::Version("ff".into()),
            ),
            (
                "00-0AF7651916CD43DD8448EB211C80319C-b7ad6b7169203331-01",
                TraceParseError::TraceId,
            ),
            (
                "00-00000000000000000000000000000000-b7ad6b7169203331-01",
                TraceParseError::TraceId,
            ),
            (
                "00-0af7651916cd43dd8448eb211c80319c-0000000000000000-01",
                TraceParseError::SpanId,
            ),
            (
                "00-0af7651916cd43dd8448eb211c80319c-b7ad6b716920333-01",
                TraceParseError::SpanId,
            ),
            (
                "00-0af7651916cd43dd8448eb211c80319c-b7ad6b7169203331-zz",
                TraceParseError::Flags,
            ),
        ];
        for (input, expected) in cases {
            assert_eq!(
                TraceContext::parse_traceparent(input),
                Err(expected),
                "input {input:?}"
            );
        }
    }

    #[test]
    fn test_extract_and_inject() {
        let mut inbound = HeaderMap::new();
        inbound.insert(TRACEPARENT, HeaderValue::from_static(SAMPLE));
        inbound.insert(TRACESTATE, HeaderValue::from_static("congo=t61rcWkgMzE"));

        let ctx = TraceContext::extract(&inbound).unwrap();
        assert_eq!(ctx.trace_state(), Some("congo=t61rcWkgMzE"));

        let child = ctx.child();
        let mut outbound = HeaderMap::new();
        child.inject(&mut outbound);

        let forwarded = TraceContext::extract(&outbound).unwrap();
        assert_eq!(forwarded.trace_id(), ctx.trace_id());
        assert_eq!(forwarded.span_id(), child.span_id());
        assert_eq!(
            outbound.get(TRACESTATE).unwrap().to_str().unwrap(),
            "congo=t61rcWkgMzE"
        );
    }

    #[test]
    fn test_extract_missing_or_invalid() {
        assert!(TraceContext::extract(&HeaderMap::new()).is_none());

        let mut headers = HeaderMap::new();
        headers.insert(TRACEPARENT, HeaderValue::from_static("garbage"));
        assert!(TraceContext::extract(&headers).is_none());
    }
}
