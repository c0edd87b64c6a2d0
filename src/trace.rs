use axum::http::Request;
use tower_http::{
    classify::{ServerErrorsAsFailures, SharedClassifier},
    trace::{MakeSpan, TraceLayer},
};
use tracing::{Span, info_span};

pub type HttpTraceLayer = TraceLayer<SharedClassifier<ServerErrorsAsFailures>, RecordMakeSpan>;

pub fn http_trace_layer() -> HttpTraceLayer {
    TraceLayer::new_for_http().make_span_with(RecordMakeSpan)
}

/// 每个请求一个 span，附带方法、路径和 Origin
#[derive(Clone, Debug, Default)]
pub struct RecordMakeSpan;

impl<B> MakeSpan<B> for RecordMakeSpan {
    fn make_span(&mut self, request: &Request<B>) -> Span {
        let origin = request
            .headers()
            .get(axum::http::header::ORIGIN)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("-");

        info_span!(
            "http.request",
            method = %request.method(),
            path = %request.uri().path(),
            origin = %origin,
        )
    }
}
