//! Prometheus metrics for search, LLM queries, symbol lookups, indexing and
//! embedding.

use lazy_static::lazy_static;
use prometheus::core::Collector;
use prometheus::{
    Counter, CounterVec, Encoder, Gauge, Histogram, HistogramOpts, HistogramVec, Opts, Registry,
    TextEncoder,
};
use std::sync::Once;

lazy_static! {
    pub static ref REGISTRY: Registry = Registry::new();

    // Search

    /// Search requests by search type (`semantic`, `scan`)
    pub static ref SEARCH_REQUESTS: CounterVec = CounterVec::new(
        Opts::new("codenav_search_requests_total", "Total number of search requests"),
        &["search_type"]
    ).expect("Failed to create SEARCH_REQUESTS counter");

    pub static ref SEARCH_LATENCY: HistogramVec = HistogramVec::new(
        HistogramOpts::new(
            "codenav_search_latency_seconds",
            "Search request latency in seconds"
        ).buckets(vec![0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0]),
        &["search_type"]
    ).expect("Failed to create SEARCH_LATENCY histogram");

    pub static ref SEARCH_RESULTS: Histogram = Histogram::with_opts(
        HistogramOpts::new(
            "codenav_search_results_count",
            "Number of search results returned per request"
        ).buckets(vec![0.0, 1.0, 5.0, 10.0, 20.0, 50.0])
    ).expect("Failed to create SEARCH_RESULTS histogram");

    // Questions answered by the language model

    pub static ref QUERY_REQUESTS: Counter = Counter::with_opts(
        Opts::new("codenav_query_requests_total", "Total number of questions asked")
    ).expect("Failed to create QUERY_REQUESTS counter");

    pub static ref LLM_LATENCY: Histogram = Histogram::with_opts(
        HistogramOpts::new(
            "codenav_llm_latency_seconds",
            "Language model call latency in seconds"
        ).buckets(vec![0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0])
    ).expect("Failed to create LLM_LATENCY histogram");

    pub static ref LLM_ERRORS: Counter = Counter::with_opts(
        Opts::new("codenav_llm_errors_total", "Failed language model calls")
    ).expect("Failed to create LLM_ERRORS counter");

    /// Definition lookups by outcome (`found`, `not_found`, `unavailable`)
    pub static ref SYMBOL_LOOKUPS: CounterVec = CounterVec::new(
        Opts::new("codenav_symbol_lookups_total", "Definition lookups by outcome"),
        &["outcome"]
    ).expect("Failed to create SYMBOL_LOOKUPS counter");

    // Indexing

    pub static ref INDEXED_FILES: Gauge = Gauge::with_opts(
        Opts::new("codenav_indexed_files_total", "Files processed by the last indexing run")
    ).expect("Failed to create INDEXED_FILES gauge");

    pub static ref INDEXED_CHUNKS: Gauge = Gauge::with_opts(
        Opts::new("codenav_indexed_chunks_total", "Chunks stored by the last indexing run")
    ).expect("Failed to create INDEXED_CHUNKS gauge");

    pub static ref INDEX_ERRORS: Counter = Counter::with_opts(
        Opts::new("codenav_index_errors_total", "Files that failed during indexing")
    ).expect("Failed to create INDEX_ERRORS counter");

    pub static ref INDEX_LATENCY: Histogram = Histogram::with_opts(
        HistogramOpts::new(
            "codenav_indexing_duration_seconds",
            "Duration of a full indexing run in seconds"
        ).buckets(vec![0.1, 0.5, 1.0, 5.0, 10.0, 30.0, 60.0, 300.0])
    ).expect("Failed to create INDEX_LATENCY histogram");

    // Embedding

    pub static ref EMBEDDING_REQUESTS: Counter = Counter::with_opts(
        Opts::new("codenav_embedding_requests_total", "Total embedding generation requests")
    ).expect("Failed to create EMBEDDING_REQUESTS counter");

    pub static ref EMBEDDING_LATENCY: Histogram = Histogram::with_opts(
        HistogramOpts::new(
            "codenav_embedding_latency_seconds",
            "Embedding generation latency in seconds"
        ).buckets(vec![0.01, 0.05, 0.1, 0.5, 1.0, 2.0])
    ).expect("Failed to create EMBEDDING_LATENCY histogram");
}

static REGISTER: Once = Once::new();

/// Register every metric with [`REGISTRY`]; later calls are no-ops
pub fn register_metrics() {
    REGISTER.call_once(|| {
        let collectors: Vec<Box<dyn Collector>> = vec![
            Box::new(SEARCH_REQUESTS.clone()),
            Box::new(SEARCH_LATENCY.clone()),
            Box::new(SEARCH_RESULTS.clone()),
            Box::new(QUERY_REQUESTS.clone()),
            Box::new(LLM_LATENCY.clone()),
            Box::new(LLM_ERRORS.clone()),
            Box::new(SYMBOL_LOOKUPS.clone()),
            Box::new(INDEXED_FILES.clone()),
            Box::new(INDEXED_CHUNKS.clone()),
            Box::new(INDEX_ERRORS.clone()),
            Box::new(INDEX_LATENCY.clone()),
            Box::new(EMBEDDING_REQUESTS.clone()),
            Box::new(EMBEDDING_LATENCY.clone()),
        ];
        for collector in collectors {
            if let Err(e) = REGISTRY.register(collector) {
                tracing::warn!(error = %e, "Failed to register metric");
            }
        }
    });
}

/// Encode all registered metrics in the Prometheus text format
pub fn gather_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();

    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!("Failed to encode metrics: {}", e);
        return String::new();
    }

    String::from_utf8(buffer).unwrap_or_else(|e| {
        tracing::error!("Metrics contained invalid UTF-8: {}", e);
        String::new()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_is_idempotent() {
        register_metrics();
        register_metrics();

        QUERY_REQUESTS.inc();
        let output = gather_metrics();
        assert!(output.contains("codenav_query_requests_total"));
    }

    #[test]
    fn test_labelled_counter() {
        let counter = SEARCH_REQUESTS.with_label_values(&["scan"]);
        let before = counter.get();
        counter.inc();
        assert!((counter.get() - before - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_histogram_observe() {
        let count_before = LLM_LATENCY.get_sample_count();
        LLM_LATENCY.observe(0.3);
        assert_eq!(LLM_LATENCY.get_sample_count(), count_before + 1);
    }
}
