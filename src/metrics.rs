use lazy_static::lazy_static;
use prometheus::{
    Counter, Encoder, Gauge, Histogram, TextEncoder, register_counter, register_gauge,
    register_histogram,
};


lazy_static! {
    pub static ref REQUEST_TOTAL: Counter =
        register_counter!("idea_board_requests_total", "Total number of idea API requests").unwrap();
    pub static ref IDEAS_CREATED: Counter =
        register_counter!("idea_board_ideas_created_total", "Total ideas created").unwrap();
    pub static ref UPVOTES_APPLIED: Counter =
        register_counter!("idea_board_upvotes_total", "Total upvotes applied").unwrap();
    pub static ref RATE_LIMITED: Counter =
        register_counter!("idea_board_rate_limited_total", "Requests rejected by the rate limiter").unwrap();
    pub static ref REQUEST_LATENCY: Histogram = register_histogram!(
        "idea_board_request_latency_seconds",
        "Request latency in seconds"
    )
    .unwrap();
    pub static ref RATE_LIMIT_KEYS: Gauge =
        register_gauge!("idea_board_rate_limit_keys", "Client keys currently tracked by the rate limiter").unwrap();
}

// Render every registered metric in the text exposition format
pub fn render() -> Result<String, prometheus::Error> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
}
