//! Prometheus metrics for the HTTP API.
//!
//! [`VouchMetrics`] owns a dedicated [`Registry`] that `GET /metrics`
//! encodes into the Prometheus text exposition format.

use prometheus::{
    register_histogram_with_registry, register_int_counter_vec_with_registry,
    register_int_counter_with_registry, register_int_gauge_with_registry, Encoder, Histogram,
    HistogramOpts, IntCounter, IntCounterVec, IntGauge, Opts, Registry, TextEncoder,
};

pub struct VouchMetrics {
    pub registry: Registry,

    // ── Counters ────────────────────────────────────────────────────────
    /// Submissions by outcome: `accepted`, `rejected`, `spam`,
    /// `rate_limited`, `failed`.
    pub submissions: IntCounterVec,
    /// Verification attempts by outcome: `verified` or a token error kind.
    pub verifications: IntCounterVec,
    pub admin_actions: IntCounter,
    pub tokens_revoked: IntCounter,

    // ── Gauges ──────────────────────────────────────────────────────────
    /// Audit entries written. Refreshed on every scrape.
    pub audit_written: IntGauge,
    /// Audit entries dropped. Refreshed on every scrape.
    pub audit_failures: IntGauge,

    // ── Histograms ──────────────────────────────────────────────────────
    /// Time to handle a submission, in milliseconds.
    pub submission_time_ms: Histogram,
}

impl VouchMetrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let submissions = register_int_counter_vec_with_registry!(
            Opts::new("vouch_submissions_total", "Review submissions by outcome"),
            &["outcome"],
            registry
        )?;
        let verifications = register_int_counter_vec_with_registry!(
            Opts::new("vouch_verifications_total", "Token verifications by outcome"),
            &["outcome"],
            registry
        )?;
        let admin_actions = register_int_counter_with_registry!(
            Opts::new("vouch_admin_actions_total", "Admin actions recorded"),
            registry
        )?;
        let tokens_revoked = register_int_counter_with_registry!(
            Opts::new("vouch_tokens_revoked_total", "Tokens revoked"),
            registry
        )?;

        let audit_written = register_int_gauge_with_registry!(
            Opts::new("vouch_audit_written", "Audit entries written to the sink"),
            registry
        )?;
        let audit_failures = register_int_gauge_with_registry!(
            Opts::new("vouch_audit_failures", "Audit entries that could not be written"),
            registry
        )?;

        // 1 ms to ~4 s.
        let submission_time_ms = register_histogram_with_registry!(
            HistogramOpts::new(
                "vouch_submission_time_ms",
                "Time to handle a review submission in milliseconds"
            )
            .buckets(prometheus::exponential_buckets(1.0, 2.0, 13)?),
            registry
        )?;

        Ok(Self {
            registry,
            submissions,
            verifications,
            admin_actions,
            tokens_revoked,
            audit_written,
            audit_failures,
            submission_time_ms,
        })
    }

    /// Encode every registered metric in the text exposition format.
    pub fn render(&self) -> Result<String, prometheus::Error> {
        let mut buf = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buf)?;
        String::from_utf8(buf).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_labelled_counters() {
        let m = VouchMetrics::new().unwrap();
        m.submissions.with_label_values(&["accepted"]).inc();
        m.verifications.with_label_values(&["Expired"]).inc_by(2);
        m.audit_failures.set(3);

        let text = m.render().unwrap();
        assert!(text.contains("vouch_submissions_total{outcome=\"accepted\"} 1"));
        assert!(text.contains("vouch_verifications_total{outcome=\"Expired\"} 2"));
        assert!(text.contains("vouch_audit_failures 3"));
    }

    #[test]
    fn registries_are_independent() {
        let a = VouchMetrics::new().unwrap();
        let b = VouchMetrics::new().unwrap();
        a.admin_actions.inc();
        assert_eq!(b.admin_actions.get(), 0);
    }
}
