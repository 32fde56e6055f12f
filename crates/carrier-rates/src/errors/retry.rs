/// Classification for retry policy.
///
/// Used by callers to decide how to react to a failed rate probe.
///
/// | Class | Retry later? | Meaning |
/// |-------|--------------|---------|
/// | `Never` | No | The request is invalid or the credentials are wrong |
/// | `WithBackoff` | Yes | Transient: rate limited or timed out |
/// | `NextProbe` | No | This probe failed; the following probes may succeed |
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RetryClass {
    /// Never retry - validation error or rejected credentials.
    /// Every further probe against the same configuration will fail too.
    Never,

    /// Retry after waiting.
    ///
    /// Used for rate limiting (429) and timeouts. The shared rate limiter
    /// already spaces out calls, so hitting this usually means the upstream
    /// quota is lower than the configured one.
    WithBackoff,

    /// Skip this probe and continue with the next one.
    ///
    /// Used for provider-side failures on a single request (5xx, malformed
    /// body). No penalty is recorded.
    NextProbe,
}
