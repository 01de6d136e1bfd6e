/// Sink for non-fatal anomalies the codec encounters while decoding.
///
/// Unknown application extensions are the one case spec'd as "report but
/// never fail"; callers that don't care can use [`NullDiagnostics`].
pub trait Diagnostics {
    fn note(&self, message: &str);
}

/// Discards every note. The default when a caller passes no sink.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullDiagnostics;

impl Diagnostics for NullDiagnostics {
    fn note(&self, _message: &str) {}
}

/// Forwards notes to `tracing::warn!`, matching how the rest of this
/// codebase reports recoverable anomalies.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingDiagnostics;

impl Diagnostics for TracingDiagnostics {
    fn note(&self, message: &str) {
        tracing::warn!(target: "gif89a::diagnostics", "{message}");
    }
}
