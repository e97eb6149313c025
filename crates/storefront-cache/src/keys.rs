//! Key builders for the tenant bootstrap namespace.
//!
//! Convention: `{namespace}:{identifier}{optional-suffix}`.

/// Namespace of whole-tenant bootstrap payloads
pub const BOOTSTRAP_NAMESPACE: &str = "bootstrap";

/// `bootstrap:{tenant_id}`
#[must_use]
pub fn bootstrap_key(tenant_id: &str) -> String {
    format!("{BOOTSTRAP_NAMESPACE}:{tenant_id}")
}

/// `bootstrap:{tenant_id}:{doc_keys}` for a batch of tenant documents.
///
/// Document keys are sorted so that the same batch requested in any order
/// maps to one entry.
#[must_use]
pub fn bootstrap_batch_key<S: AsRef<str>>(tenant_id: &str, doc_keys: &[S]) -> String {
    let mut sorted: Vec<&str> = doc_keys.iter().map(AsRef::as_ref).collect();
    sorted.sort_unstable();
    format!("{BOOTSTRAP_NAMESPACE}:{tenant_id}:{}", sorted.join(","))
}

/// `bootstrap:{tenant_id}*`, selecting every entry of one tenant
#[must_use]
pub fn namespace_pattern(tenant_id: &str) -> String {
    format!("{BOOTSTRAP_NAMESPACE}:{tenant_id}*")
}
