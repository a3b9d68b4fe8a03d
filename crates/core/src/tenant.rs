//! Tenant identification from inbound request metadata.
//!
//! A tenant is addressed by the leading label of the request host
//! (`grand.hotelier.app` -> `grand`). Resolution is a pure, total function:
//! every input maps to either a normalized identifier or `None`, which means
//! the request targets the main (administrative) domain.

use std::net::IpAddr;

/// Leading host labels that never name a tenant.
pub const NON_TENANT_LABELS: &[&str] = &["www", "app"];

/// Host names that refer to the local machine rather than a tenant.
pub const LOOPBACK_ALIASES: &[&str] = &["localhost", "127.0.0.1", "::1"];

/// Prefix of every per-tenant logical database name.
pub const TENANT_DATABASE_PREFIX: &str = "tenant_";

/// Maximum length of a DNS label, and therefore of a tenant identifier.
const MAX_TENANT_ID_LEN: usize = 63;

/// The request headers that take part in tenant resolution.
///
/// Header extraction belongs to the HTTP layer; this struct only borrows the
/// raw values so the resolver stays independent of any web framework.
#[derive(Debug, Clone, Copy, Default)]
pub struct RequestHosts<'a> {
    /// The `Host` header.
    pub host: Option<&'a str>,
    /// The `X-Forwarded-Host` header (may be a comma-separated list).
    pub forwarded_host: Option<&'a str>,
    /// The `X-Tenant-Subdomain` override header.
    pub tenant_override: Option<&'a str>,
}

/// Derive the tenant identifier for a request.
///
/// Precedence: explicit override, then forwarded host, then host. Returns
/// `None` for the main domain, loopback and IP-literal hosts, and anything
/// that is not a valid identifier.
pub fn resolve_tenant_id(hosts: &RequestHosts<'_>) -> Option<String> {
    if let Some(raw) = non_empty(hosts.tenant_override) {
        return normalize_tenant_id(raw);
    }

    let host = non_empty(hosts.forwarded_host)
        .and_then(|v| non_empty(v.split(',').next()))
        .or_else(|| non_empty(hosts.host))?;

    tenant_from_host(host)
}

/// Lowercase and validate a raw identifier.
pub fn normalize_tenant_id(raw: &str) -> Option<String> {
    let candidate = raw.trim().to_ascii_lowercase();
    is_valid_tenant_id(&candidate).then_some(candidate)
}

/// Whether `id` is a normalized tenant identifier: 1-63 characters of
/// `[a-z0-9-]`, not starting or ending with a hyphen.
pub fn is_valid_tenant_id(id: &str) -> bool {
    !id.is_empty()
        && id.len() <= MAX_TENANT_ID_LEN
        && !id.starts_with('-')
        && !id.ends_with('-')
        && id
            .bytes()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-')
}

/// Logical database name holding a tenant's data.
///
/// This mapping must stay stable across releases: reconciliation relies on
/// finding the same database for a tenant on every run.
pub fn tenant_database_name(tenant_id: &str) -> String {
    format!("{TENANT_DATABASE_PREFIX}{tenant_id}")
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn tenant_from_host(host: &str) -> Option<String> {
    let (name, port) = split_port(host);
    let name = name.trim_end_matches('.').to_ascii_lowercase();

    if name.parse::<IpAddr>().is_ok() || LOOPBACK_ALIASES.contains(&name.as_str()) {
        return None;
    }

    let mut labels = name.split('.');
    let first = labels.next()?;
    let has_rest = labels.next().is_some();

    if has_rest {
        if NON_TENANT_LABELS.contains(&first) {
            return None;
        }
        return normalize_tenant_id(first);
    }

    // A bare single label only names a tenant when it comes with a port
    // (e.g. `grand:3000` on an internal network).
    port.and_then(|_| normalize_tenant_id(first))
}

/// Split `host[:port]`, honouring bracketed IPv6 literals.
fn split_port(host: &str) -> (&str, Option<&str>) {
    if let Some(rest) = host.strip_prefix('[') {
        return match rest.split_once(']') {
            Some((addr, tail)) => (addr, tail.strip_prefix(':')),
            None => (host, None),
        };
    }

    // Unbracketed IPv6 literal: no port can be present.
    if host.matches(':').count() > 1 {
        return (host, None);
    }

    match host.rsplit_once(':') {
        Some((name, port)) => (name, Some(port)),
        None => (host, None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn host(h: &str) -> Option<String> {
        resolve_tenant_id(&RequestHosts {
            host: Some(h),
            ..Default::default()
        })
    }

    // -----------------------------------------------------------------------
    // Host-based resolution
    // -----------------------------------------------------------------------

    #[test]
    fn subdomain_is_tenant() {
        assert_eq!(host("grand.hotelier.app"), Some("grand".into()));
    }

    #[test]
    fn subdomain_with_port_is_tenant() {
        assert_eq!(host("grand.localhost:3000"), Some("grand".into()));
    }

    #[test]
    fn subdomain_is_lowercased() {
        assert_eq!(host("Grand.Hotelier.App"), Some("grand".into()));
    }

    #[test]
    fn www_and_app_are_not_tenants() {
        assert_eq!(host("www.hotelier.app"), None);
        assert_eq!(host("app.hotelier.app"), None);
    }

    #[test]
    fn loopback_hosts_are_not_tenants() {
        assert_eq!(host("localhost"), None);
        assert_eq!(host("localhost:3000"), None);
        assert_eq!(host("127.0.0.1:3000"), None);
        assert_eq!(host("[::1]:3000"), None);
    }

    #[test]
    fn ip_literals_are_not_tenants() {
        assert_eq!(host("10.0.0.12"), None);
        assert_eq!(host("10.0.0.12:8080"), None);
        assert_eq!(host("fe80::1"), None);
    }

    #[test]
    fn single_label_with_port_is_tenant() {
        assert_eq!(host("seaside:3000"), Some("seaside".into()));
    }

    #[test]
    fn single_label_without_port_is_not_tenant() {
        assert_eq!(host("seaside"), None);
    }

    #[test]
    fn trailing_dot_is_ignored() {
        assert_eq!(host("grand.hotelier.app."), Some("grand".into()));
    }

    #[test]
    fn invalid_label_resolves_to_none() {
        assert_eq!(host("gr_and.hotelier.app"), None);
        assert_eq!(host("-grand.hotelier.app"), None);
        assert_eq!(host(".hotelier.app"), None);
    }

    // -----------------------------------------------------------------------
    // Header precedence
    // -----------------------------------------------------------------------

    #[test]
    fn forwarded_host_wins_over_host() {
        let hosts = RequestHosts {
            host: Some("internal.svc.cluster"),
            forwarded_host: Some("grand.hotelier.app"),
            tenant_override: None,
        };
        assert_eq!(resolve_tenant_id(&hosts), Some("grand".into()));
    }

    #[test]
    fn forwarded_host_list_uses_first_entry() {
        let hosts = RequestHosts {
            host: None,
            forwarded_host: Some("grand.hotelier.app, proxy.internal"),
            tenant_override: None,
        };
        assert_eq!(resolve_tenant_id(&hosts), Some("grand".into()));
    }

    #[test]
    fn override_wins_over_everything() {
        let hosts = RequestHosts {
            host: Some("grand.hotelier.app"),
            forwarded_host: Some("seaside.hotelier.app"),
            tenant_override: Some("Alpine"),
        };
        assert_eq!(resolve_tenant_id(&hosts), Some("alpine".into()));
    }

    #[test]
    fn blank_override_is_ignored() {
        let hosts = RequestHosts {
            host: Some("grand.hotelier.app"),
            forwarded_host: None,
            tenant_override: Some("   "),
        };
        assert_eq!(resolve_tenant_id(&hosts), Some("grand".into()));
    }

    #[test]
    fn no_headers_resolves_to_none() {
        assert_eq!(resolve_tenant_id(&RequestHosts::default()), None);
    }

    // -----------------------------------------------------------------------
    // Identifier helpers
    // -----------------------------------------------------------------------

    #[test]
    fn database_name_is_prefixed() {
        assert_eq!(tenant_database_name("grand"), "tenant_grand");
    }

    #[test]
    fn identifier_validation() {
        assert!(is_valid_tenant_id("grand-2"));
        assert!(!is_valid_tenant_id(""));
        assert!(!is_valid_tenant_id("grand-"));
        assert!(!is_valid_tenant_id("Grand"));
        assert!(!is_valid_tenant_id(&"a".repeat(64)));
    }
}
