//! Tenant extractor for Axum handlers.

use axum::extract::FromRequestParts;
use axum::http::header::HOST;
use axum::http::request::Parts;
use axum::http::HeaderMap;
use hotelier_core::tenant::{resolve_tenant_id, RequestHosts};
use hotelier_tenancy::ResolvedTenant;

use crate::error::AppError;
use crate::state::AppState;

/// Header carrying the host the client originally asked for, set by proxies.
pub const FORWARDED_HOST_HEADER: &str = "x-forwarded-host";

/// Header that names the tenant explicitly, overriding the host.
pub const TENANT_OVERRIDE_HEADER: &str = "x-tenant-subdomain";

/// The hotel a request is addressed to, with its database handle.
///
/// Resolution reads the `X-Tenant-Subdomain`, `X-Forwarded-Host` and `Host`
/// headers, in that order of precedence. Requests on the main domain are
/// rejected with 404, unknown or inactive hotels with 404, and an
/// unreachable registry or tenant database with 503.
///
/// ```ignore
/// async fn my_handler(CurrentTenant(tenant): CurrentTenant) -> AppResult<Json<()>> {
///     tracing::info!(tenant = %tenant.tenant.subdomain, "handling request");
///     Ok(Json(()))
/// }
/// ```
#[derive(Debug, Clone)]
pub struct CurrentTenant(pub ResolvedTenant);

impl FromRequestParts<AppState> for CurrentTenant {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let tenant_id = tenant_id_from_headers(&parts.headers).ok_or(AppError::NoTenant)?;
        let resolved = state.directory.resolve(&tenant_id).await?;
        Ok(CurrentTenant(resolved))
    }
}

/// The tenant identifier a set of request headers addresses, if any.
pub fn tenant_id_from_headers(headers: &HeaderMap) -> Option<String> {
    let header = |name: &str| headers.get(name).and_then(|v| v.to_str().ok());

    resolve_tenant_id(&RequestHosts {
        host: header(HOST.as_str()),
        forwarded_host: header(FORWARDED_HOST_HEADER),
        tenant_override: header(TENANT_OVERRIDE_HEADER),
    })
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    fn headers(pairs: &[(&'static str, &'static str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.insert(*name, HeaderValue::from_static(value));
        }
        map
    }

    #[test]
    fn subdomain_of_host_is_the_tenant() {
        let map = headers(&[("host", "grand.hotelier.test")]);
        assert_eq!(tenant_id_from_headers(&map).as_deref(), Some("grand"));
    }

    #[test]
    fn override_wins_over_forwarded_host_and_host() {
        let map = headers(&[
            ("host", "grand.hotelier.test"),
            ("x-forwarded-host", "seaside.hotelier.test"),
            ("x-tenant-subdomain", "Alpine"),
        ]);
        assert_eq!(tenant_id_from_headers(&map).as_deref(), Some("alpine"));
    }

    #[test]
    fn forwarded_host_wins_over_host() {
        let map = headers(&[
            ("host", "internal-lb:8080"),
            ("x-forwarded-host", "seaside.hotelier.test"),
        ]);
        assert_eq!(tenant_id_from_headers(&map).as_deref(), Some("seaside"));
    }

    #[test]
    fn main_domain_has_no_tenant() {
        let map = headers(&[("host", "www.hotelier.test")]);
        assert_eq!(tenant_id_from_headers(&map), None);
        assert_eq!(tenant_id_from_headers(&HeaderMap::new()), None);
    }
}
