//! Admin gate: bearer password check with per-client lockout.

use std::{
    collections::HashMap,
    net::{IpAddr, SocketAddr},
    sync::Mutex,
    time::{Duration, Instant},
};

use axum::{
    extract::{ConnectInfo, Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

use crate::{error::ApiError, AppState};

/// Consecutive failures that trigger a lockout.
pub const MAX_FAILURES: u32 = 5;

/// Lockout length after [`MAX_FAILURES`].
pub const LOCKOUT: Duration = Duration::from_secs(60);

/// Tracked clients above which idle entries are pruned.
const MAX_TRACKED_CLIENTS: usize = 1024;

#[derive(Debug, Default)]
struct GateState {
    failures: u32,
    locked_until: Option<Instant>,
}

impl GateState {
    fn locked_at(&self, now: Instant) -> bool {
        self.locked_until.is_some_and(|until| now < until)
    }
}

/// Verifies admin passwords against a configured secret.
///
/// Failures are counted per client address; requests without a known address share one entry.
#[derive(Debug)]
pub struct AdminGate {
    digest: Option<[u8; 32]>,
    clients: Mutex<HashMap<Option<IpAddr>, GateState>>,
}

impl AdminGate {
    /// Creates a gate; `None` disables admin access.
    pub fn new(password: Option<&str>) -> Self {
        Self {
            digest: password.map(|password| Sha256::digest(password.as_bytes()).into()),
            clients: Mutex::new(HashMap::new()),
        }
    }

    /// Fails with [`ApiError::AdminUnavailable`] when no password is configured.
    pub fn ensure_configured(&self) -> Result<(), ApiError> {
        match self.digest {
            Some(_) => Ok(()),
            None => Err(ApiError::AdminUnavailable),
        }
    }

    /// Checks a candidate password from `client` now.
    pub fn check(&self, client: Option<IpAddr>, candidate: &str) -> Result<(), ApiError> {
        self.check_at(client, candidate, Instant::now())
    }

    /// Checks a candidate password from `client` at `now`.
    pub fn check_at(
        &self,
        client: Option<IpAddr>,
        candidate: &str,
        now: Instant,
    ) -> Result<(), ApiError> {
        let Some(expected) = self.digest else {
            return Err(ApiError::AdminUnavailable);
        };
        let mut clients = self
            .clients
            .lock()
            .map_err(|_| ApiError::internal("admin gate unavailable", "lock poisoned"))?;
        if clients.len() >= MAX_TRACKED_CLIENTS {
            clients.retain(|_, state| state.locked_at(now));
        }

        let state = clients.entry(client).or_default();
        if state.locked_at(now) {
            return Err(ApiError::LockedOut);
        }
        state.locked_until = None;

        let candidate: [u8; 32] = Sha256::digest(candidate.as_bytes()).into();
        if bool::from(candidate[..].ct_eq(&expected[..])) {
            clients.remove(&client);
            return Ok(());
        }

        state.failures += 1;
        if state.failures >= MAX_FAILURES {
            state.failures = 0;
            state.locked_until = Some(now + LOCKOUT);
            tracing::warn!(client = ?client, "admin gate locked after repeated failures");
        }
        Err(ApiError::Unauthorized)
    }
}

/// Peer address recorded by `into_make_service_with_connect_info`, when present.
pub fn client_ip(request: &Request) -> Option<IpAddr> {
    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip())
}

fn bearer(request: &Request) -> Option<&str> {
    request
        .headers()
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}

/// Middleware guarding admin-scoped routes.
///
/// A request without a bearer token is refused without counting toward the lockout.
pub async fn require_admin(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    state.gate.ensure_configured()?;
    let candidate = bearer(&request).ok_or(ApiError::Unauthorized)?;
    state.gate.check(client_ip(&request), candidate)?;
    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use std::net::Ipv4Addr;

    use super::*;

    const VISITOR: Option<IpAddr> = Some(IpAddr::V4(Ipv4Addr::new(203, 0, 113, 7)));
    const OWNER: Option<IpAddr> = Some(IpAddr::V4(Ipv4Addr::new(198, 51, 100, 1)));

    #[test]
    fn correct_password_passes() {
        let gate = AdminGate::new(Some("pw"));
        assert!(gate.check(OWNER, "pw").is_ok());
        assert!(matches!(gate.check(OWNER, "nope"), Err(ApiError::Unauthorized)));
    }

    #[test]
    fn unconfigured_gate_is_unavailable() {
        let gate = AdminGate::new(None);
        assert!(matches!(gate.ensure_configured(), Err(ApiError::AdminUnavailable)));
        assert!(matches!(gate.check(OWNER, "pw"), Err(ApiError::AdminUnavailable)));
    }

    #[test]
    fn repeated_failures_lock_even_the_right_password() {
        let gate = AdminGate::new(Some("pw"));
        let start = Instant::now();
        for _ in 0..MAX_FAILURES {
            assert!(matches!(
                gate.check_at(VISITOR, "wrong", start),
                Err(ApiError::Unauthorized)
            ));
        }
        assert!(matches!(
            gate.check_at(VISITOR, "pw", start + Duration::from_secs(59)),
            Err(ApiError::LockedOut)
        ));
        assert!(gate.check_at(VISITOR, "pw", start + LOCKOUT).is_ok());
    }

    #[test]
    fn lockout_is_scoped_to_the_failing_client() {
        let gate = AdminGate::new(Some("pw"));
        let now = Instant::now();
        for _ in 0..MAX_FAILURES {
            let _ = gate.check_at(VISITOR, "wrong", now);
        }
        assert!(matches!(
            gate.check_at(VISITOR, "pw", now),
            Err(ApiError::LockedOut)
        ));
        assert!(gate.check_at(OWNER, "pw", now).is_ok());
    }

    #[test]
    fn success_resets_the_failure_count() {
        let gate = AdminGate::new(Some("pw"));
        let now = Instant::now();
        for _ in 0..MAX_FAILURES - 1 {
            let _ = gate.check_at(OWNER, "wrong", now);
        }
        assert!(gate.check_at(OWNER, "pw", now).is_ok());
        assert!(matches!(
            gate.check_at(OWNER, "wrong", now),
            Err(ApiError::Unauthorized)
        ));
        assert!(gate.check_at(OWNER, "pw", now).is_ok());
    }
}
