//! middleware/client_ip.rs

use actix_web::HttpRequest;

pub const UNKNOWN_IP: &str = "unknown";

/// IP del cliente. Con `trust_proxy` se toma la primera entrada de
/// X-Forwarded-For; si no, la dirección del peer.
pub fn client_ip(req: &HttpRequest, trust_proxy: bool) -> String {
    if trust_proxy {
        let forwarded = req
            .headers()
            .get("x-forwarded-for")
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.split(',').next())
            .map(str::trim)
            .filter(|ip| !ip.is_empty());
        if let Some(ip) = forwarded {
            return ip.to_string();
        }
    }

    req.peer_addr()
        .map(|addr| addr.ip().to_string())
        .unwrap_or_else(|| UNKNOWN_IP.to_string())
}
