use std::str::FromStr;

use pnet::util::MacAddr;

/// Canonical inventory form of a MAC address: upper-case, colon separated.
///
/// Returns `None` for unparsable input and for the all-zero address.
pub fn normalize_mac(raw: &str) -> Option<String> {
    let candidate = raw.trim().replace('-', ":");
    let mac = MacAddr::from_str(&candidate).ok()?;
    if mac == MacAddr::zero() {
        return None;
    }
    Some(mac.to_string().to_uppercase())
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
