pub mod init;
pub mod inspect;
pub mod open;
pub mod replay;
pub mod share;

pub use init::{init, InitArgs};
pub use inspect::{inspect, InspectArgs};
pub use open::{open, OpenArgs};
pub use replay::{replay, ReplayArgs};
pub use share::{share, ShareArgs};

/// Share-link query parameter carrying the encoded document
pub const LINK_PARAM: &str = "d";

/// Pull the encoded document out of a full share link, or return a bare
/// code unchanged
pub fn extract_code(input: &str) -> String {
    let input = input.trim();
    if !input.contains(['?', '#']) {
        return input.to_string();
    }

    let prefix = format!("{LINK_PARAM}=");
    input
        .split(['?', '#', '&'])
        .skip(1)
        .find_map(|pair| pair.strip_prefix(prefix.as_str()))
        .map(percent_decode)
        .unwrap_or_default()
}

/// Undo the escapes browsers apply to legacy standard-base64 links
fn percent_decode(value: &str) -> String {
    value
        .replace("%2B", "+")
        .replace("%2b", "+")
        .replace("%2F", "/")
        .replace("%2f", "/")
        .replace("%3D", "=")
        .replace("%3d", "=")
}

/// Join a base URL and a code into a share link
pub fn link_for(base_url: &str, code: &str) -> String {
    let separator = if base_url.contains('?') { '&' } else { '?' };
    format!("{base_url}{separator}{LINK_PARAM}={code}")
}
