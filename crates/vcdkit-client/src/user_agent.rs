//! Caller-identifying user agent
//!
//! Format: `<product>/<version> (<os>/<arch>; isProvider:<bool>)`

/// Build the user agent string
pub fn user_agent(product: &str, version: &str, is_provider: bool) -> String {
    format!(
        "{product}/{version} ({}/{}; isProvider:{is_provider})",
        std::env::consts::OS,
        std::env::consts::ARCH
    )
}
