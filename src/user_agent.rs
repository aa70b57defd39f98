//! User-Agent header sent with every storefront API request.

use std::sync::OnceLock;

const CLIENT_NAME: &str = "storefront-rust";

const CLIENT_VERSION: &str = env!("CARGO_PKG_VERSION");

static USER_AGENT: OnceLock<String> = OnceLock::new();

/// Returns the User-Agent string, computed once.
///
/// Format: `storefront-rust/0.1.0 (rust/1.92; linux/x86_64)`
pub(crate) fn user_agent() -> &'static str {
    USER_AGENT.get_or_init(|| {
        format!(
            "{}/{} (rust/{}; {}/{})",
            CLIENT_NAME,
            CLIENT_VERSION,
            env!("CARGO_PKG_RUST_VERSION"),
            os_name(),
            std::env::consts::ARCH,
        )
    })
}

fn os_name() -> &'static str {
    match std::env::consts::OS {
        "macos" => "darwin",
        os => os,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_agent_format() {
        let ua = user_agent();
        assert!(ua.starts_with("storefront-rust/"));
        assert!(ua.contains(CLIENT_VERSION));
        assert!(ua.contains("rust/"));
        assert!(ua.ends_with(&format!("{})", std::env::consts::ARCH)));
    }

    #[test]
    fn test_user_agent_cached() {
        assert!(std::ptr::eq(user_agent(), user_agent()));
    }

    #[test]
    fn test_os_normalization() {
        let os = os_name();
        assert!(!os.is_empty());
        assert_ne!(os, "macos");
    }
}
