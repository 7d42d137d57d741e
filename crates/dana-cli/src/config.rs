//! Host-side configuration (§6).
//!
//! Dana has no project manifest: the whole of its ambient configuration is
//! the pair of environment variables the sandbox itself reads. This type
//! just centralises that read so `dana.rs` and the REPL agree on it.

#[derive(Debug, Clone, Default)]
pub struct SandboxConfig {
    pub danapath: Option<String>,
    pub mock_llm: bool,
}

impl SandboxConfig {
    pub fn from_env() -> Self {
        Self {
            danapath: std::env::var("DANAPATH").ok(),
            mock_llm: std::env::var("OPENDXA_MOCK_LLM")
                .map(|v| v == "true")
                .unwrap_or(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn reads_both_env_vars() {
        std::env::set_var("DANAPATH", "/tmp/a:/tmp/b");
        std::env::set_var("OPENDXA_MOCK_LLM", "true");
        let config = SandboxConfig::from_env();
        std::env::remove_var("DANAPATH");
        std::env::remove_var("OPENDXA_MOCK_LLM");

        assert_eq!(config.danapath.as_deref(), Some("/tmp/a:/tmp/b"));
        assert!(config.mock_llm);
    }

    #[test]
    #[serial]
    fn mock_llm_defaults_to_false_when_unset() {
        std::env::remove_var("OPENDXA_MOCK_LLM");
        assert!(!SandboxConfig::from_env().mock_llm);
    }
}
