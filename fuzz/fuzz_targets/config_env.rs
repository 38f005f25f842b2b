//! Fuzz target for environment-driven loader configuration.
//!
//! Run with:
//! ```bash
//! cargo +nightly fuzz run fuzz_config_env
//! ```

#![no_main]

use arbitrary::Arbitrary;
use entity_loaders_core::config::{FAILURE_POLICY_ENV, LOG_SKIPPED_ENV};
use entity_loaders_core::{FailurePolicy, LoaderConfig};
use libfuzzer_sys::fuzz_target;

/// Values for the two recognized variables.
#[derive(Debug, Arbitrary)]
struct FuzzEnv {
    failure_policy: Option<String>,
    log_skipped: Option<String>,
}

fuzz_target!(|env: FuzzEnv| {
    let result = LoaderConfig::from_lookup(|key| match key {
        FAILURE_POLICY_ENV => env.failure_policy.clone(),
        LOG_SKIPPED_ENV => env.log_skipped.clone(),
        _ => None,
    });

    // Whatever parses as a policy on its own is accepted by the lookup
    if let (Ok(config), Some(raw)) = (&result, &env.failure_policy) {
        assert_eq!(raw.parse::<FailurePolicy>().ok(), Some(config.failure_policy));
    }
});
