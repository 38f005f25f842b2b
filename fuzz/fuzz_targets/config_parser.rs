//! Fuzz target for the loader config parser.
//!
//! Feeds arbitrary strings to `LoaderConfig::from_str`, which expands
//! `${VAR}` references before parsing TOML.
//!
//! Run with:
//! ```bash
//! cargo +nightly fuzz run fuzz_config_parser
//! ```

#![no_main]

use entity_loaders_core::LoaderConfig;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(input) = std::str::from_utf8(data) {
        // Parsing should never panic, only return errors
        if let Ok(config) = LoaderConfig::from_str(input) {
            // A parsed config renders back to TOML that parses to the same value
            let rendered = toml::to_string(&config).expect("config serializes");
            assert_eq!(LoaderConfig::from_str(&rendered).ok(), Some(config));
        }
    }
});
