#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &str| {
    // Parse errors and validation errors are fine; panics are not.
    if let Ok(cfg) = weii_config::load_toml(data) {
        if cfg.validate().is_ok() {
            // A valid config must survive its own serializer.
            let text = cfg.to_toml_string().expect("serialize valid config");
            let again = weii_config::load_toml(&text).expect("reparse serialized config");
            assert!(again.validate().is_ok());
        }
    }
});
