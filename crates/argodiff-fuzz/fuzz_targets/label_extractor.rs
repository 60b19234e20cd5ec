#![no_main]
use argodiff_core::labels::{extract_tracking_label, LabelDocument};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        let _ = extract_tracking_label(s, "argocd.argoproj.io/instance");

        if let Ok(value) = serde_yaml::from_str::<serde_yaml::Value>(s) {
            for shape in LabelDocument::classify(&value) {
                let _ = shape.label("app");
            }
        }
    }
});
