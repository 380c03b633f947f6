#![no_main]

use kf_core::ConvertConfig;
use kf_graph::convert_with_config;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Some((&flags, rest)) = data.split_first() else {
        return;
    };
    let Ok(input) = std::str::from_utf8(rest) else {
        return;
    };
    let config = ConvertConfig {
        maiden_names: flags & 1 == 1,
        two_digit_year_pivot: flags % 100,
        ..ConvertConfig::default()
    };

    let conversion = convert_with_config(input, &config).expect("config is valid");
    assert_eq!(conversion.people.len(), conversion.id_mapping.len());
    for relationship in &conversion.relationships {
        for endpoint in relationship.kind.endpoints() {
            let mapped = conversion.id_mapping.source_id(endpoint).is_some();
            let reported = conversion
                .warnings
                .iter()
                .any(|warning| warning.message.contains(endpoint));
            assert!(mapped || reported, "unreported dangling endpoint {endpoint}");
        }
    }

    let _ = serde_json::to_string(&conversion).expect("conversion serializes");
});
