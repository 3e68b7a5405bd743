#![no_main]

use libfuzzer_sys::fuzz_target;
use mssql_auth::FedAuthConfig;
use mssql_client::Config;

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        let config = Config::from_connection_string(s);
        let fed_auth = FedAuthConfig::parse(s);

        // Both parsers see the same fedauth keys and must agree on validity
        if let Ok(config) = config {
            assert_eq!(Some(&config.fed_auth), fed_auth.as_ref().ok());
        }
    }
});
