use header_echo::common::create_test_server;
use header_echo::{HeaderMapping, HttpConfig, HttpEchoClient, canonical_name};
use proptest::prelude::*;
use std::collections::HashSet;
use std::net::SocketAddr;
use std::sync::{OnceLock, mpsc};
use std::thread;

fn header_name() -> impl Strategy<Value = String> {
    "[A-Za-z][A-Za-z0-9]{0,6}(-[A-Za-z0-9]{1,6}){0,2}"
}

fn header_value() -> impl Strategy<Value = String> {
    "[ -~]{0,16}".prop_map(|v| v.trim().to_string())
}

/// Address of a server shared by every wire-level case
///
/// The server lives on its own runtime thread for the rest of the test
/// binary, so cases only pay for a connection.
fn shared_server() -> SocketAddr {
    static SERVER: OnceLock<SocketAddr> = OnceLock::new();
    *SERVER.get_or_init(|| {
        let (tx, rx) = mpsc::channel();
        thread::spawn(move || {
            let runtime = tokio::runtime::Runtime::new().expect("Failed to build runtime");
            runtime.block_on(async move {
                let server = create_test_server(HttpConfig::default())
                    .await
                    .expect("Server setup failed");
                tx.send(server.addr).expect("Test thread went away");
                let _ = server.handle.await;
            });
        });
        rx.recv().expect("Server thread exited before binding")
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Property: every distinct name appears once, carrying its last value
    #[test]
    fn mapping_keeps_last_value(
        pairs in prop::collection::vec((header_name(), header_value()), 0..20)
    ) {
        let mapping = HeaderMapping::from_pairs(pairs.iter().map(|(n, v)| (n.as_str(), v.as_str())));

        let distinct: HashSet<String> = pairs.iter().map(|(n, _)| canonical_name(n)).collect();
        prop_assert_eq!(mapping.len(), distinct.len());

        for name in &distinct {
            let last = pairs
                .iter()
                .rev()
                .find(|(n, _)| &canonical_name(n) == name)
                .map(|(_, v)| v.as_str());
            prop_assert_eq!(mapping.get(name), last);
        }
    }

    /// Property: key order follows the first occurrence of each name
    #[test]
    fn mapping_orders_by_first_occurrence(
        pairs in prop::collection::vec((header_name(), header_value()), 0..20)
    ) {
        let mapping = HeaderMapping::from_pairs(pairs.iter().map(|(n, v)| (n.as_str(), v.as_str())));

        let mut seen = HashSet::new();
        let expected: Vec<String> = pairs
            .iter()
            .map(|(n, _)| canonical_name(n))
            .filter(|n| seen.insert(n.clone()))
            .collect();
        let actual: Vec<String> = mapping.names().map(str::to_string).collect();
        prop_assert_eq!(actual, expected);
    }

    /// Property: canonicalization is idempotent and case-insensitive
    #[test]
    fn canonical_name_is_stable(name in header_name()) {
        let canonical = canonical_name(&name);
        prop_assert_eq!(canonical_name(&canonical), canonical.clone());
        prop_assert_eq!(canonical_name(&name.to_ascii_uppercase()), canonical.clone());
        prop_assert_eq!(canonical_name(&name.to_ascii_lowercase()), canonical);
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(20))]

    /// Property: the echoed key set equals the distinct names sent over the wire
    #[test]
    fn server_echoes_distinct_names(
        pairs in prop::collection::vec((header_name(), header_value()), 1..10)
    ) {
        tokio_test::block_on(async {
            let addr = shared_server();

            let mut raw = String::from("GET /headers HTTP/1.1\r\nHost: proptest\r\n");
            for (name, value) in &pairs {
                raw.push_str(&format!("X-{name}: {value}\r\n"));
            }
            raw.push_str("\r\n");

            let mut client = HttpEchoClient::connect(addr).await
                .map_err(|e| TestCaseError::fail(format!("Client connection failed: {}", e)))?;
            let response = client.send_raw(raw.as_bytes()).await
                .map_err(|e| TestCaseError::fail(format!("Request failed: {}", e)))?;
            let mapping = response.header_mapping()
                .map_err(|e| TestCaseError::fail(format!("Invalid body: {}", e)))?;

            let mut expected: HashSet<String> = pairs
                .iter()
                .map(|(n, _)| canonical_name(&format!("X-{n}")))
                .collect();
            expected.insert("Host".to_string());
            let actual: HashSet<String> = mapping.names().map(str::to_string).collect();
            prop_assert_eq!(actual, expected);
            Ok(())
        })?;
    }
}
