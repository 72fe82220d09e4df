//! Cluster probe and index provisioning over real HTTP against a mock cluster.

use logmon_common::{
    ClusterProbe, CreateResult, HttpClusterTransport, IndexMapping, IndexStatus, Liveness,
    ProvisionPolicy, Provisioner, RecordingSleeper,
};
use mockito::{Matcher, Server};
use serde_json::json;
use std::net::TcpListener;
use std::sync::Arc;
use std::time::Duration;

fn transport(server: &Server) -> Arc<HttpClusterTransport> {
    Arc::new(HttpClusterTransport::new(&server.url()).unwrap())
}

fn probe(transport: Arc<HttpClusterTransport>) -> ClusterProbe {
    ClusterProbe::new(transport, Duration::from_secs(2))
}

#[test]
fn test_head_200_is_exists_and_404_is_not_found() {
    let mut server = Server::new();
    let root = server.mock("GET", "/").with_status(200).expect(2).create();
    let index_a = server
        .mock("HEAD", "/index_a")
        .with_status(200)
        .expect(2)
        .create();
    let index_b = server
        .mock("HEAD", "/index_b")
        .with_status(404)
        .expect(2)
        .create();
    let index_c = server.mock("HEAD", "/index_c").with_status(404).create();

    let probe = probe(transport(&server));
    assert_eq!(probe.check_liveness(), Liveness::Running);
    assert_eq!(probe.check_index_exists("index_a"), IndexStatus::Exists);
    assert_eq!(probe.check_index_exists("index_b"), IndexStatus::NotFound);

    let status = probe.snapshot(&IndexMapping::default());
    assert_eq!(status.index("Index_A"), Some(&IndexStatus::Exists));
    assert_eq!(status.index("Index_B"), Some(&IndexStatus::NotFound));
    assert_eq!(status.indexes[0].label, "Exists");
    assert_eq!(status.indexes[1].label, "Not found");

    root.assert();
    index_a.assert();
    index_b.assert();
    index_c.assert();
}

#[test]
fn test_non_success_root_is_unhealthy() {
    let mut server = Server::new();
    let root = server.mock("GET", "/").with_status(503).create();
    let heads = server
        .mock("HEAD", Matcher::Any)
        .with_status(200)
        .expect(0)
        .create();

    let status = probe(transport(&server)).snapshot(&IndexMapping::default());
    assert_eq!(status.liveness, Liveness::Unhealthy { status: 503 });
    assert!(status.indexes.is_empty());

    root.assert();
    heads.assert();
}

#[test]
fn test_connection_refused_is_a_status_not_an_error() {
    // Reserve a port, then release it so nothing listens there
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let url = format!("http://{}", listener.local_addr().unwrap());
    drop(listener);

    let probe = probe(Arc::new(HttpClusterTransport::new(&url).unwrap()));
    let liveness = probe.check_liveness();
    assert!(matches!(liveness, Liveness::Unreachable { .. }));
    assert!(liveness.to_string().starts_with("Error: "));

    assert!(matches!(
        probe.check_index_exists("index_a"),
        IndexStatus::Error { .. }
    ));
}

#[test]
fn test_provisioning_puts_settings_and_reports_rejected_body() {
    let settings = json!({"settings": {"number_of_shards": 1, "number_of_replicas": 0}});
    let rejection = r#"{"error":{"type":"illegal_argument_exception","reason":"bad name"},"status":400}"#;

    let mut server = Server::new();
    let root = server.mock("GET", "/").with_status(200).create();
    let mut put = |path: &str, status: usize, body: &str| {
        server
            .mock("PUT", path)
            .match_header("content-type", "application/json")
            .match_body(Matcher::Json(settings.clone()))
            .with_status(status)
            .with_body(body)
            .create()
    };
    let index_a = put("/index_a", 200, r#"{"acknowledged":true}"#);
    let index_b = put("/index_b", 201, r#"{"acknowledged":true}"#);
    let index_c = put("/index_c", 400, rejection);

    let sleeper = Arc::new(RecordingSleeper::new());
    let report = Provisioner::new(
        transport(&server),
        IndexMapping::default(),
        ProvisionPolicy::default(),
        sleeper.clone(),
    )
    .run();

    assert!(!report.aborted);
    assert_eq!(report.liveness_attempts, 1);
    assert!(sleeper.sleeps().is_empty());
    assert_eq!(report.results.len(), 3);
    assert_eq!(report.failed_count(), 1);
    assert_eq!(
        report.results[0],
        "Created or confirmed index Index_A (using index_a)"
    );
    assert_eq!(
        report.results[1],
        "Created or confirmed index Index_B (using index_b)"
    );
    assert_eq!(
        report.results[2],
        format!("Failed to create index Index_C: {}", rejection)
    );
    assert_eq!(
        report.outcomes[2].result,
        CreateResult::Rejected {
            status: 400,
            body: rejection.to_string(),
        }
    );

    root.assert();
    index_a.assert();
    index_b.assert();
    index_c.assert();
}

#[test]
fn test_rerun_against_existing_indexes_is_confirmed() {
    let exists = r#"{"error":{"type":"resource_already_exists_exception","reason":"already exists"},"status":400}"#;

    let mut server = Server::new();
    let root = server.mock("GET", "/").with_status(200).create();
    let puts = server
        .mock("PUT", Matcher::Regex(r"^/index_[abc]$".to_string()))
        .with_status(400)
        .with_body(exists)
        .expect(3)
        .create();

    let report = Provisioner::new(
        transport(&server),
        IndexMapping::default(),
        ProvisionPolicy::default(),
        Arc::new(RecordingSleeper::new()),
    )
    .run();

    assert_eq!(report.failed_count(), 0);
    assert_eq!(report.results.len(), 3);
    root.assert();
    puts.assert();
}
