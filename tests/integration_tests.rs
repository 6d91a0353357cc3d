use mongodb_exporter_operator::prelude::*;
use mongodb_exporter_operator::runner::testkit::TestKit;
use mongodb_exporter_operator::runner::WAITING_FOR_CONTROL_SURFACE;

const MISSING_SOURCE_MESSAGE: &str =
    "No Mongodb uri added. Mongodb uri needs to be added via relation or via config";
const DUPLICATE_SOURCE_MESSAGE: &str =
    "Mongodb cannot added via relation and via config at the same time";

fn setup() -> TestKit {
    let _ = env_logger::try_init();
    TestKit::new()
}

fn relation_snapshot() -> RelationSnapshot {
    RelationSnapshot {
        uris: "mongodb://relation-3:27017".to_owned(),
        username: "mongo".to_owned(),
        password: "mongo".to_owned(),
    }
}

#[test]
fn no_config_and_no_relation_blocks_with_the_missing_source_message() {
    let mut testkit = setup();
    testkit.set_reachable(true);

    let status = testkit.update_config(CharmConfig::default());
    assert_eq!(UnitStatus::blocked(MISSING_SOURCE_MESSAGE), status);
    assert_eq!(0, testkit.applied_count());
}

#[test]
fn static_uri_with_reachable_control_surface_goes_active() {
    let mut testkit = setup();
    testkit.set_reachable(true);

    let config = CharmConfig::default().with_mongodb_uri("mongodb://mongodb:27017/");
    let status = testkit.update_config(config);

    assert_eq!(UnitStatus::Active, status);
    let descriptor = testkit.last_applied().expect("no descriptor was applied");
    assert_eq!(
        Some("/bin/mongodb_exporter --mongodb.uri=mongodb://mongodb:27017/"),
        descriptor.command()
    );
}

#[test]
fn malformed_static_uri_blocks() {
    let mut testkit = setup();
    testkit.set_reachable(true);

    let status = testkit.update_config(CharmConfig::default().with_mongodb_uri("foobar"));
    assert!(matches!(status, UnitStatus::Blocked(_)));
    testkit.assert_blocked_containing("mongodb-uri is not properly formed");
    assert_eq!(0, testkit.applied_count());
}

#[test]
fn invalid_log_level_blocks_before_uri_checks() {
    let mut testkit = setup();
    testkit.set_reachable(true);
    testkit.relate(relation_snapshot());

    let config = CharmConfig::default()
        .with_mongodb_uri("foobar")
        .with_log_level("warning");
    testkit.update_config(config);
    testkit.assert_blocked_containing("invalid log level: WARNING");
}

#[test]
fn relation_uri_goes_active_and_is_embedded_in_the_descriptor() {
    let mut testkit = setup();
    testkit.set_reachable(true);

    let status = testkit.relate(relation_snapshot());
    assert_eq!(UnitStatus::Active, status);

    let descriptor = testkit.last_applied().expect("no descriptor was applied");
    assert_eq!(
        Some("/bin/mongodb_exporter --mongodb.uri=mongodb://relation-3:27017"),
        descriptor.command()
    );
    assert_eq!(
        Some(&"mongodb://relation-3:27017".to_owned()),
        descriptor.environment().unwrap().get("MONGODB_URI")
    );
}

#[test]
fn static_uri_and_relation_together_block_with_duplicate_source() {
    let mut testkit = setup();
    testkit.set_reachable(true);
    testkit.relate(relation_snapshot());

    let status =
        testkit.update_config(CharmConfig::default().with_mongodb_uri("mongodb://mongodb:27017/"));
    assert_eq!(UnitStatus::blocked(DUPLICATE_SOURCE_MESSAGE), status);
}

#[test]
fn relation_removed_without_static_config_blocks() {
    let mut testkit = setup();
    testkit.set_reachable(true);

    let status = testkit.relate(relation_snapshot());
    assert_eq!(UnitStatus::Active, status);

    let status = testkit.remove_relation();
    assert_eq!(UnitStatus::blocked(MISSING_SOURCE_MESSAGE), status);
}

#[test]
fn relation_removed_with_static_config_leaves_the_prior_status_untouched() {
    let mut testkit = setup();
    testkit.set_reachable(true);

    let config = CharmConfig::default().with_mongodb_uri("mongodb://mongodb:27017/");
    testkit.update_config(config);
    testkit.assert_active();
    let statuses_before = testkit.recorded_statuses().len();
    let applied_before = testkit.applied_count();

    let status = testkit.remove_relation();
    assert_eq!(UnitStatus::Active, status);
    // no status assignment and no descriptor update on teardown
    assert_eq!(statuses_before, testkit.recorded_statuses().len());
    assert_eq!(applied_before, testkit.applied_count());
}

#[test]
fn unreachable_control_surface_waits_and_mutates_nothing() {
    let mut testkit = setup();

    let config = CharmConfig::default().with_mongodb_uri("mongodb://mongodb:27017/");
    let status = testkit.update_config(config);

    assert_eq!(UnitStatus::waiting(WAITING_FOR_CONTROL_SURFACE), status);
    assert_eq!(0, testkit.applied_count());
    assert_eq!(0, testkit.reconcile_count());
}

#[test]
fn redelivered_event_converges_once_the_control_surface_is_up() {
    let mut testkit = setup();

    let config = CharmConfig::default().with_mongodb_uri("mongodb://mongodb:27017/");
    let status = testkit.update_config(config.clone());
    assert_eq!(UnitStatus::waiting(WAITING_FOR_CONTROL_SURFACE), status);

    testkit.set_reachable(true);
    let status = testkit.update_config(config);
    assert_eq!(UnitStatus::Active, status);
    assert_eq!(1, testkit.applied_count());
}

#[test]
fn repeated_convergence_applies_identical_descriptors() {
    let mut testkit = setup();
    testkit.set_reachable(true);

    let config = CharmConfig::default().with_mongodb_uri("mongodb://mongodb:27017/");
    testkit.update_config(config);
    testkit.workload_ready();

    assert_eq!(2, testkit.applied_count());
    let descriptor = testkit.last_applied().unwrap();
    assert_eq!(
        Some("/bin/mongodb_exporter --mongodb.uri=mongodb://mongodb:27017/"),
        descriptor.command()
    );
}

#[test]
fn periodic_check_goes_active_when_the_service_runs() {
    let mut testkit = setup();
    testkit.set_reachable(true);

    testkit.update_config(CharmConfig::default().with_mongodb_uri("mongodb://mongodb:27017/"));
    testkit.set_service_running(true);
    let status = testkit.periodic_check();
    assert_eq!(UnitStatus::Active, status);
}

#[test]
fn periodic_check_blocks_when_the_service_is_not_running() {
    let mut testkit = setup();
    testkit.set_reachable(true);

    testkit.update_config(CharmConfig::default().with_mongodb_uri("mongodb://mongodb:27017/"));
    testkit.set_service_running(false);

    let status = testkit.periodic_check();
    assert_eq!(
        UnitStatus::blocked("mongodb-exporter service is not running"),
        status
    );
}

#[test]
fn periodic_check_waits_when_the_control_surface_is_down() {
    let mut testkit = setup();

    testkit.update_config(CharmConfig::default().with_mongodb_uri("mongodb://mongodb:27017/"));
    let status = testkit.periodic_check();
    assert_eq!(UnitStatus::waiting(WAITING_FOR_CONTROL_SURFACE), status);
}

#[test]
fn successful_convergence_publishes_ingress_data() {
    let mut testkit = setup();
    testkit.set_reachable(true);

    let config = CharmConfig::default()
        .with_mongodb_uri("mongodb://mongodb:27017/")
        .with_external_hostname("exporter.example.com");
    testkit.update_config(config);

    let ingress = testkit.last_ingress().expect("no ingress data published");
    assert_eq!(Some("exporter.example.com".to_owned()), ingress.service_hostname);
    assert_eq!("mongodb-exporter", ingress.service_name);
    assert_eq!(EXPORTER_PORT, ingress.service_port);
}

#[test]
fn failed_resolution_publishes_no_ingress_data() {
    let mut testkit = setup();
    testkit.set_reachable(true);

    testkit.update_config(CharmConfig::default());
    assert!(testkit.last_ingress().is_none());
}

#[test]
fn config_changed_refreshes_the_static_scrape_job() {
    let mut testkit = setup();
    testkit.set_reachable(true);

    testkit.update_config(CharmConfig::default().with_mongodb_uri("mongodb://mongodb:27017/"));
    let jobs = testkit.scrape_jobs();
    assert_eq!(1, jobs.len());
    assert_eq!(
        vec![format!("*:{}", EXPORTER_PORT)],
        jobs[0].static_configs[0].targets
    );
}

#[test]
fn config_changed_refreshes_the_bundled_dashboards() {
    let mut testkit = setup();
    testkit.set_reachable(true);
    assert_eq!(0, testkit.dashboard_refreshes());

    testkit.update_config(CharmConfig::default().with_mongodb_uri("mongodb://mongodb:27017/"));
    assert_eq!(1, testkit.dashboard_refreshes());

    // other events leave the advertisement alone
    testkit.workload_ready();
    testkit.periodic_check();
    assert_eq!(1, testkit.dashboard_refreshes());
}

#[test]
fn apply_failure_after_the_reachability_check_waits_for_redelivery() {
    let mut testkit = setup();
    testkit.set_reachable(true);
    testkit.fail_next_apply("connection reset");

    let config = CharmConfig::default().with_mongodb_uri("mongodb://mongodb:27017/");
    let status = testkit.update_config(config.clone());
    assert_eq!(UnitStatus::waiting(WAITING_FOR_CONTROL_SURFACE), status);

    // the next delivery succeeds without any state left over from the failed attempt
    let status = testkit.update_config(config);
    assert_eq!(UnitStatus::Active, status);
}

#[test]
fn datastore_request_reflects_the_admin_role_flag() {
    let testkit = setup();
    let plain = testkit
        .controller()
        .datastore_request(&CharmConfig::default());
    assert_eq!("mongodb-exporter", plain.database_name);
    assert_eq!(None, plain.extra_user_roles);

    let admin = testkit
        .controller()
        .datastore_request(&CharmConfig::default().with_relation_admin_role(true));
    assert_eq!(Some("admin".to_owned()), admin.extra_user_roles);
}
