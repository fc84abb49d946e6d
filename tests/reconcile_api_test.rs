//! Integration tests for the reconciliation engine against a real
//! settings file.

use monitorkit::catalog::StaticCatalog;
use monitorkit::reconcile::{AccountId, DesiredConfig, OutcomeKind, Reconciler, Status};
use monitorkit::settings::{FileSettingsStore, SettingsStore};
use monitorkit::shell::FakeScriptRunner;
use tempfile::TempDir;

const KEY: &str = "0123456789abcdef0123456789abcdef01234567";

fn catalog() -> StaticCatalog {
    StaticCatalog::new([
        ("7.4", "/opt/plesk/php/7.4/bin/php"),
        ("8.1", "/opt/plesk/php/8.1/bin/php"),
        ("8.2", "/opt/plesk/php/8.2/bin/php"),
    ])
}

fn engine(temp: &TempDir) -> Reconciler<FileSettingsStore, FakeScriptRunner, StaticCatalog> {
    let store = FileSettingsStore::open(&temp.path().join("settings.yml")).unwrap();
    Reconciler::new(store, FakeScriptRunner::new(), catalog())
}

fn reopen(temp: &TempDir) -> FileSettingsStore {
    FileSettingsStore::open(&temp.path().join("settings.yml")).unwrap()
}

#[test]
fn full_install_persists_flags() {
    let temp = TempDir::new().unwrap();
    let mut engine = engine(&temp);

    let desired = DesiredConfig::new(KEY, "  web01\u{7}.example.com \n")
        .with_account_id(AccountId::new(Some(42)))
        .with_infrastructure(true)
        .with_apm(true)
        .with_variants(["8.2", "8.1"]);
    let recorded = engine.recorded_state().unwrap();
    let report = engine.reconcile(&desired, &recorded).unwrap();

    assert!(report.is_success());

    let infra = engine.runner().calls_to("infrastructure.sh");
    assert_eq!(infra[0].args, [KEY, "web01.example.com"]);

    let apm = engine.runner().calls_to("apm.sh");
    assert_eq!(
        apm[0].args[2],
        "/opt/plesk/php/8.1/bin/php:/opt/plesk/php/8.2/bin/php"
    );

    let store = reopen(&temp);
    assert_eq!(store.get("server_name").unwrap().as_deref(), Some("web01.example.com"));
    assert_eq!(store.get("account_id").unwrap().as_deref(), Some("42"));
    assert_eq!(store.get("infrastructure").unwrap().as_deref(), Some("true"));
    assert_eq!(store.get("apm").unwrap().as_deref(), Some("true"));
    assert_eq!(store.get("php_versions_81").unwrap().as_deref(), Some("true"));
    assert_eq!(store.get("php_versions_82").unwrap().as_deref(), Some("true"));
    assert_eq!(store.get("php_versions_74").unwrap(), None);
}

#[test]
fn partial_failure_keeps_successful_feature() {
    let temp = TempDir::new().unwrap();
    let store = FileSettingsStore::open(&temp.path().join("settings.yml")).unwrap();
    let mut runner = FakeScriptRunner::new();
    runner.fail("infrastructure.sh", 1, "repository unreachable");
    let mut engine = Reconciler::new(store, runner, catalog());

    let desired = DesiredConfig::new(KEY, "web01")
        .with_infrastructure(true)
        .with_apm(true)
        .with_variants(["7.4"]);
    let recorded = engine.recorded_state().unwrap();
    let report = engine.reconcile(&desired, &recorded).unwrap();

    assert!(!report.is_success());
    let infra = report.find("infrastructure").unwrap();
    assert_eq!(infra.kind, OutcomeKind::ScriptExecutionFailed);
    assert_eq!(infra.message, "repository unreachable");
    assert_eq!(report.find("apm").unwrap().status, Status::Ok);

    let store = reopen(&temp);
    assert_eq!(store.get("infrastructure").unwrap(), None);
    assert_eq!(store.get("apm").unwrap().as_deref(), Some("true"));
}

#[test]
fn reconcile_twice_is_stable() {
    let temp = TempDir::new().unwrap();
    let mut engine = engine(&temp);
    let desired = DesiredConfig::new(KEY, "web01")
        .with_apm(true)
        .with_variants(["8.1"]);

    let first = engine.recorded_state().unwrap();
    engine.reconcile(&desired, &first).unwrap();
    let after_first = engine.recorded_state().unwrap();

    let report = engine.reconcile(&desired, &after_first).unwrap();
    let after_second = engine.recorded_state().unwrap();

    assert!(report.is_success());
    assert_eq!(after_first, after_second);
    assert_eq!(engine.runner().calls_to("apm.sh").len(), 2);
}

#[test]
fn skipping_apm_warns_about_flagged_versions() {
    let temp = TempDir::new().unwrap();
    let mut engine = engine(&temp);

    let with_apm = DesiredConfig::new(KEY, "web01")
        .with_apm(true)
        .with_variants(["8.1"]);
    let recorded = engine.recorded_state().unwrap();
    engine.reconcile(&with_apm, &recorded).unwrap();

    let without_apm = DesiredConfig::new(KEY, "web01").with_infrastructure(true);
    let recorded = engine.recorded_state().unwrap();
    let report = engine.reconcile(&without_apm, &recorded).unwrap();

    let warnings = report.of_kind(OutcomeKind::VariantsStillSelected);
    assert_eq!(warnings.len(), 1);
    assert_eq!(warnings[0].subject, "8.1");
    assert!(report.is_success());
    assert_eq!(
        reopen(&temp).get("php_versions_81").unwrap().as_deref(),
        Some("true")
    );
}

#[test]
fn uninstall_all_clears_apm() {
    let temp = TempDir::new().unwrap();
    let mut engine = engine(&temp);

    let desired = DesiredConfig::new(KEY, "web01")
        .with_apm(true)
        .with_variants(["8.1", "8.2"]);
    let recorded = engine.recorded_state().unwrap();
    engine.reconcile(&desired, &recorded).unwrap();

    let recorded = engine.recorded_state().unwrap();
    let report = engine
        .uninstall(monitorkit::reconcile::FeatureId::Apm, &[], &recorded)
        .unwrap();

    assert!(report.is_success());
    assert_eq!(report.of_kind(OutcomeKind::Uninstalled).len(), 3);

    let calls = engine.runner().calls_to("phpversionsuninstall.sh");
    assert_eq!(calls.last().unwrap().args, ["", "", ""]);

    let store = reopen(&temp);
    assert_eq!(store.get("apm").unwrap(), None);
    assert_eq!(store.get("php_versions_81").unwrap(), None);
    assert_eq!(store.get("php_versions_82").unwrap(), None);
}

#[test]
fn invalid_license_writes_nothing() {
    let temp = TempDir::new().unwrap();
    let mut engine = engine(&temp);

    let desired = DesiredConfig::new("", "web01").with_infrastructure(true);
    let recorded = engine.recorded_state().unwrap();
    let report = engine.reconcile(&desired, &recorded).unwrap();

    assert_eq!(report.len(), 1);
    assert_eq!(report.outcomes()[0].kind, OutcomeKind::InvalidLicense);
    assert!(!temp.path().join("settings.yml").exists());
}

#[test]
fn uninstall_all_clears_flags_for_runtimes_gone_from_host() {
    let temp = TempDir::new().unwrap();
    {
        let mut store = FileSettingsStore::open(&temp.path().join("settings.yml")).unwrap();
        store.set("apm", "true").unwrap();
        store.set("php_versions_56", "true").unwrap();
    }
    let mut engine = engine(&temp);

    let recorded = engine.recorded_state().unwrap();
    assert_eq!(recorded.stale_variants, ["56"]);
    let report = engine
        .uninstall(monitorkit::reconcile::FeatureId::Apm, &[], &recorded)
        .unwrap();

    assert!(report.is_success());
    assert_eq!(engine.runner().calls_to("phpversionsuninstall.sh").len(), 1);

    let store = reopen(&temp);
    assert_eq!(store.get("apm").unwrap(), None);
    assert_eq!(store.get("php_versions_56").unwrap(), None);
}
