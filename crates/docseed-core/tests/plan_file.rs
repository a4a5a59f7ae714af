//! Plan file loading from disk.

use docseed_core::{ConfigError, IndexKey, PlanFile, ProvisioningDirective};
use std::io::Write;

#[test]
fn test_load_plan_from_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        r#"
name: eventstore-only
admin_database: admin
stores:
  - database: eventstore
    user:
      username: svc
      password: svc-password
      roles: [{{ role: readWrite }}]
    collections:
      - name: events
        indexes:
          - keys: [{{ field: aggregateId, direction: 1 }}]
"#
    )
    .unwrap();

    let plan = PlanFile::from_file(file.path())
        .unwrap()
        .to_plan_with(|_| None)
        .unwrap();

    assert_eq!(plan.name(), "eventstore-only");
    assert_eq!(
        plan.directives()[2],
        ProvisioningDirective::create_index(
            "eventstore",
            "events",
            vec![IndexKey::asc("aggregateId")],
            false
        )
    );
}

#[test]
fn test_missing_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = PlanFile::from_file(dir.path().join("absent.yaml")).unwrap_err();
    assert!(matches!(err, ConfigError::Io(_)));
}

#[test]
fn test_password_env_read_from_process_environment() {
    // SAFETY: We're in a test and controlling the environment
    unsafe {
        std::env::set_var("DOCSEED_TEST_SVC_PASSWORD", "from-env");
    }

    let plan = PlanFile::from_yaml(
        r#"
stores:
  - database: eventstore
    user:
      username: svc
      password_env: DOCSEED_TEST_SVC_PASSWORD
"#,
    )
    .unwrap()
    .to_plan()
    .unwrap();

    match &plan.directives()[0] {
        ProvisioningDirective::CreateUser(user) => assert_eq!(user.password, "from-env"),
        other => panic!("expected user directive, got {:?}", other),
    }

    // SAFETY: Cleanup in test
    unsafe {
        std::env::remove_var("DOCSEED_TEST_SVC_PASSWORD");
    }
}
