// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Store and directory integration tests.
//!
//! Persistence round-trips through a file-backed SQLite database, the
//! cascade on machine deletion, and the directory's validate-persist-reload
//! discipline.

use tagbus_core::error::{GatewayError, StoreError};
use tagbus_core::types::{MachineName, TagName};
use tagbus_store::{Directory, Store};

use tagbus_tests::common::TagFixtures;

// =============================================================================
// Persistence Round-Trips
// =============================================================================

#[tokio::test]
async fn test_configuration_survives_reopen() {
    let tmp = tempfile::tempdir().unwrap();
    let db_path = tmp.path().join("tagbus.db");

    {
        let store = Store::open(&db_path).await.unwrap();
        let directory = Directory::open(store).await.unwrap();
        directory
            .upsert_machine("OIL_MAIN", "172.30.1.97", 502, 1)
            .await
            .unwrap();
        directory
            .add_tag("OIL_MAIN", "PV", TagFixtures::analog(2005))
            .await
            .unwrap();
        directory.store().close().await;
    }

    let store = Store::open(&db_path).await.unwrap();
    let loaded = store.load_all().await.unwrap();

    let machine = loaded.get(&MachineName::new("OIL_MAIN")).unwrap();
    assert_eq!(machine.ip, "172.30.1.97");
    assert_eq!(machine.port, 502);
    assert!(machine.tag(&TagName::new("PV")).is_some());
    store.close().await;
}

#[tokio::test]
async fn test_machine_delete_cascades_tags() {
    let store = Store::open_in_memory().await.unwrap();
    let directory = Directory::open(store).await.unwrap();

    directory.upsert_machine("M1", "10.0.0.1", 502, 1).await.unwrap();
    directory
        .add_tag("M1", "PV", TagFixtures::analog(1))
        .await
        .unwrap();
    directory
        .add_tag("M1", "MODE", TagFixtures::digital_am(2000, 3))
        .await
        .unwrap();

    assert!(directory.delete_machine("M1").await.unwrap());

    // Re-creating the machine must not resurrect its old tags.
    directory.upsert_machine("M1", "10.0.0.1", 502, 1).await.unwrap();
    assert!(directory.machine("M1").unwrap().tags.is_empty());
}

#[tokio::test]
async fn test_upsert_machine_is_last_write_wins() {
    let store = Store::open_in_memory().await.unwrap();
    let directory = Directory::open(store).await.unwrap();

    directory.upsert_machine("M1", "10.0.0.1", 502, 1).await.unwrap();
    directory
        .add_tag("M1", "PV", TagFixtures::analog(1))
        .await
        .unwrap();

    // Second upsert updates the endpoint and keeps the tags.
    directory.upsert_machine("M1", "10.0.0.2", 1502, 3).await.unwrap();

    let machine = directory.machine("M1").unwrap();
    assert_eq!(machine.ip, "10.0.0.2");
    assert_eq!(machine.port, 1502);
    assert_eq!(machine.slave, 3);
    assert!(machine.tag(&TagName::new("PV")).is_some());
}

// =============================================================================
// Tag Mutations
// =============================================================================

#[tokio::test]
async fn test_duplicate_tag_add_is_conflict() {
    let store = Store::open_in_memory().await.unwrap();
    let directory = Directory::open(store).await.unwrap();

    directory.upsert_machine("M1", "10.0.0.1", 502, 1).await.unwrap();
    directory
        .add_tag("M1", "PV", TagFixtures::analog(1))
        .await
        .unwrap();

    // Same tag under different case is the same tag.
    let err = directory
        .add_tag("M1", "pv", TagFixtures::analog(2))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        GatewayError::Store(StoreError::DuplicateTag { .. })
    ));
}

#[tokio::test]
async fn test_update_missing_tag_is_not_found() {
    let store = Store::open_in_memory().await.unwrap();
    let directory = Directory::open(store).await.unwrap();

    directory.upsert_machine("M1", "10.0.0.1", 502, 1).await.unwrap();

    let err = directory
        .update_tag("M1", "GHOST", TagFixtures::analog(1))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        GatewayError::Store(StoreError::TagNotFound { .. })
    ));
}

#[tokio::test]
async fn test_tag_mutation_requires_machine() {
    let store = Store::open_in_memory().await.unwrap();
    let directory = Directory::open(store).await.unwrap();

    let err = directory
        .add_tag("GHOST", "PV", TagFixtures::analog(1))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        GatewayError::Store(StoreError::MachineNotFound { .. })
    ));
}

#[tokio::test]
async fn test_update_tag_revalidates_address() {
    let store = Store::open_in_memory().await.unwrap();
    let directory = Directory::open(store).await.unwrap();

    directory.upsert_machine("M1", "10.0.0.1", 502, 1).await.unwrap();
    directory
        .add_tag("M1", "MODE", TagFixtures::digital_am(2000, 3))
        .await
        .unwrap();

    let mut bad = TagFixtures::digital_am(2000, 3);
    bad.real_register = "0.16".to_string();
    assert!(directory.update_tag("M1", "MODE", bad).await.is_err());

    // The previous definition is untouched.
    let (_, tag) = directory.resolve("M1", "MODE").unwrap();
    assert_eq!(tag.real_register, "2000.3");
}

// =============================================================================
// Address Validation Boundaries
// =============================================================================

#[tokio::test]
async fn test_address_boundaries_at_admission() {
    let store = Store::open_in_memory().await.unwrap();
    let directory = Directory::open(store).await.unwrap();
    directory.upsert_machine("M1", "10.0.0.1", 502, 1).await.unwrap();

    let mut edge = TagFixtures::digital(0, 0);
    edge.real_register = "9999.15".to_string();
    assert!(directory.add_tag("M1", "EDGE", edge).await.is_ok());

    for bad_address in ["10000.0", "0.16", "5.5.5", "5"] {
        let mut bad = TagFixtures::digital(0, 0);
        bad.real_register = bad_address.to_string();
        let result = directory.add_tag("M1", "BAD", bad).await;
        assert!(result.is_err(), "{} should be rejected", bad_address);
    }
}
