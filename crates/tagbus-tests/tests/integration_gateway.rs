// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Gateway integration tests.
//!
//! End-to-end tag resolution over the mock transport: analog word
//! operations, digital bit read-modify-write, wildcard toggles, permission
//! enforcement, and bulk reads with per-tag failure isolation.

use tagbus_core::error::{ControlError, GatewayError, ModbusError, StoreError};
use tagbus_core::types::{Mode, TagValue};

use tagbus_tests::common::{GatewayHarness, TagFixtures};

// =============================================================================
// Analog Tags
// =============================================================================

#[tokio::test]
async fn test_analog_read_returns_raw_word() {
    let harness = GatewayHarness::new().await;
    harness.add_machine("OIL_MAIN").await;
    harness.add_tag("OIL_MAIN", "PV", TagFixtures::analog(2005)).await;

    harness.bank.set_register(2005, 1234);

    let value = harness.gateway.read_tag("OIL_MAIN", "PV").await.unwrap();
    assert_eq!(value, TagValue::Word(1234));
}

#[tokio::test]
async fn test_analog_write_round_trip() {
    let harness = GatewayHarness::new().await;
    harness.add_machine("OIL_MAIN").await;
    harness.add_tag("OIL_MAIN", "SV", TagFixtures::analog(2010)).await;

    let value = harness.gateway.write_tag("OIL_MAIN", "SV", "321").await.unwrap();
    assert_eq!(value, TagValue::Word(321));
    assert_eq!(harness.bank.register(2010), 321);

    let value = harness.gateway.read_tag("OIL_MAIN", "SV").await.unwrap();
    assert_eq!(value, TagValue::Word(321));
}

#[tokio::test]
async fn test_analog_rejects_non_integer_value() {
    let harness = GatewayHarness::new().await;
    harness.add_machine("M1").await;
    harness.add_tag("M1", "SV", TagFixtures::analog(10)).await;

    let err = harness.gateway.write_tag("M1", "SV", "abc").await.unwrap_err();
    assert!(matches!(
        err,
        GatewayError::Control(ControlError::InvalidTagValue { .. })
    ));
    assert_eq!(harness.bank.write_count(), 0);
}

#[tokio::test]
async fn test_analog_rejects_wildcard() {
    let harness = GatewayHarness::new().await;
    harness.add_machine("M1").await;
    harness.add_tag("M1", "SV", TagFixtures::analog(10)).await;

    let err = harness.gateway.write_tag("M1", "SV", "*").await.unwrap_err();
    assert!(matches!(
        err,
        GatewayError::Control(ControlError::InvalidTagValue { .. })
    ));
}

// =============================================================================
// Digital Tags
// =============================================================================

#[tokio::test]
async fn test_digital_am_scenario() {
    let harness = GatewayHarness::new().await;
    harness.add_machine("OIL_MAIN").await;
    harness
        .add_tag("OIL_MAIN", "MODE", TagFixtures::digital_am(2000, 3))
        .await;

    // Register word is all zeros: bit 3 clear means AUTO.
    let value = harness.gateway.read_tag("OIL_MAIN", "MODE").await.unwrap();
    assert_eq!(value, TagValue::Mode(Mode::Auto));

    // Writing MANUAL sets bit 3 and only bit 3.
    let value = harness
        .gateway
        .write_tag("OIL_MAIN", "MODE", "MANUAL")
        .await
        .unwrap();
    assert_eq!(value, TagValue::Mode(Mode::Manual));
    assert_eq!(harness.bank.register(2000), 0b0000_0000_0000_1000);

    let value = harness.gateway.read_tag("OIL_MAIN", "MODE").await.unwrap();
    assert_eq!(value, TagValue::Mode(Mode::Manual));

    // Wildcard toggles back to AUTO.
    let value = harness
        .gateway
        .write_tag("OIL_MAIN", "MODE", "*")
        .await
        .unwrap();
    assert_eq!(value, TagValue::Mode(Mode::Auto));
    assert_eq!(harness.bank.register(2000), 0);
}

#[tokio::test]
async fn test_digital_write_preserves_other_bits() {
    let harness = GatewayHarness::new().await;
    harness.add_machine("M1").await;
    harness.add_tag("M1", "MODE", TagFixtures::digital_am(2000, 3)).await;

    harness.bank.set_register(2000, 0b1111_0000_0000_0001);

    harness.gateway.write_tag("M1", "MODE", "MANUAL").await.unwrap();
    assert_eq!(harness.bank.register(2000), 0b1111_0000_0000_1001);

    harness.gateway.write_tag("M1", "MODE", "AUTO").await.unwrap();
    assert_eq!(harness.bank.register(2000), 0b1111_0000_0000_0001);
}

#[tokio::test]
async fn test_digital_generic_on_off() {
    let harness = GatewayHarness::new().await;
    harness.add_machine("M1").await;
    harness.add_tag("M1", "PUMP", TagFixtures::digital(100, 0)).await;

    let value = harness.gateway.read_tag("M1", "PUMP").await.unwrap();
    assert_eq!(value, TagValue::Mode(Mode::Off));

    let value = harness.gateway.write_tag("M1", "PUMP", "on").await.unwrap();
    assert_eq!(value, TagValue::Mode(Mode::On));
    assert_eq!(harness.bank.register(100), 1);

    let value = harness.gateway.write_tag("M1", "PUMP", "*").await.unwrap();
    assert_eq!(value, TagValue::Mode(Mode::Off));
}

#[tokio::test]
async fn test_digital_rm_mapping() {
    let harness = GatewayHarness::new().await;
    harness.add_machine("M1").await;
    harness.add_tag("M1", "CTRL", TagFixtures::digital_rm(50, 7)).await;

    let value = harness.gateway.read_tag("M1", "CTRL").await.unwrap();
    assert_eq!(value, TagValue::Mode(Mode::Local));

    let value = harness
        .gateway
        .write_tag("M1", "CTRL", "REMOTE")
        .await
        .unwrap();
    assert_eq!(value, TagValue::Mode(Mode::Remote));
    assert_eq!(harness.bank.register(50), 1 << 7);
}

#[tokio::test]
async fn test_invalid_mode_for_kind_names_accepted_values() {
    let harness = GatewayHarness::new().await;
    harness.add_machine("M1").await;
    harness.add_tag("M1", "MODE", TagFixtures::digital_am(2000, 3)).await;

    let err = harness
        .gateway
        .write_tag("M1", "MODE", "LOCAL")
        .await
        .unwrap_err();

    match err {
        GatewayError::Control(ControlError::InvalidModeValue { expected, .. }) => {
            assert!(expected.contains("AUTO"));
            assert!(expected.contains("MANUAL"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(harness.bank.write_count(), 0);
}

#[tokio::test]
async fn test_toggle_is_read_then_single_write() {
    let harness = GatewayHarness::new().await;
    harness.add_machine("M1").await;
    harness.add_tag("M1", "MODE", TagFixtures::digital_am(2000, 3)).await;

    harness.gateway.write_tag("M1", "MODE", "*").await.unwrap();

    assert_eq!(harness.bank.write_history(), vec![(2000, 0b1000)]);
}

// =============================================================================
// Permission Enforcement
// =============================================================================

#[tokio::test]
async fn test_write_to_read_only_analog_fails_without_io() {
    let harness = GatewayHarness::new().await;
    harness.add_machine("M1").await;
    harness
        .add_tag("M1", "PV", TagFixtures::analog_read_only(2005))
        .await;

    harness.bank.set_register(2005, 77);

    let err = harness.gateway.write_tag("M1", "PV", "123").await.unwrap_err();
    assert!(matches!(
        err,
        GatewayError::Control(ControlError::TagReadOnly { .. })
    ));
    assert_eq!(harness.bank.read_count(), 0);
    assert_eq!(harness.bank.write_count(), 0);

    // Reads still work.
    let value = harness.gateway.read_tag("M1", "PV").await.unwrap();
    assert_eq!(value, TagValue::Word(77));
}

#[tokio::test]
async fn test_wildcard_write_to_read_only_digital_fails() {
    let harness = GatewayHarness::new().await;
    harness.add_machine("M1").await;
    harness
        .add_tag("M1", "MODE", TagFixtures::digital_am_read_only(2000, 3))
        .await;

    let err = harness.gateway.write_tag("M1", "MODE", "*").await.unwrap_err();
    assert!(matches!(
        err,
        GatewayError::Control(ControlError::TagReadOnly { .. })
    ));
    assert_eq!(harness.bank.read_count(), 0);
}

// =============================================================================
// Resolution
// =============================================================================

#[tokio::test]
async fn test_resolution_is_case_insensitive() {
    let harness = GatewayHarness::new().await;
    harness.add_machine("oil_main").await;
    harness.add_tag("OIL_MAIN", "pv", TagFixtures::analog(2005)).await;

    harness.bank.set_register(2005, 42);

    let lower = harness.gateway.read_tag("oil_main", "pv").await.unwrap();
    let upper = harness.gateway.read_tag("OIL_MAIN", "PV").await.unwrap();
    assert_eq!(lower, upper);
}

#[tokio::test]
async fn test_unknown_machine_and_tag() {
    let harness = GatewayHarness::new().await;
    harness.add_machine("M1").await;

    let err = harness.gateway.read_tag("GHOST", "PV").await.unwrap_err();
    assert!(matches!(
        err,
        GatewayError::Store(StoreError::MachineNotFound { .. })
    ));

    let err = harness.gateway.read_tag("M1", "GHOST").await.unwrap_err();
    assert!(matches!(
        err,
        GatewayError::Store(StoreError::TagNotFound { .. })
    ));
}

#[tokio::test]
async fn test_modbus_failure_surfaces_as_read_error() {
    let harness = GatewayHarness::new().await;
    harness.add_machine("M1").await;
    harness.add_tag("M1", "PV", TagFixtures::analog(2005)).await;

    harness.bank.fail_next_read();

    let err = harness.gateway.read_tag("M1", "PV").await.unwrap_err();
    assert!(matches!(
        err,
        GatewayError::Modbus(ModbusError::ReadFailed { .. })
    ));

    // The connection was invalidated; the next read reconnects and works.
    let value = harness.gateway.read_tag("M1", "PV").await.unwrap();
    assert_eq!(value, TagValue::Word(0));
}

// =============================================================================
// Bulk Reads
// =============================================================================

#[tokio::test]
async fn test_bulk_read_isolates_per_tag_failures() {
    let harness = GatewayHarness::new().await;
    harness.add_machine("M1").await;
    harness.add_tag("M1", "PV", TagFixtures::analog(2005)).await;
    harness.add_tag("M1", "SV", TagFixtures::analog(2010)).await;

    harness.bank.set_register(2005, 11);
    harness.bank.set_register(2010, 22);

    let tags = vec![
        "PV".to_string(),
        "SV".to_string(),
        "BAD_TAG".to_string(),
    ];
    let readings = harness.gateway.read_tags("M1", &tags).await;

    assert_eq!(readings.len(), 3);
    assert_eq!(readings["PV"].value(), Some(TagValue::Word(11)));
    assert_eq!(readings["SV"].value(), Some(TagValue::Word(22)));
    assert!(readings["BAD_TAG"].is_error());
}

#[tokio::test]
async fn test_bulk_read_normalizes_requested_names() {
    let harness = GatewayHarness::new().await;
    harness.add_machine("M1").await;
    harness.add_tag("M1", "PV", TagFixtures::analog(2005)).await;

    let readings = harness
        .gateway
        .read_tags("m1", &["pv".to_string()])
        .await;

    // Result keys carry the canonical (uppercase) tag name.
    assert!(readings.contains_key("PV"));
}
