// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Auto-control integration tests.
//!
//! Compare-then-write passes against the mock device: unchanged targets
//! skip the write, differing targets write once, unreadable tags become
//! error entries, and every action lands in the day-keyed journal.

use tagbus_core::error::ControlError;
use tagbus_core::journal::{ControlRecord, ControlStatus};
use tagbus_gateway::{ControlPlan, ControlTarget, MachineControl};

use tagbus_tests::common::{GatewayHarness, TagFixtures};

fn plan_for(machine: &str, tag: &str, target: &str) -> ControlPlan {
    ControlPlan {
        enabled: true,
        machines: vec![MachineControl {
            machine_name: machine.to_string(),
            tags: vec![ControlTarget {
                tag_name: tag.to_string(),
                target_value: target.to_string(),
            }],
        }],
    }
}

fn journal_records(harness: &GatewayHarness) -> Vec<ControlRecord> {
    let content = std::fs::read_to_string(harness.journal_file()).expect("journal file");
    content
        .lines()
        .map(|line| serde_json::from_str(line).expect("journal line"))
        .collect()
}

// =============================================================================
// Execution Outcomes
// =============================================================================

#[tokio::test]
async fn test_matching_value_skips_write() {
    let harness = GatewayHarness::new().await;
    harness.add_machine("M1").await;
    harness.add_tag("M1", "SV", TagFixtures::analog(2010)).await;

    harness.bank.set_register(2010, 100);
    harness.autocontrol.configure(plan_for("M1", "SV", "100"));

    let summary = harness.autocontrol.execute(None).await.unwrap();
    assert_eq!(summary.control_count, 1);
    assert_eq!(summary.unchanged_count, 1);
    assert_eq!(summary.changed_count, 0);
    assert_eq!(harness.bank.write_count(), 0);

    let records = journal_records(&harness);
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].status, ControlStatus::Unchanged);
    assert_eq!(records[0].previous_value, "100");
}

#[tokio::test]
async fn test_differing_value_writes_once() {
    let harness = GatewayHarness::new().await;
    harness.add_machine("M1").await;
    harness.add_tag("M1", "SV", TagFixtures::analog(2010)).await;

    harness.bank.set_register(2010, 50);
    harness.autocontrol.configure(plan_for("M1", "SV", "100"));

    let summary = harness.autocontrol.execute(None).await.unwrap();
    assert_eq!(summary.changed_count, 1);
    assert_eq!(harness.bank.write_history(), vec![(2010, 100)]);

    let records = journal_records(&harness);
    assert_eq!(records[0].status, ControlStatus::Success);
    assert_eq!(records[0].previous_value, "50");
    assert_eq!(records[0].target_value, "100");
}

#[tokio::test]
async fn test_mode_target_compares_case_insensitively() {
    let harness = GatewayHarness::new().await;
    harness.add_machine("M1").await;
    harness.add_tag("M1", "MODE", TagFixtures::digital_am(2000, 3)).await;

    // Bit 3 clear: current value is AUTO, so a lowercase "auto" target
    // must be recognized as already satisfied.
    harness.autocontrol.configure(plan_for("M1", "MODE", "auto"));

    let summary = harness.autocontrol.execute(None).await.unwrap();
    assert_eq!(summary.unchanged_count, 1);
    assert_eq!(harness.bank.write_count(), 0);
}

#[tokio::test]
async fn test_unreadable_tag_becomes_error_entry() {
    let harness = GatewayHarness::new().await;
    harness.add_machine("M1").await;
    harness.add_tag("M1", "SV", TagFixtures::analog(2010)).await;

    let plan = ControlPlan {
        enabled: true,
        machines: vec![MachineControl {
            machine_name: "M1".to_string(),
            tags: vec![
                ControlTarget {
                    tag_name: "SV".to_string(),
                    target_value: "0".to_string(),
                },
                ControlTarget {
                    tag_name: "GHOST".to_string(),
                    target_value: "1".to_string(),
                },
            ],
        }],
    };
    harness.autocontrol.configure(plan);

    // One control errors; the other still runs.
    let summary = harness.autocontrol.execute(None).await.unwrap();
    assert_eq!(summary.control_count, 2);

    let records = journal_records(&harness);
    let ghost = records.iter().find(|r| r.tag == "GHOST").unwrap();
    assert_eq!(ghost.status, ControlStatus::Error);
    assert_eq!(ghost.previous_value, "unknown");
    assert!(ghost.error.is_some());

    let sv = records.iter().find(|r| r.tag == "SV").unwrap();
    assert_eq!(sv.status, ControlStatus::Unchanged);
}

#[tokio::test]
async fn test_rejected_write_becomes_failed_entry() {
    let harness = GatewayHarness::new().await;
    harness.add_machine("M1").await;
    harness
        .add_tag("M1", "SV", TagFixtures::analog_read_only(2010))
        .await;

    harness.bank.set_register(2010, 50);
    harness.autocontrol.configure(plan_for("M1", "SV", "100"));

    harness.autocontrol.execute(None).await.unwrap();

    let records = journal_records(&harness);
    assert_eq!(records[0].status, ControlStatus::Failed);
    assert!(records[0].error.is_some());
}

// =============================================================================
// Plan Management
// =============================================================================

#[tokio::test]
async fn test_execute_requires_configuration() {
    let harness = GatewayHarness::new().await;

    let err = harness.autocontrol.execute(None).await.unwrap_err();
    assert!(matches!(err, ControlError::NotConfigured));
}

#[tokio::test]
async fn test_disabled_plan_refuses_to_execute() {
    let harness = GatewayHarness::new().await;
    harness.add_machine("M1").await;
    harness.add_tag("M1", "SV", TagFixtures::analog(2010)).await;

    harness.autocontrol.configure(plan_for("M1", "SV", "1"));
    harness.autocontrol.set_enabled(false).unwrap();

    let err = harness.autocontrol.execute(None).await.unwrap_err();
    assert!(matches!(err, ControlError::Disabled));
    assert_eq!(harness.bank.write_count(), 0);
}

#[tokio::test]
async fn test_status_tracks_last_execution() {
    let harness = GatewayHarness::new().await;
    harness.add_machine("M1").await;
    harness.add_tag("M1", "SV", TagFixtures::analog(2010)).await;

    harness.autocontrol.configure(plan_for("M1", "SV", "0"));
    assert!(harness.autocontrol.status().unwrap().last_executed.is_none());

    harness.autocontrol.execute(None).await.unwrap();

    let status = harness.autocontrol.status().unwrap();
    assert!(status.enabled);
    assert!(status.last_executed.is_some());
}

#[tokio::test]
async fn test_override_plan_runs_without_stored_state() {
    let harness = GatewayHarness::new().await;
    harness.add_machine("M1").await;
    harness.add_tag("M1", "SV", TagFixtures::analog(2010)).await;

    let summary = harness
        .autocontrol
        .execute(Some(plan_for("M1", "SV", "7")))
        .await
        .unwrap();
    assert_eq!(summary.changed_count, 1);
    assert_eq!(harness.bank.register(2010), 7);
}

#[tokio::test]
async fn test_journal_accumulates_across_passes() {
    let harness = GatewayHarness::new().await;
    harness.add_machine("M1").await;
    harness.add_tag("M1", "SV", TagFixtures::analog(2010)).await;

    harness.autocontrol.configure(plan_for("M1", "SV", "1"));
    harness.autocontrol.execute(None).await.unwrap();
    harness.autocontrol.execute(None).await.unwrap();

    // First pass writes, second finds the value already in place.
    let records = journal_records(&harness);
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].status, ControlStatus::Success);
    assert_eq!(records[1].status, ControlStatus::Unchanged);
}
