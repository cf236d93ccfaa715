// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Auto-control: compare-then-write against configured targets.
//!
//! A control plan names `(machine, tag, target_value)` triples. Executing
//! the plan reads each tag, skips the write when the current value already
//! matches the target, and writes otherwise. Every action is recorded in
//! the day-keyed control journal with one of four outcomes:
//!
//! - `unchanged` - current value already matched, no write issued
//! - `success`   - write issued and acknowledged
//! - `failed`    - write issued but rejected
//! - `error`     - the tag could not even be read
//!
//! Execution is driven by the caller (typically the HTTP surface); this
//! service stores the plan and the time of the last execution but runs no
//! scheduler of its own.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use tagbus_core::error::{ControlError, ControlResult};
use tagbus_core::journal::{ControlJournal, ControlRecord, ControlStatus};

use super::resolver::TagGateway;

// =============================================================================
// Control Plan
// =============================================================================

/// One tag and the value it should hold.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ControlTarget {
    /// Tag name (any case).
    pub tag_name: String,
    /// Target value: decimal literal or mode keyword.
    pub target_value: String,
}

/// The controlled tags of one machine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MachineControl {
    /// Machine name (any case).
    pub machine_name: String,
    /// Controlled tags.
    pub tags: Vec<ControlTarget>,
}

/// A full control plan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ControlPlan {
    /// Whether execution is permitted.
    pub enabled: bool,
    /// Per-machine targets.
    pub machines: Vec<MachineControl>,
}

/// Stored plan state reported to callers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ControlState {
    /// Whether execution is permitted.
    pub enabled: bool,
    /// Per-machine targets.
    pub machines: Vec<MachineControl>,
    /// When the plan last executed.
    pub last_executed: Option<DateTime<Utc>>,
}

/// Counters summarizing one execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionSummary {
    /// Total control actions attempted.
    pub control_count: usize,
    /// Actions that issued (or tried to issue) a write.
    pub changed_count: usize,
    /// Actions skipped because the value already matched.
    pub unchanged_count: usize,
    /// When the execution ran.
    pub timestamp: DateTime<Utc>,
}

// =============================================================================
// AutoControl
// =============================================================================

/// The auto-control service.
pub struct AutoControl {
    gateway: Arc<TagGateway>,
    journal: ControlJournal,
    state: RwLock<Option<ControlState>>,
}

impl AutoControl {
    /// Creates the service over a gateway and a journal.
    pub fn new(gateway: Arc<TagGateway>, journal: ControlJournal) -> Self {
        Self {
            gateway,
            journal,
            state: RwLock::new(None),
        }
    }

    // =========================================================================
    // Plan Management
    // =========================================================================

    /// Stores a new control plan, replacing any previous one.
    pub fn configure(&self, plan: ControlPlan) -> ControlState {
        let state = ControlState {
            enabled: plan.enabled,
            machines: plan.machines,
            last_executed: None,
        };

        tracing::info!(
            machines = state.machines.len(),
            enabled = state.enabled,
            "Auto-control plan configured"
        );

        *self.state.write() = Some(state.clone());
        state
    }

    /// Enables or disables the stored plan.
    pub fn set_enabled(&self, enabled: bool) -> ControlResult<ControlState> {
        let mut guard = self.state.write();
        let state = guard.as_mut().ok_or(ControlError::NotConfigured)?;
        state.enabled = enabled;

        tracing::info!(enabled, "Auto-control toggled");

        Ok(state.clone())
    }

    /// Returns the stored plan state.
    pub fn status(&self) -> ControlResult<ControlState> {
        self.state.read().clone().ok_or(ControlError::NotConfigured)
    }

    // =========================================================================
    // Execution
    // =========================================================================

    /// Executes a control pass.
    ///
    /// With `override_plan` the given plan is used for this pass only;
    /// otherwise the stored plan runs. A disabled plan refuses to execute.
    pub async fn execute(
        &self,
        override_plan: Option<ControlPlan>,
    ) -> ControlResult<ExecutionSummary> {
        let plan = match override_plan {
            Some(plan) => {
                if !plan.enabled {
                    return Err(ControlError::Disabled);
                }
                plan
            }
            None => {
                let guard = self.state.read();
                let state = guard.as_ref().ok_or(ControlError::NotConfigured)?;
                if !state.enabled {
                    return Err(ControlError::Disabled);
                }
                ControlPlan {
                    enabled: state.enabled,
                    machines: state.machines.clone(),
                }
            }
        };

        let now = Utc::now();
        let mut records = Vec::new();

        for machine_control in &plan.machines {
            for target in &machine_control.tags {
                let record = self.control_one(machine_control, target, now).await;
                records.push(record);
            }
        }

        if records.is_empty() {
            return Err(ControlError::NoTargets);
        }

        let control_count = records.len();
        let unchanged_count = records
            .iter()
            .filter(|r| r.status == ControlStatus::Unchanged)
            .count();
        let changed_count = control_count - unchanged_count;

        tracing::info!(
            control_count,
            changed_count,
            unchanged_count,
            "Auto-control pass finished"
        );

        self.journal
            .append(&records)
            .map_err(|e| ControlError::journal_write("failed to append control records", e))?;

        if let Some(state) = self.state.write().as_mut() {
            state.last_executed = Some(now);
        }

        Ok(ExecutionSummary {
            control_count,
            changed_count,
            unchanged_count,
            timestamp: now,
        })
    }

    async fn control_one(
        &self,
        machine_control: &MachineControl,
        target: &ControlTarget,
        now: DateTime<Utc>,
    ) -> ControlRecord {
        let machine = &machine_control.machine_name;
        let tag = &target.tag_name;
        let target_value = target.target_value.trim();

        let current = match self.gateway.read_tag(machine, tag).await {
            Ok(value) => value.to_string(),
            Err(e) => {
                tracing::error!(
                    machine = %machine,
                    tag = %tag,
                    error = %e,
                    "Auto-control read failed"
                );
                return ControlRecord {
                    timestamp: now,
                    machine: machine.to_uppercase(),
                    tag: tag.to_uppercase(),
                    previous_value: "unknown".to_string(),
                    target_value: target_value.to_string(),
                    status: ControlStatus::Error,
                    error: Some(e.user_message()),
                };
            }
        };

        if current.eq_ignore_ascii_case(target_value) {
            tracing::info!(
                machine = %machine,
                tag = %tag,
                value = %current,
                "Target already satisfied; skipping write"
            );
            return ControlRecord {
                timestamp: now,
                machine: machine.to_uppercase(),
                tag: tag.to_uppercase(),
                previous_value: current,
                target_value: target_value.to_string(),
                status: ControlStatus::Unchanged,
                error: None,
            };
        }

        match self.gateway.write_tag(machine, tag, target_value).await {
            Ok(_) => ControlRecord {
                timestamp: now,
                machine: machine.to_uppercase(),
                tag: tag.to_uppercase(),
                previous_value: current,
                target_value: target_value.to_string(),
                status: ControlStatus::Success,
                error: None,
            },
            Err(e) => {
                tracing::error!(
                    machine = %machine,
                    tag = %tag,
                    error = %e,
                    "Auto-control write failed"
                );
                ControlRecord {
                    timestamp: now,
                    machine: machine.to_uppercase(),
                    tag: tag.to_uppercase(),
                    previous_value: current,
                    target_value: target_value.to_string(),
                    status: ControlStatus::Failed,
                    error: Some(e.user_message()),
                }
            }
        }
    }
}

impl std::fmt::Debug for AutoControl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AutoControl")
            .field("configured", &self.state.read().is_some())
            .finish()
    }
}
