// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # tagbus-tests
//!
//! Integration tests and shared test utilities for the tagbus gateway.
//!
//! The library part of this crate provides the `common` module used by the
//! integration tests under `tests/`:
//!
//! - `mocks`: a configurable in-memory Modbus transport with error
//!   injection and write history
//! - `fixtures`: pre-built tag and machine definitions
//! - `harness`: a fully assembled gateway over an in-memory store and the
//!   mock transport

pub mod common;
