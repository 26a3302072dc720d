// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # opcbridge-tests
//!
//! Integration tests for the opcbridge gateway, with shared mocks and
//! fixtures under [`common`].

pub mod common;
