// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

pub mod helpers;

mod download_bridge_test;
mod end_to_end_test;
mod orchestrator_test;
mod routes_test;
