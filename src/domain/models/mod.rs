// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

pub mod download_task;
pub mod message;
pub mod note;
pub mod options;
pub mod progress;
