// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// HTTP 下载桥接
pub mod download_bridge;

/// 指标
pub mod metrics;

/// 本地存储
pub mod storage;
