// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 下载桥接接口
pub mod download_bridge;

/// 存储仓库接口
pub mod storage_repository;
