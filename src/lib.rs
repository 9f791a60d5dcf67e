// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 配置模块
///
/// 处理应用程序的配置设置和环境变量
pub mod config;

/// 领域模块
///
/// 包含笔记、媒体等核心实体，以及提取与分类服务
pub mod domain;

/// 引擎模块
///
/// 提供页面会话实现（静态 HTML 快照与浏览器页面）
pub mod engines;

/// 基础设施模块
///
/// 提供下载桥接、本地存储与指标等外部集成
pub mod infrastructure;

/// 表示层模块
///
/// 处理消息协议、HTTP 路由与错误映射
pub mod presentation;

/// 工具模块
///
/// 提供通用的工具函数和辅助功能
pub mod utils;

/// 工作器模块
///
/// 实现下载编排与通知处理
pub mod workers;
