// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// HTTP请求处理器模块
///
/// 消息协议（getPageInfo / startDownload / stopDownload）的处理逻辑
pub mod message_handler;
