// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 领域服务模块
///
/// 笔记提取与媒体分类的核心逻辑：
/// - 分类（classifier）：区分内容媒体与文档/图标类文件
/// - 提取规则（extraction_rules）：站点相关的选择器数据
/// - 提取器（extractor）：笔记列表、当前笔记与用户信息
/// - 全局状态（global_state）：页面状态对象中的视频流地址
/// - 时间解析（time_parser）：发布时间规范化
/// - 视频发现（video_discovery）：多策略视频地址发现
pub mod classifier;
pub mod extraction_rules;
pub mod extractor;
pub mod global_state;
pub mod time_parser;
pub mod video_discovery;
