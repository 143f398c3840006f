//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 持有全部资源（配置、存储、网关、会话），驱动交互循环，
//! 并把会话状态机的结果渲染给用户。
//!
//! ## 层次关系
//!
//! ```text
//! orchestrator::App (资源所有者 + 交互循环 + 渲染)
//!     ↓
//! workflow::StudySession (纯状态机：begin_* / complete_*)
//!     ↓
//! services (能力层：gateway / similarity / documents / questions)
//!     ↓
//! clients / storage (基础设施：模型 API、JSON 文件)
//! ```
//!
//! ## 设计原则
//!
//! 1. **状态机不做 I/O**：模型调用夹在 begin_* 和 complete_* 之间，由 App 执行
//! 2. **渲染独立**：会话只产出结构化结果，打印全部在 App 里
//! 3. **失败不扩散**：单条命令的失败渲染成一条消息，交互循环继续

pub mod app;

pub use app::App;
