//! wardrobe
//!
//! プロフィール設定ウィザードとダッシュボードの非同期処理、
//! 外部サービス（Gemini・ローカル保存）、設定、CLI。

pub mod cli;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod input;
pub mod progress;
pub mod services;
pub mod setup;

pub use dashboard::{Dashboard, DashboardSession};
pub use error::{Result, WardrobeError};
pub use setup::{SetupSession, SubmissionReceipt};
