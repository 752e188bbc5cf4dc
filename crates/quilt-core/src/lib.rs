//! quilt-core
//!
//! Folds the output of a job's tasks into one canonical report.
//!
//! Each task family runs a two-step pipeline: a producer turns a task into
//! an optional fragment, and a transformer turns that fragment into a merge
//! instruction. The aggregator folds instructions into the report, keyed by
//! change and ordered the way the analysis step says.
//!
//! # モジュール構成
//! - **domain**: ドメインモデル（task, fragment, instruction, report, job spec）
//! - **ports**: 差し替え可能な境界（FragmentProducer, Transformer, ChangeIdentity）
//! - **impls**: 参照実装（producers, transformers, CommitIdentity）
//! - **pipeline**: producer → transformer と TaskKind ごとの registry
//! - **app**: Aggregator, Router, ReportBuilder, JobGraph
//! - **config**: 参照 producer が使う URL 設定

pub mod app;
pub mod config;
pub mod domain;
pub mod error;
pub mod impls;
pub mod pipeline;
pub mod ports;

pub use app::{Aggregator, Evaluation, JobGraph, ReportBuilder, Router};
pub use config::ProducerConfig;
pub use domain::{Event, Fragment, MergeInstruction, Report, Task, TaskKind};
pub use error::ReportError;
