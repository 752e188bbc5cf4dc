//! Impls - ports の参照実装
//!
//! - `CommitIdentity`: change identity by commits + patch
//! - `BuildProducer` / `TestRunProducer` / `ReadResultProducer` / `AnalysisProducer`
//! - `ExecutionTransformer` / `AnalysisTransformer`

pub mod commit_identity;
pub mod producers;
pub mod transformers;

pub use self::commit_identity::CommitIdentity;
pub use self::producers::{AnalysisProducer, BuildProducer, ReadResultProducer, TestRunProducer};
pub use self::transformers::{AnalysisTransformer, ExecutionTransformer};
