//! App - アプリケーション層
//!
//! ports と pipeline を組み合わせて report を組み立てる。
//!
//! # 主要コンポーネント
//! - **ReportBuilder**: Router の構築とワイヤリング
//! - **Router**: task_type ごとの pipeline 実行と aggregator への受け渡し
//! - **Aggregator**: merge instruction を report に畳み込む
//! - **JobGraph**: 依存関係順の参照 walker

pub mod aggregator;
pub mod builder;
pub mod graph;
pub mod router;

// 主要な型を再エクスポート
pub use self::aggregator::{Aggregator, MAX_ATTEMPT_INDEX};
pub use self::builder::{BuildError, ReportBuilder};
pub use self::graph::{GraphError, JobGraph};
pub use self::router::{Evaluation, Router};
