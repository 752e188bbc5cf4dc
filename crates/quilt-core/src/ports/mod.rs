//! Ports - pipeline の差し替え可能な境界
//!
//! Every seam a caller can customize is a trait here: the two pipeline steps
//! and the change identity the aggregator keys its records by. Reference
//! implementations live in `impls`.

pub mod change_identity;
pub mod producer;
pub mod transformer;

pub use self::change_identity::ChangeIdentity;
pub use self::producer::FragmentProducer;
pub use self::transformer::Transformer;
