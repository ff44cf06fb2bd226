//! Relational translation of predicate trees.
//!
//! - **property**: abstract property to physical column mapping
//! - **dialect**: identifier quoting and parameter markers
//! - **params**: placeholder allocation for one translation
//! - **rewrite**: per-codec hooks expanding multi-column properties
//! - **uint64**: the split unsigned 64-bit codec and its hook
//! - **translator**: tree to SQL text plus bound parameters

pub mod dialect;
pub mod params;
pub mod property;
pub mod rewrite;
pub mod translator;
pub mod uint64;

pub use dialect::Dialect;
pub use params::{BoundParameter, ParameterCreator};
pub use property::{NativeCodec, PropertyResolver, ScalarCodec, SqlProperty};
pub use rewrite::{Backend, RewriteHook, RewriteRegistry};
pub use translator::{SqlTranslator, Translation};
pub use uint64::{split_property, SplitUInt64Codec, SplitUInt64Rewrite, UINT64_SPLIT_CODEC};
