pub mod analysis;
pub mod body;
pub mod builder;
pub mod decode;
pub mod emitter;
pub mod error;
mod regions;
mod stack;
pub mod structuring;

pub use analysis::{BranchTargetInfo, ControlInfo, analyze};
pub use body::{DecompiledBody, MethodBody, decompile_instructions};
pub use builder::{StatementGroup, StmtRef};
pub use decode::{ListingError, MethodListing, decode_listing};
pub use emitter::emit_body;
pub use error::{DecompileError, Diagnostic};
