//! Feature preparation for the cyclist outcome model.
//!
//! Each stage returns a new table or block; nothing here reorders rows, so
//! blocks from different stages line up by position.

pub mod assembler;
pub mod categorical;
pub mod deriver;
pub mod outcome;
pub mod sparse;
pub mod text;

pub use assembler::assemble;
pub use categorical::{CategoricalEncoder, CategoricalVocabulary};
pub use deriver::{CrashFeatureDeriver, FeatureDeriver};
pub use outcome::label_outcome;
pub use sparse::SparseBlock;
pub use text::{tokenize, TextVectorizer};
