pub mod classifier;
pub mod normalize;
pub mod tokenizer;

pub use classifier::{classify, QueryKind};
pub use normalize::{compact, fold_case, normalize_text, split_raw};
pub use tokenizer::{normalize_query, tokenize, TokenSet};
