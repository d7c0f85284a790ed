//! Intent extraction and merging
//!
//! - `normalize`: canonical token symbols, chain names and chain ids
//! - `extract`: offline regex extractor
//! - `types`: `Intent`, `PartialIntent` and the merge rule

pub mod extract;
pub mod normalize;
pub mod types;

pub use extract::extract_local_intent;
pub use normalize::{
    chain_id, chain_name, is_solana, normalize_chain_alias, normalize_token_symbol,
    SOLANA_CHAIN_ID,
};
pub use types::{Intent, IntentField, PartialIntent};
