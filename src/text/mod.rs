pub mod address;
pub mod normalize;

pub use address::{clean_candidate, extract_address, ip_candidates};
pub use normalize::{normalize_line, normalize_lines};
