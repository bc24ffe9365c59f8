//! Compact-serialization parsing shared by the verifier and [`crate::dangerous`].

mod decode;
mod split;

pub use decode::{
    DecodedJwt,
    decode_segment,
};
pub use split::SplitJwt;
