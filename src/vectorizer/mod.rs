use crate::error::TraceError;
use crate::mask::BinaryMask;

/// A trait representing an algorithm that can turn a binary mask into a vector representation.
pub trait MaskVectorizer {
    type Options;
    type Output;

    fn vectorize(&self, mask: &BinaryMask, options: &Self::Options) -> Result<Self::Output, TraceError>;
}

pub mod contour;
pub mod simplify;
