use memchr::memchr_iter;

use crate::error::SplitError;

/// A compact JWT split on its two `.` separators; no decoding is performed.
#[derive(Debug, Clone, Copy)]
pub struct SplitJwt<'a> {
    token: &'a str,
    header_end: usize,
    payload_end: usize,
}

impl<'a> TryFrom<&'a str> for SplitJwt<'a> {
    type Error = SplitError;
    fn try_from(token: &'a str) -> Result<Self, Self::Error> {
        let mut dots = memchr_iter(b'.', token.as_bytes());
        let header_end = dots.next().ok_or(SplitError::Undersized)?;
        let payload_end = dots.next().ok_or(SplitError::Undersized)?;
        if dots.next().is_some() {
            return Err(SplitError::Oversized);
        }
        Ok(Self {
            token,
            header_end,
            payload_end,
        })
    }
}

impl<'a> SplitJwt<'a> {
    /// Base64url header segment
    #[must_use]
    pub fn header(&self) -> &'a str {
        &self.token[..self.header_end]
    }

    /// Base64url payload segment
    #[must_use]
    pub fn payload(&self) -> &'a str {
        &self.token[self.header_end + 1..self.payload_end]
    }

    /// Signing input: `header.payload`
    #[must_use]
    pub fn message(&self) -> &'a str {
        &self.token[..self.payload_end]
    }

    /// Base64url signature segment
    #[must_use]
    pub fn signature(&self) -> &'a str {
        &self.token[self.payload_end + 1..]
    }
}
