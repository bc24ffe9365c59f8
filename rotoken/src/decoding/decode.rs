use base64_simd::URL_SAFE_NO_PAD as b64;

use crate::{
    JwtError,
    decoding::SplitJwt,
};

/// Decodes a single base64url (unpadded) segment.
///
/// # Errors
///
/// [`JwtError::InvalidEncoding`] when `segment` is not valid base64url.
pub fn decode_segment(segment: &str) -> Result<Vec<u8>, JwtError> {
    b64.decode_to_vec(segment)
        .map_err(|_| JwtError::InvalidEncoding)
}

/// Header, payload and signature of a compact JWT decoded into one buffer.
#[derive(Debug)]
pub struct DecodedJwt {
    data: Vec<u8>,
    header_len: usize,
    payload_end: usize,
}

impl TryFrom<&SplitJwt<'_>> for DecodedJwt {
    type Error = JwtError;
    fn try_from(parts: &SplitJwt<'_>) -> Result<Self, Self::Error> {
        let mut data = Vec::with_capacity(
            b64.estimated_decoded_length(parts.header().len())
                + b64.estimated_decoded_length(parts.payload().len())
                + b64.estimated_decoded_length(parts.signature().len()),
        );
        b64.decode_append(parts.header(), &mut data)
            .map_err(|_| JwtError::InvalidEncoding)?;
        let header_len = data.len();
        b64.decode_append(parts.payload(), &mut data)
            .map_err(|_| JwtError::InvalidEncoding)?;
        let payload_end = data.len();
        b64.decode_append(parts.signature(), &mut data)
            .map_err(|_| JwtError::InvalidEncoding)?;
        Ok(Self {
            data,
            header_len,
            payload_end,
        })
    }
}

impl DecodedJwt {
    /// Decoded (not deserialized) header
    #[must_use]
    pub fn header(&self) -> &[u8] {
        &self.data[..self.header_len]
    }

    /// Decoded (not deserialized) claims
    #[must_use]
    pub fn claims(&self) -> &[u8] {
        &self.data[self.header_len..self.payload_end]
    }

    /// Decoded signature bytes
    #[must_use]
    pub fn signature(&self) -> &[u8] {
        &self.data[self.payload_end..]
    }
}
