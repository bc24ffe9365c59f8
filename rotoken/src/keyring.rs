use crate::{
    Algorithm,
    error::KeyRingError,
};

/// Backend key material that can be placed in a [`KeyRing`].
///
/// Implemented by the [`crypto`](crate::crypto) backends for both signing and
/// verification keys.
pub trait KeyMaterial {
    /// `true` when this material can sign or verify under `algorithm`.
    fn supports(&self, algorithm: Algorithm) -> bool;
}

/// A named key bound to exactly one [`Algorithm`].
#[derive(Debug)]
pub struct Key<M> {
    id: String,
    algorithm: Algorithm,
    material: M,
}

impl<M> Key<M> {
    /// Key id, written to the `kid` header of tokens signed with this key
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// The algorithm this key signs and verifies under
    #[must_use]
    pub const fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    /// Backend key material
    #[must_use]
    pub const fn material(&self) -> &M {
        &self.material
    }
}

/// Ordered collection of [`Key`]s with unique ids.
///
/// Rings are built once at startup and never mutated afterwards; rotating a key means
/// building a new signer ring without it while the verifier ring keeps it until
/// outstanding tokens have expired.
///
/// ```rust
/// # use rotoken::{Algorithm, keyring::{KeyMaterial, KeyRing}};
/// # struct Secret;
/// # impl KeyMaterial for Secret {
/// #     fn supports(&self, alg: Algorithm) -> bool { alg.is_symmetric() }
/// # }
/// let ring = KeyRing::new()
///     .with_key("2024-01", Algorithm::HS256, Secret)
///     .with_key("2024-02", Algorithm::HS512, Secret);
/// assert_eq!(ring.len(), 2);
/// assert_eq!(ring.get("2024-02").unwrap().algorithm(), Algorithm::HS512);
/// ```
#[derive(Debug)]
pub struct KeyRing<M> {
    keys: Vec<Key<M>>,
}

impl<M> Default for KeyRing<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M> KeyRing<M> {
    /// An empty ring
    #[must_use]
    pub const fn new() -> Self {
        Self { keys: Vec::new() }
    }

    /// Looks up a key by id.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Key<M>> {
        self.keys.iter().find(|k| k.id == id)
    }

    /// Number of keys in the ring
    #[must_use]
    pub const fn len(&self) -> usize {
        self.keys.len()
    }

    /// `true` when the ring holds no keys
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Keys in insertion order
    pub fn iter(&self) -> impl Iterator<Item = &Key<M>> {
        self.keys.iter()
    }

    pub(crate) fn nth(&self, index: usize) -> Option<&Key<M>> {
        self.keys.get(index)
    }
}

impl<M> KeyRing<M>
where
    M: KeyMaterial,
{
    /// Adds a key to the ring.
    ///
    /// # Errors
    ///
    /// - [`KeyRingError::DuplicateKeyId`] when a key named `id` is already present
    /// - [`KeyRingError::UnsupportedAlgorithm`] when `material` cannot be used with
    ///   `algorithm`
    pub fn try_add_key(
        &mut self,
        id: impl Into<String>,
        algorithm: Algorithm,
        material: M,
    ) -> Result<(), KeyRingError> {
        let id = id.into();
        if self.get(&id).is_some() {
            return Err(KeyRingError::DuplicateKeyId(id));
        }
        if !material.supports(algorithm) {
            return Err(KeyRingError::UnsupportedAlgorithm { kid: id, alg: algorithm });
        }
        self.keys.push(Key {
            id,
            algorithm,
            material,
        });
        Ok(())
    }

    /// Adds a key to the ring.
    ///
    /// # Panics
    ///
    /// On a duplicate `id`, or when `material` cannot be used with `algorithm`. Both
    /// are configuration errors; use [`KeyRing::try_add_key`] to handle them instead.
    pub fn add_key(&mut self, id: impl Into<String>, algorithm: Algorithm, material: M) {
        if let Err(e) = self.try_add_key(id, algorithm, material) {
            panic!("invalid key ring configuration: {e}");
        }
    }

    /// Builder-style [`KeyRing::add_key`].
    ///
    /// # Panics
    ///
    /// Under the same conditions as [`KeyRing::add_key`].
    #[must_use]
    pub fn with_key(mut self, id: impl Into<String>, algorithm: Algorithm, material: M) -> Self {
        self.add_key(id, algorithm, material);
        self
    }
}
