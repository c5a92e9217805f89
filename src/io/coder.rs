//! Element coders and the pipeline's coder registry.
//!
//! A [`CoderRegistry`] maps element types to [`Coder`]s. It is an ordinary
//! value: build it, register coders, then hand it to
//! [`Pipeline::with_registry`](crate::Pipeline::with_registry). From then on
//! the pipeline only reads it. Types without a registered coder fall back to
//! [`JsonCoder`] when they are serde-compatible.

use anyhow::{Context, Result};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::any::{Any, TypeId, type_name};
use std::collections::HashMap;
use std::marker::PhantomData;
use std::sync::Arc;

/// Byte encoding of one element.
pub trait Coder<T>: Send + Sync {
    fn encode(&self, value: &T) -> Result<Vec<u8>>;
    fn decode(&self, bytes: &[u8]) -> Result<T>;
}

/// Compact JSON, one value per encoding.
pub struct JsonCoder<T>(PhantomData<fn() -> T>);

impl<T> Default for JsonCoder<T> {
    fn default() -> Self {
        Self(PhantomData)
    }
}

impl<T> JsonCoder<T> {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<T: Serialize + DeserializeOwned> Coder<T> for JsonCoder<T> {
    fn encode(&self, value: &T) -> Result<Vec<u8>> {
        serde_json::to_vec(value).with_context(|| format!("encode {} as JSON", type_name::<T>()))
    }

    fn decode(&self, bytes: &[u8]) -> Result<T> {
        serde_json::from_slice(bytes).with_context(|| format!("decode {} from JSON", type_name::<T>()))
    }
}

/// Type-indexed coder table.
#[derive(Default)]
pub struct CoderRegistry {
    // Each value is an `Arc<dyn Coder<T>>` for the `T` of its key.
    coders: HashMap<TypeId, Box<dyn Any + Send + Sync>>,
}

impl CoderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `coder` for `T`, replacing any earlier registration.
    pub fn register<T: 'static>(&mut self, coder: impl Coder<T> + 'static) -> &mut Self {
        let coder: Arc<dyn Coder<T>> = Arc::new(coder);
        self.coders.insert(TypeId::of::<T>(), Box::new(coder));
        self
    }

    /// Builder-style [`register`](Self::register).
    pub fn with<T: 'static>(mut self, coder: impl Coder<T> + 'static) -> Self {
        self.register(coder);
        self
    }

    pub fn contains<T: 'static>(&self) -> bool {
        self.coders.contains_key(&TypeId::of::<T>())
    }

    /// The coder registered for `T`, if any.
    pub fn get<T: 'static>(&self) -> Option<Arc<dyn Coder<T>>> {
        self.coders
            .get(&TypeId::of::<T>())
            .and_then(|c| c.downcast_ref::<Arc<dyn Coder<T>>>())
            .cloned()
    }

    /// The registered coder for `T`, or [`JsonCoder`].
    pub fn coder_for<T>(&self) -> Arc<dyn Coder<T>>
    where
        T: Serialize + DeserializeOwned + 'static,
    {
        self.get::<T>().unwrap_or_else(|| Arc::new(JsonCoder::<T>::new()))
    }
}

impl std::fmt::Debug for CoderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoderRegistry").field("registered", &self.coders.len()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Upper;

    impl Coder<String> for Upper {
        fn encode(&self, value: &String) -> Result<Vec<u8>> {
            Ok(value.to_uppercase().into_bytes())
        }

        fn decode(&self, bytes: &[u8]) -> Result<String> {
            Ok(String::from_utf8(bytes.to_vec())?.to_lowercase())
        }
    }

    #[test]
    fn registered_coder_wins_over_json() -> Result<()> {
        let reg = CoderRegistry::new().with(Upper);
        assert!(reg.contains::<String>());
        assert_eq!(reg.coder_for::<String>().encode(&"ab".to_string())?, b"AB");
        assert_eq!(reg.coder_for::<u32>().encode(&7)?, b"7");
        Ok(())
    }
}
