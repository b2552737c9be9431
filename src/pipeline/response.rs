//! Type-erased response envelope seen by after-receive interceptors.

use std::any::{Any, type_name};
use std::fmt;

/// The successful result of an executor while it travels back through the
/// after-receive interceptors.
///
/// The pipeline is generic over the executor's result type, but interceptors
/// are registered once for every operation, so they see the value behind
/// this envelope. They inspect it with [`downcast_ref`](Self::downcast_ref),
/// edit it with [`downcast_mut`](Self::downcast_mut) or return a different
/// envelope altogether.
///
/// ## Example
///
/// ```rust
/// use weaviate::pipeline::Response;
///
/// let mut response = Response::new(String::from("ok"));
/// if let Some(body) = response.downcast_mut::<String>() {
///     body.push('!');
/// }
/// assert_eq!(response.into_inner::<String>().unwrap(), "ok!");
/// ```
pub struct Response {
    value: Box<dyn Any + Send>,
    type_name: &'static str,
}

impl Response {
    /// Wraps a value.
    pub fn new<T: Send + 'static>(value: T) -> Self {
        Self { value: Box::new(value), type_name: type_name::<T>() }
    }

    /// Returns `true` if the envelope holds a `T`.
    pub fn is<T: 'static>(&self) -> bool {
        self.value.is::<T>()
    }

    /// Borrows the value as `T`.
    pub fn downcast_ref<T: 'static>(&self) -> Option<&T> {
        self.value.downcast_ref()
    }

    /// Mutably borrows the value as `T`.
    pub fn downcast_mut<T: 'static>(&mut self) -> Option<&mut T> {
        self.value.downcast_mut()
    }

    /// Unwraps the value, handing the envelope back if it holds another type.
    pub fn into_inner<T: 'static>(self) -> Result<T, Self> {
        let type_name = self.type_name;
        self.value.downcast::<T>().map(|boxed| *boxed).map_err(|value| Self { value, type_name })
    }

    /// Name of the wrapped type, for diagnostics.
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }
}

impl fmt::Debug for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Response").field("type", &self.type_name).finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_downcast() {
        let mut response = Response::new(41_u32);
        assert!(response.is::<u32>());
        assert!(!response.is::<i64>());
        assert!(response.downcast_ref::<String>().is_none());

        *response.downcast_mut::<u32>().unwrap() += 1;
        assert_eq!(response.downcast_ref::<u32>(), Some(&42));
    }

    #[test]
    fn test_into_inner_mismatch_returns_envelope() {
        let response = Response::new(vec![1_u8, 2]);
        let response = response.into_inner::<String>().unwrap_err();
        assert_eq!(response.type_name(), "alloc::vec::Vec<u8>");
        assert_eq!(response.into_inner::<Vec<u8>>().unwrap(), vec![1, 2]);
    }

    #[test]
    fn test_debug_shows_type() {
        let debug = format!("{:?}", Response::new(()));
        assert!(debug.contains("()"));
    }
}
