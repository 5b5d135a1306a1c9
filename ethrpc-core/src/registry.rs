//! Registry of known interceptor variants.
//!
//! The registry is filled once at process start from an explicit
//! registration list and is independent of any session. Registering the same
//! variant twice is a no-op: identity is the implementing type.

use std::any::TypeId;
use std::sync::Arc;

use tracing::debug;

use crate::interceptor::InterceptorDescriptor;

/// Ordered, deduplicated set of interceptor descriptors.
#[derive(Clone, Default)]
pub struct InterceptorRegistry {
    descriptors: Vec<Arc<dyn InterceptorDescriptor>>,
}

impl InterceptorRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a descriptor.
    ///
    /// Returns `false` if a descriptor of the same type was already present,
    /// in which case the registry is unchanged.
    pub fn register(&mut self, descriptor: Arc<dyn InterceptorDescriptor>) -> bool {
        let id = descriptor.descriptor_id();
        if self.contains_id(id) {
            debug!("Interceptor {} already registered", descriptor.name());
            return false;
        }

        debug!("Registered interceptor {}", descriptor.name());
        self.descriptors.push(descriptor);
        true
    }

    /// Builder-style [`register`](Self::register).
    pub fn with(mut self, descriptor: impl InterceptorDescriptor) -> Self {
        self.register(Arc::new(descriptor));
        self
    }

    /// All registered descriptors in registration order.
    pub fn all(&self) -> &[Arc<dyn InterceptorDescriptor>] {
        &self.descriptors
    }

    /// Names of all registered descriptors in registration order.
    pub fn names(&self) -> Vec<String> {
        self.descriptors.iter().map(|d| d.name().to_string()).collect()
    }

    /// Number of registered descriptors.
    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    fn contains_id(&self, id: TypeId) -> bool {
        self.descriptors.iter().any(|d| d.descriptor_id() == id)
    }
}

impl std::fmt::Debug for InterceptorRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InterceptorRegistry")
            .field("descriptors", &self.names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::NetworkConfig;
    use crate::error::PipelineResult;
    use crate::interceptor::{Interceptor, Layer, Next};
    use crate::messages::JsonRpcResponse;
    use crate::transport::Transport;
    use async_trait::async_trait;
    use serde_json::Value;

    struct Passthrough;

    #[async_trait]
    impl Interceptor for Passthrough {
        fn name(&self) -> &str {
            "Passthrough"
        }

        async fn invoke(
            &self,
            method: &str,
            params: Vec<Value>,
            next: Next<'_>,
        ) -> PipelineResult<JsonRpcResponse> {
            next.run(method, params).await
        }
    }

    macro_rules! descriptor {
        ($ty:ident, $layer:expr) => {
            struct $ty;

            #[async_trait]
            impl InterceptorDescriptor for $ty {
                fn name(&self) -> &str {
                    stringify!($ty)
                }

                async fn applicable_layer(
                    &self,
                    _transport: &Arc<dyn Transport>,
                    _config: &NetworkConfig,
                ) -> PipelineResult<Option<Layer>> {
                    Ok($layer)
                }

                fn instantiate(&self, _transport: Arc<dyn Transport>) -> Box<dyn Interceptor> {
                    Box::new(Passthrough)
                }
            }
        };
    }

    descriptor!(First, Some(Layer(1)));
    descriptor!(Second, None);

    #[test]
    fn test_registration_order_is_enumeration_order() {
        let registry = InterceptorRegistry::new().with(Second).with(First);
        assert_eq!(registry.names(), vec!["Second", "First"]);
        assert_eq!(registry.all().len(), 2);
    }

    #[test]
    fn test_duplicate_registration_is_noop() {
        let mut registry = InterceptorRegistry::new();
        assert!(registry.register(Arc::new(First)));
        assert!(!registry.register(Arc::new(First)));
        assert!(registry.register(Arc::new(Second)));

        assert_eq!(registry.len(), 2);
        assert_eq!(registry.names(), vec!["First", "Second"]);
    }

    #[test]
    fn test_empty_registry() {
        let registry = InterceptorRegistry::new();
        assert!(registry.is_empty());
        assert_eq!(format!("{:?}", registry), "InterceptorRegistry { descriptors: [] }");
    }
}
