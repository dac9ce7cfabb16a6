//! Handler objects.
//!
//! Application types take part in traversal by implementing [`Handler`]. The
//! dispatcher works with type-erased [`Resource`]s, which every `Handler` is
//! through a blanket impl.
use std::{
    any::{Any, type_name},
    sync::Arc,
};

use crate::core::{error::ConfigError, route::RouteTable, traversal::TraversalMap};

/// An application-defined object exposing traversable methods.
pub trait Handler: Sized + Send + Sync + 'static {
    /// Registers the members of this type. Called once per type, the first
    /// time an instance is traversed or preloaded.
    fn routes(table: &mut RouteTable<Self>);
}

/// Object-safe view of a handler used by the dispatcher.
pub trait Resource: Send + Sync + 'static {
    /// Traversal map for this value's concrete type.
    fn traversal_map(&self) -> Result<Arc<TraversalMap>, ConfigError>;

    /// Receiver handed to the registered method bodies.
    fn as_any(&self) -> &dyn Any;

    fn type_name(&self) -> &'static str;
}

impl<T: Handler> Resource for T {
    fn traversal_map(&self) -> Result<Arc<TraversalMap>, ConfigError> {
        TraversalMap::for_type::<T>()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn type_name(&self) -> &'static str {
        type_name::<T>()
    }
}
