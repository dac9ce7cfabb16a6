//! Route metadata and member registration.
//!
//! Handler types describe themselves by registering [`Member`]s on a
//! [`RouteTable`]. A member is either a method, optionally marked traversable
//! and/or default, or a plain field which can never be traversed. The markers
//! only attach metadata ([`RouteMeta`]); the registered function is called
//! exactly as written.
//!
//! ```
//! use strider::{Args, Handler, HandlerResult, Member, Param, Response, RouteTable};
//!
//! struct Root;
//!
//! impl Root {
//!     fn spam(&self, _args: &Args) -> HandlerResult {
//!         Ok(Response::text("spam").into())
//!     }
//!
//!     fn greet(&self, args: &Args) -> HandlerResult {
//!         Ok(Response::text(format!("Hello, {}!", args.require("name")?)).into())
//!     }
//! }
//!
//! impl Handler for Root {
//!     fn routes(table: &mut RouteTable<Self>) {
//!         table
//!             .member(Member::method("spam", Root::spam).traversable())
//!             .member(
//!                 Member::method("greet", Root::greet)
//!                     .traversable_as("hello")
//!                     .param(Param::optional("name").with_default("world")),
//!             );
//!     }
//! }
//! ```
use std::{
    any::{Any, type_name},
    fmt,
    marker::PhantomData,
    sync::Arc,
};

use crate::core::{
    dispatcher::{HandlerResult, Outcome},
    error::DispatchError,
    params::Args,
};

/// Type-erased method body. The receiver is downcast back to the registering
/// type before the user function runs.
pub(crate) type Invoker =
    Arc<dyn Fn(&dyn Any, &Args) -> Result<Outcome, DispatchError> + Send + Sync>;

/// A declared method parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Param {
    name: String,
    required: bool,
    default: Option<String>,
}

impl Param {
    /// A parameter without a default; dispatch fails with BadRequest if the
    /// request does not supply it.
    pub fn required(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            required: true,
            default: None,
        }
    }

    /// A parameter that is bound only when the request supplies it.
    pub fn optional(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            required: false,
            default: None,
        }
    }

    /// Value bound when the request does not supply the parameter. Makes the
    /// parameter optional.
    pub fn with_default(mut self, value: impl Into<String>) -> Self {
        self.required = false;
        self.default = Some(value.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_required(&self) -> bool {
        self.required
    }

    pub fn default_value(&self) -> Option<&str> {
        self.default.as_deref()
    }
}

/// Immutable metadata describing how a method takes part in traversal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteMeta {
    member: String,
    name: String,
    traversable: bool,
    is_default: bool,
    params: Vec<Param>,
    accepts_arbitrary_params: bool,
}

impl RouteMeta {
    fn new(member: String) -> Self {
        Self {
            name: member.clone(),
            member,
            traversable: false,
            is_default: false,
            params: Vec::new(),
            accepts_arbitrary_params: false,
        }
    }

    /// Declared member name.
    pub fn member(&self) -> &str {
        &self.member
    }

    /// Path segment the method is reachable under when traversable.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_traversable(&self) -> bool {
        self.traversable
    }

    pub fn is_default(&self) -> bool {
        self.is_default
    }

    pub fn params(&self) -> &[Param] {
        &self.params
    }

    pub fn required_params(&self) -> impl Iterator<Item = &str> {
        self.params
            .iter()
            .filter(|p| p.is_required())
            .map(Param::name)
    }

    pub fn accepts_arbitrary_params(&self) -> bool {
        self.accepts_arbitrary_params
    }
}

pub(crate) enum MemberKind {
    Method { meta: RouteMeta, invoke: Invoker },
    Field { name: String },
}

/// One registered member of a handler type.
pub struct Member<T> {
    kind: MemberKind,
    _target: PhantomData<fn(&T)>,
}

impl<T: Any> Member<T> {
    /// Registers a method. Until it is marked with [`Member::traversable`],
    /// [`Member::traversable_as`] or [`Member::as_default`] it is excluded from
    /// traversal.
    pub fn method<F>(name: impl Into<String>, f: F) -> Self
    where
        F: Fn(&T, &Args) -> HandlerResult + Send + Sync + 'static,
    {
        let meta = RouteMeta::new(name.into());
        let member = meta.member.clone();
        let invoke: Invoker = Arc::new(move |target: &dyn Any, args: &Args| {
            let target =
                target
                    .downcast_ref::<T>()
                    .ok_or_else(|| DispatchError::TypeMismatch {
                        member: member.clone(),
                        expected: type_name::<T>(),
                    })?;
            f(target, args)
        });
        Self {
            kind: MemberKind::Method { meta, invoke },
            _target: PhantomData,
        }
    }

    /// Registers a non-callable member. Fields are never traversable.
    pub fn field(name: impl Into<String>) -> Self {
        Self {
            kind: MemberKind::Field { name: name.into() },
            _target: PhantomData,
        }
    }

    /// Makes the method reachable under its own member name.
    pub fn traversable(self) -> Self {
        self.with_meta(|meta| {
            meta.traversable = true;
            meta.name = meta.member.clone();
        })
    }

    /// Makes the method reachable under `name` only; its member name is not
    /// usable as a path segment.
    pub fn traversable_as(self, name: impl Into<String>) -> Self {
        let name = name.into();
        self.with_meta(move |meta| {
            meta.traversable = true;
            meta.name = name;
        })
    }

    /// Uses the method when no path segment remains at this level.
    pub fn as_default(self) -> Self {
        self.with_meta(|meta| meta.is_default = true)
    }

    pub fn param(self, param: Param) -> Self {
        self.with_meta(move |meta| meta.params.push(param))
    }

    /// Passes the whole request parameter set to the method.
    pub fn catch_all(self) -> Self {
        self.with_meta(|meta| meta.accepts_arbitrary_params = true)
    }

    /// Route metadata of a method member; `None` for fields.
    pub fn meta(&self) -> Option<&RouteMeta> {
        match &self.kind {
            MemberKind::Method { meta, .. } => Some(meta),
            MemberKind::Field { .. } => None,
        }
    }

    pub fn name(&self) -> &str {
        match &self.kind {
            MemberKind::Method { meta, .. } => meta.member(),
            MemberKind::Field { name } => name,
        }
    }

    fn with_meta(mut self, update: impl FnOnce(&mut RouteMeta)) -> Self {
        match &mut self.kind {
            MemberKind::Method { meta, .. } => update(meta),
            MemberKind::Field { name } => {
                tracing::warn!("Ignoring route marker on field \"{}\"", name);
            }
        }
        self
    }
}

impl<T> fmt::Debug for Member<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            MemberKind::Method { meta, .. } => f.debug_tuple("Method").field(meta).finish(),
            MemberKind::Field { name } => f.debug_tuple("Field").field(name).finish(),
        }
    }
}

/// Members registered by one handler type, in declaration order.
pub struct RouteTable<T> {
    members: Vec<MemberKind>,
    _target: PhantomData<fn(&T)>,
}

impl<T: Any> RouteTable<T> {
    pub(crate) fn new() -> Self {
        Self {
            members: Vec::new(),
            _target: PhantomData,
        }
    }

    pub fn member(&mut self, member: Member<T>) -> &mut Self {
        self.members.push(member.kind);
        self
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub(crate) fn into_members(self) -> Vec<MemberKind> {
        self.members
    }
}
