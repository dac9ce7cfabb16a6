//! The object dispatcher.
//!
//! Dispatch repeats one transition until it reaches a terminal response:
//!
//! ```text
//! (object, [segment, rest..]) ──lookup──▶ route ──bind──▶ invoke
//!        ▲                                                  │
//!        │              Outcome::Traverse(next)             │
//!        └──────────────── (next, rest..) ◀─────────────────┤
//!                                                           │
//!                      Outcome::Response ◀──────────────────┘  (rest discarded)
//! ```
//!
//! An empty remaining path looks up the type's default route. The loop is plain
//! iteration. Steps that consume a segment are bounded by the path length;
//! consecutive default-route steps are capped so a default route that keeps
//! returning traversable objects cannot spin forever.
use std::{borrow::Cow, fmt};

use crate::core::{
    binder::bind,
    error::DispatchError,
    handler::Resource,
    params::RequestParams,
    response::Response,
    traversal::{Lookup, Segment},
};

/// Default cap on consecutive default-route steps per request.
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// What a handler method produced.
pub enum Outcome {
    /// Ends traversal.
    Response(Response),
    /// Continue dispatching on this object with the remaining path.
    Traverse(Box<dyn Resource>),
}

impl Outcome {
    pub fn traverse<R: Resource>(resource: R) -> Self {
        Outcome::Traverse(Box::new(resource))
    }

    pub fn is_response(&self) -> bool {
        matches!(self, Outcome::Response(_))
    }
}

impl From<Response> for Outcome {
    fn from(response: Response) -> Self {
        Outcome::Response(response)
    }
}

impl fmt::Debug for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Response(response) => f.debug_tuple("Response").field(response).finish(),
            Outcome::Traverse(next) => {
                f.debug_tuple("Traverse").field(&next.type_name()).finish()
            }
        }
    }
}

/// Return type of every handler method.
pub type HandlerResult = Result<Outcome, DispatchError>;

/// Resolves request paths against a tree of handler objects.
#[derive(Debug, Clone, Copy)]
pub struct Dispatcher {
    max_depth: usize,
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_DEPTH)
    }
}

impl Dispatcher {
    pub fn new(max_depth: usize) -> Self {
        Self { max_depth }
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Dispatches `segments` starting at `root`.
    pub fn dispatch(
        &self,
        root: &dyn Resource,
        segments: &[String],
        params: &RequestParams,
    ) -> Result<Response, DispatchError> {
        let mut current: Option<Box<dyn Resource>> = None;
        let mut remaining = segments;
        // default-route steps since the last consumed segment
        let mut idle_steps = 0;

        loop {
            let target: &dyn Resource = current.as_deref().unwrap_or(root);
            let (segment, rest) = match remaining.split_first() {
                Some((head, tail)) => (Segment::Named(head.as_str()), tail),
                None => {
                    if idle_steps == self.max_depth {
                        break;
                    }
                    idle_steps += 1;
                    (Segment::Default, &[][..])
                }
            };

            match self.step(target, segment, params)? {
                Outcome::Response(response) => {
                    if !rest.is_empty() {
                        tracing::debug!(
                            "Ignoring {} unconsumed path segment(s) after \"{}\"",
                            rest.len(),
                            segment
                        );
                    }
                    return Ok(response);
                }
                Outcome::Traverse(next) => {
                    current = Some(next);
                    remaining = rest;
                }
            }
        }

        tracing::warn!(
            "Default routes of {} kept traversing past the limit of {} steps",
            root.type_name(),
            self.max_depth
        );
        Err(DispatchError::DepthExceeded(self.max_depth))
    }

    /// Resolves one segment on `target` and invokes the matching method.
    fn step(
        &self,
        target: &dyn Resource,
        segment: Segment<'_>,
        params: &RequestParams,
    ) -> Result<Outcome, DispatchError> {
        let map = target.traversal_map()?;
        let route = match map.lookup(segment) {
            Lookup::Route(route) => route,
            Lookup::NotFound => {
                tracing::debug!(
                    "Path segment \"{}\" not found on {}",
                    segment,
                    target.type_name()
                );
                return Err(DispatchError::NotFound {
                    segment: segment.to_string(),
                    type_name: target.type_name(),
                });
            }
            Lookup::NotTraversable => {
                tracing::warn!(
                    "Attempted to traverse member \"{}\" of {}, but it is not traversable.",
                    segment,
                    target.type_name()
                );
                return Err(DispatchError::NotTraversable {
                    segment: segment.to_string(),
                    type_name: target.type_name(),
                });
            }
        };

        let args = bind(route.meta(), params)?;
        let outcome = route.invoke(target.as_any(), &args)?;
        let produced: Cow<'_, str> = match &outcome {
            Outcome::Response(response) => format!("a {} response", response.status()).into(),
            Outcome::Traverse(next) => next.type_name().into(),
        };
        tracing::info!(
            "Traversing \"{}\" resulted in {}",
            route.meta().name(),
            produced
        );
        Ok(outcome)
    }
}

/// Splits a request path into percent-decoded segments. Empty segments are
/// dropped, so `/` yields no segments and `/spam/` equals `/spam`.
pub fn split_path(path: &str) -> Result<Vec<String>, DispatchError> {
    path.split('/')
        .filter(|segment| !segment.is_empty())
        .map(|segment| {
            urlencoding::decode(segment)
                .map(Cow::into_owned)
                .map_err(|_| {
                    DispatchError::bad_request(format!(
                        "Path segment \"{segment}\" is not valid UTF-8 once decoded"
                    ))
                })
        })
        .collect()
}
