pub mod binder;
pub mod dispatcher;
pub mod error;
pub mod handler;
pub mod params;
pub mod response;
pub mod route;
pub mod traversal;

pub use dispatcher::{Dispatcher, HandlerResult, Outcome, split_path};
pub use error::{ConfigError, DispatchError, ErrorKind};
pub use handler::{Handler, Resource};
pub use params::{Args, FormData, ParamValue, RequestInfo, RequestParams};
pub use response::Response;
pub use route::{Member, Param, RouteMeta, RouteTable};
pub use traversal::{Lookup, Segment, TraversalMap};
