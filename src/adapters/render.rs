//! Response formatting wrappers.
//!
//! Each wrapper turns a function producing a plain value into a handler method
//! producing a terminal [`Response`]. They compose with the route markers:
//!
//! ```
//! use strider::{Args, DispatchError, Handler, Member, RouteTable, render};
//!
//! struct Root;
//!
//! impl Root {
//!     fn spam(&self, _args: &Args) -> Result<&'static str, DispatchError> {
//!         Ok("spam")
//!     }
//! }
//!
//! impl Handler for Root {
//!     fn routes(table: &mut RouteTable<Self>) {
//!         table.member(Member::method("spam", render::plaintext(Root::spam)).traversable());
//!     }
//! }
//! ```
use eyre::WrapErr;
use http::{StatusCode, header};
use serde::Serialize;

use crate::{
    core::{Args, DispatchError, HandlerResult, Response},
    ports::template::{TemplateEnvironment, TemplateVars},
};

/// Serve the returned text as `text/plain`.
pub fn plaintext<T, F, S>(f: F) -> impl Fn(&T, &Args) -> HandlerResult + Send + Sync + 'static
where
    T: 'static,
    F: Fn(&T, &Args) -> Result<S, DispatchError> + Send + Sync + 'static,
    S: Into<String>,
{
    move |target: &T, args: &Args| -> HandlerResult {
        Ok(Response::text(f(target, args)?).into())
    }
}

/// Serve the returned markup as `text/html`.
pub fn html<T, F, S>(f: F) -> impl Fn(&T, &Args) -> HandlerResult + Send + Sync + 'static
where
    T: 'static,
    F: Fn(&T, &Args) -> Result<S, DispatchError> + Send + Sync + 'static,
    S: Into<String>,
{
    move |target: &T, args: &Args| -> HandlerResult {
        Ok(Response::html(f(target, args)?).into())
    }
}

/// Serialize the returned value as `application/json`.
pub fn json<T, F, S>(f: F) -> impl Fn(&T, &Args) -> HandlerResult + Send + Sync + 'static
where
    T: 'static,
    F: Fn(&T, &Args) -> Result<S, DispatchError> + Send + Sync + 'static,
    S: Serialize,
{
    move |target: &T, args: &Args| -> HandlerResult {
        let value = f(target, args)?;
        let body = serde_json::to_vec(&value).wrap_err("Failed to serialize JSON response")?;
        Ok(Response::new(StatusCode::OK, body)
            .with_header(header::CONTENT_TYPE, "application/json")
            .into())
    }
}

/// Render the template `name` with the returned variables, served as `text/html`.
///
/// The template is looked up once, here; a missing template is a startup error.
pub fn template<T, F>(
    env: &dyn TemplateEnvironment,
    name: &str,
    f: F,
) -> eyre::Result<impl Fn(&T, &Args) -> HandlerResult + Send + Sync + 'static>
where
    T: 'static,
    F: Fn(&T, &Args) -> Result<TemplateVars, DispatchError> + Send + Sync + 'static,
{
    let template = env
        .get_template(name)
        .wrap_err_with(|| format!("Failed to load template {name}"))?;
    let name = name.to_string();

    Ok(move |target: &T, args: &Args| -> HandlerResult {
        let vars = f(target, args)?;
        let body = template
            .render(&vars)
            .wrap_err_with(|| format!("Failed to render template {name}"))?;
        Ok(Response::html(body).into())
    })
}
