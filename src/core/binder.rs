//! Parameter binding.
//!
//! Decides which request parameters a handler method receives. A method gets
//! the parameters it declares (plus defaults for absent optional ones), or the
//! entire set when it declares a catch-all. Undeclared parameters are dropped
//! without error so one request parameter set can serve any signature.
use std::collections::HashMap;

use crate::core::{
    error::DispatchError,
    params::{Args, ParamValue, RequestParams},
    route::RouteMeta,
};

/// Builds the arguments for one call of the method described by `meta`.
pub fn bind(meta: &RouteMeta, params: &RequestParams) -> Result<Args, DispatchError> {
    if let Some(missing) = meta.required_params().find(|name| !params.contains(name)) {
        tracing::warn!(
            "Attempted to invoke method \"{}\" but required parameter \"{}\" was not provided.",
            meta.name(),
            missing
        );
        return Err(DispatchError::MissingParameter {
            route: meta.name().to_string(),
            param: missing.to_string(),
        });
    }

    let mut values: HashMap<String, ParamValue> = if meta.accepts_arbitrary_params() {
        params
            .iter()
            .map(|(name, value)| (name.to_string(), value.clone()))
            .collect()
    } else {
        meta.params()
            .iter()
            .filter_map(|param| {
                params
                    .get(param.name())
                    .map(|value| (param.name().to_string(), value.clone()))
            })
            .collect()
    };

    for param in meta.params() {
        if let Some(default) = param.default_value() {
            values
                .entry(param.name().to_string())
                .or_insert_with(|| ParamValue::Text(default.to_string()));
        }
    }

    Ok(Args::from_values(values))
}

#[cfg(test)]
mod tests {
    use http::{HeaderMap, Method};

    use super::*;
    use crate::core::{
        params::{FormData, RequestInfo},
        response::Response,
        route::{Member, Param},
    };

    struct Root;

    fn meta_of(member: Member<Root>) -> RouteMeta {
        member.meta().cloned().unwrap()
    }

    fn member(name: &str) -> Member<Root> {
        Member::method(name, |_: &Root, _: &Args| Ok(Response::ok().into())).traversable()
    }

    #[test]
    fn test_missing_required_parameter() {
        let meta = meta_of(member("required_arg").param(Param::required("spam")));
        let err = bind(&meta, &RequestParams::new()).unwrap_err();
        match err {
            DispatchError::MissingParameter { route, param } => {
                assert_eq!(route, "required_arg");
                assert_eq!(param, "spam");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_required_parameter_present() {
        let meta = meta_of(member("required_arg").param(Param::required("spam")));
        let params = RequestParams::new().with("spam", "eggs");
        let args = bind(&meta, &params).unwrap();
        assert_eq!(args.text("spam"), Some("eggs"));
    }

    #[test]
    fn test_default_applied_when_absent() {
        let meta =
            meta_of(member("default_args").param(Param::optional("spam").with_default("spam!")));
        let args = bind(&meta, &RequestParams::new()).unwrap();
        assert_eq!(args.text("spam"), Some("spam!"));

        let params = RequestParams::new().with("spam", "ham");
        let args = bind(&meta, &params).unwrap();
        assert_eq!(args.text("spam"), Some("ham"));
    }

    #[test]
    fn test_undeclared_parameters_dropped() {
        let meta = meta_of(member("hello").param(Param::optional("name")));
        let params = RequestParams::new().with("name", "Daniel").with("utm_source", "mail");
        let args = bind(&meta, &params).unwrap();
        assert_eq!(args.names(), vec!["name"]);
    }

    #[test]
    fn test_optional_without_default_left_unbound() {
        let meta = meta_of(member("hello").param(Param::optional("name")));
        let args = bind(&meta, &RequestParams::new()).unwrap();
        assert!(args.is_empty());
    }

    #[test]
    fn test_catch_all_receives_everything() {
        let meta = meta_of(member("keyword_args").catch_all());
        let request = RequestInfo::new(
            Method::GET,
            "/keyword_args",
            Some("a=1".to_string()),
            HeaderMap::new(),
            FormData::new(),
        );
        let params = RequestParams::from_request(request);
        let args = bind(&meta, &params).unwrap();
        assert_eq!(args.names(), vec!["a", "form", "request"]);
        assert!(args.request().is_some());
        assert!(args.form().is_some());
    }
}
