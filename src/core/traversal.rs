//! Traversal maps: which path segments a handler type answers to.
//!
//! A [`TraversalMap`] is a pure function of the members a type registers in
//! [`Handler::routes`], so it is built once per type and cached for the life of
//! the process. The cache is an insert-once `scc::HashMap` keyed by `TypeId`;
//! two threads racing to build the same map produce equal results and the
//! first insert wins.
use std::{
    any::{Any, TypeId, type_name},
    collections::{HashMap, HashSet, hash_map::Entry},
    fmt,
    sync::Arc,
};

use once_cell::sync::Lazy;

use crate::core::{
    dispatcher::HandlerResult,
    error::ConfigError,
    handler::Handler,
    params::Args,
    route::{Invoker, MemberKind, RouteMeta, RouteTable},
};

static TRAVERSAL_MAPS: Lazy<scc::HashMap<TypeId, Arc<TraversalMap>>> =
    Lazy::new(scc::HashMap::new);

/// Key looked up in a traversal map.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment<'a> {
    Named(&'a str),
    /// No path segment remains at this level.
    Default,
}

impl fmt::Display for Segment<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Segment::Named(name) => f.write_str(name),
            Segment::Default => f.write_str("<default>"),
        }
    }
}

/// A traversable method together with its metadata.
pub struct Route {
    meta: RouteMeta,
    invoke: Invoker,
}

impl Route {
    pub fn meta(&self) -> &RouteMeta {
        &self.meta
    }

    pub fn invoke(&self, target: &dyn Any, args: &Args) -> HandlerResult {
        (self.invoke)(target, args)
    }
}

impl fmt::Debug for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Route").field("meta", &self.meta).finish()
    }
}

#[derive(Debug, Clone)]
enum MapEntry {
    Route(Arc<Route>),
    NotTraversable,
}

/// Result of looking a segment up in a [`TraversalMap`].
#[derive(Debug, Clone, Copy)]
pub enum Lookup<'a> {
    Route(&'a Route),
    NotTraversable,
    NotFound,
}

/// Immutable mapping from path segment to route for one handler type.
#[derive(Debug)]
pub struct TraversalMap {
    type_name: &'static str,
    entries: HashMap<String, MapEntry>,
    default: Option<Arc<Route>>,
}

impl TraversalMap {
    /// Cached map for `T`, built on first use.
    pub fn for_type<T: Handler>() -> Result<Arc<TraversalMap>, ConfigError> {
        let type_id = TypeId::of::<T>();
        if let Some(map) = TRAVERSAL_MAPS.read_sync(&type_id, |_, map| map.clone()) {
            return Ok(map);
        }

        let map = Arc::new(Self::build::<T>()?);
        match TRAVERSAL_MAPS.insert_sync(type_id, map.clone()) {
            Ok(()) => Ok(map),
            // Another thread published first; both maps are equal, keep theirs.
            Err(_) => Ok(TRAVERSAL_MAPS
                .read_sync(&type_id, |_, map| map.clone())
                .unwrap_or(map)),
        }
    }

    /// Builds the map for `T` without consulting the cache.
    pub fn build<T: Handler>() -> Result<Self, ConfigError> {
        let type_name = type_name::<T>();
        tracing::debug!("Scanning for traversable paths on {}", type_name);

        let mut table = RouteTable::<T>::new();
        T::routes(&mut table);
        Self::from_members(type_name, table.into_members())
    }

    fn from_members(
        type_name: &'static str,
        members: Vec<MemberKind>,
    ) -> Result<Self, ConfigError> {
        let mut builder = MapBuilder {
            type_name,
            seen_members: HashSet::new(),
            entries: HashMap::new(),
            owners: HashMap::new(),
            default: None,
        };

        for member in members {
            match member {
                MemberKind::Field { name } => {
                    builder.claim_member(&name)?;
                    tracing::debug!("Found non-traversable path \"{}\" on {}", name, type_name);
                    builder.insert(name.clone(), name, MapEntry::NotTraversable)?;
                }
                MemberKind::Method { meta, invoke } => {
                    builder.claim_member(meta.member())?;
                    for param in meta.params() {
                        if meta.params().iter().filter(|p| p.name() == param.name()).count() > 1 {
                            return Err(ConfigError::DuplicateParam {
                                type_name,
                                member: meta.member().to_string(),
                                param: param.name().to_string(),
                            });
                        }
                    }
                    builder.add_method(meta, invoke)?;
                }
            }
        }

        Ok(Self {
            type_name,
            entries: builder.entries,
            default: builder.default,
        })
    }

    pub fn lookup(&self, segment: Segment<'_>) -> Lookup<'_> {
        let entry = match segment {
            Segment::Named(name) => self.entries.get(name),
            Segment::Default => {
                return match &self.default {
                    Some(route) => Lookup::Route(route),
                    None => Lookup::NotFound,
                };
            }
        };
        match entry {
            Some(MapEntry::Route(route)) => Lookup::Route(route),
            Some(MapEntry::NotTraversable) => Lookup::NotTraversable,
            None => Lookup::NotFound,
        }
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Segment names reachable by traversal, sorted.
    pub fn traversable_segments(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self
            .entries
            .iter()
            .filter(|(_, entry)| matches!(entry, MapEntry::Route(_)))
            .map(|(name, _)| name.as_str())
            .collect();
        names.sort_unstable();
        names
    }

    pub fn default_route(&self) -> Option<&Route> {
        self.default.as_deref()
    }

    /// Number of named entries, traversable or not. The default route is not
    /// counted.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty() && self.default.is_none()
    }
}

struct MapBuilder {
    type_name: &'static str,
    seen_members: HashSet<String>,
    entries: HashMap<String, MapEntry>,
    // segment -> member that claimed it, for error reporting
    owners: HashMap<String, String>,
    default: Option<Arc<Route>>,
}

impl MapBuilder {
    fn claim_member(&mut self, member: &str) -> Result<(), ConfigError> {
        if !self.seen_members.insert(member.to_string()) {
            return Err(ConfigError::DuplicateMember {
                type_name: self.type_name,
                member: member.to_string(),
            });
        }
        Ok(())
    }

    fn add_method(&mut self, meta: RouteMeta, invoke: Invoker) -> Result<(), ConfigError> {
        let member = meta.member().to_string();
        let segment = meta.name().to_string();
        let traversable = meta.is_traversable();
        let is_default = meta.is_default();
        let route = Arc::new(Route { meta, invoke });

        if traversable {
            if segment.is_empty() || segment.contains('/') {
                return Err(ConfigError::InvalidSegment {
                    type_name: self.type_name,
                    member,
                    segment,
                });
            }
            tracing::debug!("Found traversable path \"{}\" on {}", segment, self.type_name);
            self.insert(segment, member.clone(), MapEntry::Route(route.clone()))?;
        } else {
            tracing::debug!("Found non-traversable path \"{}\" on {}", member, self.type_name);
            self.insert(member.clone(), member.clone(), MapEntry::NotTraversable)?;
        }

        if is_default {
            if let Some(existing) = &self.default {
                return Err(ConfigError::MultipleDefaults {
                    type_name: self.type_name,
                    first: existing.meta().member().to_string(),
                    second: member,
                });
            }
            tracing::debug!("Found default path \"{}\" on {}", member, self.type_name);
            self.default = Some(route);
        }
        Ok(())
    }

    fn insert(
        &mut self,
        segment: String,
        member: String,
        entry: MapEntry,
    ) -> Result<(), ConfigError> {
        match self.entries.entry(segment) {
            Entry::Occupied(occupied) => Err(ConfigError::DuplicateSegment {
                type_name: self.type_name,
                segment: occupied.key().clone(),
                first: self.owners.get(occupied.key()).cloned().unwrap_or_default(),
                second: member,
            }),
            Entry::Vacant(vacant) => {
                self.owners.insert(vacant.key().clone(), member);
                vacant.insert(entry);
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{
        dispatcher::Outcome,
        response::Response,
        route::{Member, Param},
    };

    struct Root;

    impl Root {
        fn spam(&self, _args: &Args) -> HandlerResult {
            Ok(Response::text("spam").into())
        }

        fn eggs(&self, _args: &Args) -> HandlerResult {
            Ok(Response::text("eggs").into())
        }

        fn xyzzy(&self, _args: &Args) -> HandlerResult {
            Err(eyre::eyre!("should never happen").into())
        }

        fn index(&self, _args: &Args) -> HandlerResult {
            Ok(Response::text("index").into())
        }
    }

    impl Handler for Root {
        fn routes(table: &mut RouteTable<Self>) {
            table
                .member(Member::method("spam", Root::spam).traversable())
                .member(Member::method("eggs", Root::eggs).traversable_as("hovercraft"))
                .member(Member::method("xyzzy", Root::xyzzy))
                .member(Member::method("index", Root::index).as_default())
                .member(Member::field("config"));
        }
    }

    struct TwoDefaults;

    impl TwoDefaults {
        fn one(&self, _args: &Args) -> HandlerResult {
            Ok(Response::ok().into())
        }
    }

    impl Handler for TwoDefaults {
        fn routes(table: &mut RouteTable<Self>) {
            table
                .member(Member::method("one", TwoDefaults::one).as_default())
                .member(Member::method("two", TwoDefaults::one).traversable().as_default());
        }
    }

    struct Clash;

    impl Handler for Clash {
        fn routes(table: &mut RouteTable<Self>) {
            table
                .member(
                    Member::method("a", |_: &Clash, _: &Args| Ok(Response::ok().into()))
                        .traversable_as("b"),
                )
                .member(Member::field("b"));
        }
    }

    struct BadName;

    impl Handler for BadName {
        fn routes(table: &mut RouteTable<Self>) {
            table.member(
                Member::method("a", |_: &BadName, _: &Args| Ok(Response::ok().into()))
                    .traversable_as("/something-completely-different"),
            );
        }
    }

    struct Twice;

    impl Handler for Twice {
        fn routes(table: &mut RouteTable<Self>) {
            table
                .member(Member::field("a"))
                .member(Member::field("a"));
        }
    }

    struct RepeatedParam;

    impl Handler for RepeatedParam {
        fn routes(table: &mut RouteTable<Self>) {
            table.member(
                Member::method("a", |_: &RepeatedParam, _: &Args| Ok(Response::ok().into()))
                    .traversable()
                    .param(Param::required("x"))
                    .param(Param::optional("x")),
            );
        }
    }

    #[test]
    fn test_build_registers_every_member_once() {
        let map = TraversalMap::build::<Root>().unwrap();
        assert!(matches!(map.lookup(Segment::Named("spam")), Lookup::Route(_)));
        assert!(matches!(map.lookup(Segment::Named("hovercraft")), Lookup::Route(_)));
        assert!(matches!(map.lookup(Segment::Named("eggs")), Lookup::NotFound));
        assert!(matches!(map.lookup(Segment::Named("xyzzy")), Lookup::NotTraversable));
        assert!(matches!(map.lookup(Segment::Named("config")), Lookup::NotTraversable));
        assert!(matches!(map.lookup(Segment::Named("index")), Lookup::NotTraversable));
        assert!(matches!(map.lookup(Segment::Named("missing")), Lookup::NotFound));
        assert_eq!(map.traversable_segments(), vec!["hovercraft", "spam"]);
        assert_eq!(map.len(), 5);
    }

    #[test]
    fn test_default_lookup() {
        let map = TraversalMap::build::<Root>().unwrap();
        let Lookup::Route(route) = map.lookup(Segment::Default) else {
            panic!("expected a default route");
        };
        assert_eq!(route.meta().member(), "index");
        let outcome = route.invoke(&Root, &Args::default()).unwrap();
        assert!(matches!(outcome, Outcome::Response(_)));
    }

    #[test]
    fn test_multiple_defaults_rejected() {
        let err = TraversalMap::build::<TwoDefaults>().unwrap_err();
        assert!(matches!(
            err,
            ConfigError::MultipleDefaults { ref first, ref second, .. }
                if first == "one" && second == "two"
        ));
    }

    #[test]
    fn test_segment_clash_rejected() {
        let err = TraversalMap::build::<Clash>().unwrap_err();
        assert!(matches!(err, ConfigError::DuplicateSegment { ref segment, .. } if segment == "b"));
    }

    #[test]
    fn test_invalid_segment_rejected() {
        let err = TraversalMap::build::<BadName>().unwrap_err();
        assert!(matches!(err, ConfigError::InvalidSegment { .. }));
    }

    #[test]
    fn test_duplicate_member_rejected() {
        let err = TraversalMap::build::<Twice>().unwrap_err();
        assert!(matches!(err, ConfigError::DuplicateMember { ref member, .. } if member == "a"));
    }

    #[test]
    fn test_duplicate_param_rejected() {
        let err = TraversalMap::build::<RepeatedParam>().unwrap_err();
        assert!(matches!(err, ConfigError::DuplicateParam { ref param, .. } if param == "x"));
    }

    #[test]
    fn test_for_type_is_memoized() {
        let first = TraversalMap::for_type::<Root>().unwrap();
        let second = TraversalMap::for_type::<Root>().unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_failed_builds_are_not_cached() {
        assert!(TraversalMap::for_type::<TwoDefaults>().is_err());
        assert!(TraversalMap::for_type::<TwoDefaults>().is_err());
    }

    #[test]
    fn test_concurrent_builds_agree() {
        struct Racy;

        impl Handler for Racy {
            fn routes(table: &mut RouteTable<Self>) {
                table.member(
                    Member::method("go", |_: &Racy, _: &Args| Ok(Response::ok().into()))
                        .traversable(),
                );
            }
        }

        let handles: Vec<_> = (0..8)
            .map(|_| std::thread::spawn(TraversalMap::for_type::<Racy>))
            .collect();
        let maps: Vec<_> = handles
            .into_iter()
            .map(|h| h.join().unwrap().unwrap())
            .collect();
        let cached = TraversalMap::for_type::<Racy>().unwrap();
        for map in &maps {
            assert_eq!(map.traversable_segments(), vec!["go"]);
        }
        assert!(maps.iter().all(|m| Arc::ptr_eq(m, &cached)));
    }
}
